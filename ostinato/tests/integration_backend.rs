//! Integration tests for the typed file backend and factory dispatch.
//!
//! These exercise the full flow a database layer would drive: resolve a
//! location, provision a backend, serialize a canonical-layout record,
//! close, and read everything back through a fresh mapping.

use ostinato::{
    BackendFactory, Endianness, FileBackendFactory, Location, StorageBackend, find_factory,
};
use tempfile::tempdir;

// Offsets of a small hand-rolled layout: header, one data source, one
// archive, then the row region.
const OFF_VERSION: u64 = 0; // 5 UTF-16 units
const OFF_STEP: u64 = 10;
const OFF_DS_COUNT: u64 = 18;
const OFF_DS_NAME: u64 = 22; // 20 UTF-16 units
const OFF_DS_HEARTBEAT: u64 = 62;
const OFF_DS_MIN: u64 = 70;
const OFF_DS_MAX: u64 = 78;
const OFF_ARC_XFF: u64 = 86;
const OFF_ARC_ROWS: u64 = 94;
const OFF_ROW_DATA: u64 = 128;
const ROW_COUNT: usize = 10;

#[test]
fn full_record_round_trip_through_reopen() {
    let dir = tempdir().unwrap();
    let factory = FileBackendFactory::default();
    let location = Location::from_path(dir.path().join("cpu.rrd"));

    {
        let mut backend = factory.create(&location, 512).unwrap();

        backend.write_string(OFF_VERSION, "0003", 5).unwrap();
        backend.write_long(OFF_STEP, 300).unwrap();
        backend.write_int(OFF_DS_COUNT, 1).unwrap();
        backend.write_string(OFF_DS_NAME, "cpu_user", 20).unwrap();
        backend.write_long(OFF_DS_HEARTBEAT, 600).unwrap();
        backend.write_double(OFF_DS_MIN, 0.0).unwrap();
        backend.write_double(OFF_DS_MAX, f64::NAN).unwrap(); // unbounded
        backend.write_double(OFF_ARC_XFF, 0.5).unwrap();
        backend.write_int(OFF_ARC_ROWS, ROW_COUNT as i32).unwrap();

        backend.write_double_fill(OFF_ROW_DATA, f64::NAN, ROW_COUNT).unwrap();
        let samples = [1.0, 2.0, 3.0];
        backend.write_double_array(OFF_ROW_DATA, &samples).unwrap();

        assert!(backend.is_dirty());
        backend.close().unwrap();
    }

    let backend = factory.open(&location).unwrap();
    assert!(!backend.is_dirty(), "freshly opened backend must be clean");

    assert_eq!(backend.read_string(OFF_VERSION, 5).unwrap(), "0003");
    assert_eq!(backend.read_long(OFF_STEP).unwrap(), 300);
    assert_eq!(backend.read_int(OFF_DS_COUNT).unwrap(), 1);
    assert_eq!(backend.read_string(OFF_DS_NAME, 20).unwrap(), "cpu_user");
    assert_eq!(backend.read_long(OFF_DS_HEARTBEAT).unwrap(), 600);
    assert_eq!(backend.read_double(OFF_DS_MIN).unwrap(), 0.0);
    assert!(backend.read_double(OFF_DS_MAX).unwrap().is_nan());
    assert_eq!(backend.read_double(OFF_ARC_XFF).unwrap(), 0.5);
    assert_eq!(backend.read_int(OFF_ARC_ROWS).unwrap(), ROW_COUNT as i32);

    let rows = backend.read_double_array(OFF_ROW_DATA, ROW_COUNT).unwrap();
    assert_eq!(&rows[..3], &[1.0, 2.0, 3.0]);
    assert!(rows[3..].iter().all(|v| v.is_nan()));
}

#[test]
fn factory_dispatch_and_resolution() {
    let dir = tempdir().unwrap();
    let factories: Vec<Box<dyn BackendFactory>> =
        vec![Box::new(FileBackendFactory::default())];

    let raw = dir.path().join("sub/../metrics.rrd");
    let factory = find_factory(&factories, &Location::from_path(&raw)).unwrap();

    let resolved = factory.resolve_uri(raw.to_str().unwrap()).unwrap();
    assert_eq!(resolved.scheme(), "file");
    assert_eq!(resolved.path(), dir.path().join("metrics.rrd"));
    assert!(resolved.path().is_absolute());
    assert!(!factory.exists(&resolved));
    assert!(factory.should_validate_header(&resolved));

    assert!(
        find_factory(&factories, &Location::parse("sql://metrics/cpu")).is_err(),
        "unserved schemes must not fall back to the file factory"
    );
}

#[test]
fn mismatched_byte_order_reads_garbage_bytes_consistently() {
    // Bit-exact compatibility requires matching the order the file was
    // written with; a mismatched open sees byte-swapped values.
    let dir = tempdir().unwrap();
    let path = dir.path().join("order.rrd");

    {
        let big = FileBackendFactory::new(Endianness::Big);
        let mut backend = big.create(&Location::from_path(&path), 64).unwrap();
        backend.write_int(0, 0x0000_0001).unwrap();
        backend.close().unwrap();
    }

    let little = FileBackendFactory::new(Endianness::Little);
    let backend = little.open(&Location::from_path(&path)).unwrap();
    assert_eq!(backend.read_int(0).unwrap(), 0x0100_0000);
}

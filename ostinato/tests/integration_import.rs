//! Integration tests for the legacy rrdtool-format importer.
//!
//! A fixture stands in for the external legacy parser so the adapter's
//! field mapping, token normalization, and release semantics can be
//! exercised against known values.

use std::cell::Cell;
use std::rc::Rc;

use ostinato::error::ImportError;
use ostinato::import::{LegacyDatabase, LegacyResult};
use ostinato::{ConsolFun, DsType, OstinatoError, RrdToolImporter};

/// In-memory stand-in for a parsed legacy database.
struct FixtureRrd {
    version: String,
    last_update: i64,
    step: u64,
    ds: Vec<FixtureDs>,
    arcs: Vec<FixtureArc>,
    close_count: Rc<Cell<u32>>,
}

struct FixtureDs {
    name: String,
    type_token: String,
    heartbeat: u64,
    min: f64,
    max: f64,
    last_reading: String,
    pdp_value: f64,
    unknown_seconds: u64,
}

struct FixtureArc {
    type_token: String,
    xff: f64,
    pdp_per_row: u32,
    rows: u32,
    // One (cdp value, cdp unknown datapoints, row history) per DS.
    state: Vec<(f64, u32, Vec<f64>)>,
}

impl FixtureRrd {
    fn ds(&self, ds: usize) -> LegacyResult<&FixtureDs> {
        self.ds.get(ds).ok_or(ImportError::IndexOutOfRange {
            kind: "data source",
            index: ds,
            count: self.ds.len(),
        })
    }

    fn arc(&self, arc: usize) -> LegacyResult<&FixtureArc> {
        self.arcs.get(arc).ok_or(ImportError::IndexOutOfRange {
            kind: "archive",
            index: arc,
            count: self.arcs.len(),
        })
    }
}

impl LegacyDatabase for FixtureRrd {
    fn version(&self) -> LegacyResult<String> {
        Ok(self.version.clone())
    }

    fn last_update(&self) -> LegacyResult<i64> {
        Ok(self.last_update)
    }

    fn pdp_step(&self) -> LegacyResult<u64> {
        Ok(self.step)
    }

    fn ds_count(&self) -> LegacyResult<usize> {
        Ok(self.ds.len())
    }

    fn archive_count(&self) -> LegacyResult<usize> {
        Ok(self.arcs.len())
    }

    fn ds_name(&self, ds: usize) -> LegacyResult<String> {
        Ok(self.ds(ds)?.name.clone())
    }

    fn ds_type_token(&self, ds: usize) -> LegacyResult<String> {
        Ok(self.ds(ds)?.type_token.clone())
    }

    fn minimum_heartbeat(&self, ds: usize) -> LegacyResult<u64> {
        Ok(self.ds(ds)?.heartbeat)
    }

    fn minimum(&self, ds: usize) -> LegacyResult<f64> {
        Ok(self.ds(ds)?.min)
    }

    fn maximum(&self, ds: usize) -> LegacyResult<f64> {
        Ok(self.ds(ds)?.max)
    }

    fn last_reading(&self, ds: usize) -> LegacyResult<String> {
        Ok(self.ds(ds)?.last_reading.clone())
    }

    fn pdp_value(&self, ds: usize) -> LegacyResult<f64> {
        Ok(self.ds(ds)?.pdp_value)
    }

    fn pdp_unknown_seconds(&self, ds: usize) -> LegacyResult<u64> {
        Ok(self.ds(ds)?.unknown_seconds)
    }

    fn archive_type_token(&self, arc: usize) -> LegacyResult<String> {
        Ok(self.arc(arc)?.type_token.clone())
    }

    fn xff(&self, arc: usize) -> LegacyResult<f64> {
        Ok(self.arc(arc)?.xff)
    }

    fn pdp_per_row(&self, arc: usize) -> LegacyResult<u32> {
        Ok(self.arc(arc)?.pdp_per_row)
    }

    fn row_count(&self, arc: usize) -> LegacyResult<u32> {
        Ok(self.arc(arc)?.rows)
    }

    fn cdp_value(&self, arc: usize, ds: usize) -> LegacyResult<f64> {
        Ok(self.arc(arc)?.state[ds].0)
    }

    fn cdp_unknown_datapoints(&self, arc: usize, ds: usize) -> LegacyResult<u32> {
        Ok(self.arc(arc)?.state[ds].1)
    }

    fn row_values(&self, arc: usize, ds: usize) -> LegacyResult<Vec<f64>> {
        Ok(self.arc(arc)?.state[ds].2.clone())
    }

    fn close(&mut self) -> LegacyResult<()> {
        self.close_count.set(self.close_count.get() + 1);
        Ok(())
    }
}

/// Fixture matching the reference database: version "0003", step 300,
/// two data sources, one AVERAGE archive with xff 0.5 and 10 rows.
fn fixture(close_count: Rc<Cell<u32>>) -> FixtureRrd {
    let history_a: Vec<f64> = (0..10).map(f64::from).collect();
    let mut history_b = vec![f64::NAN; 10];
    history_b[9] = 42.5;

    FixtureRrd {
        version: "0003".to_string(),
        last_update: 1_666_000_000,
        step: 300,
        ds: vec![
            FixtureDs {
                name: "cpu_user".to_string(),
                type_token: "GAUGE".to_string(),
                heartbeat: 600,
                min: 0.0,
                max: f64::NAN,
                last_reading: "85.5".to_string(),
                pdp_value: 12.25,
                unknown_seconds: 30,
            },
            FixtureDs {
                name: "if_octets".to_string(),
                type_token: "counter".to_string(), // legacy files vary in case
                heartbeat: 900,
                min: f64::NAN,
                max: 1.0e9,
                last_reading: "U".to_string(),
                pdp_value: 0.0,
                unknown_seconds: 0,
            },
        ],
        arcs: vec![FixtureArc {
            type_token: "AVERAGE".to_string(),
            xff: 0.5,
            pdp_per_row: 6,
            rows: 10,
            state: vec![(3.5, 2, history_a), (f64::NAN, 0, history_b)],
        }],
        close_count,
    }
}

fn importer() -> (RrdToolImporter, Rc<Cell<u32>>) {
    let close_count = Rc::new(Cell::new(0));
    let imp = RrdToolImporter::new(Box::new(fixture(close_count.clone())));
    (imp, close_count)
}

#[test]
fn header_field_mapping() {
    let (imp, _) = importer();

    assert_eq!(imp.version().unwrap(), "0003");
    assert_eq!(imp.last_update_time().unwrap(), 1_666_000_000);
    assert_eq!(imp.step().unwrap(), 300);
    assert_eq!(imp.ds_count().unwrap(), 2);
    assert_eq!(imp.arc_count().unwrap(), 1);
}

#[test]
fn data_source_field_mapping() {
    let (imp, _) = importer();

    assert_eq!(imp.ds_name(0).unwrap(), "cpu_user");
    assert_eq!(imp.ds_type(0).unwrap(), DsType::Gauge);
    assert_eq!(imp.heartbeat(0).unwrap(), 600);
    assert_eq!(imp.min_value(0).unwrap(), 0.0);
    assert!(imp.max_value(0).unwrap().is_nan());
    assert_eq!(imp.last_value(0).unwrap(), 85.5);
    assert_eq!(imp.accum_value(0).unwrap(), 12.25);
    assert_eq!(imp.nan_seconds(0).unwrap(), 30);

    // Second source: lower-case legacy type token, unknown last reading.
    assert_eq!(imp.ds_type(1).unwrap(), DsType::Counter);
    assert!(imp.last_value(1).unwrap().is_nan());
}

#[test]
fn archive_and_state_field_mapping() {
    let (imp, _) = importer();

    assert_eq!(imp.consol_fun(0).unwrap(), ConsolFun::Average);
    assert_eq!(imp.xff(0).unwrap(), 0.5);
    assert_eq!(imp.steps(0).unwrap(), 6);
    assert_eq!(imp.rows(0).unwrap(), 10);

    assert_eq!(imp.state_accum_value(0, 0).unwrap(), 3.5);
    assert_eq!(imp.state_nan_steps(0, 0).unwrap(), 2);
    assert!(imp.state_accum_value(0, 1).unwrap().is_nan());

    let values = imp.values(0, 0).unwrap();
    assert_eq!(values.len(), 10);
    assert_eq!(values[0], 0.0);
    assert_eq!(values[9], 9.0);

    let sparse = imp.values(0, 1).unwrap();
    assert!(sparse[..9].iter().all(|v| v.is_nan()));
    assert_eq!(sparse[9], 42.5);
}

#[test]
fn unrecognized_consolidation_token_is_a_format_error() {
    let close_count = Rc::new(Cell::new(0));
    let mut db = fixture(close_count);
    db.arcs[0].type_token = "HWPREDICT".to_string();
    let imp = RrdToolImporter::new(Box::new(db));

    let err = imp.consol_fun(0).unwrap_err();
    assert!(matches!(
        err,
        OstinatoError::Import(ImportError::UnknownConsolFun { token }) if token == "HWPREDICT"
    ));
}

#[test]
fn malformed_last_reading_is_a_format_error() {
    let close_count = Rc::new(Cell::new(0));
    let mut db = fixture(close_count);
    db.ds[0].last_reading = "12,5".to_string();
    let imp = RrdToolImporter::new(Box::new(db));

    let err = imp.last_value(0).unwrap_err();
    assert!(matches!(
        err,
        OstinatoError::Import(ImportError::MalformedNumber { .. })
    ));
}

#[test]
fn out_of_range_indices_fail() {
    let (imp, _) = importer();

    assert!(imp.ds_name(2).is_err());
    assert!(imp.consol_fun(1).is_err());
}

#[test]
fn release_is_idempotent_and_latches() {
    let (mut imp, close_count) = importer();
    assert!(!imp.is_released());

    imp.release().unwrap();
    assert!(imp.is_released());
    assert_eq!(close_count.get(), 1);

    // Second release is a no-op: no second close of the resource.
    imp.release().unwrap();
    assert_eq!(close_count.get(), 1);

    // Every accessor fails fast afterwards.
    let err = imp.version().unwrap_err();
    assert!(matches!(
        err,
        OstinatoError::Import(ImportError::Released)
    ));
    assert!(imp.values(0, 0).is_err());
    assert!(imp.consol_fun(0).is_err());
}

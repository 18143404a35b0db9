//! # ostinato
//!
//! Persistence substrate for round-robin time-series databases.
//!
//! ostinato provides the byte-exact storage layer under an rrdtool-style
//! round-robin database: a typed, offset-addressed backend over a
//! fixed-layout binary file, factories that resolve storage locations to
//! backends, and an importer that re-projects legacy rrdtool-format
//! databases onto the same canonical record model for migration.
//! Consolidation scheduling, querying, and rendering live above this
//! crate and consume its typed read/write contract.
//!
//! ## Key Properties
//!
//! - 32-bit-safe addressing: every offset is validated against
//!   `i32::MAX` before any buffer access
//! - Byte order fixed per backend instance, applied uniformly to all
//!   multi-byte primitives
//! - Fixed-width, space-padded string fields of explicit character width
//! - Bulk double-array transfer as one contiguous block
//! - Fail-fast errors, no internal retry, no silent defaults
//!
//! ## Quick Start
//!
//! ```rust
//! use ostinato::{Endianness, MemoryBackend, StorageBackend};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut backend = MemoryBackend::with_len(4096, Endianness::Big);
//!
//! // Serialize a header the way the canonical layout lays it out.
//! backend.write_string(0, "0003", 5)?;   // format version
//! backend.write_long(10, 300)?;          // step in seconds
//! backend.write_int(18, 2)?;             // data-source count
//!
//! // Blank a fresh row region with NaN sentinels, then read it back.
//! backend.write_double_fill(64, f64::NAN, 10)?;
//! let rows = backend.read_double_array(64, 10)?;
//! assert!(rows.iter().all(|v| v.is_nan()));
//!
//! assert!(backend.is_dirty());
//! backend.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`backend`] — typed storage contract and byte-order configuration
//! - [`buffer`] — buffer-backed backend over any owned byte region
//! - [`file`] — memory-mapped file backend
//! - [`factory`] — location resolution and backend provisioning
//! - [`model`] — canonical consolidation-function and data-source types
//! - [`import`] — legacy rrdtool-format importer
//! - [`error`] — error types

pub mod backend;
pub mod buffer;
pub mod error;
pub mod factory;
pub mod file;
pub mod import;
pub mod model;

// Re-export primary API types at crate root for convenience.
pub use backend::{Endianness, MAX_OFFSET, StorageBackend};
pub use buffer::{BufferBackend, MemoryBackend};
pub use error::{OstinatoError, Result};
pub use factory::{BackendFactory, FileBackendFactory, Location, find_factory};
pub use file::FileBackend;
pub use import::{LegacyDatabase, LegacyResult, RrdToolImporter};
pub use model::{ConsolFun, DsType};

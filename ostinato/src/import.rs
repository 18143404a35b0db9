//! Legacy rrdtool-format importer.
//!
//! [`RrdToolImporter`] adapts an externally parsed legacy database onto
//! the canonical accessor surface a generic import pipeline consumes:
//! header fields, per-data-source fields, per-archive fields,
//! per-archive-per-data-source consolidation state, and raw row values.
//!
//! The importer is an adapter, not a parser. It never reinterprets field
//! semantics (no recomputed x-files-factors, no consolidation
//! arithmetic); it re-projects the legacy parser's names and shapes onto
//! the canonical model so the pipeline is isolated from any change to
//! the parser's own API. The parser itself is consumed only through the
//! narrow [`LegacyDatabase`] capability trait.
//!
//! Not reentrant: one importer wraps one legacy resource handle, and
//! concurrent use from multiple threads without external synchronization
//! is unsupported.

use std::str::FromStr;

use tracing::debug;

use crate::error::{ImportError, Result};
use crate::model::{ConsolFun, DsType};

/// Result type for [`LegacyDatabase`] implementations.
pub type LegacyResult<T> = std::result::Result<T, ImportError>;

/// Black-box surface of an external legacy rrdtool-format parser.
///
/// The method set mirrors what such parsers expose — header, data-source
/// definitions with their PDP status blocks, archive definitions with
/// their CDP status blocks, and row histories — using the legacy
/// format's own vocabulary. Nothing else about the parser (its buffer
/// layout, units, field names) may leak past this trait.
pub trait LegacyDatabase {
    /// Format version string from the legacy header, e.g. `"0003"`.
    fn version(&self) -> LegacyResult<String>;

    /// Last update time as seconds since the Unix epoch.
    fn last_update(&self) -> LegacyResult<i64>;

    /// Primary-data-point step of the database, in seconds.
    fn pdp_step(&self) -> LegacyResult<u64>;

    /// Number of data sources.
    fn ds_count(&self) -> LegacyResult<usize>;

    /// Number of archives.
    fn archive_count(&self) -> LegacyResult<usize>;

    /// Name of the data source at `ds`.
    fn ds_name(&self, ds: usize) -> LegacyResult<String>;

    /// The legacy type token of the data source at `ds`.
    fn ds_type_token(&self, ds: usize) -> LegacyResult<String>;

    /// Minimum heartbeat of the data source, in seconds.
    fn minimum_heartbeat(&self, ds: usize) -> LegacyResult<u64>;

    /// Declared minimum value; NaN means unbounded.
    fn minimum(&self, ds: usize) -> LegacyResult<f64>;

    /// Declared maximum value; NaN means unbounded.
    fn maximum(&self, ds: usize) -> LegacyResult<f64>;

    /// Last reading from the data source's PDP status block, in the
    /// legacy text encoding.
    fn last_reading(&self, ds: usize) -> LegacyResult<String>;

    /// Accumulator value from the PDP status block.
    fn pdp_value(&self, ds: usize) -> LegacyResult<f64>;

    /// Consecutive unknown seconds from the PDP status block.
    fn pdp_unknown_seconds(&self, ds: usize) -> LegacyResult<u64>;

    /// The legacy consolidation-function token of the archive at `arc`.
    fn archive_type_token(&self, arc: usize) -> LegacyResult<String>;

    /// X-files-factor of the archive, in `[0, 1)`.
    fn xff(&self, arc: usize) -> LegacyResult<f64>;

    /// Primary data points consolidated per row of the archive.
    fn pdp_per_row(&self, arc: usize) -> LegacyResult<u32>;

    /// Row count of the archive.
    fn row_count(&self, arc: usize) -> LegacyResult<u32>;

    /// Accumulated value of the CDP status block for archive `arc`,
    /// data source `ds`.
    fn cdp_value(&self, arc: usize, ds: usize) -> LegacyResult<f64>;

    /// Unknown primary data points since the last consolidation for
    /// archive `arc`, data source `ds`.
    fn cdp_unknown_datapoints(&self, arc: usize, ds: usize) -> LegacyResult<u32>;

    /// The full row history of data source `ds` within archive `arc`,
    /// oldest row first, `row_count` entries.
    fn row_values(&self, arc: usize, ds: usize) -> LegacyResult<Vec<f64>>;

    /// Closes the underlying legacy resource.
    fn close(&mut self) -> LegacyResult<()>;
}

/// Parses a legacy numeric-as-string field.
///
/// The rrdtool unknown markers `U`, `UNKN`, and `NaN` (any case) map to
/// NaN; any other non-numeric text is a format error, never a silent
/// NaN.
fn parse_legacy_double(text: &str) -> LegacyResult<f64> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("U")
        || trimmed.eq_ignore_ascii_case("UNKN")
        || trimmed.eq_ignore_ascii_case("NAN")
    {
        return Ok(f64::NAN);
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| ImportError::MalformedNumber {
            value: text.to_string(),
        })
}

/// Adapter exposing a legacy rrdtool database through the canonical
/// accessor surface.
///
/// Construction takes ownership of an already-opened legacy resource;
/// [`release`](Self::release) closes it. Release is idempotent and
/// latches the internal handle, so any accessor called afterwards fails
/// fast with [`ImportError::Released`].
pub struct RrdToolImporter {
    db: Option<Box<dyn LegacyDatabase>>,
}

impl RrdToolImporter {
    /// Wraps an opened legacy database.
    pub fn new(db: Box<dyn LegacyDatabase>) -> Self {
        Self { db: Some(db) }
    }

    fn db(&self) -> LegacyResult<&dyn LegacyDatabase> {
        self.db.as_deref().ok_or(ImportError::Released)
    }

    /// Format version string of the legacy database.
    ///
    /// # Errors
    ///
    /// Fails with [`ImportError::Released`] after release, or any
    /// `Io`/format error from the legacy parser.
    pub fn version(&self) -> Result<String> {
        Ok(self.db()?.version()?)
    }

    /// Last update time as seconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn last_update_time(&self) -> Result<i64> {
        Ok(self.db()?.last_update()?)
    }

    /// Step interval in seconds.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn step(&self) -> Result<u64> {
        Ok(self.db()?.pdp_step()?)
    }

    /// Number of data sources.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn ds_count(&self) -> Result<usize> {
        Ok(self.db()?.ds_count()?)
    }

    /// Number of archives.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn arc_count(&self) -> Result<usize> {
        Ok(self.db()?.archive_count()?)
    }

    /// Name of data source `ds`.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn ds_name(&self, ds: usize) -> Result<String> {
        Ok(self.db()?.ds_name(ds)?)
    }

    /// Canonical type of data source `ds`, mapped exhaustively from the
    /// legacy token.
    ///
    /// # Errors
    ///
    /// Fails with [`ImportError::UnknownDsType`] for a token outside the
    /// canonical set; see also [`version`](Self::version).
    pub fn ds_type(&self, ds: usize) -> Result<DsType> {
        let token = self.db()?.ds_type_token(ds)?;
        Ok(DsType::from_str(&token)?)
    }

    /// Minimum heartbeat of data source `ds`, in seconds.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn heartbeat(&self, ds: usize) -> Result<u64> {
        Ok(self.db()?.minimum_heartbeat(ds)?)
    }

    /// Declared minimum value of data source `ds`; NaN means unbounded.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn min_value(&self, ds: usize) -> Result<f64> {
        Ok(self.db()?.minimum(ds)?)
    }

    /// Declared maximum value of data source `ds`; NaN means unbounded.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn max_value(&self, ds: usize) -> Result<f64> {
        Ok(self.db()?.maximum(ds)?)
    }

    /// Last reading of data source `ds` as a number.
    ///
    /// The legacy status block stores the reading as text whose meaning
    /// depends on the source type (a formatted rate for gauges, a raw
    /// counter snapshot for the counter family); either way it is parsed
    /// here, with the unknown markers mapping to NaN.
    ///
    /// # Errors
    ///
    /// Fails with [`ImportError::MalformedNumber`] for non-numeric text
    /// other than the unknown markers; see also
    /// [`version`](Self::version).
    pub fn last_value(&self, ds: usize) -> Result<f64> {
        let reading = self.db()?.last_reading(ds)?;
        Ok(parse_legacy_double(&reading)?)
    }

    /// Accumulator value of data source `ds`.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn accum_value(&self, ds: usize) -> Result<f64> {
        Ok(self.db()?.pdp_value(ds)?)
    }

    /// Consecutive unknown seconds of data source `ds`.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn nan_seconds(&self, ds: usize) -> Result<u64> {
        Ok(self.db()?.pdp_unknown_seconds(ds)?)
    }

    /// Canonical consolidation function of archive `arc`.
    ///
    /// The legacy token is normalized (case, surrounding whitespace) and
    /// mapped exhaustively; an unrecognized token is an error, never a
    /// default member of the set.
    ///
    /// # Errors
    ///
    /// Fails with [`ImportError::UnknownConsolFun`] for a token outside
    /// the canonical set; see also [`version`](Self::version).
    pub fn consol_fun(&self, arc: usize) -> Result<ConsolFun> {
        let token = self.db()?.archive_type_token(arc)?;
        Ok(ConsolFun::from_str(&token)?)
    }

    /// X-files-factor of archive `arc`.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn xff(&self, arc: usize) -> Result<f64> {
        Ok(self.db()?.xff(arc)?)
    }

    /// Steps (primary data points) per row of archive `arc`.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn steps(&self, arc: usize) -> Result<u32> {
        Ok(self.db()?.pdp_per_row(arc)?)
    }

    /// Row count of archive `arc`.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn rows(&self, arc: usize) -> Result<u32> {
        Ok(self.db()?.row_count(arc)?)
    }

    /// Accumulated consolidation value for archive `arc`, data source
    /// `ds`.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn state_accum_value(&self, arc: usize, ds: usize) -> Result<f64> {
        Ok(self.db()?.cdp_value(arc, ds)?)
    }

    /// Unknown primary data points since the last consolidation for
    /// archive `arc`, data source `ds`.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn state_nan_steps(&self, arc: usize, ds: usize) -> Result<u32> {
        Ok(self.db()?.cdp_unknown_datapoints(arc, ds)?)
    }

    /// Full row history of data source `ds` within archive `arc`.
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn values(&self, arc: usize, ds: usize) -> Result<Vec<f64>> {
        Ok(self.db()?.row_values(arc, ds)?)
    }

    /// Returns `true` once the legacy resource has been released.
    pub fn is_released(&self) -> bool {
        self.db.is_none()
    }

    /// Closes the underlying legacy resource.
    ///
    /// Idempotent: the first call closes and latches the handle, any
    /// later call is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates a close failure from the legacy parser; the handle is
    /// latched regardless, so the resource is never closed twice.
    pub fn release(&mut self) -> Result<()> {
        if let Some(mut db) = self.db.take() {
            db.close()?;
            debug!("released legacy database");
        }
        Ok(())
    }
}

impl std::fmt::Debug for RrdToolImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RrdToolImporter")
            .field("released", &self.is_released())
            .finish()
    }
}

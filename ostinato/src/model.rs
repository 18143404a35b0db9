//! Canonical vocabularies of the record model.
//!
//! These enums define the closed sets the rest of the system speaks:
//! the consolidation functions an archive may use and the data-source
//! types that determine how samples are interpreted. Token parsing is
//! exhaustive; a token outside the set is an error, never a default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// Consolidation function applied when primary data points are
/// aggregated into an archive row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsolFun {
    /// Arithmetic mean of the known primary data points.
    Average,
    /// Smallest known primary data point.
    Min,
    /// Largest known primary data point.
    Max,
    /// Most recent known primary data point.
    Last,
    /// Oldest known primary data point.
    First,
    /// Sum of the known primary data points.
    Total,
}

impl ConsolFun {
    /// Canonical upper-case token for this function.
    pub fn token(self) -> &'static str {
        match self {
            Self::Average => "AVERAGE",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Last => "LAST",
            Self::First => "FIRST",
            Self::Total => "TOTAL",
        }
    }
}

impl fmt::Display for ConsolFun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ConsolFun {
    type Err = ImportError;

    /// Parses a consolidation token, normalizing case and surrounding
    /// whitespace. Legacy files vary in both.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AVERAGE" => Ok(Self::Average),
            "MIN" => Ok(Self::Min),
            "MAX" => Ok(Self::Max),
            "LAST" => Ok(Self::Last),
            "FIRST" => Ok(Self::First),
            "TOTAL" => Ok(Self::Total),
            _ => Err(ImportError::UnknownConsolFun {
                token: s.to_string(),
            }),
        }
    }
}

/// Data-source type, determining how raw readings become primary data
/// points and how a legacy source's last reading is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DsType {
    /// The reading is stored as-is.
    Gauge,
    /// Rate of change of an ever-increasing counter, with wrap handling.
    Counter,
    /// Rate of change without wrap handling.
    Derive,
    /// Counter reset on every read; the reading is the delta itself.
    Absolute,
}

impl DsType {
    /// Canonical upper-case token for this type.
    pub fn token(self) -> &'static str {
        match self {
            Self::Gauge => "GAUGE",
            Self::Counter => "COUNTER",
            Self::Derive => "DERIVE",
            Self::Absolute => "ABSOLUTE",
        }
    }
}

impl fmt::Display for DsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for DsType {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GAUGE" => Ok(Self::Gauge),
            "COUNTER" => Ok(Self::Counter),
            "DERIVE" => Ok(Self::Derive),
            "ABSOLUTE" => Ok(Self::Absolute),
            _ => Err(ImportError::UnknownDsType {
                token: s.to_string(),
            }),
        }
    }
}

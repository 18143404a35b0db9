//! Error types for the ostinato persistence core.

use thiserror::Error;

/// The main error type for all ostinato operations.
///
/// This enum covers all error conditions raised by the typed storage
/// backend, the backend factories, and the legacy-format importer. All
/// errors surface synchronously to the immediate caller; no operation
/// retries internally or recovers silently.
#[derive(Error, Debug)]
pub enum OstinatoError {
    /// Error from a typed storage backend operation.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Error resolving a storage location to a backend.
    #[error("factory error: {0}")]
    Factory(#[from] FactoryError),

    /// Error from the legacy-format importer.
    #[error("import error: {0}")]
    Import(#[from] ImportError),
}

/// Errors raised by typed storage backend operations.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The offset is outside the 32-bit-safe addressing range.
    ///
    /// Offsets must satisfy `offset <= i32::MAX`. A violation is a caller
    /// bug or corrupted metadata and is rejected before any buffer access.
    #[error("invalid address: offset {offset} exceeds the 32-bit addressing limit")]
    InvalidAddress {
        /// The rejected byte offset.
        offset: u64,
    },

    /// An access would extend past the end of the bound buffer.
    #[error("access beyond buffer bounds: offset {offset} + length {length} > buffer size {size}")]
    OutOfBounds {
        /// The requested byte offset.
        offset: u64,
        /// The requested access length in bytes.
        length: u64,
        /// The actual buffer size in bytes.
        size: u64,
    },

    /// A string value does not fit its fixed-width field.
    #[error("string of {units} UTF-16 units does not fit field width {width}")]
    StringTooWide {
        /// The field width in character units.
        width: usize,
        /// The encoded length of the rejected value.
        units: usize,
    },

    /// A fixed-width string field holds invalid UTF-16 data.
    #[error("invalid UTF-16 string data at offset {offset}")]
    StringDecode {
        /// The byte offset of the unreadable field.
        offset: u64,
    },

    /// The backend was used after `close()`.
    #[error("backend used after close")]
    Closed,

    /// Underlying file access failed.
    #[error("backend I/O failed for '{path}': {source}")]
    Io {
        /// The backing file path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while resolving a storage location.
#[derive(Error, Debug)]
pub enum FactoryError {
    /// No registered factory can store the given location.
    #[error("no factory can store '{uri}'")]
    NoMatchingFactory {
        /// The unserviceable location.
        uri: String,
    },

    /// A path could not be resolved to an absolute location.
    #[error("failed to resolve path '{path}': {source}")]
    Resolve {
        /// The path that failed to resolve.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the legacy-format importer.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The importer was used after `release()`.
    #[error("importer used after release")]
    Released,

    /// The underlying legacy resource could not be read.
    #[error("legacy database read failed: {reason}")]
    Io {
        /// Description of the failed access.
        reason: String,
    },

    /// A legacy consolidation-function token is not in the canonical set.
    #[error("unrecognized consolidation function token '{token}'")]
    UnknownConsolFun {
        /// The unrecognized legacy token.
        token: String,
    },

    /// A legacy data-source type token is not in the canonical set.
    #[error("unrecognized data-source type token '{token}'")]
    UnknownDsType {
        /// The unrecognized legacy token.
        token: String,
    },

    /// A legacy numeric-as-string field could not be parsed.
    #[error("malformed numeric field '{value}'")]
    MalformedNumber {
        /// The unparseable text.
        value: String,
    },

    /// A data-source or archive index is out of range for the database.
    #[error("{kind} index {index} out of range (count {count})")]
    IndexOutOfRange {
        /// What was being indexed ("data source" or "archive").
        kind: &'static str,
        /// The requested index.
        index: usize,
        /// The number of entries actually present.
        count: usize,
    },
}

/// Type alias for `Result<T, OstinatoError>`.
pub type Result<T> = std::result::Result<T, OstinatoError>;

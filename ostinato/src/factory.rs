//! Backend factories and storage location resolution.
//!
//! A [`BackendFactory`] turns a logical storage location into a concrete
//! [`StorageBackend`](crate::backend::StorageBackend) and answers the
//! shared policy questions around it: does the location already exist,
//! and must its header be validated before use. Each factory serves
//! exactly one location scheme; when several factories coexist, dispatch
//! is by first [`can_store`](BackendFactory::can_store) match.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::backend::Endianness;
use crate::error::{FactoryError, Result};
use crate::file::FileBackend;

/// The scheme served by [`FileBackendFactory`].
pub const FILE_SCHEME: &str = "file";

/// A parsed storage location: a scheme plus a scheme-specific path.
///
/// Locations without an explicit `scheme://` prefix default to the
/// `file` scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    scheme: String,
    path: PathBuf,
}

impl Location {
    /// Parses a location string such as `file:///var/db/cpu.rrd` or a
    /// bare path.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once("://") {
            Some((scheme, rest)) if !scheme.is_empty() => Self {
                scheme: scheme.to_ascii_lowercase(),
                path: PathBuf::from(rest),
            },
            _ => Self {
                scheme: FILE_SCHEME.to_string(),
                path: PathBuf::from(spec),
            },
        }
    }

    /// Builds a `file` scheme location from a filesystem path.
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            scheme: FILE_SCHEME.to_string(),
            path: path.into(),
        }
    }

    /// Returns the location scheme, lower-cased.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the scheme-specific path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path.display())
    }
}

/// Resolution and policy contract shared by all backend factories.
///
/// The contract is deliberately minimal: buffer provisioning (opening,
/// mapping, sizing) belongs to the concrete factory type, not the trait.
pub trait BackendFactory: fmt::Debug {
    /// Returns `true` if a database already exists at the location.
    fn exists(&self, location: &Location) -> bool;

    /// Returns `true` if the stored header must be validated before the
    /// backend is used.
    ///
    /// Defaults to `true`; specialized factories may skip validation,
    /// for example for files they just created themselves.
    fn should_validate_header(&self, _location: &Location) -> bool {
        true
    }

    /// Returns `true` if this factory serves the location's scheme.
    fn can_store(&self, location: &Location) -> bool;

    /// Normalizes a raw path into an absolute, canonical location in
    /// this factory's scheme.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::Resolve`] if the path cannot be made
    /// absolute.
    fn resolve_uri(&self, path: &str) -> Result<Location>;
}

/// Picks the first factory that can store the given location.
///
/// # Errors
///
/// Returns [`FactoryError::NoMatchingFactory`] if no factory matches.
pub fn find_factory<'a>(
    factories: &'a [Box<dyn BackendFactory>],
    location: &Location,
) -> Result<&'a dyn BackendFactory> {
    factories
        .iter()
        .find(|f| f.can_store(location))
        .map(|f| f.as_ref())
        .ok_or_else(|| {
            FactoryError::NoMatchingFactory {
                uri: location.to_string(),
            }
            .into()
        })
}

/// Factory storing round-robin databases as ordinary files on disk.
#[derive(Debug, Clone)]
pub struct FileBackendFactory {
    /// Byte order bound to every backend this factory produces.
    order: Endianness,
}

impl Default for FileBackendFactory {
    /// Big-endian, the order of the reference file format.
    fn default() -> Self {
        Self::new(Endianness::Big)
    }
}

impl FileBackendFactory {
    /// Creates a factory producing backends with the given byte order.
    pub fn new(order: Endianness) -> Self {
        Self { order }
    }

    /// Maps an existing database file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or mapped.
    pub fn open(&self, location: &Location) -> Result<FileBackend> {
        debug!(%location, "opening file backend");
        FileBackend::open(location.path(), self.order)
    }

    /// Creates and maps a new database file of `size` bytes.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created, sized, or mapped.
    pub fn create(&self, location: &Location, size: u64) -> Result<FileBackend> {
        debug!(%location, size, "creating file backend");
        FileBackend::create(location.path(), size, self.order)
    }
}

impl BackendFactory for FileBackendFactory {
    fn exists(&self, location: &Location) -> bool {
        location.path().is_file()
    }

    fn can_store(&self, location: &Location) -> bool {
        location.scheme() == FILE_SCHEME
    }

    fn resolve_uri(&self, path: &str) -> Result<Location> {
        let absolute = std::path::absolute(path).map_err(|e| FactoryError::Resolve {
            path: path.to_string(),
            source: e,
        })?;
        Ok(Location::from_path(normalize(&absolute)))
    }
}

/// Lexically folds `.` and `..` components out of an absolute path.
///
/// Purely textual, like `Path.normalize()` in the reference tooling: it
/// never touches the filesystem, so symlinks are not resolved.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

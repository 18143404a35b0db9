//! Memory-mapped file backend.
//!
//! [`FileBackend`] binds a [`BufferBackend`] to a memory-mapped file so
//! the typed operations read and write the on-disk round-robin layout
//! directly. Creation pre-allocates the file to its exact size; the map
//! is flushed on `sync()` and on `close()`.
//!
//! # Thread Safety
//!
//! Single-writer per instance, enforced by `&mut self` on every write.
//! Cross-process coordination (file locking) is the caller's concern.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use tracing::debug;

use crate::backend::{Endianness, StorageBackend};
use crate::buffer::BufferBackend;
use crate::error::{BackendError, Result};

/// A [`StorageBackend`] over a memory-mapped file.
#[derive(Debug)]
pub struct FileBackend {
    /// Bounds-checked typed access over the mapping.
    buffer: BufferBackend<MmapMut>,
    /// Path of the backing file, kept for error reporting.
    path: PathBuf,
}

impl FileBackend {
    /// Creates a new file of exactly `size` zero bytes and maps it.
    ///
    /// An existing file at `path` is truncated.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Io`] if the file cannot be created,
    /// sized, or mapped.
    pub fn create<P: AsRef<Path>>(path: P, size: u64, order: Endianness) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| io_error(&path, e))?;
        file.set_len(size).map_err(|e| io_error(&path, e))?;

        // SAFETY: the file was just created with the requested length and
        // we hold its descriptor for the lifetime of the mapping.
        let mmap = unsafe { MmapMut::map_mut(&file).map_err(|e| io_error(&path, e))? };

        debug!(path = %path.display(), size, "created file backend");
        Ok(Self {
            buffer: BufferBackend::new(mmap, order),
            path,
        })
    }

    /// Maps an existing file for read/write access.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Io`] if the file cannot be opened or
    /// mapped.
    pub fn open<P: AsRef<Path>>(path: P, order: Endianness) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| io_error(&path, e))?;

        // SAFETY: the file was successfully opened read/write and the
        // descriptor outlives the mapping call.
        let mmap = unsafe { MmapMut::map_mut(&file).map_err(|e| io_error(&path, e))? };

        debug!(path = %path.display(), size = mmap.len(), "opened file backend");
        Ok(Self {
            buffer: BufferBackend::new(mmap, order),
            path,
        })
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the mapped size in bytes, or 0 after close.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if the mapping is empty or the backend is closed.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Flushes the mapping to disk.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Closed`] after close, or
    /// [`BackendError::Io`] if the flush fails.
    pub fn sync(&self) -> Result<()> {
        let mmap = self.buffer.region().ok_or(BackendError::Closed)?;
        mmap.flush().map_err(|e| io_error(&self.path, e))?;
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> BackendError {
    BackendError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl StorageBackend for FileBackend {
    fn write_bytes(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.buffer.write_bytes(offset, bytes)
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.buffer.read_into(offset, buf)
    }

    fn byte_order(&self) -> Endianness {
        self.buffer.byte_order()
    }

    fn is_dirty(&self) -> bool {
        self.buffer.is_dirty()
    }

    /// Flushes the mapping, then releases it. Idempotent.
    fn close(&mut self) -> Result<()> {
        if let Some(mmap) = self.buffer.take_region() {
            mmap.flush().map_err(|e| io_error(&self.path, e))?;
            debug!(path = %self.path.display(), "closed file backend");
        }
        Ok(())
    }
}

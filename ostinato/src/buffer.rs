//! Buffer-backed storage backend.
//!
//! [`BufferBackend`] implements [`StorageBackend`] over any owned byte
//! region: a heap buffer ([`MemoryBackend`]) or a memory-mapped file
//! (see [`crate::file::FileBackend`]). The region is bound once at
//! construction and released exactly once by `close()`, which latches
//! the backend so later operations fail fast instead of touching freed
//! storage.

use crate::backend::{Endianness, MAX_OFFSET, StorageBackend};
use crate::error::{BackendError, Result};

/// A [`StorageBackend`] over an owned byte region.
///
/// Generic over the region type so the same bounds-checked access path
/// serves heap buffers and memory mappings alike. Writers are exclusive
/// through `&mut self`; reads are unsynchronized against writes, which
/// callers must coordinate around when sharing a file between views.
#[derive(Debug)]
pub struct BufferBackend<B> {
    /// The bound region; `None` once closed.
    region: Option<B>,
    /// Byte order applied to every multi-byte primitive.
    order: Endianness,
    /// Set by any write, cleared by `close()`.
    dirty: bool,
}

/// A heap-backed storage backend, mainly for tests and staging buffers.
pub type MemoryBackend = BufferBackend<Vec<u8>>;

impl MemoryBackend {
    /// Creates a zero-filled heap backend of `size` bytes.
    pub fn with_len(size: usize, order: Endianness) -> Self {
        Self::new(vec![0u8; size], order)
    }
}

impl<B> BufferBackend<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Binds a region with the given byte order. The backend starts
    /// clean (not dirty).
    pub fn new(region: B, order: Endianness) -> Self {
        Self {
            region: Some(region),
            order,
            dirty: false,
        }
    }

    /// Returns the bound region, or `None` after close.
    pub fn region(&self) -> Option<&B> {
        self.region.as_ref()
    }

    /// Returns the region size in bytes, or 0 after close.
    pub fn len(&self) -> usize {
        self.region.as_ref().map_or(0, |r| r.as_ref().len())
    }

    /// Returns `true` if the region is empty or the backend is closed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once `close()` has released the region.
    pub fn is_closed(&self) -> bool {
        self.region.is_none()
    }

    /// Validates the 32-bit-safe addressing invariant.
    fn check_offset(offset: u64) -> std::result::Result<(), BackendError> {
        if offset > MAX_OFFSET {
            return Err(BackendError::InvalidAddress { offset });
        }
        Ok(())
    }

    /// Borrows `length` bytes at `offset`, enforcing the address and
    /// bounds invariants before any access.
    #[allow(clippy::cast_possible_truncation)] // offset <= i32::MAX after check_offset
    fn span(&self, offset: u64, length: usize) -> std::result::Result<&[u8], BackendError> {
        Self::check_offset(offset)?;
        let region = self.region.as_ref().ok_or(BackendError::Closed)?;
        let buf = region.as_ref();
        let end = offset + length as u64;
        if end > buf.len() as u64 {
            return Err(BackendError::OutOfBounds {
                offset,
                length: length as u64,
                size: buf.len() as u64,
            });
        }
        Ok(&buf[offset as usize..end as usize])
    }

    /// Mutable counterpart of [`span`](Self::span). Nothing is mutated
    /// if any check fails.
    #[allow(clippy::cast_possible_truncation)] // offset <= i32::MAX after check_offset
    fn span_mut(
        &mut self,
        offset: u64,
        length: usize,
    ) -> std::result::Result<&mut [u8], BackendError> {
        Self::check_offset(offset)?;
        let region = self.region.as_mut().ok_or(BackendError::Closed)?;
        let buf = region.as_mut();
        let end = offset + length as u64;
        if end > buf.len() as u64 {
            return Err(BackendError::OutOfBounds {
                offset,
                length: length as u64,
                size: buf.len() as u64,
            });
        }
        Ok(&mut buf[offset as usize..end as usize])
    }

    /// Releases the region without consuming the backend, returning it
    /// to the caller (used by the file backend to flush before unmap).
    pub(crate) fn take_region(&mut self) -> Option<B> {
        self.dirty = false;
        self.region.take()
    }
}

impl<B> StorageBackend for BufferBackend<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    fn write_bytes(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        let span = self.span_mut(offset, bytes.len())?;
        span.copy_from_slice(bytes);
        self.dirty = true;
        Ok(())
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let span = self.span(offset, buf.len())?;
        buf.copy_from_slice(span);
        Ok(())
    }

    fn byte_order(&self) -> Endianness {
        self.order
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn close(&mut self) -> Result<()> {
        self.region = None;
        self.dirty = false;
        Ok(())
    }
}

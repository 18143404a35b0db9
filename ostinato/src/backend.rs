//! Typed storage backend contract.
//!
//! A [`StorageBackend`] gives offset-addressed, typed access to a byte
//! region holding the canonical round-robin database layout: header,
//! data-source definitions, archive definitions, CDP status blocks, and
//! the row data itself. Implementations bind one region (heap buffer,
//! memory-mapped file) and one byte order for their whole lifetime.
//!
//! # Design
//!
//! The typed operations are provided methods built on two required
//! byte-level primitives, [`write_bytes`](StorageBackend::write_bytes)
//! and [`read_into`](StorageBackend::read_into). Offset validation and
//! bounds checking therefore happen in exactly one place per
//! implementation, and every multi-word operation (double arrays, fixed
//! width strings) is transferred as a single contiguous block rather
//! than element by element.
//!
//! # Thread Safety
//!
//! Write operations take `&mut self`, so writers to one backend instance
//! are mutually exclusive by construction and a bulk write can never be
//! torn by another in-process writer. Reads take `&self` and are not
//! serialized against writes; callers needing read/write consistency
//! across independently mapped views must coordinate externally.

use serde::{Deserialize, Serialize};

use crate::error::{BackendError, Result};

/// Highest byte offset a backend will accept.
///
/// The canonical layout is addressed with 32-bit-safe offsets; anything
/// above this is a caller bug or corrupted metadata.
pub const MAX_OFFSET: u64 = i32::MAX as u64;

/// Byte order applied to all multi-byte primitives of a backend instance.
///
/// The order is fixed when the backend is constructed and carried by the
/// instance, never read from process-wide state, so backends with
/// different orders can coexist. Bit-exact compatibility with an existing
/// file requires matching the order the file was first written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endianness {
    /// Big-endian, the order used by the reference rrd4j file format.
    Big,
    /// Little-endian.
    Little,
}

impl Endianness {
    /// Encodes a `u16` in this byte order.
    #[inline]
    pub fn encode_u16(self, value: u16) -> [u8; 2] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    /// Decodes a `u16` in this byte order.
    #[inline]
    pub fn decode_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Self::Big => u16::from_be_bytes(bytes),
            Self::Little => u16::from_le_bytes(bytes),
        }
    }

    /// Encodes a `u32` in this byte order.
    #[inline]
    pub fn encode_u32(self, value: u32) -> [u8; 4] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    /// Decodes a `u32` in this byte order.
    #[inline]
    pub fn decode_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Big => u32::from_be_bytes(bytes),
            Self::Little => u32::from_le_bytes(bytes),
        }
    }

    /// Encodes a `u64` in this byte order.
    #[inline]
    pub fn encode_u64(self, value: u64) -> [u8; 8] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    /// Decodes a `u64` in this byte order.
    #[inline]
    pub fn decode_u64(self, bytes: [u8; 8]) -> u64 {
        match self {
            Self::Big => u64::from_be_bytes(bytes),
            Self::Little => u64::from_le_bytes(bytes),
        }
    }
}

/// Space character used to pad fixed-width string fields.
const PAD_UNIT: u16 = 0x0020;

/// Typed, offset-addressed access to a bound byte region.
///
/// Every operation validates its offset (`0..=`[`MAX_OFFSET`]) before
/// touching the region and fails with
/// [`BackendError::InvalidAddress`] on violation. Any write sets the
/// dirty flag; [`close`](Self::close) releases the region and clears it,
/// and all later operations fail with [`BackendError::Closed`].
pub trait StorageBackend {
    /// Writes raw bytes at the given offset.
    ///
    /// # Errors
    ///
    /// Fails with [`BackendError::InvalidAddress`] for an out-of-range
    /// offset, [`BackendError::OutOfBounds`] if the write would pass the
    /// end of the region, or [`BackendError::Closed`] after `close()`.
    /// A failed write mutates nothing.
    fn write_bytes(&mut self, offset: u64, bytes: &[u8]) -> Result<()>;

    /// Reads exactly `buf.len()` bytes starting at the given offset.
    ///
    /// # Errors
    ///
    /// Same conditions as [`write_bytes`](Self::write_bytes).
    fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Returns the byte order bound to this instance.
    fn byte_order(&self) -> Endianness;

    /// Returns `true` if any write occurred since open or the last close.
    fn is_dirty(&self) -> bool;

    /// Releases the bound region and clears the dirty flag.
    ///
    /// Idempotent: a second call is a no-op. All other operations fail
    /// with [`BackendError::Closed`] afterwards.
    ///
    /// # Errors
    ///
    /// Implementations that persist to storage may fail flushing.
    fn close(&mut self) -> Result<()>;

    /// Reads `length` raw bytes starting at the given offset.
    ///
    /// # Errors
    ///
    /// Same conditions as [`read_into`](Self::read_into).
    fn read_bytes(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; length];
        self.read_into(offset, &mut buf)?;
        Ok(buf)
    }

    /// Writes a 16-bit integer.
    ///
    /// # Errors
    ///
    /// Same conditions as [`write_bytes`](Self::write_bytes).
    #[allow(clippy::cast_sign_loss)] // bit-preserving reinterpretation
    fn write_short(&mut self, offset: u64, value: i16) -> Result<()> {
        let bytes = self.byte_order().encode_u16(value as u16);
        self.write_bytes(offset, &bytes)
    }

    /// Reads a 16-bit integer.
    ///
    /// # Errors
    ///
    /// Same conditions as [`read_into`](Self::read_into).
    fn read_short(&self, offset: u64) -> Result<i16> {
        let mut bytes = [0u8; 2];
        self.read_into(offset, &mut bytes)?;
        Ok(self.byte_order().decode_u16(bytes) as i16)
    }

    /// Writes a 32-bit integer.
    ///
    /// # Errors
    ///
    /// Same conditions as [`write_bytes`](Self::write_bytes).
    #[allow(clippy::cast_sign_loss)] // bit-preserving reinterpretation
    fn write_int(&mut self, offset: u64, value: i32) -> Result<()> {
        let bytes = self.byte_order().encode_u32(value as u32);
        self.write_bytes(offset, &bytes)
    }

    /// Reads a 32-bit integer.
    ///
    /// # Errors
    ///
    /// Same conditions as [`read_into`](Self::read_into).
    fn read_int(&self, offset: u64) -> Result<i32> {
        let mut bytes = [0u8; 4];
        self.read_into(offset, &mut bytes)?;
        Ok(self.byte_order().decode_u32(bytes) as i32)
    }

    /// Writes a 64-bit integer.
    ///
    /// # Errors
    ///
    /// Same conditions as [`write_bytes`](Self::write_bytes).
    #[allow(clippy::cast_sign_loss)] // bit-preserving reinterpretation
    fn write_long(&mut self, offset: u64, value: i64) -> Result<()> {
        let bytes = self.byte_order().encode_u64(value as u64);
        self.write_bytes(offset, &bytes)
    }

    /// Reads a 64-bit integer.
    ///
    /// # Errors
    ///
    /// Same conditions as [`read_into`](Self::read_into).
    fn read_long(&self, offset: u64) -> Result<i64> {
        let mut bytes = [0u8; 8];
        self.read_into(offset, &mut bytes)?;
        Ok(self.byte_order().decode_u64(bytes) as i64)
    }

    /// Writes a 64-bit float. NaN and infinities round-trip bit-exactly.
    ///
    /// # Errors
    ///
    /// Same conditions as [`write_bytes`](Self::write_bytes).
    fn write_double(&mut self, offset: u64, value: f64) -> Result<()> {
        let bytes = self.byte_order().encode_u64(value.to_bits());
        self.write_bytes(offset, &bytes)
    }

    /// Reads a 64-bit float.
    ///
    /// # Errors
    ///
    /// Same conditions as [`read_into`](Self::read_into).
    fn read_double(&self, offset: u64) -> Result<f64> {
        let mut bytes = [0u8; 8];
        self.read_into(offset, &mut bytes)?;
        Ok(f64::from_bits(self.byte_order().decode_u64(bytes)))
    }

    /// Writes `count` contiguous copies of `value` starting at `offset`.
    ///
    /// Used to blank freshly created row regions with NaN sentinels.
    ///
    /// # Errors
    ///
    /// Same conditions as [`write_bytes`](Self::write_bytes).
    fn write_double_fill(&mut self, offset: u64, value: f64, count: usize) -> Result<()> {
        let values = vec![value; count];
        self.write_double_array(offset, &values)
    }

    /// Writes a contiguous double array starting at `offset`.
    ///
    /// The whole array is transferred as one block of
    /// `values.len() * 8` bytes.
    ///
    /// # Errors
    ///
    /// Same conditions as [`write_bytes`](Self::write_bytes).
    fn write_double_array(&mut self, offset: u64, values: &[f64]) -> Result<()> {
        let order = self.byte_order();
        let mut buf = Vec::with_capacity(values.len() * 8);
        for value in values {
            buf.extend_from_slice(&order.encode_u64(value.to_bits()));
        }
        self.write_bytes(offset, &buf)
    }

    /// Reads a contiguous double array of `count` elements from `offset`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`read_into`](Self::read_into).
    fn read_double_array(&self, offset: u64, count: usize) -> Result<Vec<f64>> {
        let order = self.byte_order();
        let raw = self.read_bytes(offset, count * 8)?;
        let mut values = Vec::with_capacity(count);
        for chunk in raw.chunks_exact(8) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            values.push(f64::from_bits(order.decode_u64(bytes)));
        }
        Ok(values)
    }

    /// Writes a fixed-width string field of exactly `width` character
    /// units (UTF-16 code units, two bytes each, in the backend's byte
    /// order), space padding the remainder.
    ///
    /// The fixed character width is independent of the host string's
    /// in-memory representation: the field is interpreted as
    /// interchangeable two-byte units, not a variable-width encoding.
    ///
    /// # Errors
    ///
    /// Fails with [`BackendError::StringTooWide`] if the encoded value
    /// exceeds `width` units, plus the usual conditions of
    /// [`write_bytes`](Self::write_bytes).
    fn write_string(&mut self, offset: u64, value: &str, width: usize) -> Result<()> {
        let order = self.byte_order();
        let units: Vec<u16> = value.encode_utf16().collect();
        if units.len() > width {
            return Err(BackendError::StringTooWide {
                width,
                units: units.len(),
            }
            .into());
        }
        let mut buf = Vec::with_capacity(width * 2);
        for unit in &units {
            buf.extend_from_slice(&order.encode_u16(*unit));
        }
        for _ in units.len()..width {
            buf.extend_from_slice(&order.encode_u16(PAD_UNIT));
        }
        self.write_bytes(offset, &buf)
    }

    /// Reads a fixed-width string field of `width` character units,
    /// trimming the trailing space padding back off.
    ///
    /// # Errors
    ///
    /// Fails with [`BackendError::StringDecode`] if the field does not
    /// hold valid UTF-16, plus the usual conditions of
    /// [`read_into`](Self::read_into).
    fn read_string(&self, offset: u64, width: usize) -> Result<String> {
        let order = self.byte_order();
        let raw = self.read_bytes(offset, width * 2)?;
        let mut units = Vec::with_capacity(width);
        for chunk in raw.chunks_exact(2) {
            units.push(order.decode_u16([chunk[0], chunk[1]]));
        }
        let text =
            String::from_utf16(&units).map_err(|_| BackendError::StringDecode { offset })?;
        Ok(text.trim_end_matches(' ').to_string())
    }
}

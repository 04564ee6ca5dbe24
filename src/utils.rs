//! Low-level byte access shared by all parsers.
//!
//! Two layers live here:
//!
//! * stream helpers (`le_u16`, `bytesv`, `read_at`, ...) that read exactly
//!   the bytes they promise from a [`Read`] or return an error;
//! * [`Span`], a bounds-checked view over an in-memory buffer with typed
//!   reads in an explicit byte order. Every fixed header is read into a
//!   buffer once and decoded through a `Span`, which makes it the single
//!   place where on-disk byte order becomes host order.

use std::io::{Read, Seek, SeekFrom};

use crate::{Error, Result};

/// Byte order of a multi-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Bounds-checked, endianness-aware view over a byte buffer.
///
/// Sub-spans never reference memory outside the parent buffer.
#[derive(Debug, Clone, Copy)]
pub struct Span<'a> {
    buf: &'a [u8],
}

impl<'a> Span<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.buf
    }

    /// Borrow `len` bytes starting at `off`.
    ///
    /// Returns [`Error::OutOfRange`] if the range leaves the span.
    pub fn bytes(&self, off: usize, len: usize) -> Result<&'a [u8]> {
        let end = off.checked_add(len).ok_or(Error::OutOfRange)?;
        self.buf.get(off..end).ok_or(Error::OutOfRange)
    }

    /// Slice a sub-span of `len` bytes starting at `off`.
    pub fn sub(&self, off: usize, len: usize) -> Result<Span<'a>> {
        self.bytes(off, len).map(Span::new)
    }

    /// Everything from `off` to the end of the span.
    pub fn tail(&self, off: usize) -> Result<Span<'a>> {
        self.buf.get(off..).map(Span::new).ok_or(Error::OutOfRange)
    }

    /// Copy `N` bytes starting at `off` into an array.
    pub fn bytes_at<const N: usize>(&self, off: usize) -> Result<[u8; N]> {
        let end = off.checked_add(N).ok_or(Error::ShortRead)?;
        let src = self.buf.get(off..end).ok_or(Error::ShortRead)?;
        let mut out = [0u8; N];
        out.copy_from_slice(src);
        Ok(out)
    }

    pub fn u8(&self, off: usize) -> Result<u8> {
        self.buf.get(off).copied().ok_or(Error::ShortRead)
    }

    pub fn u16(&self, off: usize, e: Endian) -> Result<u16> {
        let b = self.bytes_at::<2>(off)?;
        Ok(match e {
            Endian::Little => u16::from_le_bytes(b),
            Endian::Big => u16::from_be_bytes(b),
        })
    }

    pub fn u32(&self, off: usize, e: Endian) -> Result<u32> {
        let b = self.bytes_at::<4>(off)?;
        Ok(match e {
            Endian::Little => u32::from_le_bytes(b),
            Endian::Big => u32::from_be_bytes(b),
        })
    }

    pub fn u64(&self, off: usize, e: Endian) -> Result<u64> {
        let b = self.bytes_at::<8>(off)?;
        Ok(match e {
            Endian::Little => u64::from_le_bytes(b),
            Endian::Big => u64::from_be_bytes(b),
        })
    }

    #[inline]
    pub fn le_u16(&self, off: usize) -> Result<u16> {
        self.u16(off, Endian::Little)
    }

    #[inline]
    pub fn le_u32(&self, off: usize) -> Result<u32> {
        self.u32(off, Endian::Little)
    }

    /// Verify that the bytes at `off` equal `expected`.
    ///
    /// Returns [`Error::BadMagic`] on mismatch or if the span is too short.
    pub fn magic(&self, off: usize, expected: &[u8]) -> Result<()> {
        match self.bytes(off, expected.len()) {
            Ok(got) if got == expected => Ok(()),
            _ => Err(Error::BadMagic),
        }
    }

    /// Read a Pascal-style string (one length byte, then the bytes).
    ///
    /// Returns the string and the offset just past it.
    pub fn pascal_string(&self, off: usize) -> Result<(String, usize)> {
        let len = self.u8(off)? as usize;
        let raw = self.bytes(off + 1, len)?;
        Ok((String::from_utf8_lossy(raw).into_owned(), off + 1 + len))
    }
}

/// Read a little-endian `u16`.
#[inline]
pub(crate) fn le_u16<R: Read>(r: &mut R) -> Result<u16> {
    let mut b = [0u8; 2];
    r.read_exact(&mut b)?;
    Ok(u16::from_le_bytes(b))
}

/// Read a `u32` with caller-supplied endianness.
#[inline]
pub(crate) fn end_u32<R: Read>(r: &mut R, e: Endian) -> Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(match e {
        Endian::Little => u32::from_le_bytes(b),
        Endian::Big => u32::from_be_bytes(b),
    })
}

/// Read exactly `N` bytes into a fixed-size array.
#[inline]
pub(crate) fn bytesa<const N: usize>(r: &mut impl Read) -> Result<[u8; N]> {
    let mut b = [0u8; N];
    r.read_exact(&mut b)?;
    Ok(b)
}

/// Read exactly `len` bytes into a `Vec`.
#[inline]
pub(crate) fn bytesv<R: Read>(r: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut b = vec![0u8; len];
    r.read_exact(&mut b)?;
    Ok(b)
}

/// Seek to `offset` and read exactly `len` bytes.
pub(crate) fn read_at<R: Read + Seek>(r: &mut R, offset: u64, len: usize) -> Result<Vec<u8>> {
    r.seek(SeekFrom::Start(offset))?;
    bytesv(r, len)
}

/// Round `n` up to a multiple of 4.
#[inline]
pub(crate) const fn align4(n: usize) -> usize {
    (n + 3) & !3
}

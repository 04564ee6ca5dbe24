//! Library-wide error and result types.

use std::io;

/// Result alias used throughout romkit.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// Header-parsing errors are returned from `open`/`parse` and mean the
/// container could not be constructed. Table and image errors are scoped to
/// the accessor that produced them; the container stays usable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The data ended before all expected bytes could be read.
    #[error("short read")]
    ShortRead,
    /// A magic/signature field did not match the expected value.
    #[error("bad magic value")]
    BadMagic,
    /// A self-declared structure size disagrees with the format's constant.
    #[error("bad structure size: expected {expected}, got {got}")]
    BadStructSize { expected: u32, got: u32 },
    /// An offset or size field would read outside the valid region.
    #[error("offset or size out of range")]
    OutOfRange,
    /// A data length does not match the size computed from the format.
    #[error("size mismatch: expected {expected} bytes, got {got}")]
    SizeMismatch { expected: usize, got: usize },
    /// The pixel format or container encoding is not supported.
    #[error("unsupported format")]
    UnsupportedFormat,
    /// A recognised format uses a variant this library cannot handle.
    #[error("unsupported variant: {0}")]
    UnsupportedVariant(&'static str),
    /// A name table references an ordinal with no entry.
    #[error("invalid ordinal reference: {0}")]
    InvalidOrdinal(u16),
    /// An external resource (e.g. a key table) has not been loaded.
    #[error("missing resource: {0}")]
    MissingResource(&'static str),
    /// The requested operation is not available in the current state.
    #[error("unsupported operation")]
    UnsupportedOperation,
    /// The file handle was released with `close()`.
    #[error("file is closed")]
    Closed,
    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::ShortRead
        } else {
            Error::Io(e)
        }
    }
}

// POSIX errno values (Linux numbering).
const EIO: i32 = 5;
const EBADF: i32 = 9;
const ENOENT: i32 = 2;
const EINVAL: i32 = 22;
const ERANGE: i32 = 34;
const ENOTSUP: i32 = 95;

impl Error {
    /// Negative POSIX error code for this error.
    ///
    /// ROM operations report their outcome to UI collaborators as a signed
    /// code: `0` on success, a negative value on failure.
    pub fn errno(&self) -> i32 {
        let code = match self {
            Error::ShortRead | Error::BadMagic | Error::BadStructSize { .. } => EIO,
            Error::OutOfRange => ERANGE,
            Error::SizeMismatch { .. } => EINVAL,
            Error::UnsupportedFormat
            | Error::UnsupportedVariant(_)
            | Error::UnsupportedOperation => ENOTSUP,
            Error::InvalidOrdinal(_) | Error::MissingResource(_) => ENOENT,
            Error::Closed => EBADF,
            Error::Io(e) => e.raw_os_error().unwrap_or(EIO),
        };
        -code
    }
}

//! Container parsers and the format registry.
//!
//! All parsers follow the same conventions:
//!
//! * **Generic over** [`std::io::Read`] + [`std::io::Seek`] - pass a
//!   [`std::fs::File`], a [`std::io::Cursor`], or anything else that
//!   implements both traits. Mutating operations additionally need
//!   [`crate::file::RomFile`].
//! * **Probe, then open** - `X::is_supported` looks only at a header
//!   prefix; `X::open` reads and validates the fixed header and fails
//!   with an [`Error`] rather than producing a half-valid object.
//! * **Lazy tables and images** - variable-length tables and decoded
//!   images are read on first access and cached.
//! * **`close()`** drops the handle. Cached data stays available; anything
//!   that still needs the file reports [`Error::Closed`].
//!
//! ## Format overview
//!
//! | Module  | Format | Description |
//! |---------|--------|-------------|
//! | [`nds`] | NDS    | Nintendo DS / DSi ROM image; trim, untrim, secure-area encryption |
//! | [`dds`] | DDS    | DirectDraw Surface texture, with DX10 and Xbox One extensions |
//! | [`ktx`] | KTX    | Khronos KTX 1.1 texture |
//! | [`ne`]  | NE     | 16-bit Windows / OS/2 New Executable |

pub mod dds;
pub mod ktx;
pub mod nds;
pub mod ne;

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::fields::Fields;
use crate::file::stream_len;
use crate::texture::Raster;
use crate::{Error, Result};

pub use dds::Dds;
pub use ktx::Ktx;
pub use nds::Nds;
pub use ne::Ne;

/// Bytes read from the start of a file for detection.
pub const PROBE_SIZE: u64 = 0x1000;

/// What a probe gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct DetectionInfo<'a> {
    /// Leading bytes of the file, at most [`PROBE_SIZE`].
    pub header: &'a [u8],
    pub file_size: u64,
    /// Lower-case extension without the dot, if known.
    pub ext: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatId {
    Nds,
    Dds,
    Ktx,
    Ne,
}

impl FormatId {
    pub fn name(self) -> &'static str {
        match self {
            FormatId::Nds => "Nintendo DS ROM",
            FormatId::Dds => "DirectDraw Surface",
            FormatId::Ktx => "Khronos KTX",
            FormatId::Ne => "New Executable",
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Probe = fn(&DetectionInfo<'_>) -> bool;
type Constructor<R> = fn(R) -> Result<Container<R>>;

/// Probes in priority order, each with its constructor.
fn registry<R: Read + Seek>() -> [(FormatId, Probe, Constructor<R>); 4] {
    [
        (FormatId::Nds, Nds::<R>::is_supported, |r| {
            Nds::open(r).map(Container::Nds)
        }),
        (FormatId::Dds, Dds::<R>::is_supported, |r| {
            Dds::open(r).map(Container::Dds)
        }),
        (FormatId::Ktx, Ktx::<R>::is_supported, |r| {
            Ktx::open(r).map(Container::Ktx)
        }),
        (FormatId::Ne, Ne::<R>::is_supported, |r| {
            Ne::open(r).map(Container::Ne)
        }),
    ]
}

/// First registered format whose probe accepts `info`.
pub fn detect(info: &DetectionInfo<'_>) -> Option<FormatId> {
    registry::<io::Empty>()
        .into_iter()
        .find(|(_, probe, _)| probe(info))
        .map(|(id, _, _)| id)
}

/// Detect the format of `handle` and open it.
///
/// Returns [`Error::UnsupportedFormat`] if no probe matches.
pub fn open<R: Read + Seek>(handle: R) -> Result<Container<R>> {
    open_with_ext(handle, None)
}

/// [`open`] a file on disk, passing its extension to the probes.
pub fn open_path(path: impl AsRef<Path>) -> Result<Container<File>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    open_with_ext(File::open(path)?, ext.as_deref())
}

fn open_with_ext<R: Read + Seek>(mut handle: R, ext: Option<&str>) -> Result<Container<R>> {
    let file_size = stream_len(&mut handle)?;
    handle.seek(SeekFrom::Start(0))?;
    let mut header = Vec::new();
    handle.by_ref().take(PROBE_SIZE).read_to_end(&mut header)?;
    handle.seek(SeekFrom::Start(0))?;

    let info = DetectionInfo {
        header: &header,
        file_size,
        ext,
    };
    let (id, _, ctor) = registry::<R>()
        .into_iter()
        .find(|(_, probe, _)| probe(&info))
        .ok_or(Error::UnsupportedFormat)?;
    debug!(format = %id, file_size, "format detected");
    ctor(handle)
}

/// Any opened container.
#[derive(Debug)]
pub enum Container<R> {
    Nds(Nds<R>),
    Dds(Dds<R>),
    Ktx(Ktx<R>),
    Ne(Ne<R>),
}

impl<R: Read + Seek> Container<R> {
    pub fn id(&self) -> FormatId {
        match self {
            Container::Nds(_) => FormatId::Nds,
            Container::Dds(_) => FormatId::Dds,
            Container::Ktx(_) => FormatId::Ktx,
            Container::Ne(_) => FormatId::Ne,
        }
    }

    pub fn fields(&mut self) -> Fields {
        match self {
            Container::Nds(c) => c.fields(),
            Container::Dds(c) => c.fields(),
            Container::Ktx(c) => c.fields(),
            Container::Ne(c) => c.fields(),
        }
    }

    /// Decode mip level `mip`. Containers without images report
    /// [`Error::UnsupportedOperation`].
    pub fn image(&mut self, mip: u32) -> Result<&Raster> {
        match self {
            Container::Dds(c) => c.image(mip),
            Container::Ktx(c) => c.image(mip),
            Container::Nds(_) | Container::Ne(_) => Err(Error::UnsupportedOperation),
        }
    }

    pub fn close(&mut self) {
        match self {
            Container::Nds(c) => c.close(),
            Container::Dds(c) => c.close(),
            Container::Ktx(c) => c.close(),
            Container::Ne(c) => c.close(),
        }
    }
}

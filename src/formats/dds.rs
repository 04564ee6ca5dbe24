//! DDS (DirectDraw Surface) texture container.
//!
//! ## Layout
//! ```text
//! [0x00] Magic "DDS "                          (4 bytes)
//! [0x04] DDS_HEADER                            (124 bytes)
//! [0x80] DDS_HEADER_DXT10 if FourCC is DX10/XBOX (20 bytes)
//! [0x94] DDS_HEADER_XBOX  if FourCC is XBOX      (16 bytes)
//! [...]  mip 0, then the remaining mip levels
//! ```
//!
//! ## DDS_HEADER (offsets relative to 0x04)
//! ```text
//! [0x00] dwSize (124)              [0x48] ddspf.dwSize (32)
//! [0x04] dwFlags                   [0x4C] ddspf.dwFlags
//! [0x08] dwHeight                  [0x50] ddspf.dwFourCC (big-endian)
//! [0x0C] dwWidth                   [0x54] ddspf.dwRGBBitCount
//! [0x10] dwPitchOrLinearSize       [0x58] ddspf.dwRBitMask .. dwABitMask
//! [0x14] dwDepth                   [0x68] dwCaps
//! [0x18] dwMipMapCount             [0x6C] dwCaps2
//! [0x1C] dwReserved1[11]           [0x70] dwCaps3, dwCaps4, dwReserved2
//!        [0x40] "NVTT" magic, [0x44] NVTT version
//! ```
//!
//! Everything except the FourCC is little-endian.

use std::io::{Read, Seek};

use tracing::{debug, warn};

use super::DetectionInfo;
use crate::fields::Fields;
use crate::file::stream_len;
use crate::texture::pixel_format::{
    self, DDPF_FOURCC, FOURCC_DX10, FOURCC_XBOX, FormatKind, PixelFormat, dxgi,
};
use crate::texture::{self, Raster};
use crate::utils::{Endian, Span, bytesa, read_at};
use crate::{Error, Result};

pub const DDS_MAGIC: &[u8; 4] = b"DDS ";
/// Size of `DDS_HEADER`, as declared in `dwSize`.
pub const DDS_HEADER_SIZE: usize = 124;
/// Size of `DDS_PIXELFORMAT`, as declared in `ddspf.dwSize`.
pub const DDS_PIXELFORMAT_SIZE: usize = 32;
pub const DXT10_HEADER_SIZE: usize = 20;
pub const XBOX_HEADER_SIZE: usize = 16;
/// Files larger than this are not decoded.
pub const MAX_FILE_SIZE: u64 = 128 * 1024 * 1024;

pub const DDSD_DEPTH: u32 = 0x0080_0000;
pub const DDSD_LINEARSIZE: u32 = 0x0008_0000;

const NVTT_MAGIC: &[u8; 4] = b"NVTT";

/// `DDS_PIXELFORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdsPixelFormat {
    pub size: u32,
    pub flags: u32,
    pub fourcc: u32,
    pub bit_count: u32,
    /// R, G, B, A masks.
    pub masks: [u32; 4],
}

/// `DDS_HEADER`, byte order already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdsHeader {
    pub size: u32,
    pub flags: u32,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mipmap_count: u32,
    /// nVidia Texture Tools version, if the writer left its tag.
    pub nvtt_version: Option<u32>,
    pub ddspf: DdsPixelFormat,
    pub caps: u32,
    pub caps2: u32,
    pub caps3: u32,
    pub caps4: u32,
}

impl DdsHeader {
    /// Decode the 124-byte header. Struct sizes are checked here.
    pub fn parse(s: Span<'_>) -> Result<Self> {
        let size = s.le_u32(0x00)?;
        if size as usize != DDS_HEADER_SIZE {
            return Err(Error::BadStructSize {
                expected: DDS_HEADER_SIZE as u32,
                got: size,
            });
        }
        let pf_size = s.le_u32(0x48)?;
        if pf_size as usize != DDS_PIXELFORMAT_SIZE {
            return Err(Error::BadStructSize {
                expected: DDS_PIXELFORMAT_SIZE as u32,
                got: pf_size,
            });
        }
        let nvtt_version = match s.magic(0x40, NVTT_MAGIC) {
            Ok(()) => Some(s.le_u32(0x44)?),
            Err(_) => None,
        };
        Ok(Self {
            size,
            flags: s.le_u32(0x04)?,
            height: s.le_u32(0x08)?,
            width: s.le_u32(0x0C)?,
            pitch_or_linear_size: s.le_u32(0x10)?,
            depth: s.le_u32(0x14)?,
            mipmap_count: s.le_u32(0x18)?,
            nvtt_version,
            ddspf: DdsPixelFormat {
                size: pf_size,
                flags: s.le_u32(0x4C)?,
                fourcc: s.u32(0x50, Endian::Big)?,
                bit_count: s.le_u32(0x54)?,
                masks: [
                    s.le_u32(0x58)?,
                    s.le_u32(0x5C)?,
                    s.le_u32(0x60)?,
                    s.le_u32(0x64)?,
                ],
            },
            caps: s.le_u32(0x68)?,
            caps2: s.le_u32(0x6C)?,
            caps3: s.le_u32(0x70)?,
            caps4: s.le_u32(0x74)?,
        })
    }

    fn is_dx10(&self) -> bool {
        self.ddspf.fourcc == FOURCC_DX10 || self.ddspf.fourcc == FOURCC_XBOX
    }

    fn is_xbox(&self) -> bool {
        self.ddspf.fourcc == FOURCC_XBOX
    }
}

/// `DDS_HEADER_DXT10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dxt10Header {
    pub dxgi_format: u32,
    pub resource_dimension: u32,
    pub misc_flag: u32,
    pub array_size: u32,
    pub misc_flags2: u32,
}

impl Dxt10Header {
    pub fn parse(s: Span<'_>) -> Result<Self> {
        Ok(Self {
            dxgi_format: s.le_u32(0x00)?,
            resource_dimension: s.le_u32(0x04)?,
            misc_flag: s.le_u32(0x08)?,
            array_size: s.le_u32(0x0C)?,
            misc_flags2: s.le_u32(0x10)?,
        })
    }
}

/// Xbox One extension that follows the DXT10 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XboxHeader {
    pub tile_mode: u32,
    pub base_alignment: u32,
    pub data_size: u32,
    pub xdk_ver: u32,
}

impl XboxHeader {
    pub fn parse(s: Span<'_>) -> Result<Self> {
        Ok(Self {
            tile_mode: s.le_u32(0x00)?,
            base_alignment: s.le_u32(0x04)?,
            data_size: s.le_u32(0x08)?,
            xdk_ver: s.le_u32(0x0C)?,
        })
    }
}

/// An open DDS texture.
#[derive(Debug)]
pub struct Dds<R> {
    inner: Option<R>,
    pub header: DdsHeader,
    pub dxt10: Option<Dxt10Header>,
    pub xbox: Option<XboxHeader>,
    data_offset: u64,
    file_size: u64,
    pixel_format: Option<PixelFormat>,
    image: Option<Raster>,
}

impl<R: Read + Seek> Dds<R> {
    pub fn is_supported(info: &DetectionInfo<'_>) -> bool {
        let s = Span::new(info.header);
        s.magic(0, DDS_MAGIC).is_ok()
            && s.le_u32(4).is_ok_and(|v| v as usize == DDS_HEADER_SIZE)
            && s
                .le_u32(4 + 0x48)
                .is_ok_and(|v| v as usize == DDS_PIXELFORMAT_SIZE)
    }

    pub fn open(mut inner: R) -> Result<Self> {
        let file_size = stream_len(&mut inner)?;
        let prefix = read_at(&mut inner, 0, 4 + DDS_HEADER_SIZE)?;
        let s = Span::new(&prefix);
        s.magic(0, DDS_MAGIC)?;
        let header = DdsHeader::parse(s.tail(4)?)?;

        let mut data_offset = (4 + DDS_HEADER_SIZE) as u64;
        let mut dxt10 = None;
        let mut xbox = None;
        if header.is_dx10() {
            let ext = bytesa::<DXT10_HEADER_SIZE>(&mut inner)?;
            let h = Dxt10Header::parse(Span::new(&ext))?;
            if dxgi::is_fake(h.dxgi_format) {
                warn!(dxgi_format = h.dxgi_format, "reserved DXGI format in DDS file");
                return Err(Error::UnsupportedFormat);
            }
            dxt10 = Some(h);
            data_offset += DXT10_HEADER_SIZE as u64;
            if header.is_xbox() {
                let ext = bytesa::<XBOX_HEADER_SIZE>(&mut inner)?;
                xbox = Some(XboxHeader::parse(Span::new(&ext))?);
                data_offset += XBOX_HEADER_SIZE as u64;
            }
        }

        let pixel_format = resolve_pixel_format(&header, dxt10.as_ref());
        match &pixel_format {
            Some(pf) => debug!(
                width = header.width,
                height = header.height,
                format = pf.name(),
                "opened DDS texture"
            ),
            None => debug!(
                fourcc = header.ddspf.fourcc,
                flags = header.ddspf.flags,
                "DDS pixel format not supported"
            ),
        }

        Ok(Self {
            inner: Some(inner),
            header,
            dxt10,
            xbox,
            data_offset,
            file_size,
            pixel_format,
            image: None,
        })
    }

    /// Release the file handle. A decoded image stays cached.
    pub fn close(&mut self) {
        self.inner = None;
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Offset of the first mip level.
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    /// `None` when the pixel format is not one the decoders handle.
    pub fn pixel_format(&self) -> Option<&PixelFormat> {
        self.pixel_format.as_ref()
    }

    /// Row stride of a linear image, or 0 to let the decoder derive it.
    fn stride(&self, pf: &PixelFormat) -> usize {
        let FormatKind::Linear(_) = pf.kind else {
            return 0;
        };
        let h = &self.header;
        if h.flags & DDSD_LINEARSIZE != 0 {
            h.pitch_or_linear_size
                .checked_div(h.height)
                .unwrap_or_default() as usize
        } else {
            h.pitch_or_linear_size as usize
        }
    }

    /// Decode mip level `mip`. Only level 0 is available.
    pub fn image(&mut self, mip: u32) -> Result<&Raster> {
        if mip != 0 {
            return Err(Error::OutOfRange);
        }
        if self.image.is_none() {
            if self.file_size > MAX_FILE_SIZE {
                return Err(Error::OutOfRange);
            }
            let pf = self.pixel_format.ok_or(Error::UnsupportedFormat)?;
            let (width, height) = (self.header.width, self.header.height);
            let stride = self.stride(&pf);
            let len = texture::expected_size(&pf, width, height, stride).inspect_err(|_| {
                debug!(stride, "implausible DDS pitch");
            })?;
            if self.data_offset + len as u64 > self.file_size {
                return Err(Error::SizeMismatch {
                    expected: len,
                    got: self.file_size.saturating_sub(self.data_offset) as usize,
                });
            }
            let offset = self.data_offset;
            let file = self.inner.as_mut().ok_or(Error::Closed)?;
            let data = read_at(file, offset, len)?;
            self.image = Some(texture::decode(&pf, width, height, &data, stride)?);
        }
        self.image.as_ref().ok_or(Error::OutOfRange)
    }

    pub fn fields(&self) -> Fields {
        let h = &self.header;
        let mut f = Fields::new();
        let pitch_name = if h.flags & DDSD_LINEARSIZE != 0 {
            "Linear Size"
        } else {
            "Pitch"
        };
        f.add_dec(pitch_name, h.pitch_or_linear_size as u64);
        f.add_string("Pixel Format", self.pixel_format_name());
        if let Some(dxt10) = &self.dxt10 {
            let name = pixel_format::dxgi_name(dxt10.dxgi_format).map_or_else(
                || format!("Unknown (0x{:08X})", dxt10.dxgi_format),
                str::to_string,
            );
            f.add_string("DX10 Format", name);
        }
        if let Some(v) = h.nvtt_version {
            f.add_string(
                "NVTT Version",
                format!("{}.{}.{}", (v >> 16) & 0xFF, (v >> 8) & 0xFF, v & 0xFF),
            );
        }
        f.add_bitfield("Flags", FLAG_NAMES, 3, h.flags);
        f.add_bitfield("Caps", CAPS_NAMES, 3, h.caps);
        f.add_bitfield("Caps2", CAPS2_NAMES, 4, h.caps2 >> 8);
        if let Some(x) = &self.xbox {
            f.add_dec("Tile Mode", x.tile_mode as u64);
            f.add_dec("Base Alignment", x.base_alignment as u64);
            f.add_dec("Data Size", x.data_size as u64);
            f.add_hex("XDK Version", x.xdk_ver as u64, 4);
        }
        f
    }

    /// FourCC text for FourCC formats, otherwise the resolved format name.
    fn pixel_format_name(&self) -> String {
        let pf = &self.header.ddspf;
        if pf.flags & DDPF_FOURCC != 0 && self.dxt10.is_none() {
            return String::from_utf8_lossy(&pf.fourcc.to_be_bytes()).into_owned();
        }
        match &self.pixel_format {
            Some(p) => p.name().to_string(),
            None => format!("Unknown ({}-bit)", pf.bit_count),
        }
    }
}

fn resolve_pixel_format(h: &DdsHeader, dxt10: Option<&Dxt10Header>) -> Option<PixelFormat> {
    if let Some(d) = dxt10 {
        return pixel_format::from_dxgi(d.dxgi_format, d.misc_flags2);
    }
    let pf = &h.ddspf;
    if pf.flags & DDPF_FOURCC != 0 {
        pixel_format::from_fourcc(pf.fourcc)
    } else {
        pixel_format::from_dds_masks(pf.flags, pf.bit_count, pf.masks)
    }
}

const FLAG_NAMES: &[Option<&str>] = &[
    Some("Caps"),
    Some("Height"),
    Some("Width"),
    Some("Pitch"),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    Some("Pixel Format"),
    None,
    None,
    None,
    None,
    Some("Mipmap Count"),
    None,
    Some("Linear Size"),
    None,
    None,
    None,
    Some("Depth"),
];

const CAPS_NAMES: &[Option<&str>] = &[
    None,
    None,
    None,
    Some("Complex"),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    Some("Texture"),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    Some("Mipmap"),
];

// dwCaps2 shifted right by 8.
const CAPS2_NAMES: &[Option<&str>] = &[
    None,
    Some("Cubemap"),
    Some("+X"),
    Some("-X"),
    Some("+Y"),
    Some("-Y"),
    Some("+Z"),
    Some("-Z"),
    None,
    None,
    None,
    None,
    None,
    Some("Volume"),
];

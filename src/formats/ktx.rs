//! KTX 1.1 (Khronos Texture) container.
//!
//! ## Layout
//! ```text
//! [0x00] Identifier «KTX 11»\r\n\x1A\n       (12 bytes)
//! [0x0C] endianness (0x04030201)             (u32)
//! [0x10] glType                [0x28] pixelHeight
//! [0x14] glTypeSize            [0x2C] pixelDepth
//! [0x18] glFormat              [0x30] numberOfArrayElements
//! [0x1C] glInternalFormat      [0x34] numberOfFaces
//! [0x20] glBaseInternalFormat  [0x38] numberOfMipmapLevels
//! [0x24] pixelWidth            [0x3C] bytesOfKeyValueData
//! [0x40] key/value data
//! [align4(0x40 + bytesOfKeyValueData)]
//!        per mip level: imageSize (u32), image data, padding to 4
//! ```
//!
//! Every `u32` uses the byte order announced by `endianness`.
//!
//! ## Key/value records
//! ```text
//! [0x00] keyAndValueByteSize (u32)
//! [0x04] key, NUL, value, NUL
//! [...]  padding to 4
//! ```

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use super::DetectionInfo;
use crate::fields::Fields;
use crate::file::stream_len;
use crate::texture::pixel_format::{self, FormatKind, PixelFormat};
use crate::texture::{self, FlipOp, MAX_DIMENSION, Raster};
use crate::utils::{Endian, Span, align4, end_u32, read_at};
use crate::{Error, Result};

pub const KTX_IDENTIFIER: &[u8; 12] = b"\xABKTX 11\xBB\r\n\x1A\n";
pub const KTX_HEADER_SIZE: usize = 64;
const ENDIAN_MAGIC: u32 = 0x0403_0201;

pub const MAX_MIPMAP_LEVELS: u32 = 128;
/// Key/value blocks outside `MIN_KV_SIZE..=MAX_KV_SIZE` are not parsed.
pub const MIN_KV_SIZE: u32 = 5;
pub const MAX_KV_SIZE: u32 = 512 * 1024;
/// Files larger than this are not decoded.
pub const MAX_FILE_SIZE: u64 = 128 * 1024 * 1024;

const ORIENTATION_KEY: &str = "KTXorientation";

/// KTX header with every field in host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KtxHeader {
    pub endian: Endian,
    pub gl_type: u32,
    pub gl_type_size: u32,
    pub gl_format: u32,
    pub gl_internal_format: u32,
    pub gl_base_internal_format: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pixel_depth: u32,
    pub array_elements: u32,
    pub faces: u32,
    pub mipmap_levels: u32,
    pub kv_size: u32,
}

impl KtxHeader {
    pub fn parse(s: Span<'_>) -> Result<Self> {
        s.magic(0, KTX_IDENTIFIER)?;
        let endian = match s.le_u32(0x0C)? {
            ENDIAN_MAGIC => Endian::Little,
            v if v.swap_bytes() == ENDIAN_MAGIC => Endian::Big,
            _ => return Err(Error::BadMagic),
        };
        let u = |off| s.u32(off, endian);
        Ok(Self {
            endian,
            gl_type: u(0x10)?,
            gl_type_size: u(0x14)?,
            gl_format: u(0x18)?,
            gl_internal_format: u(0x1C)?,
            gl_base_internal_format: u(0x20)?,
            pixel_width: u(0x24)?,
            pixel_height: u(0x28)?,
            pixel_depth: u(0x2C)?,
            array_elements: u(0x30)?,
            faces: u(0x34)?,
            mipmap_levels: u(0x38)?,
            kv_size: u(0x3C)?,
        })
    }

    /// Offset of the first `imageSize` field.
    pub fn data_offset(&self) -> u64 {
        align4(KTX_HEADER_SIZE + self.kv_size as usize) as u64
    }

    /// Dimensions of mip level `mip`. 1D textures are one pixel high.
    pub fn mip_dimensions(&self, mip: u32) -> (u32, u32) {
        let w = self.pixel_width.checked_shr(mip).unwrap_or(0).max(1);
        let h = self.pixel_height.max(1).checked_shr(mip).unwrap_or(0).max(1);
        (w, h)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Walk a key/value block.
///
/// Returns the records read before the first malformed one, plus the flip
/// implied by the first `KTXorientation` key (vertical when absent).
pub fn parse_key_values(data: &[u8], endian: Endian) -> (Vec<KeyValue>, FlipOp) {
    let s = Span::new(data);
    let mut out = Vec::new();
    let mut flip = None;
    let mut pos = 0usize;

    while pos + 4 <= data.len() {
        let Ok(size) = s.u32(pos, endian) else { break };
        let size = size as usize;
        if size < 2 {
            break;
        }
        let Ok(record) = s.bytes(pos + 4, size) else {
            break;
        };
        let Some(key_end) = record.iter().position(|&b| b == 0) else {
            break;
        };
        let Some(value_len) = size.checked_sub(key_end + 2) else {
            break;
        };
        if record[key_end + 1..].iter().position(|&b| b == 0) != Some(value_len) {
            break;
        }
        let key = String::from_utf8_lossy(&record[..key_end]).into_owned();
        let value_raw = &record[key_end + 1..size - 1];

        if flip.is_none() && key.eq_ignore_ascii_case(ORIENTATION_KEY) {
            flip = Some(orientation_flip(value_raw).unwrap_or(FlipOp::Vertical));
        }
        out.push(KeyValue {
            key,
            value: String::from_utf8_lossy(value_raw).into_owned(),
        });
        pos += 4 + align4(size);
    }
    (out, flip.unwrap_or(FlipOp::Vertical))
}

/// Only the S and T axes are considered.
fn orientation_flip(value: &[u8]) -> Option<FlipOp> {
    const TABLE: [(&[u8; 7], FlipOp); 4] = [
        (b"S=r,T=d", FlipOp::None),
        (b"S=r,T=u", FlipOp::Vertical),
        (b"S=l,T=d", FlipOp::Horizontal),
        (b"S=l,T=u", FlipOp::Both),
    ];
    let head = value.get(..7)?;
    TABLE
        .iter()
        .find(|(s, _)| s.as_slice() == head)
        .map(|&(_, op)| op)
}

/// An open KTX texture.
#[derive(Debug)]
pub struct Ktx<R> {
    inner: Option<R>,
    pub header: KtxHeader,
    file_size: u64,
    key_values: Vec<KeyValue>,
    flip: FlipOp,
    pixel_format: Option<PixelFormat>,
    mipmaps: Vec<Option<Raster>>,
}

impl<R: Read + Seek> Ktx<R> {
    pub fn is_supported(info: &DetectionInfo<'_>) -> bool {
        let s = Span::new(info.header);
        s.magic(0, KTX_IDENTIFIER).is_ok()
            && s
                .le_u32(0x0C)
                .is_ok_and(|v| v == ENDIAN_MAGIC || v.swap_bytes() == ENDIAN_MAGIC)
    }

    pub fn open(mut inner: R) -> Result<Self> {
        let file_size = stream_len(&mut inner)?;
        let buf = read_at(&mut inner, 0, KTX_HEADER_SIZE)?;
        let header = KtxHeader::parse(Span::new(&buf))?;
        if header.mipmap_levels > MAX_MIPMAP_LEVELS {
            return Err(Error::OutOfRange);
        }

        let (key_values, flip) = if (MIN_KV_SIZE..=MAX_KV_SIZE).contains(&header.kv_size) {
            match read_at(&mut inner, KTX_HEADER_SIZE as u64, header.kv_size as usize) {
                Ok(kv) => parse_key_values(&kv, header.endian),
                Err(e) => {
                    debug!(error = %e, "KTX key/value block unreadable");
                    (Vec::new(), FlipOp::Vertical)
                }
            }
        } else {
            (Vec::new(), FlipOp::Vertical)
        };

        let pixel_format =
            pixel_format::from_gl(header.gl_format, header.gl_internal_format);
        if pixel_format.is_none() {
            debug!(
                gl_format = header.gl_format,
                gl_internal_format = header.gl_internal_format,
                "KTX pixel format not supported"
            );
        }
        debug!(
            width = header.pixel_width,
            height = header.pixel_height,
            mipmaps = header.mipmap_levels,
            ?flip,
            "opened KTX texture"
        );

        let levels = header.mipmap_levels.max(1) as usize;
        Ok(Self {
            inner: Some(inner),
            header,
            file_size,
            key_values,
            flip,
            pixel_format,
            mipmaps: vec![None; levels],
        })
    }

    /// Release the file handle. Decoded mip levels stay cached.
    pub fn close(&mut self) {
        self.inner = None;
    }

    pub fn key_values(&self) -> &[KeyValue] {
        &self.key_values
    }

    /// Flip applied to every decoded level.
    pub fn flip(&self) -> FlipOp {
        self.flip
    }

    pub fn pixel_format(&self) -> Option<&PixelFormat> {
        self.pixel_format.as_ref()
    }

    pub fn mipmap_count(&self) -> usize {
        self.mipmaps.len()
    }

    /// Offset of mip level `mip`'s `imageSize` field, found by walking
    /// the preceding levels.
    fn mip_offset(&mut self, mip: u32) -> Result<u64> {
        let endian = self.header.endian;
        let mut off = self.header.data_offset();
        let file = self.inner.as_mut().ok_or(Error::Closed)?;
        for _ in 0..mip {
            file.seek(SeekFrom::Start(off))?;
            let size = end_u32(file, endian)?;
            off += 4 + align4(size as usize) as u64;
        }
        Ok(off)
    }

    /// Decode mip level `mip`, flipped to top-left origin.
    pub fn image(&mut self, mip: u32) -> Result<&Raster> {
        let idx = mip as usize;
        if idx >= self.mipmaps.len() {
            return Err(Error::OutOfRange);
        }
        if self.mipmaps[idx].is_none() {
            let raster = self.load_mip(mip)?;
            self.mipmaps[idx] = Some(raster);
        }
        self.mipmaps[idx].as_ref().ok_or(Error::OutOfRange)
    }

    fn load_mip(&mut self, mip: u32) -> Result<Raster> {
        let h = self.header;
        if h.pixel_width == 0 || h.pixel_width > MAX_DIMENSION || h.pixel_height > MAX_DIMENSION {
            return Err(Error::OutOfRange);
        }
        if self.file_size > MAX_FILE_SIZE {
            return Err(Error::OutOfRange);
        }
        let pf = self.pixel_format.ok_or(Error::UnsupportedFormat)?;
        let (width, height) = h.mip_dimensions(mip);

        // Uncompressed rows are 4-byte aligned.
        let stride = match pf.kind {
            FormatKind::Linear(f) => align4(width as usize * f.bytes_per_pixel()),
            FormatKind::Compressed(_) => 0,
        };
        let expected = texture::expected_size(&pf, width, height, stride)?;

        let off = self.mip_offset(mip)?;
        let file = self.inner.as_mut().ok_or(Error::Closed)?;
        file.seek(SeekFrom::Start(off))?;
        let image_size = end_u32(file, h.endian)? as usize;
        let per_element = if h.array_elements <= 1 {
            image_size
        } else {
            image_size / h.array_elements as usize
        };
        if per_element != expected {
            debug!(mip, image_size, expected, "KTX imageSize mismatch");
            return Err(Error::SizeMismatch {
                expected,
                got: per_element,
            });
        }

        let data = read_at(file, off + 4, expected)?;
        let mut raster = texture::decode(&pf, width, height, &data, stride)?;
        raster.flip(self.flip);
        Ok(raster)
    }

    pub fn fields(&self) -> Fields {
        let h = &self.header;
        let mut f = Fields::new();
        f.add_string(
            "Endianness",
            match h.endian {
                Endian::Little => "Little-Endian",
                Endian::Big => "Big-Endian",
            },
        );
        add_gl_enum(&mut f, "glType", h.gl_type);
        add_gl_enum(&mut f, "glFormat", h.gl_format);
        add_gl_enum(&mut f, "glInternalFormat", h.gl_internal_format);
        if h.gl_base_internal_format != h.gl_format {
            add_gl_enum(&mut f, "glBaseInternalFormat", h.gl_base_internal_format);
        }
        if h.array_elements > 0 {
            f.add_dec("# of Array Elements", h.array_elements as u64);
        }
        if h.faces > 1 {
            f.add_dec("# of Faces", h.faces as u64);
        }
        if !self.key_values.is_empty() {
            let rows = self
                .key_values
                .iter()
                .map(|kv| vec![kv.key.clone(), kv.value.clone()])
                .collect();
            f.add_list("Key/Value Data", &["Key", "Value"], rows);
        }
        f
    }
}

fn add_gl_enum(f: &mut Fields, name: &'static str, value: u32) {
    match pixel_format::gl_name(value) {
        Some(s) => f.add_string(name, s),
        None => f.add_hex(name, value as u64, 4),
    }
}

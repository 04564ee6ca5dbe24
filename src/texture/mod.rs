//! Texture decoding.
//!
//! [`decode`] turns the raw bytes of one mipmap level into a [`Raster`] of
//! 32-bit ARGB pixels (`0xAARRGGBB`, straight alpha).
//!
//! | Module | Encodings |
//! |--------|-----------|
//! | [`pixel_format`] | format resolution from DDS, DXGI and GL descriptions |
//! | [`linear`] | uncompressed 8/16/24/32-bit layouts |
//! | [`s3tc`] | BC1-BC5, LATC |
//! | [`etc`] | ETC1, ETC2, EAC |
//! | [`bc7`] | BC7 / BPTC |
//! | [`pvrtc`] | PVRTC-I, PVRTC-II |
//! | [`astc`] | ASTC LDR |
//!
//! The input length must equal [`expected_size`] exactly; decoders index
//! only inside that length.

pub mod astc;
pub mod bc7;
pub mod etc;
pub mod linear;
pub mod pixel_format;
pub mod pvrtc;
pub mod s3tc;

use tracing::trace;

pub use pixel_format::{AlphaMode, CompressedFormat, FormatKind, LinearFormat, PixelFormat};

use crate::{Error, Result};

/// Largest accepted width or height.
pub const MAX_DIMENSION: u32 = 32768;

/// Orientation fix-ups applied after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlipOp {
    #[default]
    None,
    Vertical,
    Horizontal,
    Both,
}

/// A decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Raster {
    /// A raster filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixels in row-major order.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    /// Copy a `bw` × `bh` tile into place at block position (`bx`, `by`),
    /// clipping at the right and bottom edges.
    pub(crate) fn put_tile(&mut self, bx: usize, by: usize, bw: usize, bh: usize, tile: &[u32]) {
        let w = self.width as usize;
        let h = self.height as usize;
        let x0 = bx * bw;
        let y0 = by * bh;
        for ty in 0..bh {
            let y = y0 + ty;
            if y >= h {
                break;
            }
            let cols = bw.min(w.saturating_sub(x0));
            let dst = y * w + x0;
            self.pixels[dst..dst + cols].copy_from_slice(&tile[ty * bw..ty * bw + cols]);
        }
    }

    /// Flip in place.
    pub fn flip(&mut self, op: FlipOp) {
        let w = self.width as usize;
        if matches!(op, FlipOp::Horizontal | FlipOp::Both) {
            for row in self.pixels.chunks_exact_mut(w.max(1)) {
                row.reverse();
            }
        }
        if matches!(op, FlipOp::Vertical | FlipOp::Both) {
            let h = self.height as usize;
            for y in 0..h / 2 {
                let (top, bottom) = self.pixels.split_at_mut((h - 1 - y) * w);
                top[y * w..(y + 1) * w].swap_with_slice(&mut bottom[..w]);
            }
        }
    }

    /// Convert premultiplied colour to straight alpha.
    pub fn unpremultiply(&mut self) {
        for px in &mut self.pixels {
            let a = *px >> 24;
            if a == 0 || a == 255 {
                continue;
            }
            let ch = |shift: u32| (((*px >> shift) & 0xFF) * 255 / a).min(255);
            *px = (a << 24) | (ch(16) << 16) | (ch(8) << 8) | ch(0);
        }
    }
}

/// Pack channels into canonical ARGB.
#[inline]
pub(crate) const fn argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Number of blocks along each axis for a `bw` × `bh` footprint.
#[inline]
pub(crate) const fn block_grid(width: u32, height: u32, bw: usize, bh: usize) -> (usize, usize) {
    (
        (width as usize).div_ceil(bw),
        (height as usize).div_ceil(bh),
    )
}

/// Decode a row-major grid of fixed-size blocks.
///
/// `decode_block` receives one encoded block and fills a `bw * bh` tile.
/// `data` must hold every block of the grid.
pub(crate) fn decode_blocks<F>(
    width: u32,
    height: u32,
    data: &[u8],
    (bw, bh): (usize, usize),
    block_bytes: usize,
    mut decode_block: F,
) -> Raster
where
    F: FnMut(&[u8], &mut [u32]),
{
    let (nx, ny) = block_grid(width, height, bw, bh);
    let mut raster = Raster::new(width, height);
    let mut tile = vec![0u32; bw * bh];
    for (i, block) in data.chunks_exact(block_bytes).take(nx * ny).enumerate() {
        decode_block(block, &mut tile);
        raster.put_tile(i % nx, i / nx, bw, bh, &tile);
    }
    raster
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::OutOfRange);
    }
    Ok(())
}

/// Bytes one mip level occupies for `format` at `width` × `height`.
///
/// `stride` is the row pitch of linear formats (`0` means tightly packed)
/// and is ignored for compressed ones.
pub fn expected_size(format: &PixelFormat, width: u32, height: u32, stride: usize) -> Result<usize> {
    check_dimensions(width, height)?;
    let (w, h) = (width as usize, height as usize);
    match format.kind {
        FormatKind::Linear(f) => {
            let bpp = f.bytes_per_pixel();
            let stride = if stride == 0 { w * bpp } else { stride };
            if stride < w * bpp || stride > w * 16 {
                return Err(Error::OutOfRange);
            }
            Ok(stride * h)
        }
        FormatKind::Compressed(CompressedFormat::Pvrtc { two_bpp, .. })
        | FormatKind::Compressed(CompressedFormat::Pvrtc2 { two_bpp }) => {
            Ok(pvrtc::expected_size(width, height, two_bpp))
        }
        FormatKind::Compressed(c) => {
            let (bw, bh) = c.block_dims();
            let (nx, ny) = block_grid(width, height, bw, bh);
            Ok(nx * ny * c.block_bytes())
        }
    }
}

/// Decode one mip level.
pub fn decode(
    format: &PixelFormat,
    width: u32,
    height: u32,
    data: &[u8],
    stride: usize,
) -> Result<Raster> {
    let expected = expected_size(format, width, height, stride)?;
    if data.len() != expected {
        return Err(Error::SizeMismatch {
            expected,
            got: data.len(),
        });
    }
    trace!(format = format.name(), width, height, "decoding texture");

    let raster = match format.kind {
        FormatKind::Linear(f) => {
            let stride = if stride == 0 {
                width as usize * f.bytes_per_pixel()
            } else {
                stride
            };
            linear::decode(f, width, height, data, stride)
        }
        FormatKind::Compressed(c) => {
            use CompressedFormat::*;
            match c {
                Bc1 => s3tc::decode_bc1(width, height, data, format.alpha != AlphaMode::Opaque),
                Bc2 => {
                    let mut r = s3tc::decode_bc2(width, height, data);
                    if format.alpha == AlphaMode::Premultiplied {
                        r.unpremultiply();
                    }
                    r
                }
                Bc3 => {
                    let mut r = s3tc::decode_bc3(width, height, data);
                    if format.alpha == AlphaMode::Premultiplied {
                        r.unpremultiply();
                    }
                    r
                }
                Bc4 => s3tc::decode_bc4(width, height, data),
                Bc5 => s3tc::decode_bc5(width, height, data),
                Latc1 => s3tc::decode_latc1(width, height, data),
                Latc2 => s3tc::decode_latc2(width, height, data),
                Bc7 => bc7::decode(width, height, data),
                Etc1 => etc::decode_etc1(width, height, data),
                Etc2Rgb => etc::decode_etc2_rgb(width, height, data),
                Etc2RgbA1 => etc::decode_etc2_rgb_a1(width, height, data),
                Etc2Rgba => etc::decode_etc2_rgba(width, height, data),
                EacR11 => etc::decode_eac_r11(width, height, data),
                EacRg11 => etc::decode_eac_rg11(width, height, data),
                Pvrtc { two_bpp, alpha } => pvrtc::decode_v1(width, height, data, two_bpp, alpha),
                Pvrtc2 { two_bpp } => pvrtc::decode_v2(width, height, data, two_bpp),
                Astc { block_w, block_h } => {
                    astc::decode(width, height, data, block_w as usize, block_h as usize)
                }
            }
        }
    };
    Ok(raster)
}

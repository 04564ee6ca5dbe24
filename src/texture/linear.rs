//! Uncompressed pixel layouts.
//!
//! Every pixel is read as a little-endian integer of the format's width and
//! converted channel by channel. Channel expansion replicates the high
//! bits into the low bits, so full-scale values map to 255.

use super::{LinearFormat, Raster, argb};

#[inline]
const fn x1(v: u32) -> u8 {
    if v & 1 != 0 { 0xFF } else { 0 }
}

#[inline]
const fn x2(v: u32) -> u8 {
    ((v & 3) * 0x55) as u8
}

#[inline]
const fn x3(v: u32) -> u8 {
    let v = v & 7;
    ((v << 5) | (v << 2) | (v >> 1)) as u8
}

#[inline]
const fn x4(v: u32) -> u8 {
    ((v & 0xF) * 0x11) as u8
}

#[inline]
const fn x5(v: u32) -> u8 {
    let v = v & 0x1F;
    ((v << 3) | (v >> 2)) as u8
}

#[inline]
const fn x6(v: u32) -> u8 {
    let v = v & 0x3F;
    ((v << 2) | (v >> 4)) as u8
}

#[inline]
const fn x8(v: u32) -> u8 {
    (v & 0xFF) as u8
}

#[inline]
const fn x10(v: u32) -> u8 {
    ((v & 0x3FF) >> 2) as u8
}

/// Shared-exponent RGB: 9-bit mantissas, 5-bit exponent with bias 15.
fn rgb9e5(px: u32) -> u32 {
    let exp = (px >> 27) as i32 - 15 - 9;
    let scale = 2f32.powi(exp);
    let ch = |m: u32| ((m & 0x1FF) as f32 * scale).clamp(0.0, 1.0) * 255.0 + 0.5;
    argb(
        0xFF,
        ch(px) as u8,
        ch(px >> 9) as u8,
        ch(px >> 18) as u8,
    )
}

/// Convert one pixel value to ARGB.
pub fn pixel_to_argb(format: LinearFormat, px: u32) -> u32 {
    use LinearFormat::*;
    match format {
        L8 => argb(0xFF, x8(px), x8(px), x8(px)),
        A4L4 => {
            let l = x4(px);
            argb(x4(px >> 4), l, l, l)
        }
        A8 => argb(x8(px), 0, 0, 0),
        R8 => argb(0xFF, x8(px), 0, 0),

        ARGB1555 => argb(x1(px >> 15), x5(px >> 10), x5(px >> 5), x5(px)),
        ABGR1555 => argb(x1(px >> 15), x5(px), x5(px >> 5), x5(px >> 10)),
        RGBA5551 => argb(x1(px), x5(px >> 11), x5(px >> 6), x5(px >> 1)),
        BGRA5551 => argb(x1(px), x5(px >> 1), x5(px >> 6), x5(px >> 11)),
        RGB565 => argb(0xFF, x5(px >> 11), x6(px >> 5), x5(px)),
        BGR565 => argb(0xFF, x5(px), x6(px >> 5), x5(px >> 11)),
        RGB555 => argb(0xFF, x5(px >> 10), x5(px >> 5), x5(px)),
        BGR555 => argb(0xFF, x5(px), x5(px >> 5), x5(px >> 10)),
        ARGB4444 => argb(x4(px >> 12), x4(px >> 8), x4(px >> 4), x4(px)),
        ABGR4444 => argb(x4(px >> 12), x4(px), x4(px >> 4), x4(px >> 8)),
        RGBA4444 => argb(x4(px), x4(px >> 12), x4(px >> 8), x4(px >> 4)),
        BGRA4444 => argb(x4(px), x4(px >> 4), x4(px >> 8), x4(px >> 12)),
        xRGB4444 => argb(0xFF, x4(px >> 8), x4(px >> 4), x4(px)),
        xBGR4444 => argb(0xFF, x4(px), x4(px >> 4), x4(px >> 8)),
        RGBx4444 => argb(0xFF, x4(px >> 12), x4(px >> 8), x4(px >> 4)),
        BGRx4444 => argb(0xFF, x4(px >> 4), x4(px >> 8), x4(px >> 12)),
        ARGB8332 => argb(x8(px >> 8), x3(px >> 5), x3(px >> 2), x2(px)),
        L16 => {
            let l = x8(px >> 8);
            argb(0xFF, l, l, l)
        }
        A8L8 => argb(x8(px >> 8), x8(px), x8(px), x8(px)),
        GR88 => argb(0xFF, x8(px), x8(px >> 8), 0),

        RGB888 | xRGB8888 => 0xFF00_0000 | (px & 0x00FF_FFFF),
        BGR888 | xBGR8888 => argb(0xFF, x8(px), x8(px >> 8), x8(px >> 16)),
        ARGB8888 => px,
        ABGR8888 => argb(x8(px >> 24), x8(px), x8(px >> 8), x8(px >> 16)),
        RGBA8888 => argb(x8(px), x8(px >> 24), x8(px >> 16), x8(px >> 8)),
        BGRA8888 => argb(x8(px), x8(px >> 8), x8(px >> 16), x8(px >> 24)),
        G16R16 => argb(0xFF, x8(px >> 8), x8(px >> 24), 0),
        A2R10G10B10 => argb(x2(px >> 30), x10(px >> 20), x10(px >> 10), x10(px)),
        A2B10G10R10 => argb(x2(px >> 30), x10(px), x10(px >> 10), x10(px >> 20)),
        RGB9_E5 => rgb9e5(px),
    }
}

/// Decode a linear image. `stride` has already been validated against
/// the data length.
pub fn decode(format: LinearFormat, width: u32, height: u32, data: &[u8], stride: usize) -> Raster {
    let bpp = format.bytes_per_pixel();
    let w = width as usize;
    let mut raster = Raster::new(width, height);
    for (y, out) in raster.pixels_mut().chunks_exact_mut(w).enumerate() {
        let row = &data[y * stride..y * stride + w * bpp];
        for (px, src) in out.iter_mut().zip(row.chunks_exact(bpp)) {
            let mut word = [0u8; 4];
            word[..bpp].copy_from_slice(src);
            *px = pixel_to_argb(format, u32::from_le_bytes(word));
        }
    }
    raster
}

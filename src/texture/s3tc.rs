//! S3TC / RGTC / LATC block decoders.
//!
//! ```text
//! BC1 (8 bytes)     color0 u16 | color1 u16 | indices u32 (2 bits/pixel)
//! BC2 (16 bytes)    alpha u64 (4 bits/pixel) | BC1 colour block
//! BC3 (16 bytes)    BC4 alpha block | BC1 colour block
//! BC4 (8 bytes)     value0 u8 | value1 u8 | indices 48 bits (3 bits/pixel)
//! BC5 (16 bytes)    BC4 red block | BC4 green block
//! ```
//!
//! Pixels within a block are stored row-major, least significant bits
//! first. Colour blocks inside BC2/BC3 always use the four-colour palette.

use super::{Raster, argb, decode_blocks};

const BLOCK: (usize, usize) = (4, 4);

fn rgb565(c: u16) -> [u8; 3] {
    let r5 = ((c >> 11) & 0x1F) as u8;
    let g6 = ((c >> 5) & 0x3F) as u8;
    let b5 = (c & 0x1F) as u8;
    [(r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2)]
}

#[inline]
fn lerp(a: u8, b: u8, num: u32, den: u32) -> u8 {
    ((a as u32 * (den - num) + b as u32 * num) / den) as u8
}

fn lerp3(a: [u8; 3], b: [u8; 3], num: u32, den: u32) -> [u8; 3] {
    [
        lerp(a[0], b[0], num, den),
        lerp(a[1], b[1], num, den),
        lerp(a[2], b[2], num, den),
    ]
}

/// Colour palette of a BC1-style block as ARGB.
///
/// `three_colour` enables the `color0 <= color1` mode with a transparent
/// fourth entry; `punch_alpha` controls whether that entry is transparent
/// or opaque black.
fn colour_palette(block: &[u8], three_colour: bool, punch_alpha: bool) -> [u32; 4] {
    let c0 = u16::from_le_bytes([block[0], block[1]]);
    let c1 = u16::from_le_bytes([block[2], block[3]]);
    let (p0, p1) = (rgb565(c0), rgb565(c1));
    let pack = |c: [u8; 3]| argb(0xFF, c[0], c[1], c[2]);

    if c0 > c1 || !three_colour {
        [
            pack(p0),
            pack(p1),
            pack(lerp3(p0, p1, 1, 3)),
            pack(lerp3(p0, p1, 2, 3)),
        ]
    } else {
        let last = if punch_alpha { 0 } else { 0xFF00_0000 };
        [pack(p0), pack(p1), pack(lerp3(p0, p1, 1, 2)), last]
    }
}

fn colour_indices(block: &[u8]) -> u32 {
    u32::from_le_bytes([block[4], block[5], block[6], block[7]])
}

/// Eight-entry palette of a BC4 / BC3-alpha block.
fn value_palette(v0: u8, v1: u8) -> [u8; 8] {
    let mut p = [v0, v1, 0, 0, 0, 0, 0, 0];
    if v0 > v1 {
        for i in 1..7 {
            p[i as usize + 1] = lerp(v0, v1, i, 7);
        }
    } else {
        for i in 1..5 {
            p[i as usize + 1] = lerp(v0, v1, i, 5);
        }
        p[6] = 0;
        p[7] = 255;
    }
    p
}

/// Decode an 8-byte BC4 block into 16 values.
fn decode_values(block: &[u8]) -> [u8; 16] {
    let palette = value_palette(block[0], block[1]);
    let mut bits = [0u8; 8];
    bits[..6].copy_from_slice(&block[2..8]);
    let bits = u64::from_le_bytes(bits);
    let mut out = [0u8; 16];
    for (i, v) in out.iter_mut().enumerate() {
        *v = palette[((bits >> (3 * i)) & 7) as usize];
    }
    out
}

/// BC1 (DXT1). `alpha` selects the 1-bit transparency path.
pub fn decode_bc1(width: u32, height: u32, data: &[u8], alpha: bool) -> Raster {
    decode_blocks(width, height, data, BLOCK, 8, |block, tile| {
        let palette = colour_palette(block, true, alpha);
        let idx = colour_indices(block);
        for (i, px) in tile.iter_mut().enumerate() {
            *px = palette[((idx >> (2 * i)) & 3) as usize];
        }
    })
}

/// BC2 (DXT2/DXT3), explicit 4-bit alpha.
pub fn decode_bc2(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, BLOCK, 16, |block, tile| {
        let mut ab = [0u8; 8];
        ab.copy_from_slice(&block[..8]);
        let alpha = u64::from_le_bytes(ab);
        let colour = &block[8..];
        let palette = colour_palette(colour, false, false);
        let idx = colour_indices(colour);
        for (i, px) in tile.iter_mut().enumerate() {
            let a = ((alpha >> (4 * i)) & 0xF) as u32 * 17;
            *px = (a << 24) | (palette[((idx >> (2 * i)) & 3) as usize] & 0x00FF_FFFF);
        }
    })
}

/// BC3 (DXT4/DXT5), interpolated alpha.
pub fn decode_bc3(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, BLOCK, 16, |block, tile| {
        let alpha = decode_values(&block[..8]);
        let colour = &block[8..];
        let palette = colour_palette(colour, false, false);
        let idx = colour_indices(colour);
        for (i, px) in tile.iter_mut().enumerate() {
            let rgb = palette[((idx >> (2 * i)) & 3) as usize] & 0x00FF_FFFF;
            *px = ((alpha[i] as u32) << 24) | rgb;
        }
    })
}

/// BC4 (RGTC1): red channel only.
pub fn decode_bc4(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, BLOCK, 8, |block, tile| {
        let red = decode_values(block);
        for (px, r) in tile.iter_mut().zip(red) {
            *px = argb(0xFF, r, 0, 0);
        }
    })
}

/// BC5 (RGTC2): red and green channels.
pub fn decode_bc5(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, BLOCK, 16, |block, tile| {
        let red = decode_values(&block[..8]);
        let green = decode_values(&block[8..]);
        for (i, px) in tile.iter_mut().enumerate() {
            *px = argb(0xFF, red[i], green[i], 0);
        }
    })
}

/// LATC1: BC4 data as luminance.
pub fn decode_latc1(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, BLOCK, 8, |block, tile| {
        let l = decode_values(block);
        for (px, l) in tile.iter_mut().zip(l) {
            *px = argb(0xFF, l, l, l);
        }
    })
}

/// LATC2: BC5 data as luminance plus alpha.
pub fn decode_latc2(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, BLOCK, 16, |block, tile| {
        let l = decode_values(&block[..8]);
        let a = decode_values(&block[8..]);
        for (i, px) in tile.iter_mut().enumerate() {
            *px = argb(a[i], l[i], l[i], l[i]);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // color0 = white, color1 = black; rows use index 0, 1, 2, 3.
    const WHITE_BLACK_ROWS: [u8; 8] = [0xFF, 0xFF, 0x00, 0x00, 0x00, 0x55, 0xAA, 0xFF];

    #[test]
    fn bc1_four_colour_rows() {
        let r = decode_bc1(4, 4, &WHITE_BLACK_ROWS, true);
        let rows: Vec<u32> = (0..4).map(|y| r.pixel(0, y).unwrap()).collect();
        assert_eq!(rows, [0xFFFF_FFFF, 0xFF00_0000, 0xFFAA_AAAA, 0xFF55_5555]);
    }

    #[test]
    fn bc1_three_colour_mode_transparency() {
        // color0 = black < color1 = white: index 3 is transparent.
        let block = [0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let r = decode_bc1(4, 4, &block, true);
        assert_eq!(r.pixel(0, 0), Some(0));
        let r = decode_bc1(4, 4, &block, false);
        assert_eq!(r.pixel(0, 0), Some(0xFF00_0000));
    }

    #[test]
    fn bc1_clips_partial_blocks() {
        let r = decode_bc1(3, 2, &WHITE_BLACK_ROWS, true);
        assert_eq!(r.pixels().len(), 6);
        assert_eq!(r.pixel(2, 1), Some(0xFF00_0000));
    }

    #[test]
    fn bc2_explicit_alpha() {
        let mut block = [0u8; 16];
        block[0] = 0xF0; // pixel 0 alpha 0, pixel 1 alpha 15
        block[8..].copy_from_slice(&WHITE_BLACK_ROWS);
        let r = decode_bc2(4, 4, &block);
        assert_eq!(r.pixel(0, 0), Some(0x00FF_FFFF));
        assert_eq!(r.pixel(1, 0), Some(0xFFFF_FFFF));
    }

    #[test]
    fn bc3_alpha_palette() {
        let mut block = [0u8; 16];
        block[0] = 0xFF;
        block[1] = 0x00;
        // pixel 0 index 2, pixel 1 index 7
        let bits: u64 = 2 | (7 << 3);
        block[2..8].copy_from_slice(&bits.to_le_bytes()[..6]);
        block[8..].copy_from_slice(&WHITE_BLACK_ROWS);
        let r = decode_bc3(4, 4, &block);
        assert_eq!(r.pixel(0, 0).unwrap() >> 24, 218);
        assert_eq!(r.pixel(1, 0).unwrap() >> 24, 36);
    }

    #[test]
    fn bc4_six_value_mode_has_extremes() {
        let mut block = [0u8; 8];
        block[0] = 10;
        block[1] = 200;
        let bits: u64 = 6 | (7 << 3);
        block[2..8].copy_from_slice(&bits.to_le_bytes()[..6]);
        let r = decode_bc4(4, 4, &block);
        assert_eq!(r.pixel(0, 0), Some(0xFF00_0000));
        assert_eq!(r.pixel(1, 0), Some(0xFFFF_0000));
        let l = decode_latc1(4, 4, &block);
        assert_eq!(l.pixel(1, 0), Some(0xFFFF_FFFF));
    }
}

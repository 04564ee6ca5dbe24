//! ETC1, ETC2 and EAC block decoders.
//!
//! Blocks are 4×4 pixels stored as big-endian 64-bit words. Pixel indices
//! are column-major: pixel (x, y) uses bit `x * 4 + y`.
//!
//! ```text
//! ETC1/ETC2 colour block, bits 63..32:
//!   individual:   R1:4 R2:4 G1:4 G2:4 B1:4 B2:4 cw1:3 cw2:3 diff:1 flip:1
//!   differential: R:5 dR:3  G:5 dG:3  B:5 dB:3  cw1:3 cw2:3 diff:1 flip:1
//! bits 31..16: index MSBs, bits 15..0: index LSBs
//!
//! EAC block:  base:8 mult:4 table:4 | 16 × 3-bit indices, MSB first
//! ```
//!
//! ETC2 reuses the differential encoding: when a base-plus-delta channel
//! overflows 0..31 the block is in T mode (red), H mode (green) or planar
//! mode (blue) instead.

use super::{Raster, argb, decode_blocks};

const BLOCK: (usize, usize) = (4, 4);

const MODIFIERS: [[i32; 2]; 8] = [
    [2, 8],
    [5, 17],
    [9, 29],
    [13, 42],
    [18, 60],
    [24, 80],
    [33, 106],
    [47, 183],
];

const T_H_DISTANCES: [i32; 8] = [3, 6, 11, 16, 23, 32, 41, 64];

const EAC_MODIFIERS: [[i32; 8]; 16] = [
    [-3, -6, -9, -15, 2, 5, 8, 14],
    [-3, -7, -10, -13, 2, 6, 9, 12],
    [-2, -5, -8, -13, 1, 4, 7, 12],
    [-2, -4, -6, -13, 1, 3, 5, 12],
    [-3, -6, -8, -12, 2, 5, 7, 11],
    [-3, -7, -9, -11, 2, 6, 8, 10],
    [-4, -7, -8, -11, 3, 6, 7, 10],
    [-3, -5, -8, -11, 2, 4, 7, 10],
    [-2, -6, -8, -10, 1, 5, 7, 9],
    [-2, -5, -8, -10, 1, 4, 7, 9],
    [-2, -4, -8, -10, 1, 3, 7, 9],
    [-2, -5, -7, -10, 1, 4, 6, 9],
    [-3, -4, -7, -10, 2, 3, 6, 9],
    [-1, -2, -3, -10, 0, 1, 2, 9],
    [-4, -6, -8, -9, 3, 5, 7, 8],
    [-3, -5, -7, -9, 2, 4, 6, 8],
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Variant {
    Etc1,
    Etc2,
    /// ETC2 with punch-through alpha; the diff bit is the opaque flag.
    Etc2A1,
}

#[inline]
fn clamp8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
fn ext4(v: u32) -> i32 {
    ((v & 0xF) * 0x11) as i32
}

#[inline]
fn ext5(v: u32) -> i32 {
    let v = v & 0x1F;
    ((v << 3) | (v >> 2)) as i32
}

#[inline]
fn ext6(v: u32) -> i32 {
    let v = v & 0x3F;
    ((v << 2) | (v >> 4)) as i32
}

#[inline]
fn ext7(v: u32) -> i32 {
    let v = v & 0x7F;
    ((v << 1) | (v >> 6)) as i32
}

/// Sign-extend a 3-bit delta.
#[inline]
fn delta3(v: u32) -> i32 {
    ((v & 7) as i32 ^ 4) - 4
}

fn rgb(c: [i32; 3]) -> u32 {
    argb(0xFF, clamp8(c[0]), clamp8(c[1]), clamp8(c[2]))
}

fn add(c: [i32; 3], d: i32) -> [i32; 3] {
    [c[0] + d, c[1] + d, c[2] + d]
}

/// Decode one ETC colour block into a 4×4 ARGB tile (row-major).
fn decode_colour_block(block: &[u8], variant: Variant, tile: &mut [u32]) {
    let b = block;
    let hi = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
    let lo = u32::from_be_bytes([b[4], b[5], b[6], b[7]]);
    let diff = hi & 2 != 0;
    let flip = hi & 1 != 0;

    // Punch-through blocks have no individual mode.
    let differential = diff || variant == Variant::Etc2A1;
    let opaque = variant != Variant::Etc2A1 || diff;

    let index_of = |x: usize, y: usize| -> usize {
        let bit = x * 4 + y;
        (((lo >> (16 + bit)) & 1) << 1 | ((lo >> bit) & 1)) as usize
    };

    let (base1, base2) = if differential {
        let r = (hi >> 27) & 0x1F;
        let g = (hi >> 19) & 0x1F;
        let bl = (hi >> 11) & 0x1F;
        let r2 = r as i32 + delta3(hi >> 24);
        let g2 = g as i32 + delta3(hi >> 16);
        let b2 = bl as i32 + delta3(hi >> 8);

        if variant != Variant::Etc1 {
            if !(0..=31).contains(&r2) {
                return decode_t_mode(b, lo, opaque, tile);
            }
            if !(0..=31).contains(&g2) {
                return decode_h_mode(b, lo, opaque, tile);
            }
            if !(0..=31).contains(&b2) {
                return decode_planar(hi, lo, tile);
            }
        }
        (
            [ext5(r), ext5(g), ext5(bl)],
            [
                ext5(r2 as u32),
                ext5(g2 as u32),
                ext5(b2 as u32),
            ],
        )
    } else {
        (
            [ext4(hi >> 28), ext4(hi >> 20), ext4(hi >> 12)],
            [ext4(hi >> 24), ext4(hi >> 16), ext4(hi >> 8)],
        )
    };

    let tables = [
        MODIFIERS[((hi >> 5) & 7) as usize],
        MODIFIERS[((hi >> 2) & 7) as usize],
    ];

    for y in 0..4 {
        for x in 0..4 {
            let second = if flip { y >= 2 } else { x >= 2 };
            let (base, table) = if second {
                (base2, tables[1])
            } else {
                (base1, tables[0])
            };
            let idx = index_of(x, y);
            tile[y * 4 + x] = if !opaque && idx == 2 {
                0
            } else {
                let m = match idx {
                    0 if !opaque => 0,
                    0 => table[0],
                    1 => table[1],
                    2 => -table[0],
                    _ => -table[1],
                };
                rgb(add(base, m))
            };
        }
    }
}

fn paint_tile(lo: u32, paint: [u32; 4], opaque: bool, tile: &mut [u32]) {
    for y in 0..4 {
        for x in 0..4 {
            let bit = x * 4 + y;
            let idx = (((lo >> (16 + bit)) & 1) << 1 | ((lo >> bit) & 1)) as usize;
            tile[y * 4 + x] = if !opaque && idx == 2 { 0 } else { paint[idx] };
        }
    }
}

fn decode_t_mode(b: &[u8], lo: u32, opaque: bool, tile: &mut [u32]) {
    let (b0, b1, b2, b3) = (b[0] as u32, b[1] as u32, b[2] as u32, b[3] as u32);
    let c1 = [
        ext4((((b0 >> 3) & 3) << 2) | (b0 & 3)),
        ext4(b1 >> 4),
        ext4(b1),
    ];
    let c2 = [ext4(b2 >> 4), ext4(b2), ext4(b3 >> 4)];
    let d = T_H_DISTANCES[((((b3 >> 2) & 3) << 1) | (b3 & 1)) as usize];
    let paint = [rgb(c1), rgb(add(c2, d)), rgb(c2), rgb(add(c2, -d))];
    paint_tile(lo, paint, opaque, tile);
}

fn decode_h_mode(b: &[u8], lo: u32, opaque: bool, tile: &mut [u32]) {
    let (b0, b1, b2, b3) = (b[0] as u32, b[1] as u32, b[2] as u32, b[3] as u32);
    let r1 = (b0 >> 3) & 0xF;
    let g1 = ((b0 & 7) << 1) | ((b1 >> 4) & 1);
    let bl1 = (b1 & 8) | ((b1 & 3) << 1) | (b2 >> 7);
    let r2 = (b2 >> 3) & 0xF;
    let g2 = ((b2 & 7) << 1) | (b3 >> 7);
    let bl2 = (b3 >> 3) & 0xF;

    let v1 = (r1 << 8) | (g1 << 4) | bl1;
    let v2 = (r2 << 8) | (g2 << 4) | bl2;
    let di = (b3 & 4) | ((b3 & 1) << 1) | (v1 >= v2) as u32;
    let d = T_H_DISTANCES[di as usize];

    let c1 = [ext4(r1), ext4(g1), ext4(bl1)];
    let c2 = [ext4(r2), ext4(g2), ext4(bl2)];
    let paint = [
        rgb(add(c1, d)),
        rgb(add(c1, -d)),
        rgb(add(c2, d)),
        rgb(add(c2, -d)),
    ];
    paint_tile(lo, paint, opaque, tile);
}

fn decode_planar(hi: u32, lo: u32, tile: &mut [u32]) {
    let word = ((hi as u64) << 32) | lo as u64;
    let bits = |msb: u32, len: u32| ((word >> (msb + 1 - len)) & ((1 << len) - 1)) as u32;

    let ro = ext6(bits(62, 6));
    let go = ext7((bits(56, 1) << 6) | bits(54, 6));
    let bo = ext6((bits(48, 1) << 5) | (bits(44, 2) << 3) | bits(41, 3));
    let rh = ext6((bits(38, 5) << 1) | bits(32, 1));
    let gh = ext7(bits(31, 7));
    let bh = ext6(bits(24, 6));
    let rv = ext6(bits(18, 6));
    let gv = ext7(bits(12, 7));
    let bv = ext6(bits(5, 6));

    let interp = |o: i32, h: i32, v: i32, x: i32, y: i32| {
        clamp8((x * (h - o) + y * (v - o) + 4 * o + 2) >> 2)
    };
    for y in 0..4 {
        for x in 0..4 {
            let (xi, yi) = (x as i32, y as i32);
            tile[y * 4 + x] = argb(
                0xFF,
                interp(ro, rh, rv, xi, yi),
                interp(go, gh, gv, xi, yi),
                interp(bo, bh, bv, xi, yi),
            );
        }
    }
}

/// Decode an EAC block to 16 row-major values.
///
/// `eleven_bit` selects the R11/RG11 reconstruction, whose 11-bit result
/// is reduced to 8 bits.
fn decode_eac(block: &[u8], eleven_bit: bool) -> [u8; 16] {
    let word = u64::from_be_bytes([
        block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
    ]);
    let base = (word >> 56) as i32;
    let mult = ((word >> 52) & 0xF) as i32;
    let table = &EAC_MODIFIERS[((word >> 48) & 0xF) as usize];

    let mut out = [0u8; 16];
    for x in 0..4 {
        for y in 0..4 {
            let i = x * 4 + y;
            let idx = ((word >> (45 - 3 * i)) & 7) as usize;
            let m = table[idx];
            out[y * 4 + x] = if eleven_bit {
                let scale = if mult == 0 { 1 } else { mult * 8 };
                let v = (base * 8 + 4 + m * scale).clamp(0, 2047);
                (v >> 3) as u8
            } else {
                clamp8(base + m * mult)
            };
        }
    }
    out
}

pub fn decode_etc1(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, BLOCK, 8, |block, tile| {
        decode_colour_block(block, Variant::Etc1, tile)
    })
}

pub fn decode_etc2_rgb(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, BLOCK, 8, |block, tile| {
        decode_colour_block(block, Variant::Etc2, tile)
    })
}

/// ETC2 with 1-bit punch-through alpha.
pub fn decode_etc2_rgb_a1(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, BLOCK, 8, |block, tile| {
        decode_colour_block(block, Variant::Etc2A1, tile)
    })
}

/// ETC2 colour with an EAC alpha block in front.
pub fn decode_etc2_rgba(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, BLOCK, 16, |block, tile| {
        let alpha = decode_eac(&block[..8], false);
        decode_colour_block(&block[8..], Variant::Etc2, tile);
        for (px, a) in tile.iter_mut().zip(alpha) {
            *px = (*px & 0x00FF_FFFF) | ((a as u32) << 24);
        }
    })
}

/// EAC R11 (unsigned; signed data decodes through the same path).
pub fn decode_eac_r11(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, BLOCK, 8, |block, tile| {
        let red = decode_eac(block, true);
        for (px, r) in tile.iter_mut().zip(red) {
            *px = argb(0xFF, r, 0, 0);
        }
    })
}

/// EAC RG11: a red block followed by a green block.
pub fn decode_eac_rg11(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, BLOCK, 16, |block, tile| {
        let red = decode_eac(&block[..8], true);
        let green = decode_eac(&block[8..], true);
        for (i, px) in tile.iter_mut().enumerate() {
            *px = argb(0xFF, red[i], green[i], 0);
        }
    })
}

//! PVRTC-I and PVRTC-II decoders.
//!
//! A PVRTC image is a grid of 64-bit words in Morton (twiddled) order, one
//! per 4×4 (4 bpp) or 8×4 (2 bpp) block:
//!
//! ```text
//! bits  0..31   modulation data
//! bits 32..63   colour data
//!   bit 0        modulation mode
//!   bits 1..15   colour A (bit 15: opaque flag in PVRTC-I, hard flag in -II)
//!   bits 16..31  colour B (bit 31: opaque flag; in -II it covers both)
//! ```
//!
//! Each pixel blends two low-resolution images, A and B, bilinearly
//! upscaled from the block colours, by its modulation weight. The encoded
//! data always covers power-of-two dimensions no smaller than the minimum
//! block grid; other sizes are padded up and cropped after decoding.

use super::{Raster, argb};

/// Padded dimensions the encoded data covers.
fn padded_dims(width: u32, height: u32, two_bpp: bool) -> (usize, usize) {
    let w = (width as usize).next_power_of_two();
    let h = (height as usize).next_power_of_two();
    if two_bpp {
        (w.max(16), h.max(8))
    } else {
        (w.max(8), h.max(8))
    }
}

pub fn expected_size(width: u32, height: u32, two_bpp: bool) -> usize {
    let (w, h) = padded_dims(width, height, two_bpp);
    if two_bpp { w * h / 4 } else { w * h / 2 }
}

/// Morton index of block (`x`, `y`) in a `w` × `h` block grid.
fn twiddle(w: usize, h: usize, x: usize, y: usize) -> usize {
    let (min_dim, mut rest) = if h < w { (h, x) } else { (w, y) };
    let mut out = 0;
    let mut src = 1;
    let mut dst = 1;
    let mut shift = 0;
    while src < min_dim {
        if y & src != 0 {
            out |= dst;
        }
        if x & src != 0 {
            out |= dst << 1;
        }
        src <<= 1;
        dst <<= 2;
        shift += 1;
    }
    rest >>= shift;
    out | (rest << (2 * shift))
}

#[inline]
fn ext3(v: u32) -> i32 {
    let v = v & 7;
    ((v << 5) | (v << 2) | (v >> 1)) as i32
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

#[derive(Clone, Copy)]
struct Block {
    modulation: u32,
    /// ARGB channels of colour A and B, 8 bits each.
    a: [i32; 4],
    b: [i32; 4],
    mode: bool,
    hard: bool,
}

impl Block {
    fn parse(modulation: u32, colour: u32, v2: bool) -> Self {
        let (opaque_a, opaque_b, hard) = if v2 {
            let o = colour & 0x8000_0000 != 0;
            (o, o, colour & 0x8000 != 0)
        } else {
            (colour & 0x8000 != 0, colour & 0x8000_0000 != 0, false)
        };

        let a = if opaque_a {
            [0xFF, ext5(colour >> 10), ext5(colour >> 5), ext4(colour >> 1)]
        } else {
            [
                ext3(colour >> 12),
                ext4(colour >> 8),
                ext4(colour >> 4),
                ext3(colour >> 1),
            ]
        };
        let b = if opaque_b {
            [0xFF, ext5(colour >> 26), ext5(colour >> 21), ext5(colour >> 16)]
        } else {
            [
                ext3(colour >> 28),
                ext4(colour >> 24),
                ext4(colour >> 20),
                ext4(colour >> 16),
            ]
        };
        Block {
            modulation,
            a,
            b,
            mode: colour & 1 != 0,
            hard,
        }
    }
}

// Per-pixel modulation: 0..=8 in eighths, or a marker asking for
// interpolation from the neighbours.
const INTERP_BOTH: i8 = -1;
const INTERP_H: i8 = -2;
const INTERP_V: i8 = -3;

const STANDARD: [i8; 4] = [0, 3, 5, 8];

struct Grid {
    pw: usize,
    ph: usize,
    bw: usize,
    bh: usize,
    nbx: usize,
    nby: usize,
    blocks: Vec<Block>,
}

impl Grid {
    fn block(&self, bx: usize, by: usize) -> &Block {
        &self.blocks[by * self.nbx + bx]
    }

    /// Fill per-pixel weights and punch-through flags.
    fn modulation(&self) -> (Vec<i8>, Vec<bool>) {
        let mut weights = vec![0i8; self.pw * self.ph];
        let mut punch = vec![false; self.pw * self.ph];
        for by in 0..self.nby {
            for bx in 0..self.nbx {
                let blk = self.block(bx, by);
                let mut bits = blk.modulation;
                let two_bpp = self.bw == 8;

                // 2 bpp interpolated blocks borrow bits 0 and 20 as flags.
                let mut interp = INTERP_BOTH;
                if two_bpp && blk.mode {
                    if bits & 1 != 0 {
                        interp = if bits & (1 << 20) != 0 { INTERP_V } else { INTERP_H };
                        if bits & (1 << 21) != 0 {
                            bits |= 1 << 20;
                        } else {
                            bits &= !(1 << 20);
                        }
                    }
                    if bits & 2 != 0 {
                        bits |= 1;
                    } else {
                        bits &= !1;
                    }
                }

                for y in 0..self.bh {
                    for x in 0..self.bw {
                        let i = (by * self.bh + y) * self.pw + bx * self.bw + x;
                        weights[i] = if !two_bpp {
                            let v = (bits >> (2 * (y * 4 + x))) & 3;
                            if blk.mode {
                                punch[i] = v == 2;
                                [0, 4, 4, 8][v as usize]
                            } else {
                                STANDARD[v as usize]
                            }
                        } else if !blk.mode {
                            if (bits >> (y * 8 + x)) & 1 != 0 { 8 } else { 0 }
                        } else if (x ^ y) & 1 == 0 {
                            let v = bits & 3;
                            bits >>= 2;
                            STANDARD[v as usize]
                        } else {
                            interp
                        };
                    }
                }
            }
        }

        // Resolve interpolated positions from stored neighbours (wrapping).
        let resolved = weights.clone();
        let at = |x: isize, y: isize| -> i32 {
            let x = x.rem_euclid(self.pw as isize) as usize;
            let y = y.rem_euclid(self.ph as isize) as usize;
            resolved[y * self.pw + x].max(0) as i32
        };
        for y in 0..self.ph {
            for x in 0..self.pw {
                let i = y * self.pw + x;
                let (xi, yi) = (x as isize, y as isize);
                weights[i] = match weights[i] {
                    INTERP_BOTH => {
                        ((at(xi - 1, yi) + at(xi + 1, yi) + at(xi, yi - 1) + at(xi, yi + 1) + 2)
                            / 4) as i8
                    }
                    INTERP_H => ((at(xi - 1, yi) + at(xi + 1, yi) + 1) / 2) as i8,
                    INTERP_V => ((at(xi, yi - 1) + at(xi, yi + 1) + 1) / 2) as i8,
                    w => w,
                };
            }
        }
        (weights, punch)
    }

    /// Bilinearly upscaled colours A and B at pixel (`x`, `y`).
    fn colours(&self, x: usize, y: usize) -> ([i32; 4], [i32; 4]) {
        let own = self.block(x / self.bw, y / self.bh);
        if own.hard {
            return (own.a, own.b);
        }

        let sx = x + self.pw - self.bw / 2;
        let sy = y + self.ph - self.bh / 2;
        let bx0 = (sx / self.bw) % self.nbx;
        let by0 = (sy / self.bh) % self.nby;
        let bx1 = (bx0 + 1) % self.nbx;
        let by1 = (by0 + 1) % self.nby;
        let fx = (sx % self.bw) as i32;
        let fy = (sy % self.bh) as i32;
        let (bw, bh) = (self.bw as i32, self.bh as i32);

        let corners = [
            (self.block(bx0, by0), (bw - fx) * (bh - fy)),
            (self.block(bx1, by0), fx * (bh - fy)),
            (self.block(bx0, by1), (bw - fx) * fy),
            (self.block(bx1, by1), fx * fy),
        ];
        let mut a = [0i32; 4];
        let mut b = [0i32; 4];
        for (blk, w) in corners {
            for c in 0..4 {
                a[c] += blk.a[c] * w;
                b[c] += blk.b[c] * w;
            }
        }
        let total = bw * bh;
        for c in 0..4 {
            a[c] /= total;
            b[c] /= total;
        }
        (a, b)
    }
}

fn decode_common(width: u32, height: u32, data: &[u8], two_bpp: bool, v2: bool) -> Raster {
    let (pw, ph) = padded_dims(width, height, two_bpp);
    let (bw, bh) = if two_bpp { (8, 4) } else { (4, 4) };
    let (nbx, nby) = (pw / bw, ph / bh);

    let mut blocks = Vec::with_capacity(nbx * nby);
    for by in 0..nby {
        for bx in 0..nbx {
            let off = twiddle(nbx, nby, bx, by) * 8;
            let word = |o: usize| {
                u32::from_le_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]])
            };
            blocks.push(Block::parse(word(off), word(off + 4), v2));
        }
    }
    let grid = Grid {
        pw,
        ph,
        bw,
        bh,
        nbx,
        nby,
        blocks,
    };

    let (weights, punch) = grid.modulation();
    let mut raster = Raster::new(width, height);
    let w = width as usize;
    for (i, px) in raster.pixels_mut().iter_mut().enumerate() {
        let (x, y) = (i % w, i / w);
        let (a, b) = grid.colours(x, y);
        let p = y * pw + x;
        let m = weights[p] as i32;
        let mix = |c: usize| ((a[c] * (8 - m) + b[c] * m) / 8).clamp(0, 255) as u8;
        let alpha = if punch[p] { 0 } else { mix(0) };
        *px = argb(alpha, mix(1), mix(2), mix(3));
    }
    raster
}

/// PVRTC-I. Formats without alpha force every pixel opaque.
pub fn decode_v1(width: u32, height: u32, data: &[u8], two_bpp: bool, alpha: bool) -> Raster {
    let mut raster = decode_common(width, height, data, two_bpp, false);
    if !alpha {
        for px in raster.pixels_mut() {
            *px |= 0xFF00_0000;
        }
    }
    raster
}

/// PVRTC-II. Blocks with the hard-transition flag use their own colours
/// without blending into their neighbours.
pub fn decode_v2(width: u32, height: u32, data: &[u8], two_bpp: bool) -> Raster {
    decode_common(width, height, data, two_bpp, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(blocks: usize, modulation: u32, colour: u32) -> Vec<u8> {
        let mut out = Vec::with_capacity(blocks * 8);
        for _ in 0..blocks {
            out.extend_from_slice(&modulation.to_le_bytes());
            out.extend_from_slice(&colour.to_le_bytes());
        }
        out
    }

    // A: opaque black, B: opaque white.
    const BLACK_WHITE: u32 = 0xFFFF_8000;

    #[test]
    fn sizes() {
        assert_eq!(expected_size(1, 1, false), 32);
        assert_eq!(expected_size(1, 1, true), 32);
        assert_eq!(expected_size(64, 32, true), 512);
        assert_eq!(expected_size(60, 30, false), 64 * 32 / 2);
    }

    #[test]
    fn morton_order() {
        assert_eq!(twiddle(2, 2, 0, 1), 1);
        assert_eq!(twiddle(2, 2, 1, 0), 2);
        assert_eq!(twiddle(2, 2, 1, 1), 3);
        assert_eq!(twiddle(4, 2, 2, 0), 4);
    }

    #[test]
    fn modulation_weights_4bpp() {
        let r = decode_v1(8, 8, &uniform(4, 0, BLACK_WHITE), false, true);
        assert!(r.pixels().iter().all(|&p| p == 0xFF00_0000));
        let r = decode_v1(8, 8, &uniform(4, 0xFFFF_FFFF, BLACK_WHITE), false, true);
        assert!(r.pixels().iter().all(|&p| p == 0xFFFF_FFFF));
        // weight 3/8 of 255
        let r = decode_v1(8, 8, &uniform(4, 0x5555_5555, BLACK_WHITE), false, true);
        assert!(r.pixels().iter().all(|&p| p == 0xFF5F_5F5F));
    }

    #[test]
    fn punch_through_clears_alpha() {
        let r = decode_v1(8, 8, &uniform(4, 0xAAAA_AAAA, BLACK_WHITE | 1), false, true);
        assert!(r.pixels().iter().all(|&p| p >> 24 == 0));
        let r = decode_v1(8, 8, &uniform(4, 0xAAAA_AAAA, BLACK_WHITE | 1), false, false);
        assert!(r.pixels().iter().all(|&p| p >> 24 == 0xFF));
    }

    #[test]
    fn two_bpp_direct_modulation() {
        // 16x8 at 2 bpp is a 2x2 block grid; every bit set selects B.
        let r = decode_v1(16, 8, &uniform(4, 0xFFFF_FFFF, BLACK_WHITE), true, true);
        assert!(r.pixels().iter().all(|&p| p == 0xFFFF_FFFF));
    }

    #[test]
    fn crops_to_requested_size() {
        let r = decode_v2(3, 5, &uniform(4, 0, BLACK_WHITE), false);
        assert_eq!((r.width(), r.height()), (3, 5));
        assert_eq!(r.pixels().len(), 15);
    }

    #[test]
    fn non_power_of_two_is_padded_then_cropped() {
        // 12x6 is stored as 16x8, a 4x2 grid of 4bpp blocks
        assert_eq!(expected_size(12, 6, false), 8 * 8);
        let r = decode_v1(12, 6, &uniform(8, 0xFFFF_FFFF, BLACK_WHITE), false, true);
        assert_eq!((r.width(), r.height()), (12, 6));
        assert!(r.pixels().iter().all(|&p| p == 0xFFFF_FFFF));
    }
}

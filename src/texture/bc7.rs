//! BC7 (BPTC) block decoder.
//!
//! Each 16-byte block is read as a little-endian 128-bit integer. The mode
//! is the position of the lowest set bit (0..=7); a block with no bit set
//! in its first byte is reserved and decodes to transparent black.
//!
//! ```text
//! mode | subsets | partition | rotation | idx sel | colour | alpha | pbits      | idx | idx2
//!  0   |    3    |     4     |    -     |    -    |   4    |   -   | per endpt  |  3  |  -
//!  1   |    2    |     6     |    -     |    -    |   6    |   -   | shared     |  3  |  -
//!  2   |    3    |     6     |    -     |    -    |   5    |   -   |     -      |  2  |  -
//!  3   |    2    |     6     |    -     |    -    |   7    |   -   | per endpt  |  2  |  -
//!  4   |    1    |     -     |    2     |    1    |   5    |   6   |     -      |  2  |  3
//!  5   |    1    |     -     |    2     |    -    |   7    |   8   |     -      |  2  |  2
//!  6   |    1    |     -     |    -     |    -    |   7    |   7   | per endpt  |  4  |  -
//!  7   |    2    |     6     |    -     |    -    |   5    |   5   | per endpt  |  2  |  -
//! ```

use super::{Raster, decode_blocks};

struct Mode {
    subsets: usize,
    partition_bits: u32,
    rotation_bits: u32,
    index_selection_bits: u32,
    colour_bits: u32,
    alpha_bits: u32,
    endpoint_pbits: bool,
    shared_pbits: bool,
    index_bits: u32,
    index2_bits: u32,
}

const fn mode(
    subsets: usize,
    partition_bits: u32,
    rotation_bits: u32,
    index_selection_bits: u32,
    colour_bits: u32,
    alpha_bits: u32,
    endpoint_pbits: bool,
    shared_pbits: bool,
    index_bits: u32,
    index2_bits: u32,
) -> Mode {
    Mode {
        subsets,
        partition_bits,
        rotation_bits,
        index_selection_bits,
        colour_bits,
        alpha_bits,
        endpoint_pbits,
        shared_pbits,
        index_bits,
        index2_bits,
    }
}

const MODES: [Mode; 8] = [
    mode(3, 4, 0, 0, 4, 0, true, false, 3, 0),
    mode(2, 6, 0, 0, 6, 0, false, true, 3, 0),
    mode(3, 6, 0, 0, 5, 0, false, false, 2, 0),
    mode(2, 6, 0, 0, 7, 0, true, false, 2, 0),
    mode(1, 0, 2, 1, 5, 6, false, false, 2, 3),
    mode(1, 0, 2, 0, 7, 8, false, false, 2, 2),
    mode(1, 0, 0, 0, 7, 7, true, false, 4, 0),
    mode(2, 6, 0, 0, 5, 5, true, false, 2, 0),
];

/// Two-subset partitions: bit `i` set means pixel `i` is in subset 1.
const PARTITIONS_2: [u16; 64] = [
    0xCCCC, 0x8888, 0xEEEE, 0xECC8, 0xC880, 0xFEEC, 0xFEC8, 0xEC80, 0xC800, 0xFFEC, 0xFE80, 0xE800,
    0xFFE8, 0xFF00, 0xFFF0, 0xF000, 0xF710, 0x008E, 0x7100, 0x08CE, 0x008C, 0x7310, 0x3100, 0x8CCE,
    0x088C, 0x3110, 0x6666, 0x366C, 0x17E8, 0x0FF0, 0x718E, 0x399C, 0xAAAA, 0xF0F0, 0x5A5A, 0x33CC,
    0x3C3C, 0x55AA, 0x9696, 0xA55A, 0x73CE, 0x13C8, 0x324C, 0x3BDC, 0x6996, 0xC33C, 0x9966, 0x0660,
    0x0272, 0x04E4, 0x4E40, 0x2720, 0xC936, 0x936C, 0x39C6, 0x639C, 0x9336, 0x9CC6, 0x817E, 0xE718,
    0xCCF0, 0x0FCC, 0x7744, 0xEE22,
];

#[rustfmt::skip]
const PARTITIONS_3: [[u8; 16]; 64] = [
    [0,0,1,1,0,0,1,1,0,2,2,1,2,2,2,2], [0,0,0,1,0,0,1,1,2,2,1,1,2,2,2,1],
    [0,0,0,0,2,0,0,1,2,2,1,1,2,2,1,1], [0,2,2,2,0,0,2,2,0,0,1,1,0,1,1,1],
    [0,0,0,0,0,0,0,0,1,1,2,2,1,1,2,2], [0,0,1,1,0,0,1,1,0,0,2,2,0,0,2,2],
    [0,0,2,2,0,0,2,2,1,1,1,1,1,1,1,1], [0,0,1,1,0,0,1,1,2,2,1,1,2,2,1,1],
    [0,0,0,0,0,0,0,0,1,1,1,1,2,2,2,2], [0,0,0,0,1,1,1,1,1,1,1,1,2,2,2,2],
    [0,0,0,0,1,1,1,1,2,2,2,2,2,2,2,2], [0,0,1,2,0,0,1,2,0,0,1,2,0,0,1,2],
    [0,1,1,2,0,1,1,2,0,1,1,2,0,1,1,2], [0,1,2,2,0,1,2,2,0,1,2,2,0,1,2,2],
    [0,0,1,1,0,1,1,2,1,1,2,2,1,2,2,2], [0,0,1,1,2,0,0,1,2,2,0,0,2,2,2,0],
    [0,0,0,1,0,0,1,1,0,1,1,2,1,1,2,2], [0,1,1,1,0,0,1,1,2,0,0,1,2,2,0,0],
    [0,0,0,0,1,1,2,2,1,1,2,2,1,1,2,2], [0,0,2,2,0,0,2,2,0,0,2,2,1,1,1,1],
    [0,1,1,1,0,1,1,1,0,2,2,2,0,2,2,2], [0,0,0,1,0,0,0,1,2,2,2,1,2,2,2,1],
    [0,0,0,0,0,0,1,1,0,1,2,2,0,1,2,2], [0,0,0,0,1,1,0,0,2,2,1,0,2,2,1,0],
    [0,1,2,2,0,1,2,2,0,0,1,1,0,0,0,0], [0,0,1,2,0,0,1,2,1,1,2,2,2,2,2,2],
    [0,1,1,0,1,2,2,1,1,2,2,1,0,1,1,0], [0,0,0,0,0,1,1,0,1,2,2,1,1,2,2,1],
    [0,0,2,2,1,1,0,2,1,1,0,2,0,0,2,2], [0,1,1,0,0,1,1,0,2,0,0,2,2,2,2,2],
    [0,0,1,1,0,1,2,2,0,1,2,2,0,0,1,1], [0,0,0,0,2,0,0,0,2,2,1,1,2,2,2,1],
    [0,0,0,0,0,0,0,2,1,1,2,2,1,2,2,2], [0,2,2,2,0,0,2,2,0,0,1,2,0,0,1,1],
    [0,0,1,1,0,0,1,2,0,0,2,2,0,2,2,2], [0,1,2,0,0,1,2,0,0,1,2,0,0,1,2,0],
    [0,0,0,0,1,1,1,1,2,2,2,2,0,0,0,0], [0,1,2,0,1,2,0,1,2,0,1,2,0,1,2,0],
    [0,1,2,0,2,0,1,2,1,2,0,1,0,1,2,0], [0,0,1,1,2,2,0,0,1,1,2,2,0,0,1,1],
    [0,0,1,1,1,1,2,2,2,2,0,0,0,0,1,1], [0,1,0,1,0,1,0,1,2,2,2,2,2,2,2,2],
    [0,0,0,0,0,0,0,0,2,1,2,1,2,1,2,1], [0,0,2,2,1,1,2,2,0,0,2,2,1,1,2,2],
    [0,0,2,2,0,0,1,1,0,0,2,2,0,0,1,1], [0,2,2,0,1,2,2,1,0,2,2,0,1,2,2,1],
    [0,1,0,1,2,2,2,2,2,2,2,2,0,1,0,1], [0,0,0,0,2,1,2,1,2,1,2,1,2,1,2,1],
    [0,1,0,1,0,1,0,1,0,1,0,1,2,2,2,2], [0,2,2,2,0,1,1,1,0,2,2,2,0,1,1,1],
    [0,0,0,2,1,1,1,2,0,0,0,2,1,1,1,2], [0,0,0,0,2,1,1,2,2,1,1,2,2,1,1,2],
    [0,2,2,2,0,1,1,1,0,1,1,1,0,2,2,2], [0,0,0,2,1,1,1,2,1,1,1,2,0,0,0,2],
    [0,1,1,0,0,1,1,0,0,1,1,0,2,2,2,2], [0,0,0,0,0,0,0,0,2,1,1,2,2,1,1,2],
    [0,1,1,0,0,1,1,0,2,2,2,2,2,2,2,2], [0,0,2,2,0,0,1,1,0,0,1,1,0,0,2,2],
    [0,0,2,2,1,1,2,2,1,1,2,2,0,0,2,2], [0,0,0,0,0,0,0,0,0,0,0,0,2,1,1,2],
    [0,0,0,2,0,0,0,1,0,0,0,2,0,0,0,1], [0,2,2,2,1,2,2,2,0,2,2,2,1,2,2,2],
    [0,1,0,1,2,2,2,2,2,2,2,2,2,2,2,2], [0,1,1,1,2,0,1,1,2,2,0,1,2,2,2,0],
];

#[rustfmt::skip]
const ANCHOR_2: [u8; 64] = [
    15,15,15,15,15,15,15,15, 15,15,15,15,15,15,15,15,
    15, 2, 8, 2, 2, 8, 8,15,  2, 8, 2, 2, 8, 8, 2, 2,
    15,15, 6, 8, 2, 8,15,15,  2, 8, 2, 2, 2,15,15, 6,
     6, 2, 6, 8,15,15, 2, 2, 15,15,15,15,15, 2, 2,15,
];

#[rustfmt::skip]
const ANCHOR_3_SECOND: [u8; 64] = [
     3, 3,15,15, 8, 3,15,15,  8, 8, 6, 6, 6, 5, 3, 3,
     3, 3, 8,15, 3, 3, 6,10,  5, 8, 8, 6, 8, 5,15,15,
     8,15, 3, 5, 6,10, 8,15, 15, 3,15, 5,15,15,15,15,
     3,15, 5, 5, 5, 8, 5,10,  5,10, 8,13,15,12, 3, 3,
];

#[rustfmt::skip]
const ANCHOR_3_THIRD: [u8; 64] = [
    15, 8, 8, 3,15,15, 3, 8, 15,15,15,15,15,15,15, 8,
    15, 8,15, 3,15, 8,15, 8,  3,15, 6,10,15,15,10, 8,
    15, 3,15,10,10, 8, 9,10,  6,15, 8,15, 3, 6, 6, 8,
    15, 3,15,15,15,15,15,15, 15,15,15,15, 3,15,15, 8,
];

const WEIGHTS_2: [u32; 4] = [0, 21, 43, 64];
const WEIGHTS_3: [u32; 8] = [0, 9, 18, 27, 37, 46, 55, 64];
const WEIGHTS_4: [u32; 16] = [0, 4, 9, 13, 17, 21, 26, 30, 34, 38, 43, 47, 51, 55, 60, 64];

struct Bits {
    value: u128,
    pos: u32,
}

impl Bits {
    fn read(&mut self, n: u32) -> u32 {
        if n == 0 || self.pos >= 128 {
            return 0;
        }
        let v = (self.value >> self.pos) as u32 & ((1u32 << n) - 1);
        self.pos += n;
        v
    }
}

#[inline]
fn interpolate(e0: u32, e1: u32, bits: u32, index: u32) -> u8 {
    let w = match bits {
        2 => WEIGHTS_2[index as usize],
        3 => WEIGHTS_3[index as usize],
        _ => WEIGHTS_4[index as usize],
    };
    (((64 - w) * e0 + w * e1 + 32) >> 6) as u8
}

/// Expand an `n`-bit endpoint to 8 bits.
#[inline]
fn unquantize(v: u32, n: u32) -> u32 {
    let v = v << (8 - n);
    v | (v >> n)
}

fn subset_of(m: &Mode, partition: usize, pixel: usize) -> usize {
    match m.subsets {
        2 => ((PARTITIONS_2[partition] >> pixel) & 1) as usize,
        3 => PARTITIONS_3[partition][pixel] as usize,
        _ => 0,
    }
}

fn is_anchor(m: &Mode, partition: usize, pixel: usize) -> bool {
    if pixel == 0 {
        return true;
    }
    match m.subsets {
        2 => pixel == ANCHOR_2[partition] as usize,
        3 => {
            pixel == ANCHOR_3_SECOND[partition] as usize
                || pixel == ANCHOR_3_THIRD[partition] as usize
        }
        _ => false,
    }
}

fn decode_block(block: &[u8], tile: &mut [u32]) {
    let mut raw = [0u8; 16];
    raw.copy_from_slice(&block[..16]);
    let mut bits = Bits {
        value: u128::from_le_bytes(raw),
        pos: 0,
    };

    let Some(mode_idx) = (0..8).find(|&i| raw[0] & (1 << i) != 0) else {
        tile.fill(0);
        return;
    };
    bits.pos = mode_idx + 1;
    let m = &MODES[mode_idx as usize];

    let partition = bits.read(m.partition_bits) as usize;
    let rotation = bits.read(m.rotation_bits);
    let index_selection = bits.read(m.index_selection_bits);

    let n = m.subsets * 2;
    // endpoints[e][c]: c = R, G, B, A
    let mut endpoints = [[0u32; 4]; 6];
    for c in 0..3 {
        for ep in endpoints.iter_mut().take(n) {
            ep[c] = bits.read(m.colour_bits);
        }
    }
    for ep in endpoints.iter_mut().take(n) {
        ep[3] = bits.read(m.alpha_bits);
    }

    let mut colour_bits = m.colour_bits;
    let mut alpha_bits = m.alpha_bits;
    if m.endpoint_pbits || m.shared_pbits {
        let mut pbits = [0u32; 6];
        if m.endpoint_pbits {
            for p in pbits.iter_mut().take(n) {
                *p = bits.read(1);
            }
        } else {
            for s in 0..m.subsets {
                let p = bits.read(1);
                pbits[s * 2] = p;
                pbits[s * 2 + 1] = p;
            }
        }
        for (ep, p) in endpoints.iter_mut().zip(pbits).take(n) {
            for c in ep.iter_mut() {
                *c = (*c << 1) | p;
            }
        }
        colour_bits += 1;
        if alpha_bits > 0 {
            alpha_bits += 1;
        }
    }

    for ep in endpoints.iter_mut().take(n) {
        for c in 0..3 {
            ep[c] = unquantize(ep[c], colour_bits);
        }
        ep[3] = if alpha_bits > 0 {
            unquantize(ep[3], alpha_bits)
        } else {
            255
        };
    }

    let mut indices = [0u32; 16];
    for (i, idx) in indices.iter_mut().enumerate() {
        let width = m.index_bits - is_anchor(m, partition, i) as u32;
        *idx = bits.read(width);
    }
    let mut indices2 = [0u32; 16];
    if m.index2_bits > 0 {
        for (i, idx) in indices2.iter_mut().enumerate() {
            *idx = bits.read(m.index2_bits - (i == 0) as u32);
        }
    }

    for (i, px) in tile.iter_mut().enumerate() {
        let s = subset_of(m, partition, i);
        let (e0, e1) = (endpoints[s * 2], endpoints[s * 2 + 1]);

        let (colour_idx, colour_bits, alpha_idx, alpha_bits) = if m.index2_bits == 0 {
            (indices[i], m.index_bits, indices[i], m.index_bits)
        } else if index_selection == 0 {
            (indices[i], m.index_bits, indices2[i], m.index2_bits)
        } else {
            (indices2[i], m.index2_bits, indices[i], m.index_bits)
        };

        let mut rgba = [
            interpolate(e0[0], e1[0], colour_bits, colour_idx),
            interpolate(e0[1], e1[1], colour_bits, colour_idx),
            interpolate(e0[2], e1[2], colour_bits, colour_idx),
            interpolate(e0[3], e1[3], alpha_bits, alpha_idx),
        ];
        match rotation {
            1 => rgba.swap(0, 3),
            2 => rgba.swap(1, 3),
            3 => rgba.swap(2, 3),
            _ => {}
        }
        *px = super::argb(rgba[3], rgba[0], rgba[1], rgba[2]);
    }
}

pub fn decode(width: u32, height: u32, data: &[u8]) -> Raster {
    decode_blocks(width, height, data, (4, 4), 16, decode_block)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Packs fields LSB-first into a 16-byte block.
    struct Writer {
        value: u128,
        pos: u32,
    }

    impl Writer {
        fn new() -> Self {
            Self { value: 0, pos: 0 }
        }

        fn put(&mut self, n: u32, v: u128) -> &mut Self {
            self.value |= v << self.pos;
            self.pos += n;
            self
        }

        fn block(&self) -> [u8; 16] {
            self.value.to_le_bytes()
        }
    }

    #[test]
    fn reserved_mode_is_transparent_black() {
        let r = decode(4, 4, &[0u8; 16]);
        assert!(r.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn mode6_solid_endpoints() {
        // Mode 6: both endpoints (0x7F, 0x00, 0x7F, 0x7F) with pbit 1,
        // so R = B = A = 0xFF and G = 0x01.
        let mut w = Writer::new();
        w.put(7, 1 << 6);
        w.put(7, 0x7F).put(7, 0x7F); // R0 R1
        w.put(7, 0).put(7, 0); // G0 G1
        w.put(7, 0x7F).put(7, 0x7F); // B0 B1
        w.put(7, 0x7F).put(7, 0x7F); // A0 A1
        w.put(1, 1).put(1, 1); // pbits
        let r = decode(4, 4, &w.block());
        assert!(r.pixels().iter().all(|&p| p == 0xFFFF_01FF));
    }

    #[test]
    fn mode6_interpolates_between_endpoints() {
        let mut w = Writer::new();
        w.put(7, 1 << 6);
        w.put(7, 0).put(7, 0x7F); // R0 = 0, R1 = 0x7F
        w.put(7, 0).put(7, 0);
        w.put(7, 0).put(7, 0);
        w.put(7, 0x7F).put(7, 0x7F);
        w.put(1, 0).put(1, 1); // R0 -> 0x00, R1 -> 0xFF
        // pixel 0 (anchor, 3 bits) index 0; pixel 1 index 15
        w.put(3, 0).put(4, 15);
        let r = decode(4, 4, &w.block());
        let red = |p: u32| (p >> 16) & 0xFF;
        assert_eq!(red(r.pixel(0, 0).unwrap()), 0);
        assert_eq!(red(r.pixel(1, 0).unwrap()), 0xFF);
        // pixel 2 index 0
        assert_eq!(red(r.pixel(2, 0).unwrap()), 0);
    }

    fn put_all(w: &mut Writer, n: u32, values: &[u128]) {
        for &v in values {
            w.put(n, v);
        }
    }

    #[test]
    fn mode0_three_subsets_with_anchors() {
        // Partition 0; anchors at pixels 0, 3 and 15 carry 2-bit indices.
        // Subset 0 runs black to white (pbit 0 / 1), subset 1 is red and
        // subset 2 blue.
        let mut w = Writer::new();
        w.put(1, 1).put(4, 0);
        put_all(&mut w, 4, &[0, 0xF, 0xF, 0xF, 0, 0]); // R
        put_all(&mut w, 4, &[0, 0xF, 0, 0, 0, 0]); // G
        put_all(&mut w, 4, &[0, 0xF, 0, 0, 0xF, 0xF]); // B
        put_all(&mut w, 1, &[0, 1, 0, 0, 0, 0]); // pbits
        w.put(2, 3).put(3, 7).put(3, 0).put(2, 0).put(3, 4).put(3, 1);
        let r = decode(4, 4, &w.block());

        assert_eq!(r.pixel(0, 0), Some(0xFF6C_6C6C));
        assert_eq!(r.pixel(1, 0), Some(0xFFFF_FFFF));
        assert_eq!(r.pixel(2, 0), Some(0xFFF7_0000));
        assert_eq!(r.pixel(3, 0), Some(0xFFF7_0000));
        assert_eq!(r.pixel(0, 1), Some(0xFF93_9393));
        assert_eq!(r.pixel(1, 1), Some(0xFF24_2424));
        assert_eq!(r.pixel(0, 2), Some(0xFF00_0000));
        assert_eq!(r.pixel(1, 2), Some(0xFF00_00F7));
        assert_eq!(r.pixel(3, 3), Some(0xFF00_00F7));
    }

    #[test]
    fn mode1_pbit_is_shared_per_subset() {
        // Partition 13 puts the bottom two rows in subset 1.
        let mut w = Writer::new();
        w.put(2, 0b10).put(6, 13);
        put_all(&mut w, 6, &[0x3F, 0x3F, 0, 0]); // R
        put_all(&mut w, 6, &[0, 0, 0, 0]); // G
        put_all(&mut w, 6, &[0, 0, 0x3F, 0x3F]); // B
        w.put(1, 1).put(1, 0); // one pbit per subset
        w.put(2, 0).put(3, 7);
        let r = decode(4, 4, &w.block());

        // pbit 1 on both endpoints: R 0x7F -> 0xFF, G/B 1 -> 0x02
        assert_eq!(r.pixel(0, 0), Some(0xFFFF_0202));
        assert_eq!(r.pixel(1, 0), Some(0xFFFF_0202));
        assert_eq!(r.pixel(0, 2), Some(0xFF00_00FD));
        assert_eq!(r.pixel(3, 3), Some(0xFF00_00FD));
    }

    #[test]
    fn mode2_two_bit_indices() {
        // Partition 8: rows 0-1 subset 0, row 2 subset 1, row 3 subset 2.
        let mut w = Writer::new();
        w.put(3, 0b100).put(6, 8);
        put_all(&mut w, 5, &[0, 0x1F, 0, 0, 0, 0]); // R
        put_all(&mut w, 5, &[0, 0x1F, 0x1F, 0x1F, 0, 0]); // G
        put_all(&mut w, 5, &[0, 0x1F, 0, 0, 0x1F, 0x1F]); // B
        w.put(1, 1).put(2, 2).put(2, 3);
        let r = decode(4, 4, &w.block());

        assert_eq!(r.pixel(0, 0), Some(0xFF54_5454));
        assert_eq!(r.pixel(1, 0), Some(0xFFAB_ABAB));
        assert_eq!(r.pixel(2, 0), Some(0xFFFF_FFFF));
        assert_eq!(r.pixel(3, 0), Some(0xFF00_0000));
        assert_eq!(r.pixel(0, 2), Some(0xFF00_FF00));
        assert_eq!(r.pixel(3, 3), Some(0xFF00_00FF));
    }

    #[test]
    fn mode3_pbits_per_endpoint() {
        // Partition 0: columns 2-3 are subset 1.
        let mut w = Writer::new();
        w.put(4, 0b1000).put(6, 0);
        put_all(&mut w, 7, &[0x7F, 0x7F, 0, 0]); // R
        put_all(&mut w, 7, &[0, 0, 0, 0]); // G
        put_all(&mut w, 7, &[0, 0, 0x7F, 0x7F]); // B
        put_all(&mut w, 1, &[1, 0, 1, 1]);
        w.put(1, 0).put(2, 3);
        let r = decode(4, 4, &w.block());

        assert_eq!(r.pixel(0, 0), Some(0xFFFF_0101));
        assert_eq!(r.pixel(1, 0), Some(0xFFFE_0000));
        assert_eq!(r.pixel(2, 0), Some(0xFF01_01FF));
        assert_eq!(r.pixel(3, 3), Some(0xFF01_01FF));
    }

    #[test]
    fn mode7_partitioned_alpha() {
        let mut w = Writer::new();
        w.put(8, 0x80).put(6, 13);
        put_all(&mut w, 5, &[0x1F, 0x1F, 0, 0]); // R
        put_all(&mut w, 5, &[0, 0, 0, 0]); // G
        put_all(&mut w, 5, &[0, 0, 0, 0]); // B
        put_all(&mut w, 5, &[0xF, 0xF, 0, 0]); // A
        put_all(&mut w, 1, &[1, 1, 0, 0]);
        let r = decode(4, 4, &w.block());

        assert_eq!(r.pixel(0, 0), Some(0x7DFF_0404));
        assert_eq!(r.pixel(0, 2), Some(0));
    }

    #[test]
    fn mode4_index_selection_swaps_index_sets() {
        for (selection, expected) in [(0, 0x6C54_5454), (1, 0x546C_6C6C)] {
            let mut w = Writer::new();
            w.put(5, 1 << 4).put(2, 0).put(1, selection);
            put_all(&mut w, 5, &[0, 0x1F]); // R
            put_all(&mut w, 5, &[0, 0x1F]); // G
            put_all(&mut w, 5, &[0, 0x1F]); // B
            put_all(&mut w, 6, &[0, 0x3F]); // A
            w.put(1, 1).put(30, 0); // 2-bit indices
            w.put(2, 3); // 3-bit indices
            let r = decode(4, 4, &w.block());
            assert_eq!(r.pixel(0, 0), Some(expected), "selection {selection}");
        }
    }

    #[test]
    fn mode5_rotation_swaps_alpha_and_red() {
        let mut w = Writer::new();
        w.put(6, 1 << 5);
        w.put(2, 1); // rotation: swap R and A
        w.put(7, 0x7F).put(7, 0x7F); // R
        w.put(7, 0).put(7, 0); // G
        w.put(7, 0).put(7, 0); // B
        w.put(8, 0x10).put(8, 0x10); // A
        let r = decode(4, 4, &w.block());
        // R endpoint 0xFF becomes alpha, alpha 0x10 becomes red.
        assert_eq!(r.pixel(0, 0), Some(0xFF10_0000));
    }
}

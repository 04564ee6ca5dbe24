//! ASTC LDR decoder.
//!
//! Every block is 128 bits regardless of footprint. Layout, low bits
//! first:
//!
//! ```text
//! [0..11)   block mode: weight grid size, weight range, dual plane
//! [11..13)  partition count - 1
//! 1 partition:   [13..17) colour endpoint mode, endpoints from bit 17
//! 2-4:           [13..23) partition seed, [23..29) modes, endpoints from 29
//! ...            colour endpoint data (integer sequence encoded)
//! ...            extra mode bits, dual-plane component selector
//! [128-n..128)   weights, stored bit-reversed from the top
//! ```
//!
//! Void-extent blocks (mode bits `0x1FC`) carry one constant colour.
//! Reserved encodings, HDR endpoint modes and HDR void extents decode to
//! the error colour (opaque magenta).

use super::{Raster, argb, decode_blocks};

pub const ERROR_COLOUR: u32 = 0xFFFF_00FF;

pub fn decode(width: u32, height: u32, data: &[u8], bw: usize, bh: usize) -> Raster {
    decode_blocks(width, height, data, (bw, bh), 16, |block, tile| {
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&block[..16]);
        if decode_block(u128::from_le_bytes(raw), bw, bh, tile).is_none() {
            tile.fill(ERROR_COLOUR);
        }
    })
}

#[inline]
fn field(v: u128, start: u32, len: u32) -> u32 {
    if len == 0 || start >= 128 {
        return 0;
    }
    ((v >> start) & ((1u128 << len) - 1)) as u32
}

/// Integer sequence encoding of one value range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ise {
    trits: bool,
    quints: bool,
    bits: u32,
}

const fn ise(trits: bool, quints: bool, bits: u32) -> Ise {
    Ise {
        trits,
        quints,
        bits,
    }
}

/// Ranges by maximum value, ascending.
const RANGES: [(u32, Ise); 21] = [
    (1, ise(false, false, 1)),
    (2, ise(true, false, 0)),
    (3, ise(false, false, 2)),
    (4, ise(false, true, 0)),
    (5, ise(true, false, 1)),
    (7, ise(false, false, 3)),
    (9, ise(false, true, 1)),
    (11, ise(true, false, 2)),
    (15, ise(false, false, 4)),
    (19, ise(false, true, 2)),
    (23, ise(true, false, 3)),
    (31, ise(false, false, 5)),
    (39, ise(false, true, 3)),
    (47, ise(true, false, 4)),
    (63, ise(false, false, 6)),
    (79, ise(false, true, 4)),
    (95, ise(true, false, 5)),
    (127, ise(false, false, 7)),
    (159, ise(false, true, 5)),
    (191, ise(true, false, 6)),
    (255, ise(false, false, 8)),
];

/// Weight ranges indexed by `r - 2` (low precision) and `r - 2 + 6` (high).
const WEIGHT_RANGES: [u32; 12] = [1, 2, 3, 4, 5, 7, 9, 11, 15, 19, 23, 31];

fn ise_for(max: u32) -> Option<Ise> {
    RANGES.iter().find(|(m, _)| *m == max).map(|(_, i)| *i)
}

fn ise_bit_count(n: usize, e: Ise) -> usize {
    let mut bits = n * e.bits as usize;
    if e.trits {
        bits += (8 * n + 4) / 5;
    }
    if e.quints {
        bits += (7 * n + 2) / 3;
    }
    bits
}

/// LSB-first reader over a bounded region of a 128-bit block. Reads past
/// the end of the region return zero bits.
struct BitReader {
    value: u128,
    pos: u32,
    end: u32,
}

impl BitReader {
    fn read(&mut self, n: u32) -> u32 {
        let mut out = 0;
        for i in 0..n {
            let p = self.pos + i;
            if p < self.end {
                out |= field(self.value, p, 1) << i;
            }
        }
        self.pos += n;
        out
    }
}

fn decode_trits(t: u32) -> [u32; 5] {
    let bit = |v: u32, i: u32| (v >> i) & 1;
    let (c, t4, t3) = if (t >> 2) & 7 == 7 {
        ((((t >> 5) & 7) << 2) | (t & 3), 2, 2)
    } else if (t >> 5) & 3 == 3 {
        (t & 0x1F, 2, bit(t, 7))
    } else {
        (t & 0x1F, bit(t, 7), (t >> 5) & 3)
    };
    let (t2, t1, t0) = if c & 3 == 3 {
        (2, bit(c, 4), (bit(c, 3) << 1) | (bit(c, 2) & (bit(c, 3) ^ 1)))
    } else if (c >> 2) & 3 == 3 {
        (2, 2, c & 3)
    } else {
        (
            bit(c, 4),
            (c >> 2) & 3,
            (bit(c, 1) << 1) | (bit(c, 0) & (bit(c, 1) ^ 1)),
        )
    };
    [t0, t1, t2, t3, t4]
}

fn decode_quints(q: u32) -> [u32; 3] {
    let bit = |v: u32, i: u32| (v >> i) & 1;
    if (q >> 1) & 3 == 3 && (q >> 5) & 3 == 0 {
        let q0b = bit(q, 0);
        let q2 = (q0b << 2) | ((bit(q, 4) & (q0b ^ 1)) << 1) | (bit(q, 3) & (q0b ^ 1));
        return [4, 4, q2];
    }
    let (q2, c) = if (q >> 1) & 3 == 3 {
        (4, (((q >> 3) & 3) << 3) | ((!(q >> 5) & 3) << 1) | (q & 1))
    } else {
        ((q >> 5) & 3, q & 0x1F)
    };
    let (q1, q0) = if c & 7 == 5 {
        (4, (c >> 3) & 3)
    } else {
        ((c >> 3) & 3, c & 7)
    };
    [q0, q1, q2]
}

/// Decode `n` values from `reader`.
fn decode_ise(reader: &mut BitReader, n: usize, e: Ise) -> Vec<u32> {
    let b = e.bits;
    let mut out = Vec::with_capacity(n + 4);
    while out.len() < n {
        if e.trits {
            let mut m = [0u32; 5];
            m[0] = reader.read(b);
            let mut t = reader.read(2);
            m[1] = reader.read(b);
            t |= reader.read(2) << 2;
            m[2] = reader.read(b);
            t |= reader.read(1) << 4;
            m[3] = reader.read(b);
            t |= reader.read(2) << 5;
            m[4] = reader.read(b);
            t |= reader.read(1) << 7;
            for (tv, mv) in decode_trits(t).into_iter().zip(m) {
                out.push((tv << b) | mv);
            }
        } else if e.quints {
            let mut m = [0u32; 3];
            m[0] = reader.read(b);
            let mut q = reader.read(3);
            m[1] = reader.read(b);
            q |= reader.read(2) << 3;
            m[2] = reader.read(b);
            q |= reader.read(2) << 5;
            for (qv, mv) in decode_quints(q).into_iter().zip(m) {
                out.push((qv << b) | mv);
            }
        } else {
            out.push(reader.read(b));
        }
    }
    out.truncate(n);
    out
}

/// Replicate an `from`-bit value into `to` bits.
fn replicate(v: u32, from: u32, to: u32) -> u32 {
    if from == 0 {
        return 0;
    }
    let mut out = 0;
    let mut pos = to as i32;
    while pos > 0 {
        let shift = pos - from as i32;
        if shift >= 0 {
            out |= v << shift;
        } else {
            out |= v >> -shift;
        }
        pos -= from as i32;
    }
    out & ((1 << to) - 1)
}

fn unquantize_colour(v: u32, e: Ise) -> i32 {
    if !e.trits && !e.quints {
        return replicate(v, e.bits, 8) as i32;
    }
    let b = e.bits;
    let m = v & ((1 << b) - 1);
    let d = v >> b;
    let a = if m & 1 != 0 { 0x1FF } else { 0 };
    let x = m >> 1;
    let (bb, c) = match (e.trits, b) {
        (true, 1) => (0, 204),
        (true, 2) => ((x << 8) | (x << 4) | (x << 2) | (x << 1), 93),
        (true, 3) => ((x << 7) | (x << 2) | x, 44),
        (true, 4) => ((x << 6) | x, 22),
        (true, 5) => ((x << 5) | (x >> 2), 11),
        (true, _) => ((x << 4) | (x >> 4), 5),
        (false, 1) => (0, 113),
        (false, 2) => ((x << 8) | (x << 3) | (x << 2), 54),
        (false, 3) => ((x << 7) | (x << 1) | (x >> 1), 26),
        (false, 4) => ((x << 6) | (x >> 1), 13),
        (false, _) => ((x << 5) | (x >> 3), 6),
    };
    let t = (d * c + bb) ^ a;
    ((a & 0x80) | (t >> 2)) as i32
}

fn unquantize_weight(v: u32, e: Ise) -> u32 {
    let r = if !e.trits && !e.quints {
        replicate(v, e.bits, 6)
    } else if e.bits == 0 {
        return if e.trits {
            [0, 32, 64][v.min(2) as usize]
        } else {
            [0, 16, 32, 48, 64][v.min(4) as usize]
        };
    } else {
        let b = e.bits;
        let m = v & ((1 << b) - 1);
        let d = v >> b;
        let a = if m & 1 != 0 { 0x7F } else { 0 };
        let x = m >> 1;
        let (bb, c) = match (e.trits, b) {
            (true, 1) => (0, 50),
            (false, 1) => (0, 28),
            (true, 2) => ((x << 6) | (x << 2) | x, 23),
            (false, _) => ((x << 6) | (x << 1), 13),
            (true, _) => ((x << 5) | x, 11),
        };
        let t = (d * c + bb) ^ a;
        (a & 0x20) | (t >> 2)
    };
    if r > 32 { r + 1 } else { r }
}

struct BlockMode {
    grid_w: usize,
    grid_h: usize,
    dual_plane: bool,
    weight_max: u32,
}

fn block_mode(mode: u32) -> Option<BlockMode> {
    let r0 = (mode >> 4) & 1;
    let a = (mode >> 5) & 3;
    let d = mode & 0x400 != 0;
    let h = mode & 0x200 != 0;

    let (w, hgt, r, dual, high) = if mode & 3 != 0 {
        let r = r0 | ((mode & 3) << 1);
        let b = (mode >> 7) & 3;
        let (w, hgt) = match (mode >> 2) & 3 {
            0 => (b + 4, a + 2),
            1 => (b + 8, a + 2),
            2 => (a + 2, b + 8),
            _ if mode & 0x100 == 0 => (a + 2, (b & 1) + 6),
            _ => ((b & 1) + 2, a + 2),
        };
        (w, hgt, r, d, h)
    } else {
        let r = r0 | (((mode >> 2) & 3) << 1);
        match (mode >> 7) & 3 {
            0 => (12, a + 2, r, d, h),
            1 => (a + 2, 12, r, d, h),
            3 => {
                if mode & 0x40 != 0 {
                    return None;
                }
                if mode & 0x20 == 0 {
                    (6, 10, r, d, h)
                } else {
                    (10, 6, r, d, h)
                }
            }
            _ => (a + 6, ((mode >> 9) & 3) + 6, r, false, false),
        }
    };
    if r < 2 {
        return None;
    }
    let weight_max = WEIGHT_RANGES[(r - 2) as usize + if high { 6 } else { 0 }];
    Some(BlockMode {
        grid_w: w as usize,
        grid_h: hgt as usize,
        dual_plane: dual,
        weight_max,
    })
}

fn hash52(mut p: u32) -> u32 {
    p ^= p >> 15;
    p = p.wrapping_sub(p << 17);
    p = p.wrapping_add(p << 7);
    p = p.wrapping_add(p << 4);
    p ^= p >> 5;
    p = p.wrapping_add(p << 16);
    p ^= p >> 7;
    p ^= p >> 3;
    p ^= p << 6;
    p ^= p >> 17;
    p
}

/// Partition of texel (`x`, `y`, `z`) for a block with `count` partitions.
fn select_partition(seed: u32, x: u32, y: u32, z: u32, count: u32, small: bool) -> usize {
    if count <= 1 {
        return 0;
    }
    let (x, y, z) = if small { (x << 1, y << 1, z << 1) } else { (x, y, z) };
    let seed = seed + (count - 1) * 1024;
    let rnum = hash52(seed);

    let mut s = [
        rnum & 0xF,
        (rnum >> 4) & 0xF,
        (rnum >> 8) & 0xF,
        (rnum >> 12) & 0xF,
        (rnum >> 16) & 0xF,
        (rnum >> 20) & 0xF,
        (rnum >> 24) & 0xF,
        (rnum >> 28) & 0xF,
        (rnum >> 18) & 0xF,
        (rnum >> 22) & 0xF,
        (rnum >> 26) & 0xF,
        ((rnum >> 30) | (rnum << 2)) & 0xF,
    ];
    for v in &mut s {
        *v *= *v;
    }

    let (sh1, sh2) = if seed & 1 != 0 {
        (
            if seed & 2 != 0 { 4 } else { 5 },
            if count == 3 { 6 } else { 5 },
        )
    } else {
        (
            if count == 3 { 6 } else { 5 },
            if seed & 2 != 0 { 4 } else { 5 },
        )
    };
    let sh3 = if seed & 0x10 != 0 { sh1 } else { sh2 };
    for (i, v) in s.iter_mut().enumerate() {
        *v >>= match i {
            0..=7 if i % 2 == 0 => sh1,
            0..=7 => sh2,
            _ => sh3,
        };
    }

    let a = (s[0] * x + s[1] * y + s[10] * z + (rnum >> 14)) & 0x3F;
    let b = (s[2] * x + s[3] * y + s[11] * z + (rnum >> 10)) & 0x3F;
    let mut c = (s[4] * x + s[5] * y + s[8] * z + (rnum >> 6)) & 0x3F;
    let mut d = (s[6] * x + s[7] * y + s[9] * z + (rnum >> 2)) & 0x3F;
    if count < 4 {
        d = 0;
    }
    if count < 3 {
        c = 0;
    }

    if a >= b && a >= c && a >= d {
        0
    } else if b >= c && b >= d {
        1
    } else if c >= d {
        2
    } else {
        3
    }
}

type Rgba = [i32; 4];

fn bit_transfer_signed(a: i32, b: i32) -> (i32, i32) {
    let b = (b >> 1) | (a & 0x80);
    let mut a = (a >> 1) & 0x3F;
    if a & 0x20 != 0 {
        a -= 0x40;
    }
    (a, b)
}

fn blue_contract(c: Rgba) -> Rgba {
    [(c[0] + c[2]) >> 1, (c[1] + c[2]) >> 1, c[2], c[3]]
}

fn clamp(c: Rgba) -> Rgba {
    c.map(|v| v.clamp(0, 255))
}

/// LDR endpoint pair for colour endpoint mode `cem`.
fn decode_endpoints(cem: u32, v: &[i32]) -> Option<(Rgba, Rgba)> {
    let (e0, e1) = match cem {
        0 => ([v[0], v[0], v[0], 255], [v[1], v[1], v[1], 255]),
        1 => {
            let l0 = (v[0] >> 2) | (v[1] & 0xC0);
            let l1 = (l0 + (v[1] & 0x3F)).min(255);
            ([l0, l0, l0, 255], [l1, l1, l1, 255])
        }
        4 => ([v[0], v[0], v[0], v[2]], [v[1], v[1], v[1], v[3]]),
        5 => {
            let (d0, b0) = bit_transfer_signed(v[1], v[0]);
            let (d2, b2) = bit_transfer_signed(v[3], v[2]);
            (
                [b0, b0, b0, b2],
                [b0 + d0, b0 + d0, b0 + d0, b2 + d2],
            )
        }
        6 => (
            [
                (v[0] * v[3]) >> 8,
                (v[1] * v[3]) >> 8,
                (v[2] * v[3]) >> 8,
                255,
            ],
            [v[0], v[1], v[2], 255],
        ),
        8 | 12 => {
            let (a0, a1) = if cem == 12 { (v[6], v[7]) } else { (255, 255) };
            let s0 = v[0] + v[2] + v[4];
            let s1 = v[1] + v[3] + v[5];
            if s1 >= s0 {
                ([v[0], v[2], v[4], a0], [v[1], v[3], v[5], a1])
            } else {
                (
                    blue_contract([v[1], v[3], v[5], a1]),
                    blue_contract([v[0], v[2], v[4], a0]),
                )
            }
        }
        9 | 13 => {
            let (d0, b0) = bit_transfer_signed(v[1], v[0]);
            let (d1, b1) = bit_transfer_signed(v[3], v[2]);
            let (d2, b2) = bit_transfer_signed(v[5], v[4]);
            let (da, ba) = if cem == 13 {
                bit_transfer_signed(v[7], v[6])
            } else {
                (0, 255)
            };
            if d0 + d1 + d2 >= 0 {
                (
                    [b0, b1, b2, ba],
                    [b0 + d0, b1 + d1, b2 + d2, ba + da],
                )
            } else {
                (
                    blue_contract([b0 + d0, b1 + d1, b2 + d2, ba + da]),
                    blue_contract([b0, b1, b2, ba]),
                )
            }
        }
        10 => (
            [
                (v[0] * v[3]) >> 8,
                (v[1] * v[3]) >> 8,
                (v[2] * v[3]) >> 8,
                v[4],
            ],
            [v[0], v[1], v[2], v[5]],
        ),
        // HDR modes
        _ => return None,
    };
    Some((clamp(e0), clamp(e1)))
}

/// Bilinear infill of the weight grid onto the block footprint.
fn infill(weights: &[u32], gw: usize, gh: usize, bw: usize, bh: usize, plane: usize, planes: usize) -> Vec<u32> {
    let w_at = |i: usize| weights.get(i * planes + plane).copied().unwrap_or(0);
    let ds = (1024 + bw / 2) / (bw - 1);
    let dt = (1024 + bh / 2) / (bh - 1);
    let mut out = Vec::with_capacity(bw * bh);
    for t in 0..bh {
        for s in 0..bw {
            let gs = (ds * s * (gw - 1) + 32) >> 6;
            let gt = (dt * t * (gh - 1) + 32) >> 6;
            let (js, fs) = (gs >> 4, gs & 0xF);
            let (jt, ft) = (gt >> 4, gt & 0xF);
            let v0 = js + jt * gw;
            let w11 = (fs * ft + 8) >> 4;
            let w10 = ft - w11;
            let w01 = fs - w11;
            let w00 = 16 + w11 - fs - ft;
            let p = w_at(v0) as usize * w00
                + w_at(v0 + 1) as usize * w01
                + w_at(v0 + gw) as usize * w10
                + w_at(v0 + gw + 1) as usize * w11;
            out.push(((p + 8) >> 4) as u32);
        }
    }
    out
}

const HDR_MODES: [u32; 6] = [2, 3, 7, 11, 14, 15];

fn decode_block(bits: u128, bw: usize, bh: usize, tile: &mut [u32]) -> Option<()> {
    if field(bits, 0, 9) == 0x1FC {
        if field(bits, 9, 1) != 0 || field(bits, 10, 2) != 0b11 {
            return None;
        }
        let coord = |i: u32| field(bits, 12 + 13 * i, 13);
        let all_ones = (0..4).all(|i| coord(i) == 0x1FFF);
        if !all_ones && (coord(0) >= coord(1) || coord(2) >= coord(3)) {
            return None;
        }
        let ch = |start| (field(bits, start, 16) >> 8) as u8;
        tile.fill(argb(ch(112), ch(64), ch(80), ch(96)));
        return Some(());
    }

    let bm = block_mode(field(bits, 0, 11))?;
    if bm.grid_w > bw || bm.grid_h > bh {
        return None;
    }
    let partitions = field(bits, 11, 2) + 1;
    if bm.dual_plane && partitions == 4 {
        return None;
    }

    let weight_ise = ise_for(bm.weight_max)?;
    let planes = if bm.dual_plane { 2 } else { 1 };
    let num_weights = bm.grid_w * bm.grid_h * planes;
    if num_weights > 64 {
        return None;
    }
    let weight_bits = ise_bit_count(num_weights, weight_ise);
    if !(24..=96).contains(&weight_bits) {
        return None;
    }
    let weight_bits = weight_bits as u32;

    let mut cems = [0u32; 4];
    let mut extra_bits = 0u32;
    let colour_start;
    let mut seed = 0;
    if partitions == 1 {
        cems[0] = field(bits, 13, 4);
        colour_start = 17;
    } else {
        seed = field(bits, 13, 10);
        colour_start = 29;
        let cem_field = field(bits, 23, 6);
        if cem_field & 3 == 0 {
            cems = [cem_field >> 2; 4];
        } else {
            extra_bits = 3 * partitions - 4;
            let extra_pos = 128 - weight_bits - extra_bits;
            let combined = (cem_field >> 2) | (field(bits, extra_pos, extra_bits) << 4);
            let base_class = (cem_field & 3) - 1;
            for (i, cem) in cems.iter_mut().enumerate().take(partitions as usize) {
                let c = (combined >> i) & 1;
                let m = (combined >> (partitions as usize + 2 * i)) & 3;
                *cem = ((base_class + c) << 2) | m;
            }
        }
    }

    let ccs_bits = if bm.dual_plane { 2 } else { 0 };
    let colour_end = 128u32.checked_sub(weight_bits + extra_bits + ccs_bits)?;
    let ccs = field(bits, colour_end, ccs_bits) as usize;
    if colour_end <= colour_start {
        return None;
    }

    let cems = &cems[..partitions as usize];
    if cems.iter().any(|c| HDR_MODES.contains(c)) {
        return None;
    }
    let colour_values: usize = cems.iter().map(|c| ((c >> 2) as usize + 1) * 2).sum();
    if colour_values > 18 {
        return None;
    }

    let available = (colour_end - colour_start) as usize;
    let &(colour_max, colour_ise) = RANGES
        .iter()
        .rev()
        .find(|(_, e)| ise_bit_count(colour_values, *e) <= available)?;
    if colour_max < 5 {
        return None;
    }

    let mut reader = BitReader {
        value: bits,
        pos: colour_start,
        end: colour_end,
    };
    let values: Vec<i32> = decode_ise(&mut reader, colour_values, colour_ise)
        .into_iter()
        .map(|v| unquantize_colour(v, colour_ise))
        .collect();

    let mut endpoints = [([0i32; 4], [0i32; 4]); 4];
    let mut vi = 0;
    for (p, &cem) in cems.iter().enumerate() {
        let n = ((cem >> 2) as usize + 1) * 2;
        endpoints[p] = decode_endpoints(cem, &values[vi..vi + n])?;
        vi += n;
    }

    let mut reader = BitReader {
        value: bits.reverse_bits(),
        pos: 0,
        end: weight_bits,
    };
    let weights: Vec<u32> = decode_ise(&mut reader, num_weights, weight_ise)
        .into_iter()
        .map(|v| unquantize_weight(v, weight_ise))
        .collect();
    let plane0 = infill(&weights, bm.grid_w, bm.grid_h, bw, bh, 0, planes);
    let plane1 = if bm.dual_plane {
        infill(&weights, bm.grid_w, bm.grid_h, bw, bh, 1, planes)
    } else {
        Vec::new()
    };

    let small = bw * bh < 31;
    for y in 0..bh {
        for x in 0..bw {
            let i = y * bw + x;
            let p = select_partition(seed, x as u32, y as u32, 0, partitions, small);
            let (e0, e1) = endpoints[p];
            let mut out = [0u8; 4];
            for c in 0..4 {
                let w = if bm.dual_plane && c == ccs {
                    plane1[i]
                } else {
                    plane0[i]
                } as i32;
                let c0 = e0[c] * 257;
                let c1 = e1[c] * 257;
                out[c] = (((c0 * (64 - w) + c1 * w + 32) >> 6) >> 8) as u8;
            }
            tile[i] = argb(out[3], out[0], out[1], out[2]);
        }
    }
    Some(())
}

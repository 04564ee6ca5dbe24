//! In-memory builders for synthetic test files.

#![allow(dead_code)]

use romkit::crypto::crc16;
use romkit::keys::{NDS_BLOWFISH_SIZE, NdsBlowfishKey};

pub const DECRYPTED: [u32; 2] = [0xE7FF_DEFF, 0xE7FF_DEFF];

fn put_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

// ---------------------------------------------------------------------------
// NDS
// ---------------------------------------------------------------------------

/// A ROM image of `file_len` bytes whose header declares `used` bytes.
///
/// The ARM9 binary starts at 0x4000 and the secure area begins with
/// `secure`. Bytes past the header follow a fixed pattern so truncation
/// and padding are visible.
pub fn nds_rom(used: u32, file_len: usize, secure: [u32; 2]) -> Vec<u8> {
    let mut rom: Vec<u8> = (0..file_len).map(|i| (i * 7 % 251) as u8).collect();
    rom[..0x200].fill(0);
    rom[0x1000..0x4000].fill(0);

    rom[..10].copy_from_slice(b"ROMKITTEST");
    rom[0x0C..0x10].copy_from_slice(b"ARKE");
    rom[0x10..0x12].copy_from_slice(b"01");
    put_u32(&mut rom, 0x20, 0x4000);
    put_u32(&mut rom, 0x24, 0x0200_0800);
    put_u32(&mut rom, 0x28, 0x0200_0000);
    put_u32(&mut rom, 0x2C, 0x1000);
    put_u32(&mut rom, 0x80, used);
    put_u32(&mut rom, 0x84, 0x4000);
    rom[0xC0..0xC4].copy_from_slice(&[0x24, 0xFF, 0xAE, 0x51]);
    put_u16(&mut rom, 0x15C, 0xCF56);
    let crc = crc16(&rom[..0x15E]);
    put_u16(&mut rom, 0x15E, crc);

    put_u32(&mut rom, 0x4000, secure[0]);
    put_u32(&mut rom, 0x4004, secure[1]);
    rom
}

/// A key table with arbitrary but fixed contents.
pub fn blowfish_key() -> NdsBlowfishKey {
    let bytes: Vec<u8> = (0..NDS_BLOWFISH_SIZE / 4)
        .flat_map(|i| (i as u32).wrapping_mul(0x9E37_79B9).to_le_bytes())
        .collect();
    NdsBlowfishKey::from_bytes(&bytes).expect("key table has the right size")
}

// ---------------------------------------------------------------------------
// NE
// ---------------------------------------------------------------------------

pub enum Reloc {
    Ordinal { module: u16, ordinal: u16 },
    /// `name` indexes [`NeSpec::imported_functions`].
    Name { module: u16, name: usize },
}

#[derive(Default)]
pub struct NeSpec<'a> {
    pub entry_table: Vec<u8>,
    pub module_name: &'a str,
    pub description: &'a str,
    pub resident_names: &'a [(&'a str, u16)],
    pub non_resident_names: &'a [(&'a str, u16)],
    pub modules: &'a [&'a str],
    pub imported_functions: &'a [&'a str],
    pub relocations: Vec<Reloc>,
    pub target_os: u8,
}

fn pascal(out: &mut Vec<u8>, s: &str) {
    out.push(s.len() as u8);
    out.extend_from_slice(s.as_bytes());
}

fn name_table(first: &str, names: &[(&str, u16)]) -> Vec<u8> {
    let mut t = Vec::new();
    pascal(&mut t, first);
    t.extend_from_slice(&0u16.to_le_bytes());
    for (name, ord) in names {
        pascal(&mut t, name);
        t.extend_from_slice(&ord.to_le_bytes());
    }
    t.push(0);
    t
}

/// An MZ stub followed by an NE header at 0x40, one segment with
/// relocations, and the requested name and import tables.
pub fn ne_exe(spec: &NeSpec<'_>) -> Vec<u8> {
    const NE_BASE: usize = 0x40;
    const SHIFT: u16 = 4;

    let resident = name_table(spec.module_name, spec.resident_names);
    let non_resident = name_table(spec.description, spec.non_resident_names);

    let mut imported = vec![0u8];
    let mut module_offsets = Vec::new();
    for m in spec.modules {
        module_offsets.push(imported.len() as u16);
        pascal(&mut imported, m);
    }
    let mut function_offsets = Vec::new();
    for f in spec.imported_functions {
        function_offsets.push(imported.len() as u16);
        pascal(&mut imported, f);
    }
    let modrefs: Vec<u8> = module_offsets.iter().flat_map(|o| o.to_le_bytes()).collect();

    // Resident section, offsets relative to the NE header.
    let seg_off = 0x40usize;
    let res_names_off = seg_off + 8;
    let modref_off = res_names_off + resident.len();
    let imported_off = modref_off + modrefs.len();
    let entry_off = imported_off + imported.len();
    let resident_end = entry_off + spec.entry_table.len();

    let non_res_abs = NE_BASE + resident_end;
    let seg_abs = (non_res_abs + non_resident.len()).next_multiple_of(1 << SHIFT);
    let seg_len = 0x10usize;

    let mut relocs = Vec::new();
    relocs.extend_from_slice(&(spec.relocations.len() as u16).to_le_bytes());
    for (i, r) in spec.relocations.iter().enumerate() {
        let (flags, t1, t2) = match *r {
            Reloc::Ordinal { module, ordinal } => (1u8, module, ordinal),
            Reloc::Name { module, name } => (2u8, module, function_offsets[name]),
        };
        relocs.push(3);
        relocs.push(flags);
        relocs.extend_from_slice(&(i as u16 * 2).to_le_bytes());
        relocs.extend_from_slice(&t1.to_le_bytes());
        relocs.extend_from_slice(&t2.to_le_bytes());
    }

    let total = seg_abs + seg_len + relocs.len();
    let mut f = vec![0u8; total];
    f[..2].copy_from_slice(b"MZ");
    put_u32(&mut f, 0x3C, NE_BASE as u32);

    let h = NE_BASE;
    f[h..h + 2].copy_from_slice(b"NE");
    f[h + 2] = 5;
    f[h + 3] = 10;
    put_u16(&mut f, h + 0x04, entry_off as u16);
    put_u16(&mut f, h + 0x06, spec.entry_table.len() as u16);
    f[h + 0x0C] = 0x02;
    f[h + 0x0D] = 0x83;
    put_u16(&mut f, h + 0x1C, 1);
    put_u16(&mut f, h + 0x1E, spec.modules.len() as u16);
    put_u16(&mut f, h + 0x20, non_resident.len() as u16);
    put_u16(&mut f, h + 0x22, seg_off as u16);
    put_u16(&mut f, h + 0x24, res_names_off as u16);
    put_u16(&mut f, h + 0x26, res_names_off as u16);
    put_u16(&mut f, h + 0x28, modref_off as u16);
    put_u16(&mut f, h + 0x2A, imported_off as u16);
    put_u32(&mut f, h + 0x2C, non_res_abs as u32);
    put_u16(&mut f, h + 0x32, SHIFT);
    f[h + 0x36] = spec.target_os;
    f[h + 0x3E] = 0x00;
    f[h + 0x3F] = 0x03;

    // One code segment with relocation data.
    let s = h + seg_off;
    put_u16(&mut f, s, (seg_abs >> SHIFT) as u16);
    put_u16(&mut f, s + 2, seg_len as u16);
    put_u16(&mut f, s + 4, 0x0100);
    put_u16(&mut f, s + 6, seg_len as u16);

    f[h + res_names_off..h + modref_off].copy_from_slice(&resident);
    f[h + modref_off..h + imported_off].copy_from_slice(&modrefs);
    f[h + imported_off..h + entry_off].copy_from_slice(&imported);
    f[h + entry_off..h + resident_end].copy_from_slice(&spec.entry_table);
    f[non_res_abs..non_res_abs + non_resident.len()].copy_from_slice(&non_resident);
    f[seg_abs + seg_len..].copy_from_slice(&relocs);
    f
}

// ---------------------------------------------------------------------------
// DDS
// ---------------------------------------------------------------------------

pub const DDSD_CAPS: u32 = 0x1;
pub const DDSD_HEIGHT: u32 = 0x2;
pub const DDSD_WIDTH: u32 = 0x4;
pub const DDSD_PITCH: u32 = 0x8;
pub const DDSD_PIXELFORMAT: u32 = 0x1000;
pub const DDSD_LINEARSIZE: u32 = 0x80000;

/// Magic plus a 124-byte header with the given pixel format fields.
fn dds_header(
    width: u32,
    height: u32,
    flags: u32,
    pitch: u32,
    pf_flags: u32,
    fourcc: &[u8; 4],
    bit_count: u32,
    masks: [u32; 4],
) -> Vec<u8> {
    let mut b = vec![0u8; 128];
    b[..4].copy_from_slice(b"DDS ");
    let h = 4;
    put_u32(&mut b, h, 124);
    put_u32(
        &mut b,
        h + 0x04,
        DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | flags,
    );
    put_u32(&mut b, h + 0x08, height);
    put_u32(&mut b, h + 0x0C, width);
    put_u32(&mut b, h + 0x10, pitch);
    put_u32(&mut b, h + 0x48, 32);
    put_u32(&mut b, h + 0x4C, pf_flags);
    b[h + 0x50..h + 0x54].copy_from_slice(fourcc);
    put_u32(&mut b, h + 0x54, bit_count);
    for (i, m) in masks.iter().enumerate() {
        put_u32(&mut b, h + 0x58 + i * 4, *m);
    }
    put_u32(&mut b, h + 0x68, 0x1000);
    b
}

/// A FourCC-compressed DDS file.
pub fn dds_fourcc(width: u32, height: u32, fourcc: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut b = dds_header(
        width,
        height,
        DDSD_LINEARSIZE,
        data.len() as u32,
        0x4,
        fourcc,
        0,
        [0; 4],
    );
    b.extend_from_slice(data);
    b
}

/// An uncompressed DDS file described by bit masks.
pub fn dds_masks(
    width: u32,
    height: u32,
    pitch: u32,
    pf_flags: u32,
    bit_count: u32,
    masks: [u32; 4],
    data: &[u8],
) -> Vec<u8> {
    let mut b = dds_header(width, height, DDSD_PITCH, pitch, pf_flags, &[0; 4], bit_count, masks);
    b.extend_from_slice(data);
    b
}

/// A DX10 (or Xbox One) DDS file.
pub fn dds_dx10(
    width: u32,
    height: u32,
    dxgi_format: u32,
    misc_flags2: u32,
    xbox: bool,
    data: &[u8],
) -> Vec<u8> {
    let fourcc = if xbox { b"XBOX" } else { b"DX10" };
    let mut b = dds_header(width, height, 0, 0, 0x4, fourcc, 0, [0; 4]);
    let mut ext = vec![0u8; 20];
    put_u32(&mut ext, 0, dxgi_format);
    put_u32(&mut ext, 4, 3);
    put_u32(&mut ext, 12, 1);
    put_u32(&mut ext, 16, misc_flags2);
    b.extend_from_slice(&ext);
    if xbox {
        let mut x = vec![0u8; 16];
        put_u32(&mut x, 0, 14);
        put_u32(&mut x, 4, 0x200);
        put_u32(&mut x, 8, data.len() as u32);
        put_u32(&mut x, 12, 0x2AC1);
        b.extend_from_slice(&x);
    }
    b.extend_from_slice(data);
    b
}

// ---------------------------------------------------------------------------
// KTX
// ---------------------------------------------------------------------------

pub const GL_UNSIGNED_BYTE: u32 = 0x1401;
pub const GL_RGBA: u32 = 0x1908;
pub const GL_RGBA8: u32 = 0x8058;

pub struct KtxSpec<'a> {
    pub big_endian: bool,
    pub gl_format: u32,
    pub gl_internal_format: u32,
    pub width: u32,
    pub height: u32,
    pub array_elements: u32,
    pub key_values: &'a [(&'a str, &'a str)],
    pub levels: &'a [&'a [u8]],
}

impl Default for KtxSpec<'_> {
    fn default() -> Self {
        Self {
            big_endian: false,
            gl_format: GL_RGBA,
            gl_internal_format: GL_RGBA8,
            width: 1,
            height: 1,
            array_elements: 0,
            key_values: &[],
            levels: &[],
        }
    }
}

/// A KTX file; every `u32` is written in the requested byte order.
pub fn ktx_file(spec: &KtxSpec<'_>) -> Vec<u8> {
    let word = |v: u32| {
        if spec.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    };

    let mut kv = Vec::new();
    for (k, v) in spec.key_values {
        let size = k.len() + v.len() + 2;
        kv.extend_from_slice(&word(size as u32));
        kv.extend_from_slice(k.as_bytes());
        kv.push(0);
        kv.extend_from_slice(v.as_bytes());
        kv.push(0);
        kv.resize(kv.len().next_multiple_of(4), 0);
    }

    let mut b = Vec::new();
    b.extend_from_slice(b"\xABKTX 11\xBB\r\n\x1A\n");
    for v in [
        0x0403_0201,
        GL_UNSIGNED_BYTE,
        1,
        spec.gl_format,
        spec.gl_internal_format,
        spec.gl_format,
        spec.width,
        spec.height,
        0,
        spec.array_elements,
        1,
        spec.levels.len() as u32,
        kv.len() as u32,
    ] {
        b.extend_from_slice(&word(v));
    }
    b.extend_from_slice(&kv);
    for level in spec.levels {
        b.extend_from_slice(&word(level.len() as u32));
        b.extend_from_slice(level);
        b.resize(b.len().next_multiple_of(4), 0);
    }
    b
}

/// RGBA byte quadruples, as GL_RGBA / GL_UNSIGNED_BYTE stores them.
pub fn rgba(pixels: &[[u8; 4]]) -> Vec<u8> {
    pixels.concat()
}

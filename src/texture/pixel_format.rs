//! Pixel format resolution.
//!
//! Containers describe their pixels in several vocabularies: classic DDS
//! bit masks, DDS FourCC codes, DXGI enums (DX10 DDS) and OpenGL enums
//! (KTX). Everything here maps one of those descriptions to a
//! [`PixelFormat`], the one vocabulary the decoders understand.
//!
//! Uncompressed resolution is table driven and requires an exact match of
//! all four masks. Compressed resolution is a direct enum lookup.
//! Unrecognised inputs resolve to `None`, which is not an error for the
//! container: only image decoding becomes unavailable.

/// How the alpha channel should be interpreted.
///
/// Values match the DDS `miscFlags2` alpha-mode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphaMode {
    Unknown,
    Straight,
    Premultiplied,
    Opaque,
    Custom,
}

impl AlphaMode {
    pub fn from_misc_flags2(v: u32) -> Self {
        match v & 7 {
            1 => AlphaMode::Straight,
            2 => AlphaMode::Premultiplied,
            3 => AlphaMode::Opaque,
            4 => AlphaMode::Custom,
            _ => AlphaMode::Unknown,
        }
    }
}

/// Uncompressed pixel layouts.
///
/// Names describe the pixel as a little-endian integer read from the file,
/// most significant channel first: `ARGB8888` has alpha in bits 31..24,
/// `RGB888` has red in bits 23..16 (stored as bytes B, G, R).
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinearFormat {
    // 8-bit
    L8,
    A4L4,
    A8,
    R8,
    // 16-bit
    ARGB1555,
    ABGR1555,
    RGBA5551,
    BGRA5551,
    RGB565,
    BGR565,
    RGB555,
    BGR555,
    ARGB4444,
    ABGR4444,
    RGBA4444,
    BGRA4444,
    xRGB4444,
    xBGR4444,
    RGBx4444,
    BGRx4444,
    ARGB8332,
    L16,
    A8L8,
    GR88,
    // 24-bit
    RGB888,
    BGR888,
    // 32-bit
    ARGB8888,
    ABGR8888,
    RGBA8888,
    BGRA8888,
    xRGB8888,
    xBGR8888,
    G16R16,
    A2R10G10B10,
    A2B10G10R10,
    RGB9_E5,
}

impl LinearFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        use LinearFormat::*;
        match self {
            L8 | A4L4 | A8 | R8 => 1,
            RGB888 | BGR888 => 3,
            ARGB8888 | ABGR8888 | RGBA8888 | BGRA8888 | xRGB8888 | xBGR8888 | G16R16
            | A2R10G10B10 | A2B10G10R10 | RGB9_E5 => 4,
            _ => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        use LinearFormat::*;
        match self {
            L8 => "L8",
            A4L4 => "A4L4",
            A8 => "A8",
            R8 => "R8",
            ARGB1555 => "ARGB1555",
            ABGR1555 => "ABGR1555",
            RGBA5551 => "RGBA5551",
            BGRA5551 => "BGRA5551",
            RGB565 => "RGB565",
            BGR565 => "BGR565",
            RGB555 => "RGB555",
            BGR555 => "BGR555",
            ARGB4444 => "ARGB4444",
            ABGR4444 => "ABGR4444",
            RGBA4444 => "RGBA4444",
            BGRA4444 => "BGRA4444",
            xRGB4444 => "xRGB4444",
            xBGR4444 => "xBGR4444",
            RGBx4444 => "RGBx4444",
            BGRx4444 => "BGRx4444",
            ARGB8332 => "ARGB8332",
            L16 => "L16",
            A8L8 => "A8L8",
            GR88 => "GR88",
            RGB888 => "RGB888",
            BGR888 => "BGR888",
            ARGB8888 => "ARGB8888",
            ABGR8888 => "ABGR8888",
            RGBA8888 => "RGBA8888",
            BGRA8888 => "BGRA8888",
            xRGB8888 => "xRGB8888",
            xBGR8888 => "xBGR8888",
            G16R16 => "G16R16",
            A2R10G10B10 => "A2R10G10B10",
            A2B10G10R10 => "A2B10G10R10",
            RGB9_E5 => "RGB9_E5",
        }
    }
}

/// Block-compressed encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressedFormat {
    /// DXT1. Decoded with 1-bit alpha unless the alpha mode is opaque.
    Bc1,
    /// DXT2/DXT3. Premultiplied alpha mode selects DXT2.
    Bc2,
    /// DXT4/DXT5. Premultiplied alpha mode selects DXT4.
    Bc3,
    /// RGTC1, red channel.
    Bc4,
    /// RGTC2, red and green channels.
    Bc5,
    /// BPTC.
    Bc7,
    /// LATC1, luminance.
    Latc1,
    /// LATC2, luminance and alpha.
    Latc2,
    Etc1,
    Etc2Rgb,
    Etc2RgbA1,
    Etc2Rgba,
    EacR11,
    EacRg11,
    /// PVRTC-I. Data covers the size rounded up to powers of two (at least
    /// 8x8 at 4bpp, 16x8 at 2bpp); the decoded raster is cropped back.
    Pvrtc { two_bpp: bool, alpha: bool },
    /// PVRTC-II.
    Pvrtc2 { two_bpp: bool },
    /// ASTC with the given block footprint.
    Astc { block_w: u8, block_h: u8 },
}

impl CompressedFormat {
    /// Block footprint in pixels.
    pub const fn block_dims(self) -> (usize, usize) {
        match self {
            CompressedFormat::Pvrtc { two_bpp: true, .. }
            | CompressedFormat::Pvrtc2 { two_bpp: true } => (8, 4),
            CompressedFormat::Astc { block_w, block_h } => (block_w as usize, block_h as usize),
            _ => (4, 4),
        }
    }

    /// Encoded size of one block in bytes.
    pub const fn block_bytes(self) -> usize {
        use CompressedFormat::*;
        match self {
            Bc1 | Bc4 | Latc1 | Etc1 | Etc2Rgb | Etc2RgbA1 | EacR11 | Pvrtc { .. }
            | Pvrtc2 { .. } => 8,
            _ => 16,
        }
    }

    pub const fn name(self) -> &'static str {
        use CompressedFormat::*;
        match self {
            Bc1 => "BC1",
            Bc2 => "BC2",
            Bc3 => "BC3",
            Bc4 => "BC4",
            Bc5 => "BC5",
            Bc7 => "BC7",
            Latc1 => "LATC1",
            Latc2 => "LATC2",
            Etc1 => "ETC1",
            Etc2Rgb => "ETC2 RGB",
            Etc2RgbA1 => "ETC2 RGB A1",
            Etc2Rgba => "ETC2 RGBA",
            EacR11 => "EAC R11",
            EacRg11 => "EAC RG11",
            Pvrtc { two_bpp: true, .. } => "PVRTC 2bpp",
            Pvrtc { two_bpp: false, .. } => "PVRTC 4bpp",
            Pvrtc2 { two_bpp: true } => "PVRTC-II 2bpp",
            Pvrtc2 { two_bpp: false } => "PVRTC-II 4bpp",
            Astc { .. } => "ASTC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Linear(LinearFormat),
    Compressed(CompressedFormat),
}

/// Resolved pixel format descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    pub kind: FormatKind,
    pub alpha: AlphaMode,
}

impl PixelFormat {
    pub const fn linear(format: LinearFormat, alpha: AlphaMode) -> Self {
        Self {
            kind: FormatKind::Linear(format),
            alpha,
        }
    }

    pub const fn compressed(format: CompressedFormat, alpha: AlphaMode) -> Self {
        Self {
            kind: FormatKind::Compressed(format),
            alpha,
        }
    }

    /// Bytes per pixel for linear formats, `None` for compressed ones.
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self.kind {
            FormatKind::Linear(f) => Some(f.bytes_per_pixel()),
            FormatKind::Compressed(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            FormatKind::Linear(f) => f.name(),
            FormatKind::Compressed(f) => f.name(),
        }
    }
}

// DDS pixel format flags (DDS_PIXELFORMAT.dwFlags).
pub const DDPF_ALPHAPIXELS: u32 = 0x1;
pub const DDPF_ALPHA: u32 = 0x2;
pub const DDPF_FOURCC: u32 = 0x4;
pub const DDPF_RGB: u32 = 0x40;
pub const DDPF_YUV: u32 = 0x200;
pub const DDPF_LUMINANCE: u32 = 0x20000;

struct MaskEntry {
    masks: [u32; 4],
    format: LinearFormat,
}

const fn m(r: u32, g: u32, b: u32, a: u32, format: LinearFormat) -> MaskEntry {
    MaskEntry {
        masks: [r, g, b, a],
        format,
    }
}

const MASKS_16: &[MaskEntry] = &[
    m(0x7C00, 0x03E0, 0x001F, 0x8000, LinearFormat::ARGB1555),
    m(0x001F, 0x03E0, 0x7C00, 0x8000, LinearFormat::ABGR1555),
    m(0xF800, 0x07C0, 0x003E, 0x0001, LinearFormat::RGBA5551),
    m(0x003E, 0x07C0, 0xF800, 0x0001, LinearFormat::BGRA5551),
    m(0xF800, 0x07E0, 0x001F, 0x0000, LinearFormat::RGB565),
    m(0x001F, 0x07E0, 0xF800, 0x0000, LinearFormat::BGR565),
    m(0x7C00, 0x03E0, 0x001F, 0x0000, LinearFormat::RGB555),
    m(0x001F, 0x03E0, 0x7C00, 0x0000, LinearFormat::BGR555),
    m(0x0F00, 0x00F0, 0x000F, 0xF000, LinearFormat::ARGB4444),
    m(0x000F, 0x00F0, 0x0F00, 0xF000, LinearFormat::ABGR4444),
    m(0xF000, 0x0F00, 0x00F0, 0x000F, LinearFormat::RGBA4444),
    m(0x00F0, 0x0F00, 0xF000, 0x000F, LinearFormat::BGRA4444),
    m(0x0F00, 0x00F0, 0x000F, 0x0000, LinearFormat::xRGB4444),
    m(0x000F, 0x00F0, 0x0F00, 0x0000, LinearFormat::xBGR4444),
    m(0xF000, 0x0F00, 0x00F0, 0x0000, LinearFormat::RGBx4444),
    m(0x00F0, 0x0F00, 0xF000, 0x0000, LinearFormat::BGRx4444),
    m(0x00E0, 0x001C, 0x0003, 0xFF00, LinearFormat::ARGB8332),
];

const MASKS_24: &[MaskEntry] = &[
    m(0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0, LinearFormat::RGB888),
    m(0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0, LinearFormat::BGR888),
];

const MASKS_32: &[MaskEntry] = &[
    m(0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000, LinearFormat::ARGB8888),
    m(0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000, LinearFormat::ABGR8888),
    m(0xFF00_0000, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, LinearFormat::RGBA8888),
    m(0x0000_FF00, 0x00FF_0000, 0xFF00_0000, 0x0000_00FF, LinearFormat::BGRA8888),
    m(0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0, LinearFormat::xRGB8888),
    m(0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0, LinearFormat::xBGR8888),
    m(0x0000_FFFF, 0xFFFF_0000, 0, 0, LinearFormat::G16R16),
    m(0x3FF0_0000, 0x000F_FC00, 0x0000_03FF, 0xC000_0000, LinearFormat::A2R10G10B10),
    m(0x0000_03FF, 0x000F_FC00, 0x3FF0_0000, 0xC000_0000, LinearFormat::A2B10G10R10),
];

const MASKS_LUMA: &[MaskEntry] = &[
    m(0x00FF, 0, 0, 0, LinearFormat::L8),
    m(0x000F, 0, 0, 0x00F0, LinearFormat::A4L4),
    m(0xFFFF, 0, 0, 0, LinearFormat::L16),
    m(0x00FF, 0, 0, 0xFF00, LinearFormat::A8L8),
];

const MASKS_ALPHA: &[MaskEntry] = &[m(0, 0, 0, 0x00FF, LinearFormat::A8)];

/// Resolve a classic DDS pixel format from its bit masks.
///
/// `flags` selects the table (RGB, luminance or alpha-only) and
/// `bit_count` the RGB table. All four masks must match exactly.
pub fn from_dds_masks(flags: u32, bit_count: u32, masks: [u32; 4]) -> Option<PixelFormat> {
    let table = if flags & DDPF_RGB != 0 {
        match bit_count {
            15 | 16 => MASKS_16,
            24 => MASKS_24,
            32 => MASKS_32,
            _ => return None,
        }
    } else if flags & DDPF_LUMINANCE != 0 {
        MASKS_LUMA
    } else if flags & DDPF_ALPHA != 0 {
        MASKS_ALPHA
    } else {
        return None;
    };

    let entry = table.iter().find(|e| e.masks == masks)?;
    let alpha = if masks[3] != 0 {
        AlphaMode::Straight
    } else {
        AlphaMode::Opaque
    };
    Some(PixelFormat::linear(entry.format, alpha))
}

/// Build a FourCC from its four ASCII characters (big-endian).
pub const fn fourcc(s: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*s)
}

pub const FOURCC_DX10: u32 = fourcc(b"DX10");
pub const FOURCC_XBOX: u32 = fourcc(b"XBOX");

/// Resolve a legacy DDS FourCC.
///
/// DXT2 and DXT4 carry premultiplied alpha, DXT3 and DXT5 straight alpha;
/// the block layouts are otherwise identical.
pub fn from_fourcc(code: u32) -> Option<PixelFormat> {
    use CompressedFormat::*;
    let (format, alpha) = match &code.to_be_bytes() {
        b"DXT1" => (Bc1, AlphaMode::Straight),
        b"DXT2" => (Bc2, AlphaMode::Premultiplied),
        b"DXT3" => (Bc2, AlphaMode::Straight),
        b"DXT4" => (Bc3, AlphaMode::Premultiplied),
        b"DXT5" => (Bc3, AlphaMode::Straight),
        b"ATI1" | b"BC4U" => (Bc4, AlphaMode::Straight),
        b"ATI2" | b"BC5U" => (Bc5, AlphaMode::Straight),
        b"PTC2" => (
            Pvrtc {
                two_bpp: true,
                alpha: true,
            },
            AlphaMode::Straight,
        ),
        b"PTC4" => (
            Pvrtc {
                two_bpp: false,
                alpha: true,
            },
            AlphaMode::Straight,
        ),
        _ => return None,
    };
    Some(PixelFormat::compressed(format, alpha))
}

/// DXGI_FORMAT values used by the resolver.
pub mod dxgi {
    pub const R10G10B10A2_TYPELESS: u32 = 23;
    pub const R10G10B10A2_UNORM: u32 = 24;
    pub const R10G10B10A2_UINT: u32 = 25;
    pub const R8G8B8A8_TYPELESS: u32 = 27;
    pub const R8G8B8A8_UNORM: u32 = 28;
    pub const R8G8B8A8_UNORM_SRGB: u32 = 29;
    pub const R8G8B8A8_UINT: u32 = 30;
    pub const R8G8B8A8_SNORM: u32 = 31;
    pub const R8G8B8A8_SINT: u32 = 32;
    pub const R16G16_TYPELESS: u32 = 33;
    pub const R16G16_SINT: u32 = 38;
    pub const R8G8_TYPELESS: u32 = 48;
    pub const R8G8_SINT: u32 = 52;
    pub const R8_UNORM: u32 = 61;
    pub const A8_UNORM: u32 = 65;
    pub const R9G9B9E5_SHAREDEXP: u32 = 67;
    pub const BC1_TYPELESS: u32 = 70;
    pub const BC1_UNORM: u32 = 71;
    pub const BC1_UNORM_SRGB: u32 = 72;
    pub const BC2_TYPELESS: u32 = 73;
    pub const BC2_UNORM_SRGB: u32 = 75;
    pub const BC3_TYPELESS: u32 = 76;
    pub const BC3_UNORM_SRGB: u32 = 78;
    pub const BC4_TYPELESS: u32 = 79;
    pub const BC4_SNORM: u32 = 81;
    pub const BC5_TYPELESS: u32 = 82;
    pub const BC5_SNORM: u32 = 84;
    pub const B5G6R5_UNORM: u32 = 85;
    pub const B5G5R5A1_UNORM: u32 = 86;
    pub const B8G8R8A8_UNORM: u32 = 87;
    pub const B8G8R8X8_UNORM: u32 = 88;
    pub const B8G8R8A8_TYPELESS: u32 = 90;
    pub const B8G8R8A8_UNORM_SRGB: u32 = 91;
    pub const B8G8R8X8_TYPELESS: u32 = 92;
    pub const B8G8R8X8_UNORM_SRGB: u32 = 93;
    pub const BC7_TYPELESS: u32 = 97;
    pub const BC7_UNORM: u32 = 98;
    pub const BC7_UNORM_SRGB: u32 = 99;
    pub const B4G4R4A4_UNORM: u32 = 115;

    /// Reserved range used internally for formats DXGI cannot express.
    /// Real files must never contain these values.
    pub const FAKE_START: u32 = 0x7FFF_FF00;
    pub const FAKE_END: u32 = 0x7FFF_FFFF;

    pub const fn is_fake(format: u32) -> bool {
        format >= FAKE_START && format <= FAKE_END
    }
}

/// Resolve a DXGI format from a DX10 DDS header.
///
/// The alpha mode is taken from `misc_flags2` rather than implied by the
/// format.
pub fn from_dxgi(format: u32, misc_flags2: u32) -> Option<PixelFormat> {
    use CompressedFormat::*;
    use LinearFormat::*;

    let alpha = AlphaMode::from_misc_flags2(misc_flags2);
    let kind = match format {
        dxgi::R10G10B10A2_TYPELESS..=dxgi::R10G10B10A2_UINT => FormatKind::Linear(A2B10G10R10),
        dxgi::R8G8B8A8_TYPELESS..=dxgi::R8G8B8A8_SINT => FormatKind::Linear(ABGR8888),
        dxgi::R16G16_TYPELESS..=dxgi::R16G16_SINT => FormatKind::Linear(G16R16),
        dxgi::R8G8_TYPELESS..=dxgi::R8G8_SINT => FormatKind::Linear(GR88),
        dxgi::R8_UNORM => FormatKind::Linear(R8),
        dxgi::A8_UNORM => FormatKind::Linear(A8),
        dxgi::R9G9B9E5_SHAREDEXP => FormatKind::Linear(RGB9_E5),
        dxgi::B5G6R5_UNORM => FormatKind::Linear(RGB565),
        dxgi::B5G5R5A1_UNORM => FormatKind::Linear(ARGB1555),
        dxgi::B8G8R8A8_UNORM | dxgi::B8G8R8A8_TYPELESS | dxgi::B8G8R8A8_UNORM_SRGB => {
            FormatKind::Linear(ARGB8888)
        }
        dxgi::B8G8R8X8_UNORM | dxgi::B8G8R8X8_TYPELESS | dxgi::B8G8R8X8_UNORM_SRGB => {
            FormatKind::Linear(xRGB8888)
        }
        dxgi::B4G4R4A4_UNORM => FormatKind::Linear(ARGB4444),
        dxgi::BC1_TYPELESS..=dxgi::BC1_UNORM_SRGB => FormatKind::Compressed(Bc1),
        dxgi::BC2_TYPELESS..=dxgi::BC2_UNORM_SRGB => FormatKind::Compressed(Bc2),
        dxgi::BC3_TYPELESS..=dxgi::BC3_UNORM_SRGB => FormatKind::Compressed(Bc3),
        dxgi::BC4_TYPELESS..=dxgi::BC4_SNORM => FormatKind::Compressed(Bc4),
        dxgi::BC5_TYPELESS..=dxgi::BC5_SNORM => FormatKind::Compressed(Bc5),
        dxgi::BC7_TYPELESS..=dxgi::BC7_UNORM_SRGB => FormatKind::Compressed(Bc7),
        _ => return None,
    };
    Some(PixelFormat { kind, alpha })
}

/// Name of a DXGI format, for field listings.
pub fn dxgi_name(format: u32) -> Option<&'static str> {
    Some(match format {
        23 => "R10G10B10A2_TYPELESS",
        24 => "R10G10B10A2_UNORM",
        25 => "R10G10B10A2_UINT",
        27 => "R8G8B8A8_TYPELESS",
        28 => "R8G8B8A8_UNORM",
        29 => "R8G8B8A8_UNORM_SRGB",
        30 => "R8G8B8A8_UINT",
        31 => "R8G8B8A8_SNORM",
        32 => "R8G8B8A8_SINT",
        33 => "R16G16_TYPELESS",
        34 => "R16G16_FLOAT",
        35 => "R16G16_UNORM",
        36 => "R16G16_UINT",
        37 => "R16G16_SNORM",
        38 => "R16G16_SINT",
        48 => "R8G8_TYPELESS",
        49 => "R8G8_UNORM",
        50 => "R8G8_UINT",
        51 => "R8G8_SNORM",
        52 => "R8G8_SINT",
        61 => "R8_UNORM",
        65 => "A8_UNORM",
        67 => "R9G9B9E5_SHAREDEXP",
        70 => "BC1_TYPELESS",
        71 => "BC1_UNORM",
        72 => "BC1_UNORM_SRGB",
        73 => "BC2_TYPELESS",
        74 => "BC2_UNORM",
        75 => "BC2_UNORM_SRGB",
        76 => "BC3_TYPELESS",
        77 => "BC3_UNORM",
        78 => "BC3_UNORM_SRGB",
        79 => "BC4_TYPELESS",
        80 => "BC4_UNORM",
        81 => "BC4_SNORM",
        82 => "BC5_TYPELESS",
        83 => "BC5_UNORM",
        84 => "BC5_SNORM",
        85 => "B5G6R5_UNORM",
        86 => "B5G5R5A1_UNORM",
        87 => "B8G8R8A8_UNORM",
        88 => "B8G8R8X8_UNORM",
        90 => "B8G8R8A8_TYPELESS",
        91 => "B8G8R8A8_UNORM_SRGB",
        92 => "B8G8R8X8_TYPELESS",
        93 => "B8G8R8X8_UNORM_SRGB",
        94 => "BC6H_TYPELESS",
        95 => "BC6H_UF16",
        96 => "BC6H_SF16",
        97 => "BC7_TYPELESS",
        98 => "BC7_UNORM",
        99 => "BC7_UNORM_SRGB",
        115 => "B4G4R4A4_UNORM",
        _ => return None,
    })
}

/// OpenGL enum values used by KTX.
pub mod gl {
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const UNSIGNED_SHORT: u32 = 0x1403;
    pub const UNSIGNED_INT: u32 = 0x1405;
    pub const FLOAT: u32 = 0x1406;
    pub const HALF_FLOAT: u32 = 0x140B;
    pub const UNSIGNED_SHORT_4_4_4_4: u32 = 0x8033;
    pub const UNSIGNED_SHORT_5_5_5_1: u32 = 0x8034;
    pub const UNSIGNED_SHORT_5_6_5: u32 = 0x8363;
    pub const UNSIGNED_INT_5_9_9_9_REV: u32 = 0x8C3E;

    pub const RED: u32 = 0x1903;
    pub const RGB: u32 = 0x1907;
    pub const RGBA: u32 = 0x1908;
    pub const LUMINANCE: u32 = 0x1909;
    pub const LUMINANCE_ALPHA: u32 = 0x190A;
    pub const RG: u32 = 0x8227;
    pub const RGB8: u32 = 0x8051;
    pub const RGBA8: u32 = 0x8058;
    pub const R8: u32 = 0x8229;
    pub const RG8: u32 = 0x822B;
    pub const RGB9_E5: u32 = 0x8C3D;

    pub const RGB_S3TC: u32 = 0x83A0;
    pub const RGB4_S3TC: u32 = 0x83A1;
    pub const RGBA_DXT5_S3TC: u32 = 0x83A4;
    pub const RGBA4_DXT5_S3TC: u32 = 0x83A5;
    pub const COMPRESSED_RGB_S3TC_DXT1: u32 = 0x83F0;
    pub const COMPRESSED_RGBA_S3TC_DXT1: u32 = 0x83F1;
    pub const COMPRESSED_RGBA_S3TC_DXT3: u32 = 0x83F2;
    pub const COMPRESSED_RGBA_S3TC_DXT5: u32 = 0x83F3;

    pub const ETC1_RGB8_OES: u32 = 0x8D64;
    pub const COMPRESSED_R11_EAC: u32 = 0x9270;
    pub const COMPRESSED_SIGNED_R11_EAC: u32 = 0x9271;
    pub const COMPRESSED_RG11_EAC: u32 = 0x9272;
    pub const COMPRESSED_SIGNED_RG11_EAC: u32 = 0x9273;
    pub const COMPRESSED_RGB8_ETC2: u32 = 0x9274;
    pub const COMPRESSED_SRGB8_ETC2: u32 = 0x9275;
    pub const COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9276;
    pub const COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9277;
    pub const COMPRESSED_RGBA8_ETC2_EAC: u32 = 0x9278;
    pub const COMPRESSED_SRGB8_ALPHA8_ETC2_EAC: u32 = 0x9279;

    pub const COMPRESSED_LUMINANCE_LATC1: u32 = 0x8C70;
    pub const COMPRESSED_SIGNED_LUMINANCE_LATC1: u32 = 0x8C71;
    pub const COMPRESSED_LUMINANCE_ALPHA_LATC2: u32 = 0x8C72;
    pub const COMPRESSED_SIGNED_LUMINANCE_ALPHA_LATC2: u32 = 0x8C73;
    pub const COMPRESSED_RED_RGTC1: u32 = 0x8DBB;
    pub const COMPRESSED_SIGNED_RED_RGTC1: u32 = 0x8DBC;
    pub const COMPRESSED_RG_RGTC2: u32 = 0x8DBD;
    pub const COMPRESSED_SIGNED_RG_RGTC2: u32 = 0x8DBE;

    pub const COMPRESSED_RGBA_BPTC_UNORM: u32 = 0x8E8C;
    pub const COMPRESSED_SRGB_ALPHA_BPTC_UNORM: u32 = 0x8E8D;

    pub const COMPRESSED_RGB_PVRTC_4BPPV1: u32 = 0x8C00;
    pub const COMPRESSED_RGB_PVRTC_2BPPV1: u32 = 0x8C01;
    pub const COMPRESSED_RGBA_PVRTC_4BPPV1: u32 = 0x8C02;
    pub const COMPRESSED_RGBA_PVRTC_2BPPV1: u32 = 0x8C03;
    pub const COMPRESSED_RGBA_PVRTC_2BPPV2: u32 = 0x9137;
    pub const COMPRESSED_RGBA_PVRTC_4BPPV2: u32 = 0x9138;

    pub const COMPRESSED_RGBA_ASTC_4X4: u32 = 0x93B0;
    pub const COMPRESSED_RGBA_ASTC_12X12: u32 = 0x93BD;
    pub const COMPRESSED_SRGB8_ALPHA8_ASTC_4X4: u32 = 0x93D0;
    pub const COMPRESSED_SRGB8_ALPHA8_ASTC_12X12: u32 = 0x93DD;
}

/// ASTC footprints in enum order, shared by the RGBA and sRGB ranges.
pub const ASTC_FOOTPRINTS: [(u8, u8); 14] = [
    (4, 4),
    (5, 4),
    (5, 5),
    (6, 5),
    (6, 6),
    (8, 5),
    (8, 6),
    (8, 8),
    (10, 5),
    (10, 6),
    (10, 8),
    (10, 10),
    (12, 10),
    (12, 12),
];

/// Footprint of an ASTC GL enum, from either the linear or the sRGB range.
pub fn astc_footprint(internal_format: u32) -> Option<(u8, u8)> {
    let idx = match internal_format {
        gl::COMPRESSED_RGBA_ASTC_4X4..=gl::COMPRESSED_RGBA_ASTC_12X12 => {
            internal_format - gl::COMPRESSED_RGBA_ASTC_4X4
        }
        gl::COMPRESSED_SRGB8_ALPHA8_ASTC_4X4..=gl::COMPRESSED_SRGB8_ALPHA8_ASTC_12X12 => {
            internal_format - gl::COMPRESSED_SRGB8_ALPHA8_ASTC_4X4
        }
        _ => return None,
    };
    ASTC_FOOTPRINTS.get(idx as usize).copied()
}

/// Resolve a KTX (OpenGL) format pair.
///
/// `format` is checked first for the uncompressed base formats; a zero or
/// unrecognised `format` falls through to `internal_format`.
pub fn from_gl(format: u32, internal_format: u32) -> Option<PixelFormat> {
    use CompressedFormat::*;
    use LinearFormat::*;

    let lin = |f, a| Some(PixelFormat::linear(f, a));
    let comp = |f, a| Some(PixelFormat::compressed(f, a));

    match format {
        gl::RGB => return lin(BGR888, AlphaMode::Opaque),
        gl::RGBA => return lin(ABGR8888, AlphaMode::Straight),
        gl::LUMINANCE => return lin(L8, AlphaMode::Opaque),
        gl::RGB9_E5 => return lin(RGB9_E5, AlphaMode::Opaque),
        _ => {}
    }

    match internal_format {
        gl::RGB8 => lin(BGR888, AlphaMode::Opaque),
        gl::RGBA8 => lin(ABGR8888, AlphaMode::Straight),
        gl::R8 => lin(R8, AlphaMode::Opaque),
        gl::RGB9_E5 => lin(RGB9_E5, AlphaMode::Opaque),

        gl::RGB_S3TC | gl::RGB4_S3TC | gl::COMPRESSED_RGB_S3TC_DXT1 => comp(Bc1, AlphaMode::Opaque),
        gl::COMPRESSED_RGBA_S3TC_DXT1 => comp(Bc1, AlphaMode::Straight),
        gl::COMPRESSED_RGBA_S3TC_DXT3 => comp(Bc2, AlphaMode::Straight),
        gl::RGBA_DXT5_S3TC | gl::RGBA4_DXT5_S3TC | gl::COMPRESSED_RGBA_S3TC_DXT5 => {
            comp(Bc3, AlphaMode::Straight)
        }

        gl::ETC1_RGB8_OES => comp(Etc1, AlphaMode::Opaque),
        gl::COMPRESSED_RGB8_ETC2 | gl::COMPRESSED_SRGB8_ETC2 => comp(Etc2Rgb, AlphaMode::Opaque),
        gl::COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2
        | gl::COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2 => comp(Etc2RgbA1, AlphaMode::Straight),
        gl::COMPRESSED_RGBA8_ETC2_EAC | gl::COMPRESSED_SRGB8_ALPHA8_ETC2_EAC => {
            comp(Etc2Rgba, AlphaMode::Straight)
        }
        gl::COMPRESSED_R11_EAC | gl::COMPRESSED_SIGNED_R11_EAC => comp(EacR11, AlphaMode::Opaque),
        gl::COMPRESSED_RG11_EAC | gl::COMPRESSED_SIGNED_RG11_EAC => {
            comp(EacRg11, AlphaMode::Opaque)
        }

        gl::COMPRESSED_RED_RGTC1 | gl::COMPRESSED_SIGNED_RED_RGTC1 => comp(Bc4, AlphaMode::Opaque),
        gl::COMPRESSED_RG_RGTC2 | gl::COMPRESSED_SIGNED_RG_RGTC2 => comp(Bc5, AlphaMode::Opaque),
        gl::COMPRESSED_LUMINANCE_LATC1 | gl::COMPRESSED_SIGNED_LUMINANCE_LATC1 => {
            comp(Latc1, AlphaMode::Opaque)
        }
        gl::COMPRESSED_LUMINANCE_ALPHA_LATC2 | gl::COMPRESSED_SIGNED_LUMINANCE_ALPHA_LATC2 => {
            comp(Latc2, AlphaMode::Straight)
        }

        gl::COMPRESSED_RGBA_BPTC_UNORM | gl::COMPRESSED_SRGB_ALPHA_BPTC_UNORM => {
            comp(Bc7, AlphaMode::Straight)
        }

        gl::COMPRESSED_RGB_PVRTC_2BPPV1 => comp(
            Pvrtc {
                two_bpp: true,
                alpha: false,
            },
            AlphaMode::Opaque,
        ),
        gl::COMPRESSED_RGBA_PVRTC_2BPPV1 => comp(
            Pvrtc {
                two_bpp: true,
                alpha: true,
            },
            AlphaMode::Straight,
        ),
        gl::COMPRESSED_RGB_PVRTC_4BPPV1 => comp(
            Pvrtc {
                two_bpp: false,
                alpha: false,
            },
            AlphaMode::Opaque,
        ),
        gl::COMPRESSED_RGBA_PVRTC_4BPPV1 => comp(
            Pvrtc {
                two_bpp: false,
                alpha: true,
            },
            AlphaMode::Straight,
        ),
        gl::COMPRESSED_RGBA_PVRTC_2BPPV2 => comp(Pvrtc2 { two_bpp: true }, AlphaMode::Straight),
        gl::COMPRESSED_RGBA_PVRTC_4BPPV2 => comp(Pvrtc2 { two_bpp: false }, AlphaMode::Straight),

        _ => {
            let (block_w, block_h) = astc_footprint(internal_format)?;
            comp(Astc { block_w, block_h }, AlphaMode::Straight)
        }
    }
}

/// Name of an OpenGL enum, for field listings.
pub fn gl_name(value: u32) -> Option<&'static str> {
    Some(match value {
        gl::UNSIGNED_BYTE => "GL_UNSIGNED_BYTE",
        gl::UNSIGNED_SHORT => "GL_UNSIGNED_SHORT",
        gl::UNSIGNED_INT => "GL_UNSIGNED_INT",
        gl::FLOAT => "GL_FLOAT",
        gl::HALF_FLOAT => "GL_HALF_FLOAT",
        gl::UNSIGNED_SHORT_4_4_4_4 => "GL_UNSIGNED_SHORT_4_4_4_4",
        gl::UNSIGNED_SHORT_5_5_5_1 => "GL_UNSIGNED_SHORT_5_5_5_1",
        gl::UNSIGNED_SHORT_5_6_5 => "GL_UNSIGNED_SHORT_5_6_5",
        gl::UNSIGNED_INT_5_9_9_9_REV => "GL_UNSIGNED_INT_5_9_9_9_REV",
        gl::RED => "GL_RED",
        gl::RGB => "GL_RGB",
        gl::RGBA => "GL_RGBA",
        gl::LUMINANCE => "GL_LUMINANCE",
        gl::LUMINANCE_ALPHA => "GL_LUMINANCE_ALPHA",
        gl::RG => "GL_RG",
        gl::RGB8 => "GL_RGB8",
        gl::RGBA8 => "GL_RGBA8",
        gl::R8 => "GL_R8",
        gl::RG8 => "GL_RG8",
        gl::RGB9_E5 => "GL_RGB9_E5",
        gl::RGB_S3TC => "GL_RGB_S3TC",
        gl::RGB4_S3TC => "GL_RGB4_S3TC",
        gl::RGBA_DXT5_S3TC => "GL_RGBA_DXT5_S3TC",
        gl::RGBA4_DXT5_S3TC => "GL_RGBA4_DXT5_S3TC",
        gl::COMPRESSED_RGB_S3TC_DXT1 => "GL_COMPRESSED_RGB_S3TC_DXT1_EXT",
        gl::COMPRESSED_RGBA_S3TC_DXT1 => "GL_COMPRESSED_RGBA_S3TC_DXT1_EXT",
        gl::COMPRESSED_RGBA_S3TC_DXT3 => "GL_COMPRESSED_RGBA_S3TC_DXT3_EXT",
        gl::COMPRESSED_RGBA_S3TC_DXT5 => "GL_COMPRESSED_RGBA_S3TC_DXT5_EXT",
        gl::ETC1_RGB8_OES => "GL_ETC1_RGB8_OES",
        gl::COMPRESSED_R11_EAC => "GL_COMPRESSED_R11_EAC",
        gl::COMPRESSED_SIGNED_R11_EAC => "GL_COMPRESSED_SIGNED_R11_EAC",
        gl::COMPRESSED_RG11_EAC => "GL_COMPRESSED_RG11_EAC",
        gl::COMPRESSED_SIGNED_RG11_EAC => "GL_COMPRESSED_SIGNED_RG11_EAC",
        gl::COMPRESSED_RGB8_ETC2 => "GL_COMPRESSED_RGB8_ETC2",
        gl::COMPRESSED_SRGB8_ETC2 => "GL_COMPRESSED_SRGB8_ETC2",
        gl::COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2 => {
            "GL_COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2"
        }
        gl::COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2 => {
            "GL_COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2"
        }
        gl::COMPRESSED_RGBA8_ETC2_EAC => "GL_COMPRESSED_RGBA8_ETC2_EAC",
        gl::COMPRESSED_SRGB8_ALPHA8_ETC2_EAC => "GL_COMPRESSED_SRGB8_ALPHA8_ETC2_EAC",
        gl::COMPRESSED_LUMINANCE_LATC1 => "GL_COMPRESSED_LUMINANCE_LATC1_EXT",
        gl::COMPRESSED_SIGNED_LUMINANCE_LATC1 => "GL_COMPRESSED_SIGNED_LUMINANCE_LATC1_EXT",
        gl::COMPRESSED_LUMINANCE_ALPHA_LATC2 => "GL_COMPRESSED_LUMINANCE_ALPHA_LATC2_EXT",
        gl::COMPRESSED_SIGNED_LUMINANCE_ALPHA_LATC2 => {
            "GL_COMPRESSED_SIGNED_LUMINANCE_ALPHA_LATC2_EXT"
        }
        gl::COMPRESSED_RED_RGTC1 => "GL_COMPRESSED_RED_RGTC1",
        gl::COMPRESSED_SIGNED_RED_RGTC1 => "GL_COMPRESSED_SIGNED_RED_RGTC1",
        gl::COMPRESSED_RG_RGTC2 => "GL_COMPRESSED_RG_RGTC2",
        gl::COMPRESSED_SIGNED_RG_RGTC2 => "GL_COMPRESSED_SIGNED_RG_RGTC2",
        gl::COMPRESSED_RGBA_BPTC_UNORM => "GL_COMPRESSED_RGBA_BPTC_UNORM",
        gl::COMPRESSED_SRGB_ALPHA_BPTC_UNORM => "GL_COMPRESSED_SRGB_ALPHA_BPTC_UNORM",
        gl::COMPRESSED_RGB_PVRTC_4BPPV1 => "GL_COMPRESSED_RGB_PVRTC_4BPPV1_IMG",
        gl::COMPRESSED_RGB_PVRTC_2BPPV1 => "GL_COMPRESSED_RGB_PVRTC_2BPPV1_IMG",
        gl::COMPRESSED_RGBA_PVRTC_4BPPV1 => "GL_COMPRESSED_RGBA_PVRTC_4BPPV1_IMG",
        gl::COMPRESSED_RGBA_PVRTC_2BPPV1 => "GL_COMPRESSED_RGBA_PVRTC_2BPPV1_IMG",
        gl::COMPRESSED_RGBA_PVRTC_2BPPV2 => "GL_COMPRESSED_RGBA_PVRTC_2BPPV2_IMG",
        gl::COMPRESSED_RGBA_PVRTC_4BPPV2 => "GL_COMPRESSED_RGBA_PVRTC_4BPPV2_IMG",
        _ => return astc_name(value),
    })
}

fn astc_name(value: u32) -> Option<&'static str> {
    const RGBA: [&str; 14] = [
        "GL_COMPRESSED_RGBA_ASTC_4x4_KHR",
        "GL_COMPRESSED_RGBA_ASTC_5x4_KHR",
        "GL_COMPRESSED_RGBA_ASTC_5x5_KHR",
        "GL_COMPRESSED_RGBA_ASTC_6x5_KHR",
        "GL_COMPRESSED_RGBA_ASTC_6x6_KHR",
        "GL_COMPRESSED_RGBA_ASTC_8x5_KHR",
        "GL_COMPRESSED_RGBA_ASTC_8x6_KHR",
        "GL_COMPRESSED_RGBA_ASTC_8x8_KHR",
        "GL_COMPRESSED_RGBA_ASTC_10x5_KHR",
        "GL_COMPRESSED_RGBA_ASTC_10x6_KHR",
        "GL_COMPRESSED_RGBA_ASTC_10x8_KHR",
        "GL_COMPRESSED_RGBA_ASTC_10x10_KHR",
        "GL_COMPRESSED_RGBA_ASTC_12x10_KHR",
        "GL_COMPRESSED_RGBA_ASTC_12x12_KHR",
    ];
    const SRGB: [&str; 14] = [
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_4x4_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_5x4_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_5x5_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_6x5_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_6x6_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_8x5_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_8x6_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_8x8_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_10x5_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_10x6_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_10x8_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_10x10_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_12x10_KHR",
        "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_12x12_KHR",
    ];
    match value {
        gl::COMPRESSED_RGBA_ASTC_4X4..=gl::COMPRESSED_RGBA_ASTC_12X12 => {
            RGBA.get((value - gl::COMPRESSED_RGBA_ASTC_4X4) as usize).copied()
        }
        gl::COMPRESSED_SRGB8_ALPHA8_ASTC_4X4..=gl::COMPRESSED_SRGB8_ALPHA8_ASTC_12X12 => SRGB
            .get((value - gl::COMPRESSED_SRGB8_ALPHA8_ASTC_4X4) as usize)
            .copied(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_must_match_exactly() {
        let rgb565 = from_dds_masks(DDPF_RGB, 16, [0xF800, 0x07E0, 0x001F, 0]).unwrap();
        assert_eq!(rgb565.kind, FormatKind::Linear(LinearFormat::RGB565));
        assert_eq!(rgb565.alpha, AlphaMode::Opaque);
        assert!(from_dds_masks(DDPF_RGB, 16, [0xF800, 0x07E0, 0x001E, 0]).is_none());
        assert!(from_dds_masks(DDPF_RGB, 8, [0xE0, 0x1C, 0x03, 0]).is_none());
    }

    #[test]
    fn bit_count_15_uses_16_bit_table() {
        let f = from_dds_masks(DDPF_RGB, 15, [0x7C00, 0x03E0, 0x001F, 0]).unwrap();
        assert_eq!(f.kind, FormatKind::Linear(LinearFormat::RGB555));
        assert_eq!(f.bytes_per_pixel(), Some(2));
    }

    #[test]
    fn dxt_alpha_defaults() {
        assert_eq!(
            from_fourcc(fourcc(b"DXT2")).unwrap().alpha,
            AlphaMode::Premultiplied
        );
        assert_eq!(
            from_fourcc(fourcc(b"DXT3")).unwrap().alpha,
            AlphaMode::Straight
        );
        assert!(from_fourcc(fourcc(b"XYZW")).is_none());
    }

    #[test]
    fn astc_ranges() {
        assert_eq!(astc_footprint(0x93B0), Some((4, 4)));
        assert_eq!(astc_footprint(0x93DD), Some((12, 12)));
        assert_eq!(astc_footprint(0x93BE), None);
        assert_eq!(
            from_gl(0, 0x93D7).unwrap().kind,
            FormatKind::Compressed(CompressedFormat::Astc {
                block_w: 8,
                block_h: 8
            })
        );
    }

    #[test]
    fn dxgi_alpha_comes_from_misc_flags() {
        let f = from_dxgi(71, 3).unwrap();
        assert_eq!(f.kind, FormatKind::Compressed(CompressedFormat::Bc1));
        assert_eq!(f.alpha, AlphaMode::Opaque);
        assert!(dxgi::is_fake(0x7FFF_FF00));
        assert!(!dxgi::is_fake(98));
    }
}

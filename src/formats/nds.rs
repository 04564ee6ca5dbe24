//! Nintendo DS / DSi ROM images.
//!
//! ## Header (0x200 bytes at offset 0)
//! ```text
//! [0x000] Title                     (12 bytes, ASCII, NUL-padded)
//! [0x00C] Game code                 (4 bytes)
//! [0x010] Maker code                (2 bytes)
//! [0x012] Unit code (0=NDS, 2=NDS+DSi, 3=DSi)
//! [0x013] Encryption seed select
//! [0x014] Device capacity (128 KiB << n)
//! [0x01D] NDS region
//! [0x01E] ROM version
//! [0x01F] Autostart
//! [0x020] ARM9 {rom_offset, entry_address, ram_address, size} (4 × u32)
//! [0x030] ARM7 {rom_offset, entry_address, ram_address, size} (4 × u32)
//! [0x040] FNT offset, size          (u32, u32)
//! [0x048] FAT offset, size          (u32, u32)
//! [0x068] Icon/title offset         (u32)
//! [0x06C] Secure area CRC16         (u16)
//! [0x080] Total used ROM size       (u32)
//! [0x084] Header size               (u32)
//! [0x0C0] Nintendo logo             (156 bytes, starts 24 FF AE 51)
//! [0x15C] Logo CRC16 (0xCF56)       (u16)
//! [0x15E] Header CRC16 over 0x000..0x15E (u16)
//! [0x210] DSi total used ROM size   (u32, DSi titles only)
//! ```
//!
//! ## Secure area and security data
//! ```text
//! [0x1000..0x4000] security data: Blowfish tables, static test pattern,
//!                  random filler (blank in most cartridge dumps)
//! [0x4000..0x8000] ARM9 secure area; first 2 KiB KEY1-encrypted on retail
//!                  cartridges
//! ```
//!
//! ## ROM operations
//! | Id | Operation | Enabled when |
//! |----|-----------|--------------|
//! | 0  | Trim / Untrim | ROM size differs from the used size, or is not a power of two |
//! | 1  | Encrypt / Decrypt | secure area is decrypted / encrypted (`decryption` feature) |
//!
//! Untrim pads with 0xFF in 64 KiB blocks up to the next power of two. A
//! write failure part way leaves the file at whatever was written; there is
//! no rollback. Decrypting is not supported.

use std::io::{Read, Seek, SeekFrom};

use bitflags::bitflags;
use tracing::{debug, info};

use super::DetectionInfo;
use crate::crypto::crc16;
use crate::fields::Fields;
use crate::file::{RomFile, stream_len};
use crate::keys::NdsBlowfishKey;
use crate::utils::{Endian, Span, read_at};
use crate::{Error, Result};

pub const HEADER_SIZE: usize = 0x200;

/// Expected CRC16 of the Nintendo logo.
pub const LOGO_CRC: u16 = 0xCF56;

/// Leading bytes of the Nintendo logo bitmap at 0xC0.
pub const LOGO_PREFIX: [u8; 4] = [0x24, 0xFF, 0xAE, 0x51];

const LOGO_OFFSET: usize = 0xC0;
const LOGO_CRC_OFFSET: usize = 0x15C;
const HEADER_CRC_OFFSET: usize = 0x15E;
const DSI_USED_SIZE_OFFSET: u64 = 0x210;

const SECURITY_DATA_OFFSET: u64 = 0x1000;
const SECURITY_DATA_LEN: usize = 0x3000;
const SECURE_AREA_OFFSET: u64 = 0x4000;
const SECURE_AREA_MAGIC_DECRYPTED: u32 = 0xE7FF_DEFF;

/// Bytes read, encrypted and written back by the encrypt operation.
pub const SECURE_AREA_OP_SIZE: usize = 32 * 1024;

/// Block size of the untrim fill.
pub const UNTRIM_BLOCK_SIZE: usize = 64 * 1024;

/// Known static test pattern in the security data (big-endian words).
const STATIC_PATTERN: [(usize, u32); 12] = [
    (0x2000, 0xFF00_FF00),
    (0x2004, 0xAA55_AA55),
    (0x2008, 0x0809_0A0B),
    (0x200C, 0x0C0D_0E0F),
    (0x2200, 0xFFFE_FDFC),
    (0x2204, 0xFBFA_F9F8),
    (0x2400, 0x0000_0000),
    (0x2600, 0xFFFF_FFFF),
    (0x2800, 0x0F0F_0F0F),
    (0x2A00, 0xF0F0_F0F0),
    (0x2C00, 0x5555_5555),
    (0x2E00, 0xAAAA_AAAA),
];

bitflags! {
    /// What the security-data area (0x1000..0x4000) contains.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SecurityData: u32 {
        const BLOWFISH = 1 << 0;
        const STATIC = 1 << 1;
        const RANDOM = 1 << 2;
    }
}

const SECURITY_DATA_NAMES: &[Option<&str>] = &[Some("Blowfish"), Some("Static"), Some("Random")];

impl SecurityData {
    /// Classify a 0x3000-byte security-data block.
    pub fn classify(data: &[u8]) -> Self {
        let s = Span::new(data);
        let word = |off: usize| s.u32(off, Endian::Big).unwrap_or(0);
        let mut flags = SecurityData::empty();
        if word(0x0600) != 0 && word(0x0C00) != 0 {
            flags |= SecurityData::BLOWFISH;
        }
        if data.len() >= SECURITY_DATA_LEN
            && STATIC_PATTERN.iter().all(|&(off, v)| word(off) == v)
        {
            flags |= SecurityData::STATIC;
        }
        if word(0x0000) != 0 || word(0x0700) != 0 || word(0x1C00) != 0 {
            flags |= SecurityData::RANDOM;
        }
        flags
    }
}

/// State of the ARM9 secure area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecureArea {
    #[default]
    Unknown,
    /// No secure area (ARM9 code starts below 0x4000).
    Homebrew,
    /// Secure area is blank (download play).
    Multiboot,
    Decrypted,
    Encrypted,
}

impl SecureArea {
    /// Classify from the ARM9 ROM offset and the first 8 bytes at 0x4000.
    pub fn classify(arm9_rom_offset: u32, first: Option<[u32; 2]>) -> Self {
        let Some(words) = first else {
            return SecureArea::Unknown;
        };
        if arm9_rom_offset < SECURE_AREA_OFFSET as u32 {
            SecureArea::Homebrew
        } else if words == [0, 0] {
            SecureArea::Multiboot
        } else if words == [SECURE_AREA_MAGIC_DECRYPTED; 2] {
            SecureArea::Decrypted
        } else {
            SecureArea::Encrypted
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SecureArea::Unknown => "Unknown",
            SecureArea::Homebrew => "Homebrew",
            SecureArea::Multiboot => "Multiboot",
            SecureArea::Decrypted => "Decrypted",
            SecureArea::Encrypted => "Encrypted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArmSection {
    pub rom_offset: u32,
    pub entry_address: u32,
    pub ram_address: u32,
    pub size: u32,
}

impl ArmSection {
    fn parse(s: Span<'_>, off: usize) -> Result<Self> {
        Ok(Self {
            rom_offset: s.le_u32(off)?,
            entry_address: s.le_u32(off + 4)?,
            ram_address: s.le_u32(off + 8)?,
            size: s.le_u32(off + 12)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdsHeader {
    pub title: String,
    pub game_code: [u8; 4],
    pub maker_code: [u8; 2],
    pub unit_code: u8,
    pub seed_select: u8,
    pub device_capacity: u8,
    pub region: u8,
    pub rom_version: u8,
    pub autostart: u8,
    pub arm9: ArmSection,
    pub arm7: ArmSection,
    pub fnt: (u32, u32),
    pub fat: (u32, u32),
    pub icon_offset: u32,
    pub secure_area_crc: u16,
    pub total_used_rom_size: u32,
    pub header_size: u32,
    pub logo_crc: u16,
    pub header_crc: u16,
    /// Header CRC16 computed over 0x000..0x15E.
    pub computed_header_crc: u16,
    /// Used size from the DSi extended header.
    pub dsi_total_used_rom_size: Option<u32>,
}

impl NdsHeader {
    pub fn parse(s: Span<'_>) -> Result<Self> {
        s.magic(LOGO_OFFSET, &LOGO_PREFIX)?;
        let logo_crc = s.le_u16(LOGO_CRC_OFFSET)?;
        if logo_crc != LOGO_CRC {
            return Err(Error::BadMagic);
        }
        let title = s.bytes(0, 12)?;
        let title_len = title.iter().position(|&b| b == 0).unwrap_or(title.len());
        Ok(Self {
            title: String::from_utf8_lossy(&title[..title_len]).into_owned(),
            game_code: s.bytes_at(0x0C)?,
            maker_code: s.bytes_at(0x10)?,
            unit_code: s.u8(0x12)?,
            seed_select: s.u8(0x13)?,
            device_capacity: s.u8(0x14)?,
            region: s.u8(0x1D)?,
            rom_version: s.u8(0x1E)?,
            autostart: s.u8(0x1F)?,
            arm9: ArmSection::parse(s, 0x20)?,
            arm7: ArmSection::parse(s, 0x30)?,
            fnt: (s.le_u32(0x40)?, s.le_u32(0x44)?),
            fat: (s.le_u32(0x48)?, s.le_u32(0x4C)?),
            icon_offset: s.le_u32(0x68)?,
            secure_area_crc: s.le_u16(0x6C)?,
            total_used_rom_size: s.le_u32(0x80)?,
            header_size: s.le_u32(0x84)?,
            logo_crc,
            header_crc: s.le_u16(HEADER_CRC_OFFSET)?,
            computed_header_crc: crc16(s.bytes(0, HEADER_CRC_OFFSET)?),
            dsi_total_used_rom_size: None,
        })
    }

    pub fn is_dsi(&self) -> bool {
        self.unit_code & 0x02 != 0
    }

    /// Bytes of the image actually used by the title.
    pub fn used_rom_size(&self) -> u32 {
        match self.dsi_total_used_rom_size {
            Some(n) if self.is_dsi() => n,
            _ => self.total_used_rom_size,
        }
    }

    pub fn game_code_str(&self) -> String {
        String::from_utf8_lossy(&self.game_code).into_owned()
    }

    pub fn maker_code_str(&self) -> String {
        String::from_utf8_lossy(&self.maker_code).into_owned()
    }
}

fn unit_code_name(unit_code: u8) -> &'static str {
    match unit_code {
        0x00 => "Nintendo DS",
        0x02 => "Nintendo DS, Nintendo DSi",
        0x03 => "Nintendo DSi",
        _ => "Unknown",
    }
}

/// An entry of [`Nds::list_operations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomOp {
    pub id: u32,
    pub desc: &'static str,
    pub enabled: bool,
}

pub const OP_TRIM: u32 = 0;
#[cfg(feature = "decryption")]
pub const OP_CRYPT: u32 = 1;

/// An opened NDS ROM image.
#[derive(Debug)]
pub struct Nds<R> {
    inner: Option<R>,
    pub header: NdsHeader,
    rom_size: u64,
    secure_area: SecureArea,
    security_data: SecurityData,
}

impl<R: Read + Seek> Nds<R> {
    pub fn is_supported(info: &DetectionInfo<'_>) -> bool {
        let s = Span::new(info.header);
        s.magic(LOGO_OFFSET, &LOGO_PREFIX).is_ok()
            && s.le_u16(LOGO_CRC_OFFSET).is_ok_and(|crc| crc == LOGO_CRC)
    }

    pub fn open(mut inner: R) -> Result<Self> {
        let buf = read_at(&mut inner, 0, HEADER_SIZE)?;
        let mut header = NdsHeader::parse(Span::new(&buf))?;
        if header.is_dsi() {
            header.dsi_total_used_rom_size = read_at(&mut inner, DSI_USED_SIZE_OFFSET, 4)
                .ok()
                .and_then(|b| Span::new(&b).le_u32(0).ok());
        }
        let mut nds = Self {
            inner: Some(inner),
            header,
            rom_size: 0,
            secure_area: SecureArea::Unknown,
            security_data: SecurityData::empty(),
        };
        nds.refresh();
        debug!(
            game_code = %nds.header.game_code_str(),
            rom_size = nds.rom_size,
            secure_area = ?nds.secure_area,
            "opened NDS ROM"
        );
        Ok(nds)
    }

    pub fn close(&mut self) {
        self.inner = None;
    }

    pub fn rom_size(&self) -> u64 {
        self.rom_size
    }

    pub fn secure_area(&self) -> SecureArea {
        self.secure_area
    }

    pub fn security_data(&self) -> SecurityData {
        self.security_data
    }

    /// Re-derive the file size, secure-area state and security data from
    /// the file. A closed handle yields an unknown state.
    pub fn refresh(&mut self) {
        let arm9 = self.header.arm9.rom_offset;
        let Some(file) = self.inner.as_mut() else {
            self.secure_area = SecureArea::Unknown;
            self.security_data = SecurityData::empty();
            return;
        };
        self.rom_size = stream_len(file).unwrap_or(0);
        self.security_data = read_at(file, SECURITY_DATA_OFFSET, SECURITY_DATA_LEN)
            .map(|b| SecurityData::classify(&b))
            .unwrap_or_default();
        let first = read_at(file, SECURE_AREA_OFFSET, 16).ok().and_then(|b| {
            let s = Span::new(&b);
            Some([s.le_u32(0).ok()?, s.le_u32(4).ok()?])
        });
        self.secure_area = SecureArea::classify(arm9, first);
    }

    fn trim_state(&self) -> (bool, bool) {
        let used = self.header.used_rom_size() as u64;
        if self.rom_size == 0 || (used == self.rom_size && self.rom_size.is_power_of_two()) {
            (false, false)
        } else {
            (used >= self.rom_size, true)
        }
    }

    /// Operations available on this ROM in its current state.
    pub fn list_operations(&self) -> Vec<RomOp> {
        let (untrim, enabled) = self.trim_state();
        let mut ops = Vec::with_capacity(2);
        ops.push(RomOp {
            id: OP_TRIM,
            desc: if untrim { "Untrim ROM" } else { "Trim ROM" },
            enabled,
        });
        #[cfg(feature = "decryption")]
        ops.push(RomOp {
            id: OP_CRYPT,
            desc: if self.secure_area == SecureArea::Decrypted {
                "Encrypt ROM"
            } else {
                "Decrypt ROM"
            },
            enabled: matches!(
                self.secure_area,
                SecureArea::Decrypted | SecureArea::Encrypted
            ),
        });
        ops
    }

    pub fn fields(&self) -> Fields {
        let h = &self.header;
        let mut f = Fields::new();
        f.add_string("Title", h.title.clone());
        f.add_string("Game ID", format!("{}{}", h.game_code_str(), h.maker_code_str()));
        f.add_string("Publisher", h.maker_code_str());
        f.add_dec("Revision", h.rom_version as u64);
        f.add_string("Hardware", unit_code_name(h.unit_code));
        f.add_hex("DS Region", h.region as u64, 2);
        f.add_dec("Capacity (KiB)", 128u64 << h.device_capacity.min(20));
        f.add_dec("ROM Size", self.rom_size);
        f.add_dec("Used ROM Size", h.used_rom_size() as u64);
        f.add_string("Secure Area", self.secure_area.name());
        f.add_bitfield(
            "Security Data",
            SECURITY_DATA_NAMES,
            3,
            self.security_data.bits(),
        );
        f.add_hex("ARM9 Entry", h.arm9.entry_address as u64, 8);
        f.add_hex("ARM9 Size", h.arm9.size as u64, 8);
        f.add_hex("ARM7 Entry", h.arm7.entry_address as u64, 8);
        f.add_hex("ARM7 Size", h.arm7.size as u64, 8);
        let crc_state = if h.header_crc == h.computed_header_crc {
            "valid"
        } else {
            "invalid"
        };
        f.add_string(
            "Header Checksum",
            format!("0x{:04X} ({crc_state})", h.header_crc),
        );
        f
    }
}

impl<R: RomFile> Nds<R> {
    /// Run operation `id` from [`list_operations`](Self::list_operations).
    ///
    /// `key` is needed only to encrypt. The derived state is refreshed
    /// afterwards whether or not the operation succeeded.
    pub fn perform_operation(&mut self, id: u32, key: Option<&NdsBlowfishKey>) -> Result<()> {
        let res = self.perform(id, key);
        self.refresh();
        match &res {
            Ok(()) => info!(op = id, rom_size = self.rom_size, "NDS ROM operation done"),
            Err(e) => debug!(op = id, error = %e, "NDS ROM operation failed"),
        }
        res
    }

    fn perform(&mut self, id: u32, key: Option<&NdsBlowfishKey>) -> Result<()> {
        let used = self.header.used_rom_size() as u64;
        let (untrim, enabled) = self.trim_state();
        match id {
            OP_TRIM if enabled && untrim => untrim_file(self.rom_file()?, used),
            OP_TRIM if enabled => {
                let file = self.rom_file()?;
                file.set_len(used)?;
                file.flush()?;
                Ok(())
            }
            #[cfg(feature = "decryption")]
            OP_CRYPT if self.secure_area == SecureArea::Decrypted => {
                let key = key.ok_or(Error::MissingResource(crate::keys::NDS_BLOWFISH_FILE))?;
                let file = self.rom_file()?;
                let mut buf = read_at(file, 0, SECURE_AREA_OP_SIZE)?;
                crate::crypto::ndscrypt::encrypt_secure_area(&mut buf, key)?;
                file.seek(SeekFrom::Start(0))?;
                file.write_all(&buf)?;
                file.flush()?;
                Ok(())
            }
            _ => {
                let _ = key;
                Err(Error::UnsupportedOperation)
            }
        }
    }

    fn rom_file(&mut self) -> Result<&mut R> {
        self.inner.as_mut().ok_or(Error::Closed)
    }
}

/// Pad `file` with 0xFF from `used` to the next power of two.
fn untrim_file<F: RomFile>(file: &mut F, used: u64) -> Result<()> {
    if used == 0 {
        return Err(Error::UnsupportedOperation);
    }
    let next = 1u64
        .checked_shl(used.ilog2() + 1)
        .ok_or(Error::OutOfRange)?;
    let block = vec![0xFFu8; UNTRIM_BLOCK_SIZE];
    let mut pos = used;
    file.seek(SeekFrom::Start(pos))?;

    let partial = (pos % UNTRIM_BLOCK_SIZE as u64) as usize;
    if partial != 0 {
        let n = UNTRIM_BLOCK_SIZE - partial;
        file.write_all(&block[..n])?;
        pos += n as u64;
    }
    while pos < next {
        file.write_all(&block)?;
        pos += UNTRIM_BLOCK_SIZE as u64;
    }
    file.flush()?;
    Ok(())
}

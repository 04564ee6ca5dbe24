//! KEY1 secure-area encryption for Nintendo DS ROM images.
//!
//! ## KEY1
//!
//! KEY1 is Blowfish with a 16-round Feistel network whose initial state is
//! the BIOS key table ([`NdsBlowfishKey`]). Before use the state is mixed
//! with a "keycode" derived from the 4-byte game code:
//!
//! ```text
//! keycode = [gamecode, gamecode >> 1, gamecode << 1]
//! level 1:  apply_keycode
//! level 2:  apply_keycode
//!           keycode[1] <<= 1, keycode[2] >>= 1
//! level 3:  apply_keycode
//! ```
//!
//! ## Secure area
//!
//! The first 2 KiB of the secure area (0x4000..0x4800) are stored
//! encrypted on retail cartridges. A decrypted dump carries
//! `E7FFDEFF E7FFDEFF` in its first 8 bytes, where the encrypted form has
//! the ID string `"encryObj"`. Encryption:
//!
//! ```text
//! 1. replace the first 8 bytes with "encryObj"
//! 2. level 3 keys: encrypt every 8-byte block of 0x4000..0x4800
//! 3. level 2 keys: encrypt the first block again
//! 4. update the secure-area CRC (0x6C) and the header CRC (0x15E)
//! ```

use crate::crypto::crc16;
use crate::keys::{NDS_BLOWFISH_WORDS, NdsBlowfishKey};
use crate::{Error, Result};

/// Offset of the secure area in a ROM image.
pub const SECURE_AREA_OFFSET: usize = 0x4000;

/// Length of the encrypted part of the secure area.
pub const SECURE_AREA_CRYPT_LEN: usize = 0x800;

/// The whole secure area, covered by the header's secure-area CRC.
pub const SECURE_AREA_LEN: usize = 0x4000;

/// First word of a decrypted secure area (an undefined ARM instruction).
pub const DECRYPTED_MAGIC: u32 = 0xE7FF_DEFF;

/// `"encryObj"` as two little-endian words.
const ENCRYOBJ: [u32; 2] = [0x7263_6E65, 0x6A62_4F79];

/// Expanded KEY1 state for one game code and level.
pub(crate) struct Key1 {
    buf: Box<[u32; NDS_BLOWFISH_WORDS]>,
}

impl Key1 {
    /// Derive the KEY1 state for `idcode` at `level` (1..=3).
    pub(crate) fn new(key: &NdsBlowfishKey, idcode: u32, level: u8, modulo: usize) -> Self {
        let mut k = Key1 {
            buf: key.words.clone(),
        };
        let mut keycode = [idcode, idcode >> 1, idcode << 1];
        if level >= 1 {
            k.apply_keycode(&mut keycode, modulo);
        }
        if level >= 2 {
            k.apply_keycode(&mut keycode, modulo);
        }
        keycode[1] <<= 1;
        keycode[2] >>= 1;
        if level >= 3 {
            k.apply_keycode(&mut keycode, modulo);
        }
        k
    }

    #[inline]
    fn f(&self, x: u32) -> u32 {
        let a = self.buf[0x012 + (x >> 24) as usize];
        let b = self.buf[0x112 + ((x >> 16) & 0xFF) as usize];
        let c = self.buf[0x212 + ((x >> 8) & 0xFF) as usize];
        let d = self.buf[0x312 + (x & 0xFF) as usize];
        (a.wrapping_add(b) ^ c).wrapping_add(d)
    }

    /// Encrypt one 64-bit block held as two words `[lo, hi]`.
    pub(crate) fn encrypt(&self, block: &mut [u32; 2]) {
        let mut y = block[0];
        let mut x = block[1];
        for i in 0..16 {
            let z = self.buf[i] ^ x;
            x = self.f(z) ^ y;
            y = z;
        }
        block[0] = x ^ self.buf[16];
        block[1] = y ^ self.buf[17];
    }

    #[cfg(test)]
    pub(crate) fn decrypt(&self, block: &mut [u32; 2]) {
        let mut y = block[0];
        let mut x = block[1];
        for i in (2..18).rev() {
            let z = self.buf[i] ^ x;
            x = self.f(z) ^ y;
            y = z;
        }
        block[0] = x ^ self.buf[1];
        block[1] = y ^ self.buf[0];
    }

    fn apply_keycode(&mut self, keycode: &mut [u32; 3], modulo: usize) {
        let mut pair = [keycode[1], keycode[2]];
        self.encrypt(&mut pair);
        [keycode[1], keycode[2]] = pair;
        let mut pair = [keycode[0], keycode[1]];
        self.encrypt(&mut pair);
        [keycode[0], keycode[1]] = pair;

        for i in 0..18 {
            self.buf[i] ^= keycode[((i * 4) % modulo) / 4].swap_bytes();
        }

        let mut scratch = [0u32; 2];
        for i in (0..NDS_BLOWFISH_WORDS).step_by(2) {
            self.encrypt(&mut scratch);
            self.buf[i] = scratch[1];
            self.buf[i + 1] = scratch[0];
        }
    }
}

fn block_at(buf: &[u8], off: usize) -> [u32; 2] {
    let w = |o: usize| u32::from_le_bytes([buf[o], buf[o + 1], buf[o + 2], buf[o + 3]]);
    [w(off), w(off + 4)]
}

fn store_block(buf: &mut [u8], off: usize, block: [u32; 2]) {
    buf[off..off + 4].copy_from_slice(&block[0].to_le_bytes());
    buf[off + 4..off + 8].copy_from_slice(&block[1].to_le_bytes());
}

/// Encrypt the secure area of a decrypted ROM image in place.
///
/// `rom` must hold at least the first 32 KiB of the image (header plus
/// secure area). The header checksums are updated to match.
///
/// Returns [`Error::UnsupportedOperation`] if the secure area is not in
/// its decrypted form.
pub fn encrypt_secure_area(rom: &mut [u8], key: &NdsBlowfishKey) -> Result<()> {
    if rom.len() < SECURE_AREA_OFFSET + SECURE_AREA_LEN {
        return Err(Error::ShortRead);
    }
    if block_at(rom, SECURE_AREA_OFFSET) != [DECRYPTED_MAGIC, DECRYPTED_MAGIC] {
        return Err(Error::UnsupportedOperation);
    }
    let idcode = u32::from_le_bytes([rom[0x0C], rom[0x0D], rom[0x0E], rom[0x0F]]);

    store_block(rom, SECURE_AREA_OFFSET, ENCRYOBJ);

    let level3 = Key1::new(key, idcode, 3, 8);
    for off in (SECURE_AREA_OFFSET..SECURE_AREA_OFFSET + SECURE_AREA_CRYPT_LEN).step_by(8) {
        let mut block = block_at(rom, off);
        level3.encrypt(&mut block);
        store_block(rom, off, block);
    }

    let level2 = Key1::new(key, idcode, 2, 8);
    let mut block = block_at(rom, SECURE_AREA_OFFSET);
    level2.encrypt(&mut block);
    store_block(rom, SECURE_AREA_OFFSET, block);

    let sa_crc = crc16(&rom[SECURE_AREA_OFFSET..SECURE_AREA_OFFSET + SECURE_AREA_LEN]);
    rom[0x6C..0x6E].copy_from_slice(&sa_crc.to_le_bytes());
    let hdr_crc = crc16(&rom[..0x15E]);
    rom[0x15E..0x160].copy_from_slice(&hdr_crc.to_le_bytes());
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A deterministic stand-in for the BIOS table.
    pub(crate) fn test_key() -> NdsBlowfishKey {
        let mut state = 0x1234_5678u32;
        let mut bytes = Vec::with_capacity(NDS_BLOWFISH_WORDS * 4);
        for _ in 0..NDS_BLOWFISH_WORDS {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            bytes.extend_from_slice(&state.to_le_bytes());
        }
        NdsBlowfishKey::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn key1_block_cipher_inverts() {
        let key = test_key();
        let k = Key1::new(&key, u32::from_le_bytes(*b"ABCE"), 3, 8);
        let original = [0xDEAD_BEEF, 0x0123_4567];
        let mut block = original;
        k.encrypt(&mut block);
        assert_ne!(block, original);
        k.decrypt(&mut block);
        assert_eq!(block, original);
    }

    #[test]
    fn encrypt_secure_area_round_trips_through_key1() {
        let key = test_key();
        let mut rom = vec![0u8; 0x8000];
        rom[0x0C..0x10].copy_from_slice(b"ABCE");
        store_block(&mut rom, 0x4000, [DECRYPTED_MAGIC, DECRYPTED_MAGIC]);
        for (i, b) in rom[0x4008..0x4800].iter_mut().enumerate() {
            *b = i as u8;
        }
        let plain = rom.clone();

        encrypt_secure_area(&mut rom, &key).unwrap();
        assert_ne!(block_at(&rom, 0x4000), [DECRYPTED_MAGIC, DECRYPTED_MAGIC]);
        assert_eq!(&rom[0x4800..], &plain[0x4800..]);
        let crc = u16::from_le_bytes([rom[0x6C], rom[0x6D]]);
        assert_eq!(crc, crc16(&rom[0x4000..0x8000]));

        // Undo it by hand.
        let idcode = u32::from_le_bytes(*b"ABCE");
        let level2 = Key1::new(&key, idcode, 2, 8);
        let mut first = block_at(&rom, 0x4000);
        level2.decrypt(&mut first);
        store_block(&mut rom, 0x4000, first);
        let level3 = Key1::new(&key, idcode, 3, 8);
        for off in (0x4000..0x4800).step_by(8) {
            let mut block = block_at(&rom, off);
            level3.decrypt(&mut block);
            store_block(&mut rom, off, block);
        }
        assert_eq!(block_at(&rom, 0x4000), ENCRYOBJ);
        assert_eq!(&rom[0x4008..0x4800], &plain[0x4008..0x4800]);
    }

    #[test]
    fn encrypt_rejects_already_encrypted_area() {
        let key = test_key();
        let mut rom = vec![0x55u8; 0x8000];
        assert!(matches!(
            encrypt_secure_area(&mut rom, &key),
            Err(Error::UnsupportedOperation)
        ));
    }
}

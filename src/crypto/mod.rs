//! Cryptographic helpers for Nintendo DS ROM images.
//!
//! All functions accept already-loaded key material; loading the BIOS key
//! table is handled by [`crate::keys::NdsBlowfishKey`].
//!
//! The implementations here are intended for **offline file-format
//! processing** only. They are not constant-time.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`ndscrypt`] | KEY1 Blowfish secure-area encryption (`decryption` feature) |
//!
//! [`crc16`] is always available; NDS headers store two CRC-16 checksums
//! (secure area and header) that the field listing verifies.

#[cfg(feature = "decryption")]
pub mod ndscrypt;

/// CRC-16 as used by NDS headers (polynomial 0x8005 reflected, init 0xFFFF).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &b in data {
        crc ^= b as u16;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

//! Key material for Nintendo DS secure-area encryption.
//!
//! The DS cartridge protocol uses a Blowfish variant ("KEY1") whose initial
//! P-array and S-boxes come from the console BIOS. romkit does not ship that
//! table; callers load it from a dump, conventionally named
//! `nds-blowfish.bin`.
//!
//! This module is a plain data container. The cipher itself lives in
//! [`crate::crypto::ndscrypt`].
//!
//! ## Key file format
//! ```text
//! [0x0000] P-array   18 × u32 LE
//! [0x0048] S-box 0  256 × u32 LE
//! [0x0448] S-box 1  256 × u32 LE
//! [0x0848] S-box 2  256 × u32 LE
//! [0x0C48] S-box 3  256 × u32 LE
//! [0x1048] end
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::utils::{Span, bytesv};
use crate::{Error, Result};

/// Conventional file name of the key table.
pub const NDS_BLOWFISH_FILE: &str = "nds-blowfish.bin";

/// Number of 32-bit words in the key table (P-array plus four S-boxes).
pub const NDS_BLOWFISH_WORDS: usize = 18 + 4 * 256;

/// Size of the key table file in bytes.
pub const NDS_BLOWFISH_SIZE: usize = NDS_BLOWFISH_WORDS * 4;

/// The BIOS Blowfish key table.
#[derive(Clone)]
pub struct NdsBlowfishKey {
    pub(crate) words: Box<[u32; NDS_BLOWFISH_WORDS]>,
}

impl std::fmt::Debug for NdsBlowfishKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdsBlowfishKey").finish_non_exhaustive()
    }
}

impl NdsBlowfishKey {
    /// Load a key table from `reader`.
    ///
    /// The stream must contain exactly [`NDS_BLOWFISH_SIZE`] bytes; anything
    /// shorter or longer is rejected with [`Error::MissingResource`].
    pub fn load<R: Read>(mut reader: R) -> Result<Self> {
        let buf = bytesv(&mut reader, NDS_BLOWFISH_SIZE)
            .map_err(|_| Error::MissingResource(NDS_BLOWFISH_FILE))?;
        let mut extra = [0u8; 1];
        if reader.read(&mut extra)? != 0 {
            return Err(Error::MissingResource(NDS_BLOWFISH_FILE));
        }
        Self::from_bytes(&buf)
    }

    /// Load a key table from a file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "cannot open key table");
            Error::MissingResource(NDS_BLOWFISH_FILE)
        })?;
        Self::load(file)
    }

    /// Build a key table from its raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != NDS_BLOWFISH_SIZE {
            return Err(Error::MissingResource(NDS_BLOWFISH_FILE));
        }
        let span = Span::new(bytes);
        let mut words = Box::new([0u32; NDS_BLOWFISH_WORDS]);
        for (i, w) in words.iter_mut().enumerate() {
            *w = span.le_u32(i * 4)?;
        }
        Ok(Self { words })
    }
}

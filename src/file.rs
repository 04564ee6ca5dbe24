//! Writable file handles for in-place ROM operations.
//!
//! Parsers only need [`Read`] + [`Seek`]. Operations that change a file's
//! size (NDS trim/untrim) need a little more, which [`RomFile`] provides.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use crate::Result;

/// A seekable, readable and writable byte stream with a known size.
pub trait RomFile: Read + Write + Seek {
    /// Current total size in bytes.
    fn size(&mut self) -> Result<u64>;

    /// Truncate or extend the file to exactly `len` bytes.
    fn set_len(&mut self, len: u64) -> Result<()>;
}

impl RomFile for File {
    fn size(&mut self) -> Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        File::set_len(self, len)?;
        Ok(())
    }
}

impl RomFile for Cursor<Vec<u8>> {
    fn size(&mut self) -> Result<u64> {
        Ok(self.get_ref().len() as u64)
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        let len = usize::try_from(len).map_err(|_| crate::Error::OutOfRange)?;
        self.get_mut().resize(len, 0);
        if self.position() > len as u64 {
            self.set_position(len as u64);
        }
        Ok(())
    }
}

impl<F: RomFile + ?Sized> RomFile for &mut F {
    fn size(&mut self) -> Result<u64> {
        (**self).size()
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        (**self).set_len(len)
    }
}

/// Size of any seekable stream, restoring the current position.
pub(crate) fn stream_len<S: Seek>(s: &mut S) -> Result<u64> {
    let pos = s.stream_position()?;
    let len = s.seek(SeekFrom::End(0))?;
    if pos != len {
        s.seek(SeekFrom::Start(pos))?;
    }
    Ok(len)
}

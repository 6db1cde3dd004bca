//! Pack writer stream.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use super::error::Result;

/// Buffered output stream tracking its write position.
pub struct OStream {
    writer: BufWriter<File>,
    pos: u64,
}

impl OStream {
    /// Wrap an already-open file, starting at position zero.
    pub fn new(file: File) -> Self {
        Self {
            writer: BufWriter::with_capacity(256 * 1024, file),
            pos: 0,
        }
    }

    /// Get the current write position.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Write bytes and advance position.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    /// Write a u64 value (little-endian).
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.writer.write_u64::<LittleEndian>(value)?;
        self.pos += 8;
        Ok(())
    }

    /// Write a u8 value.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.pos += 1;
        Ok(())
    }

    /// Seek to a position and return the current position.
    pub fn seek(&mut self, pos: u64) -> Result<u64> {
        self.writer.flush()?;
        let new_pos = self.writer.seek(SeekFrom::Start(pos))?;
        self.pos = new_pos;
        Ok(new_pos)
    }

    /// Seek to end and return the position.
    pub fn seek_end(&mut self) -> Result<u64> {
        self.writer.flush()?;
        let new_pos = self.writer.seek(SeekFrom::End(0))?;
        self.pos = new_pos;
        Ok(new_pos)
    }

    /// Flush buffered bytes and sync the file to disk.
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_positions_track_writes() -> Result<()> {
        let mut file = tempfile::tempfile()?;
        let mut stream = OStream::new(file.try_clone()?);
        stream.write_u8(7)?;
        stream.write_u64(2)?;
        stream.write_bytes(b"abc")?;
        assert_eq!(stream.pos(), 12);

        stream.seek(0)?;
        stream.write_u8(9)?;
        assert_eq!(stream.seek_end()?, 12);
        stream.sync()?;

        let mut bytes = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut bytes)?;
        assert_eq!(bytes[0], 9);
        assert_eq!(&bytes[9..], b"abc");
        Ok(())
    }
}

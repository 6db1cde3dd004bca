//! Pack archive writer.
//!
//! A [`Writer`] is one transactional session: entries are appended to a
//! temporary sibling of the target path, and the archive only replaces the
//! target when [`Writer::close`] finalizes it. Dropping a writer without
//! closing it discards everything written so far.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::compression;
use super::error::{Error, Result};
use super::format::*;
use super::stream::OStream;

/// Options for writing archives.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Compression level for entry payloads (-1 = none, 0-9 = zlib level).
    pub compression_hint: i32,
    /// Whether to fsync the archive before it replaces the target path.
    pub sync: bool,
}

impl WriteOptions {
    /// Create default options (no compression, sync on close).
    pub fn new() -> Self {
        Self {
            compression_hint: -1,
            sync: true,
        }
    }

    /// Set compression hint (-1 = no compression, 0-9 = compression level).
    pub fn with_compression(mut self, hint: i32) -> Self {
        self.compression_hint = hint.clamp(-1, 9);
        self
    }

    /// Enable/disable fsync on close.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Pack archive writer session.
pub struct Writer {
    path: PathBuf,
    temp: NamedTempFile,
    stream: OStream,
    options: WriteOptions,
    entries: Vec<(String, u64)>,
    seen: HashSet<String>,
    /// First error raised while committing an entry from `EntryWriter::drop`.
    deferred: Option<Error>,
    frozen: bool,
}

impl Writer {
    /// Start writing an archive that will replace `path` on close.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with(path, WriteOptions::default())
    }

    /// Start writing an archive with explicit options.
    pub fn create_with(path: impl AsRef<Path>, options: WriteOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.is_dir() {
            return Err(Error::FileNotFound(dir));
        }

        let temp = tempfile::Builder::new()
            .prefix(".classio-")
            .suffix(".partial")
            .tempfile_in(&dir)?;
        let mut stream = OStream::new(temp.as_file().try_clone()?);

        // Header with placeholder for root position.
        stream.write_bytes(PACK_MAGIC)?;
        stream.write_u8(NOT_FROZEN_FLAG)?;
        stream.write_bytes(&CURRENT_VERSION.to_be_bytes())?;
        stream.write_u64(0)?;

        tracing::trace!(path = %path.display(), "opened pack writer");

        Ok(Self {
            path,
            temp,
            stream,
            options,
            entries: Vec::new(),
            seen: HashSet::new(),
            deferred: None,
            frozen: false,
        })
    }

    /// Run `f` inside a writer session on `path`.
    ///
    /// The archive is finalized when `f` succeeds and discarded when it fails;
    /// either way the session is closed before this returns.
    pub fn scoped<T, E, F>(path: impl AsRef<Path>, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Writer) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let mut writer = Writer::create(path)?;
        let value = f(&mut writer)?;
        writer.close()?;
        Ok(value)
    }

    /// Target path of the archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entry has been committed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of committed entries, in write order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Check if the archive has been frozen (finalized).
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Open a named sub-file. Bytes written to it are committed when the
    /// returned handle is finished or dropped.
    pub fn file(&mut self, name: &str) -> Result<EntryWriter<'_>> {
        self.check_name(name)?;
        Ok(EntryWriter {
            writer: self,
            name: name.to_string(),
            buf: Vec::new(),
            done: false,
        })
    }

    /// Write a whole entry at once.
    pub fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.check_name(name)?;
        self.commit(name, data)
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if self.frozen {
            return Err(Error::Frozen);
        }
        if !is_valid_name(name) {
            return Err(Error::InvalidName(name.to_string()));
        }
        if self.seen.contains(name) {
            return Err(Error::DuplicateEntry(name.to_string()));
        }
        Ok(())
    }

    fn commit(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let crc = checksum(data);
        let (flags, payload) = compression::compress(data, self.options.compression_hint)?;

        let mut block = Vec::with_capacity(ENTRY_HEADER_SIZE + payload.len());
        block.extend_from_slice(&crc.to_le_bytes());
        block.push(flags);
        block.extend_from_slice(&payload);

        let pos = self.write_data(&block)?;
        self.entries.push((name.to_string(), pos));
        self.seen.insert(name.to_string());
        tracing::trace!(entry = name, bytes = data.len(), stored = payload.len(), "committed pack entry");
        Ok(())
    }

    /// Write a size-prefixed data block and return its position.
    fn write_data(&mut self, data: &[u8]) -> Result<u64> {
        if self.frozen {
            return Err(Error::Frozen);
        }
        let pos = self.stream.pos();
        self.stream.write_u64(data.len() as u64)?;
        self.stream.write_bytes(data)?;
        Ok(pos)
    }

    /// Write a group of child pointers and return its position.
    fn write_group(&mut self, children: &[u64]) -> Result<u64> {
        if self.frozen {
            return Err(Error::Frozen);
        }
        let pos = self.stream.pos();
        self.stream.write_u64(children.len() as u64)?;
        for &child in children {
            self.stream.write_u64(child)?;
        }
        Ok(pos)
    }

    /// Finalize the archive and move it over the target path.
    pub fn close(mut self) -> Result<()> {
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }

        let index = encode_names(self.entries.iter().map(|(name, _)| name.as_str()));
        let index_pos = self.write_data(&index)?;

        let mut children = Vec::with_capacity(self.entries.len() + 1);
        children.push(make_data_offset(index_pos));
        children.extend(self.entries.iter().map(|&(_, pos)| make_data_offset(pos)));
        let root_pos = self.write_group(&children)?;

        self.frozen = true;

        self.stream.seek(FROZEN_OFFSET as u64)?;
        self.stream.write_u8(FROZEN_FLAG)?;
        self.stream.seek(ROOT_POS_OFFSET as u64)?;
        self.stream.write_u64(root_pos)?;
        self.stream.seek_end()?;
        if self.options.sync {
            self.stream.sync()?;
        }

        let Writer { path, temp, stream, entries, .. } = self;
        drop(stream);
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!(path = %path.display(), entries = entries.len(), "closed pack writer");
        Ok(())
    }
}

/// Write handle for one named entry of a [`Writer`].
pub struct EntryWriter<'a> {
    writer: &'a mut Writer,
    name: String,
    buf: Vec<u8>,
    done: bool,
}

impl EntryWriter<'_> {
    /// Entry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Commit the entry, reporting any write error.
    pub fn finish(mut self) -> Result<()> {
        self.done = true;
        let buf = std::mem::take(&mut self.buf);
        self.writer.commit(&self.name, &buf)
    }
}

impl Write for EntryWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for EntryWriter<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let buf = std::mem::take(&mut self.buf);
        if let Err(err) = self.writer.commit(&self.name, &buf) {
            if self.writer.deferred.is_none() {
                self.writer.deferred = Some(err);
            }
        }
    }
}

/// CRC32 of an entry's uncompressed bytes.
pub(crate) fn checksum(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Read;

    #[test]
    fn test_write_empty_archive() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("empty.pack");

        Writer::create(&path)?.close()?;

        let mut file = File::open(&path)?;
        let mut header = [0u8; HEADER_SIZE];
        file.read_exact(&mut header)?;

        assert_eq!(&header[0..5], PACK_MAGIC);
        assert_eq!(header[FROZEN_OFFSET], FROZEN_FLAG);
        assert_eq!(header[VERSION_OFFSET], 0);
        assert_eq!(header[VERSION_OFFSET + 1], 1);
        Ok(())
    }

    #[test]
    fn test_dropped_writer_leaves_no_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("dropped.pack");
        {
            let mut writer = Writer::create(&path)?;
            writer.write_entry("a", b"hello")?;
        }
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_duplicate_and_invalid_names() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut writer = Writer::create(dir.path().join("dup.pack"))?;
        writer.write_entry("a", b"1")?;
        assert!(matches!(writer.write_entry("a", b"2"), Err(Error::DuplicateEntry(n)) if n == "a"));
        assert!(matches!(writer.file(""), Err(Error::InvalidName(_))));
        assert!(matches!(writer.file("a\0b"), Err(Error::InvalidName(_))));
        assert_eq!(writer.len(), 1);
        Ok(())
    }

    #[test]
    fn test_entry_writer_commits_on_drop() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut writer = Writer::create(dir.path().join("drop.pack"))?;
        {
            let mut entry = writer.file("notes")?;
            entry.write_all(b"dropped without finish")?;
        }
        let mut entry = writer.file("more")?;
        entry.write_all(b"finished")?;
        entry.finish()?;
        assert_eq!(writer.names().collect::<Vec<_>>(), vec!["notes", "more"]);
        writer.close()
    }

    #[test]
    fn test_scoped_error_discards_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoped.pack");
        let result: Result<()> = Writer::scoped(&path, |writer| {
            writer.write_entry("a", b"1")?;
            Err(Error::invalid("codec failed"))
        });
        assert!(matches!(result, Err(Error::InvalidStructure(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("x.pack");
        assert!(matches!(Writer::create(path), Err(Error::FileNotFound(_))));
    }
}

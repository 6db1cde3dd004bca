//! Pack archive reader.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;
use parking_lot::RwLock;

use super::compression;
use super::error::{Error, Result};
use super::format::*;
use super::writer::checksum;

/// Input streams for reading pack data.
/// Supports both memory-mapped and buffered I/O modes.
pub struct IStreams {
    inner: StreamsInner,
    version: u16,
    frozen: bool,
    size: u64,
}

enum StreamsInner {
    /// Memory-mapped file (preferred)
    Mmap(Mmap),
    /// Buffered file access (fallback)
    File(Arc<RwLock<File>>),
}

impl IStreams {
    /// Open a file for reading with memory mapping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_opts(path, true)
    }

    /// Open a file with optional memory mapping.
    pub fn open_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let size = file.metadata()?.len();
        if size < HEADER_SIZE as u64 {
            return Err(Error::UnexpectedEof(size));
        }

        let inner = if use_mmap {
            // Safety: the file is opened read-only; archives are replaced by
            // rename, never rewritten in place.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
            StreamsInner::Mmap(mmap)
        } else {
            StreamsInner::File(Arc::new(RwLock::new(file)))
        };

        let (version, frozen) = match &inner {
            StreamsInner::Mmap(mmap) => Self::parse_header(mmap)?,
            StreamsInner::File(file) => {
                let mut f = file.write();
                let mut header = [0u8; HEADER_SIZE];
                f.seek(SeekFrom::Start(0))?;
                f.read_exact(&mut header)?;
                Self::parse_header(&header)?
            }
        };

        Ok(Self { inner, version, frozen, size })
    }

    /// Parse and validate the pack header.
    fn parse_header(data: &[u8]) -> Result<(u16, bool)> {
        if data.len() < HEADER_SIZE {
            return Err(Error::UnexpectedEof(data.len() as u64));
        }
        if &data[0..5] != PACK_MAGIC {
            return Err(Error::InvalidMagic);
        }

        let frozen = data[FROZEN_OFFSET] == FROZEN_FLAG;
        let version = u16::from_be_bytes([data[VERSION_OFFSET], data[VERSION_OFFSET + 1]]);
        if version != CURRENT_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        Ok((version, frozen))
    }

    /// Check if the archive is frozen (finalized).
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Get the format version.
    #[inline]
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Get the total file size.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Check if the streams are memory-mapped.
    #[inline]
    pub fn is_mmap(&self) -> bool {
        matches!(self.inner, StreamsInner::Mmap(_))
    }

    /// Get the root group position from the header.
    pub fn root_pos(&self) -> Result<u64> {
        self.read_u64(ROOT_POS_OFFSET as u64)
    }

    fn check_range(&self, pos: u64, len: u64) -> Result<()> {
        match pos.checked_add(len) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(Error::UnexpectedEof(pos.saturating_add(len))),
        }
    }

    /// Read bytes at a specific position, borrowing from the map when possible.
    pub fn bytes(&self, pos: u64, len: usize) -> Result<Cow<'_, [u8]>> {
        self.check_range(pos, len as u64)?;

        match &self.inner {
            StreamsInner::Mmap(mmap) => Ok(Cow::Borrowed(&mmap[pos as usize..pos as usize + len])),
            StreamsInner::File(file) => {
                let mut f = file.write();
                f.seek(SeekFrom::Start(pos))?;
                let mut buf = vec![0u8; len];
                f.read_exact(&mut buf)?;
                Ok(Cow::Owned(buf))
            }
        }
    }

    /// Read bytes into an existing buffer.
    pub fn read_into(&self, pos: u64, buf: &mut [u8]) -> Result<()> {
        self.check_range(pos, buf.len() as u64)?;

        match &self.inner {
            StreamsInner::Mmap(mmap) => {
                buf.copy_from_slice(&mmap[pos as usize..(pos as usize + buf.len())]);
                Ok(())
            }
            StreamsInner::File(file) => {
                let mut f = file.write();
                f.seek(SeekFrom::Start(pos))?;
                f.read_exact(buf)?;
                Ok(())
            }
        }
    }

    /// Read a u64 value at the given position.
    pub fn read_u64(&self, pos: u64) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_into(pos, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Read the size-prefixed data block at `pos`.
    pub fn data(&self, pos: u64) -> Result<Cow<'_, [u8]>> {
        let size = self.read_u64(pos)?;
        let len = usize::try_from(size).map_err(|_| Error::UnexpectedEof(size))?;
        self.bytes(pos + 8, len)
    }
}

/// Location and shape of one entry in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Entry name.
    pub name: String,
    /// Position of the entry's data block.
    pub pos: u64,
    /// Stored payload size in bytes (after compression).
    pub stored_size: u64,
    /// Whether the payload is zlib-compressed.
    pub compressed: bool,
    /// CRC32 of the uncompressed bytes.
    pub crc: u32,
}

/// Pack archive reader session.
pub struct Reader {
    path: PathBuf,
    streams: IStreams,
    entries: Vec<EntryInfo>,
    by_name: HashMap<String, usize>,
}

impl Reader {
    /// Open an archive for reading with memory mapping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_opts(path, true)
    }

    /// Open an archive with optional memory mapping.
    pub fn open_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let streams = IStreams::open_opts(&path, use_mmap)?;
        if !streams.is_frozen() {
            return Err(Error::NotFrozen);
        }

        let root_pos = streams.root_pos()?;
        let num_children = streams.read_u64(root_pos)?;
        if num_children == 0 {
            return Err(Error::invalid("root group has no name index"));
        }
        // Each child offset takes 8 bytes after the count.
        let max_children = streams
            .size()
            .checked_sub(root_pos)
            .and_then(|rest| rest.checked_sub(8))
            .map_or(0, |rest| rest / 8);
        if num_children > max_children {
            return Err(Error::invalid(format!(
                "root group claims {num_children} children, room for {max_children}"
            )));
        }

        let mut offsets = Vec::with_capacity(num_children as usize);
        for i in 0..num_children {
            let offset = streams.read_u64(root_pos + 8 + i * 8)?;
            if !is_data_offset(offset) {
                return Err(Error::invalid(format!("root child {i} is not a data block")));
            }
            offsets.push(extract_offset(offset));
        }

        let names = decode_names(&streams.data(offsets[0])?)?;
        if names.len() != offsets.len() - 1 {
            return Err(Error::invalid(format!(
                "name index lists {} entries, root group has {}",
                names.len(),
                offsets.len() - 1
            )));
        }

        let mut entries = Vec::with_capacity(names.len());
        let mut by_name = HashMap::with_capacity(names.len());
        for (name, &pos) in names.into_iter().zip(&offsets[1..]) {
            let size = streams.read_u64(pos)?;
            if size < ENTRY_HEADER_SIZE as u64 {
                return Err(Error::invalid(format!("entry {name} is shorter than its header")));
            }
            let mut header = [0u8; ENTRY_HEADER_SIZE];
            streams.read_into(pos + 8, &mut header)?;
            let crc = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);

            if by_name.insert(name.clone(), entries.len()).is_some() {
                return Err(Error::DuplicateEntry(name));
            }
            entries.push(EntryInfo {
                name,
                pos,
                stored_size: size - ENTRY_HEADER_SIZE as u64,
                compressed: header[4] & ENTRY_FLAG_ZLIB != 0,
                crc,
            });
        }

        tracing::trace!(path = %path.display(), entries = entries.len(), "opened pack reader");
        Ok(Self { path, streams, entries, by_name })
    }

    /// Run `f` inside a reader session on `path`; the archive is released
    /// before this returns.
    pub fn scoped<T, E, F>(path: impl AsRef<Path>, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Reader) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let reader = Reader::open(path)?;
        f(&reader)
    }

    /// Path the archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format version.
    pub fn version(&self) -> u16 {
        self.streams.version()
    }

    /// Total archive size in bytes.
    pub fn size(&self) -> u64 {
        self.streams.size()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if an entry exists.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Entry names, in write order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Entry descriptors, in write order.
    pub fn entries(&self) -> &[EntryInfo] {
        &self.entries
    }

    /// Open a named sub-file for reading. The payload is checked against its
    /// stored CRC before the handle is returned.
    pub fn file(&self, name: &str) -> Result<EntryReader<'_>> {
        let index = *self
            .by_name
            .get(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        let info = &self.entries[index];

        let payload_pos = info.pos + 8 + ENTRY_HEADER_SIZE as u64;
        let stored = self.streams.bytes(payload_pos, info.stored_size as usize)?;
        let data = if info.compressed {
            Cow::Owned(compression::decompress(ENTRY_FLAG_ZLIB, &stored)?)
        } else {
            stored
        };

        let actual = checksum(&data);
        if actual != info.crc {
            return Err(Error::ChecksumMismatch {
                name: info.name.clone(),
                expected: info.crc,
                actual,
            });
        }

        Ok(EntryReader {
            name: &info.name,
            cursor: Cursor::new(data),
        })
    }

    /// Read a whole entry into memory.
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self.file(name)?;
        let mut buf = Vec::with_capacity(entry.len());
        entry.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Read handle for one named entry of a [`Reader`].
pub struct EntryReader<'a> {
    name: &'a str,
    cursor: Cursor<Cow<'a, [u8]>>,
}

impl EntryReader<'_> {
    /// Entry name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Uncompressed entry length.
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    /// Check if the entry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Read for EntryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}

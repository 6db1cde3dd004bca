//! Error types for pack archives.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing or reading a pack archive.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid magic bytes at start of file
    #[error("Invalid pack file: expected CPack magic bytes")]
    InvalidMagic,

    /// Unsupported file format version
    #[error("Unsupported pack version: {0}")]
    UnsupportedVersion(u16),

    /// File is truncated or corrupted
    #[error("Unexpected end of file at position {0}")]
    UnexpectedEof(u64),

    /// Invalid data structure in file
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// Archive was never finalized
    #[error("Archive is not frozen; it was not closed cleanly")]
    NotFrozen,

    /// No entry with the requested name
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// An entry with this name was already written
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Entry names must be non-empty and free of NUL bytes
    #[error("Invalid entry name: {0:?}")]
    InvalidName(String),

    /// Stored checksum does not match the entry payload
    #[error("Checksum mismatch in entry {name}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    /// Archive is frozen (finalized)
    #[error("Archive is frozen and cannot be modified")]
    Frozen,

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }
}

/// Result type alias for pack operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::InvalidMagic;
        assert!(e.to_string().contains("magic"));

        let e = Error::ChecksumMismatch { name: "config".into(), expected: 1, actual: 2 };
        assert!(e.to_string().contains("config"));
        assert!(e.to_string().contains("0x00000001"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}

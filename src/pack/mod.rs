//! Single-file multi-entry archive.
//!
//! A pack holds any number of named byte entries in one file. It is the
//! container behind [`crate::IoClass::save`] and [`crate::IoClass::load`]:
//! each declared attribute becomes one entry, encoded by its codec.
//!
//! ## File Structure
//!
//! ```text
//! +------------------+
//! | Magic: "CPack"   |  5 bytes
//! +------------------+
//! | Frozen flag      |  1 byte (0x00 or 0xFF)
//! +------------------+
//! | Version          |  2 bytes (u16 BE)
//! +------------------+
//! | Root Group Pos   |  8 bytes (u64 LE)
//! +------------------+
//! | Entry blocks     |  [size: u64][crc32: u32][flags: u8][payload]
//! +------------------+
//! | Name index       |  [size: u64][names separated by NUL]
//! +------------------+
//! | Root group       |  [count: u64][index ptr][entry ptrs...]
//! +------------------+
//! ```

mod compression;
mod error;
mod format;
mod reader;
mod stream;
mod writer;

pub use error::{Error, Result};
pub use format::*;
pub use reader::{EntryInfo, EntryReader, IStreams, Reader};
pub use writer::{EntryWriter, WriteOptions, Writer};

#[cfg(test)]
mod tests;

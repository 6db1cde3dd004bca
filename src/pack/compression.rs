//! Zlib compression of entry payloads.

use std::io::{Read, Write};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::error::{Error, Result};
use super::format::ENTRY_FLAG_ZLIB;

/// Compress an entry payload.
///
/// Returns the entry flags together with the bytes to store. Data is kept
/// as-is when `level` is not positive or compression would not save space.
pub fn compress(data: &[u8], level: i32) -> Result<(u8, Vec<u8>)> {
    if level <= 0 || data.is_empty() {
        return Ok((0, data.to_vec()));
    }

    let compression_level = match level {
        1 => Compression::fast(),
        2..=5 => Compression::default(),
        6..=9 => Compression::best(),
        _ => Compression::default(),
    };

    let mut encoder = ZlibEncoder::new(Vec::new(), compression_level);
    encoder.write_all(data)?;
    let compressed = encoder.finish()?;

    if compressed.len() >= data.len() {
        return Ok((0, data.to_vec()));
    }
    Ok((ENTRY_FLAG_ZLIB, compressed))
}

/// Undo [`compress`] given the stored entry flags.
pub fn decompress(flags: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if flags & ENTRY_FLAG_ZLIB == 0 {
        return Ok(payload.to_vec());
    }
    let mut decoder = ZlibDecoder::new(payload);
    let mut out = Vec::with_capacity(payload.len() * 2);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::invalid(format!("corrupt zlib payload: {e}")))?;
    Ok(out)
}

//! Pack format constants and offset helpers.

/// Magic bytes at the start of a pack file.
pub const PACK_MAGIC: &[u8; 5] = b"CPack";

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Offset of the frozen flag in the header.
pub const FROZEN_OFFSET: usize = 5;

/// Offset of the version in the header.
pub const VERSION_OFFSET: usize = 6;

/// Offset of the root group position in the header.
pub const ROOT_POS_OFFSET: usize = 8;

/// Current pack format version.
pub const CURRENT_VERSION: u16 = 1;

/// Frozen flag value once the root group has been written.
pub const FROZEN_FLAG: u8 = 0xFF;

/// Frozen flag value while the archive is still being written.
pub const NOT_FROZEN_FLAG: u8 = 0x00;

/// Bit marking a root child pointer as a data block (groups have it clear).
pub const DATA_FLAG_MASK: u64 = 1 << 63;

/// Mask to extract the file position from a child pointer.
pub const OFFSET_MASK: u64 = !DATA_FLAG_MASK;

/// Size of the entry header: CRC32 of the uncompressed bytes plus a flags byte.
pub const ENTRY_HEADER_SIZE: usize = 5;

/// Entry flag set when the payload is zlib-compressed.
pub const ENTRY_FLAG_ZLIB: u8 = 0x01;

/// Separator between names in the entry index block.
pub const NAME_SEPARATOR: u8 = 0;

/// Entry names are non-empty and contain no separator byte.
#[inline]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.as_bytes().contains(&NAME_SEPARATOR)
}

/// Check if a child pointer refers to a data block.
#[inline]
pub const fn is_data_offset(offset: u64) -> bool {
    (offset & DATA_FLAG_MASK) != 0
}

/// Extract the file position from a child pointer.
#[inline]
pub const fn extract_offset(offset: u64) -> u64 {
    offset & OFFSET_MASK
}

/// Create a data child pointer.
#[inline]
pub const fn make_data_offset(pos: u64) -> u64 {
    pos | DATA_FLAG_MASK
}

/// Encode entry names into the index block.
pub fn encode_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, name) in names.into_iter().enumerate() {
        if i > 0 {
            out.push(NAME_SEPARATOR);
        }
        out.extend_from_slice(name.as_bytes());
    }
    out
}

/// Decode the index block back into entry names.
pub fn decode_names(data: &[u8]) -> std::result::Result<Vec<String>, std::string::FromUtf8Error> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    data.split(|&b| b == NAME_SEPARATOR)
        .map(|part| String::from_utf8(part.to_vec()))
        .collect()
}

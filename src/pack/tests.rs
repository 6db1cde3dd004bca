use super::*;
use std::io::{Read, Write};

fn write_sample(path: &std::path::Path, options: WriteOptions) -> Result<()> {
    let mut writer = Writer::create_with(path, options)?;
    {
        let mut config = writer.file("config")?;
        config.write_all(br#"{"a": "1"}"#)?;
        config.finish()?;
    }
    writer.write_entry("table", &b"0123456789".repeat(64))?;
    writer.write_entry("empty", b"")?;
    writer.close()
}

#[test]
fn test_write_and_read_entries() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data");
    write_sample(&path, WriteOptions::default())?;

    let reader = Reader::open(&path)?;
    assert_eq!(reader.version(), CURRENT_VERSION);
    assert_eq!(reader.names().collect::<Vec<_>>(), vec!["config", "table", "empty"]);
    assert!(reader.contains("table"));

    let mut config = String::new();
    reader.file("config")?.read_to_string(&mut config)?;
    assert_eq!(config, r#"{"a": "1"}"#);
    assert_eq!(reader.read_entry("table")?, b"0123456789".repeat(64));
    assert!(reader.file("empty")?.is_empty());
    Ok(())
}

#[test]
fn test_compressed_entries() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data");
    write_sample(&path, WriteOptions::new().with_compression(6))?;

    let reader = Reader::open_opts(&path, false)?;
    let table = reader.entries().iter().find(|e| e.name == "table").cloned();
    let table = table.ok_or_else(|| Error::EntryNotFound("table".into()))?;
    assert!(table.compressed);
    assert!(table.stored_size < 640);
    assert_eq!(reader.read_entry("table")?, b"0123456789".repeat(64));
    Ok(())
}

#[test]
fn test_missing_entry() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data");
    write_sample(&path, WriteOptions::default())?;

    let reader = Reader::open(&path)?;
    assert!(matches!(reader.file("df"), Err(Error::EntryNotFound(name)) if name == "df"));
    Ok(())
}

#[test]
fn test_checksum_mismatch() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data");
    write_sample(&path, WriteOptions::default())?;

    let pos = Reader::open(&path)?.entries()[0].pos;
    let mut bytes = std::fs::read(&path)?;
    // First payload byte of "config".
    let at = (pos + 8) as usize + ENTRY_HEADER_SIZE;
    bytes[at] ^= 0xFF;
    std::fs::write(&path, &bytes)?;

    let reader = Reader::open(&path)?;
    assert!(matches!(reader.file("config"), Err(Error::ChecksumMismatch { .. })));
    assert_eq!(reader.read_entry("table")?, b"0123456789".repeat(64));
    Ok(())
}

#[test]
fn test_unfrozen_archive_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data");
    write_sample(&path, WriteOptions::default())?;

    let mut bytes = std::fs::read(&path)?;
    bytes[FROZEN_OFFSET] = NOT_FROZEN_FLAG;
    std::fs::write(&path, &bytes)?;
    assert!(matches!(Reader::open(&path), Err(Error::NotFrozen)));
    Ok(())
}

#[test]
fn test_corrupt_child_count_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data");
    Writer::create(&path)?.close()?;

    let mut bytes = std::fs::read(&path)?;
    let mut root = [0u8; 8];
    root.copy_from_slice(&bytes[ROOT_POS_OFFSET..ROOT_POS_OFFSET + 8]);
    let root_pos = u64::from_le_bytes(root) as usize;
    bytes[root_pos..root_pos + 8].copy_from_slice(&u64::MAX.to_le_bytes());
    std::fs::write(&path, &bytes)?;

    for use_mmap in [true, false] {
        let err = Reader::open_opts(&path, use_mmap).err();
        assert!(matches!(err, Some(Error::InvalidStructure(_))), "{err:?}");
    }
    Ok(())
}

#[test]
fn test_overwrite_existing_archive() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data");
    write_sample(&path, WriteOptions::default())?;

    Writer::scoped(&path, |writer| writer.write_entry("only", b"x"))?;
    let reader = Reader::open(&path)?;
    assert_eq!(reader.names().collect::<Vec<_>>(), vec!["only"]);
    Ok(())
}

#[test]
fn test_scoped_reader() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data");
    write_sample(&path, WriteOptions::default())?;

    let len = Reader::scoped(&path, |reader| Ok::<_, Error>(reader.len()))?;
    assert_eq!(len, 3);
    Ok(())
}

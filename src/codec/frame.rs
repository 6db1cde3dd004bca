//! Columnar codecs for frames and series.
//!
//! ```text
//! +-----------------+
//! | Magic           |  4 bytes ("CFRM" or "CSER")
//! +-----------------+
//! | Version         |  1 byte
//! +-----------------+
//! | Flags           |  1 byte (bit 0: zlib body)
//! +-----------------+
//! | Body            |  little-endian, see below
//! +-----------------+
//! ```
//!
//! Frame body: `[ncols: u32][nrows: u64]` then per column
//! `[name len: u32][name][dtype: u8][values]`. Series body:
//! `[has name: u8][name len: u32][name]?[nrows: u64][dtype: u8][values]`.
//! Strings are `[len: u32][utf8]`, booleans one byte each.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::{mismatch, Capabilities, Codec, Error, Result};
use crate::frame::{Column, DType, Frame, Series};
use crate::value::Value;

const FRAME_MAGIC: &[u8; 4] = b"CFRM";
const SERIES_MAGIC: &[u8; 4] = b"CSER";
const FORMAT_VERSION: u8 = 1;
const FLAG_ZLIB: u8 = 0x01;

/// Upper bound on capacity reserved from untrusted lengths.
const MAX_PREALLOC: usize = 1 << 16;

/// Default zlib level.
const DEFAULT_COMPRESSION: u32 = 6;

fn write_header(dst: &mut dyn Write, magic: &[u8; 4], level: u32) -> Result<()> {
    dst.write_all(magic)?;
    dst.write_u8(FORMAT_VERSION)?;
    dst.write_u8(if level > 0 { FLAG_ZLIB } else { 0 })?;
    Ok(())
}

/// Read and check the header; returns the flags byte.
fn read_header(src: &mut dyn Read, magic: &[u8; 4]) -> Result<u8> {
    let mut found = [0u8; 4];
    src.read_exact(&mut found)?;
    if &found != magic {
        return Err(Error::invalid_frame(format!(
            "bad magic {:?}, expected {:?}",
            String::from_utf8_lossy(&found),
            String::from_utf8_lossy(magic)
        )));
    }
    let version = src.read_u8()?;
    if version != FORMAT_VERSION {
        return Err(Error::invalid_frame(format!("unsupported version {version}")));
    }
    Ok(src.read_u8()?)
}

/// Write the body through zlib when `level` is positive.
fn write_body<F>(dst: &mut dyn Write, level: u32, body: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    if level == 0 {
        return body(dst);
    }
    let mut encoder = ZlibEncoder::new(dst, Compression::new(level.min(9)));
    body(&mut encoder)?;
    encoder.finish()?;
    Ok(())
}

fn read_body<T, F>(src: &mut dyn Read, flags: u8, body: F) -> Result<T>
where
    F: FnOnce(&mut dyn Read) -> Result<T>,
{
    if flags & FLAG_ZLIB == 0 {
        return body(src);
    }
    let mut decoder = ZlibDecoder::new(src);
    body(&mut decoder)
}

fn write_str(dst: &mut dyn Write, s: &str) -> Result<()> {
    let len = u32::try_from(s.len()).map_err(|_| Error::invalid_frame("string too long"))?;
    dst.write_u32::<LittleEndian>(len)?;
    dst.write_all(s.as_bytes())?;
    Ok(())
}

fn read_str(src: &mut dyn Read) -> Result<String> {
    let len = src.read_u32::<LittleEndian>()? as u64;
    let mut bytes = Vec::new();
    let read = src.take(len).read_to_end(&mut bytes)?;
    if read as u64 != len {
        return Err(Error::invalid_frame("truncated string"));
    }
    String::from_utf8(bytes).map_err(|e| Error::invalid_frame(format!("invalid UTF-8: {e}")))
}

fn write_values(dst: &mut dyn Write, column: &Column) -> Result<()> {
    dst.write_u8(column.dtype().tag())?;
    match column {
        Column::Int64(values) => {
            for &v in values {
                dst.write_i64::<LittleEndian>(v)?;
            }
        }
        Column::Float64(values) => {
            for &v in values {
                dst.write_f64::<LittleEndian>(v)?;
            }
        }
        Column::Bool(values) => {
            for &v in values {
                dst.write_u8(u8::from(v))?;
            }
        }
        Column::Utf8(values) => {
            for v in values {
                write_str(dst, v)?;
            }
        }
    }
    Ok(())
}

fn read_values(src: &mut dyn Read, rows: usize) -> Result<Column> {
    let tag = src.read_u8()?;
    let dtype = DType::from_tag(tag).ok_or_else(|| Error::invalid_frame(format!("unknown dtype tag {tag}")))?;
    let capacity = rows.min(MAX_PREALLOC);
    let column = match dtype {
        DType::Int64 => {
            let mut values = Vec::with_capacity(capacity);
            for _ in 0..rows {
                values.push(src.read_i64::<LittleEndian>()?);
            }
            Column::Int64(values)
        }
        DType::Float64 => {
            let mut values = Vec::with_capacity(capacity);
            for _ in 0..rows {
                values.push(src.read_f64::<LittleEndian>()?);
            }
            Column::Float64(values)
        }
        DType::Bool => {
            let mut values = Vec::with_capacity(capacity);
            for _ in 0..rows {
                values.push(match src.read_u8()? {
                    0 => false,
                    1 => true,
                    b => return Err(Error::invalid_frame(format!("invalid bool byte {b}"))),
                });
            }
            Column::Bool(values)
        }
        DType::Utf8 => {
            let mut values = Vec::with_capacity(capacity);
            for _ in 0..rows {
                values.push(read_str(src)?);
            }
            Column::Utf8(values)
        }
    };
    Ok(column)
}

fn read_rows(src: &mut dyn Read) -> Result<usize> {
    let rows = src.read_u64::<LittleEndian>()?;
    usize::try_from(rows).map_err(|_| Error::invalid_frame(format!("row count {rows} out of range")))
}

/// Tabular frames in a compact columnar encoding.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    compression: u32,
}

impl FrameCodec {
    /// Codec with the default zlib level.
    pub fn new() -> Self {
        Self { compression: DEFAULT_COMPRESSION }
    }

    /// Set the zlib level (0 stores the body uncompressed, max 9).
    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression = level;
        self
    }

    /// Configured zlib level.
    pub fn compression(&self) -> u32 {
        self.compression
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for FrameCodec {
    fn name(&self) -> &'static str {
        "frame"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn save(&self, data: &Value, dst: &mut dyn Write) -> Result<()> {
        let Value::Frame(frame) = data else {
            return Err(mismatch(self.name(), "frame", data));
        };
        let ncols = u32::try_from(frame.num_columns()).map_err(|_| Error::invalid_frame("too many columns"))?;
        write_header(dst, FRAME_MAGIC, self.compression)?;
        write_body(dst, self.compression, |out| {
            out.write_u32::<LittleEndian>(ncols)?;
            out.write_u64::<LittleEndian>(frame.num_rows() as u64)?;
            for (name, column) in frame.columns() {
                write_str(out, name)?;
                write_values(out, column)?;
            }
            Ok(())
        })
    }

    fn load(&self, src: &mut dyn Read) -> Result<Value> {
        let flags = read_header(src, FRAME_MAGIC)?;
        let frame = read_body(src, flags, |input| {
            let ncols = input.read_u32::<LittleEndian>()?;
            let rows = read_rows(input)?;
            let mut frame = Frame::new();
            for _ in 0..ncols {
                let name = read_str(input)?;
                let column = read_values(input, rows)?;
                frame.push_column(name, column)?;
            }
            Ok(frame)
        })?;
        Ok(Value::Frame(frame))
    }
}

/// Single-column series, same encoding as a frame column.
#[derive(Debug, Clone, Copy)]
pub struct SeriesCodec {
    compression: u32,
}

impl SeriesCodec {
    /// Codec with the default zlib level.
    pub fn new() -> Self {
        Self { compression: DEFAULT_COMPRESSION }
    }

    /// Set the zlib level (0 stores the body uncompressed, max 9).
    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression = level;
        self
    }
}

impl Default for SeriesCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for SeriesCodec {
    fn name(&self) -> &'static str {
        "series"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn save(&self, data: &Value, dst: &mut dyn Write) -> Result<()> {
        let Value::Series(series) = data else {
            return Err(mismatch(self.name(), "series", data));
        };
        write_header(dst, SERIES_MAGIC, self.compression)?;
        write_body(dst, self.compression, |out| {
            match series.name() {
                Some(name) => {
                    out.write_u8(1)?;
                    write_str(out, name)?;
                }
                None => out.write_u8(0)?,
            }
            out.write_u64::<LittleEndian>(series.len() as u64)?;
            write_values(out, series.values())
        })
    }

    fn load(&self, src: &mut dyn Read) -> Result<Value> {
        let flags = read_header(src, SERIES_MAGIC)?;
        let series = read_body(src, flags, |input| {
            let name = match input.read_u8()? {
                0 => None,
                _ => Some(read_str(input)?),
            };
            let rows = read_rows(input)?;
            let values = read_values(input, rows)?;
            Ok(match name {
                Some(name) => Series::named(name, values),
                None => Series::new(values),
            })
        })?;
        Ok(Value::Series(series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iris() -> Frame {
        Frame::new()
            .with_column("sepal_length", vec![5.1, 4.9, f64::NAN]).unwrap()
            .with_column("petal_count", vec![3i64, 3, 4]).unwrap()
            .with_column("is_setosa", vec![true, true, false]).unwrap()
            .with_column("species", vec!["setosa", "setosa", "virginica"]).unwrap()
    }

    fn roundtrip_frame(codec: FrameCodec, frame: &Frame) -> Result<(Vec<u8>, Frame)> {
        let mut buf = Vec::new();
        codec.save(&Value::Frame(frame.clone()), &mut buf)?;
        match codec.load(&mut buf.as_slice())? {
            Value::Frame(loaded) => Ok((buf, loaded)),
            other => panic!("expected frame, got {}", other.kind()),
        }
    }

    #[test]
    fn test_frame_roundtrip() -> Result<()> {
        let frame = iris();
        let (buf, loaded) = roundtrip_frame(FrameCodec::new(), &frame)?;
        assert_eq!(&buf[..4], FRAME_MAGIC);
        assert_eq!(buf[5], FLAG_ZLIB);
        assert!(loaded.equals(&frame));

        let (buf, loaded) = roundtrip_frame(FrameCodec::new().with_compression(0), &frame)?;
        assert_eq!(buf[5], 0);
        assert!(loaded.equals(&frame));
        Ok(())
    }

    #[test]
    fn test_empty_frame() -> Result<()> {
        let (_, loaded) = roundtrip_frame(FrameCodec::new(), &Frame::new())?;
        assert!(loaded.is_empty());
        Ok(())
    }

    #[test]
    fn test_series_roundtrip() -> Result<()> {
        let codec = SeriesCodec::new();
        for series in [Series::named("target", vec![0i64, 1, 2]), Series::new(vec!["a", "b"])] {
            let mut buf = Vec::new();
            codec.save(&Value::Series(series.clone()), &mut buf)?;
            assert_eq!(codec.load(&mut buf.as_slice())?, Value::Series(series));
        }
        Ok(())
    }

    #[test]
    fn test_rejects_wrong_magic() {
        let mut buf = Vec::new();
        SeriesCodec::new().save(&Value::Series(Series::new(vec![1i64])), &mut buf).unwrap();
        let err = FrameCodec::new().load(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, Error::InvalidFrame(_)));
    }

    #[test]
    fn test_truncated_frame() {
        let mut buf = Vec::new();
        FrameCodec::new().with_compression(0).save(&Value::Frame(iris()), &mut buf).unwrap();
        buf.truncate(buf.len() - 3);
        assert!(FrameCodec::new().load(&mut buf.as_slice()).is_err());
    }
}

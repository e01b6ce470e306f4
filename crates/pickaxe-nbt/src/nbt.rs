use bytes::{Buf, BufMut, BytesMut};
use std::io::{Read, Write};

/// NBT tag type IDs.
pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

#[derive(Debug, thiserror::Error)]
pub enum NbtError {
    #[error("unexpected end of NBT data")]
    UnexpectedEof,
    #[error("unsupported tag id {0}")]
    UnsupportedTag(u8),
    #[error("invalid NBT string")]
    InvalidString,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

type Result<T> = std::result::Result<T, NbtError>;

/// An NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtValue>),
    Compound(Vec<(String, NbtValue)>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtValue {
    pub fn tag_id(&self) -> u8 {
        match self {
            NbtValue::Byte(_) => TAG_BYTE,
            NbtValue::Short(_) => TAG_SHORT,
            NbtValue::Int(_) => TAG_INT,
            NbtValue::Long(_) => TAG_LONG,
            NbtValue::Float(_) => TAG_FLOAT,
            NbtValue::Double(_) => TAG_DOUBLE,
            NbtValue::ByteArray(_) => TAG_BYTE_ARRAY,
            NbtValue::String(_) => TAG_STRING,
            NbtValue::List(_) => TAG_LIST,
            NbtValue::Compound(_) => TAG_COMPOUND,
            NbtValue::IntArray(_) => TAG_INT_ARRAY,
            NbtValue::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// Write this value as a full named root tag (the only root shape this
    /// protocol range uses; the unnamed "network" root was introduced in 1.20.2).
    pub fn write_root_named(&self, name: &str, buf: &mut BytesMut) {
        buf.put_u8(self.tag_id());
        write_nbt_string(name, buf);
        self.write_payload(buf);
    }

    /// Write just the payload (no tag type or name).
    pub fn write_payload(&self, buf: &mut BytesMut) {
        match self {
            NbtValue::Byte(v) => buf.put_i8(*v),
            NbtValue::Short(v) => buf.put_i16(*v),
            NbtValue::Int(v) => buf.put_i32(*v),
            NbtValue::Long(v) => buf.put_i64(*v),
            NbtValue::Float(v) => buf.put_f32(*v),
            NbtValue::Double(v) => buf.put_f64(*v),
            NbtValue::ByteArray(v) => {
                buf.put_i32(v.len() as i32);
                for b in v {
                    buf.put_i8(*b);
                }
            }
            NbtValue::String(v) => {
                write_nbt_string(v, buf);
            }
            NbtValue::List(v) => {
                if v.is_empty() {
                    buf.put_u8(TAG_END);
                    buf.put_i32(0);
                } else {
                    buf.put_u8(v[0].tag_id());
                    buf.put_i32(v.len() as i32);
                    for item in v {
                        item.write_payload(buf);
                    }
                }
            }
            NbtValue::Compound(entries) => {
                for (name, value) in entries {
                    buf.put_u8(value.tag_id());
                    write_nbt_string(name, buf);
                    value.write_payload(buf);
                }
                buf.put_u8(TAG_END);
            }
            NbtValue::IntArray(v) => {
                buf.put_i32(v.len() as i32);
                for i in v {
                    buf.put_i32(*i);
                }
            }
            NbtValue::LongArray(v) => {
                buf.put_i32(v.len() as i32);
                for l in v {
                    buf.put_i64(*l);
                }
            }
        }
    }

    /// Read a payload of the given tag kind from `buf`.
    pub fn read_payload(tag_id: u8, buf: &mut impl Buf) -> Result<NbtValue> {
        Ok(match tag_id {
            TAG_BYTE => NbtValue::Byte(read_i8(buf)?),
            TAG_SHORT => NbtValue::Short(read_i16(buf)?),
            TAG_INT => NbtValue::Int(read_i32(buf)?),
            TAG_LONG => NbtValue::Long(read_i64(buf)?),
            TAG_FLOAT => NbtValue::Float(read_f32(buf)?),
            TAG_DOUBLE => NbtValue::Double(read_f64(buf)?),
            TAG_BYTE_ARRAY => {
                let len = read_i32(buf)? as usize;
                let mut out = Vec::with_capacity(len);
                for _ in 0..len {
                    out.push(read_i8(buf)?);
                }
                NbtValue::ByteArray(out)
            }
            TAG_STRING => NbtValue::String(read_nbt_string(buf)?),
            TAG_LIST => {
                let elem_id = read_u8(buf)?;
                let len = read_i32(buf)? as usize;
                let mut out = Vec::with_capacity(len);
                if elem_id != TAG_END {
                    for _ in 0..len {
                        out.push(NbtValue::read_payload(elem_id, buf)?);
                    }
                }
                NbtValue::List(out)
            }
            TAG_COMPOUND => {
                let mut entries = Vec::new();
                loop {
                    let child_id = read_u8(buf)?;
                    if child_id == TAG_END {
                        break;
                    }
                    let name = read_nbt_string(buf)?;
                    let value = NbtValue::read_payload(child_id, buf)?;
                    entries.push((name, value));
                }
                NbtValue::Compound(entries)
            }
            TAG_INT_ARRAY => {
                let len = read_i32(buf)? as usize;
                let mut out = Vec::with_capacity(len);
                for _ in 0..len {
                    out.push(read_i32(buf)?);
                }
                NbtValue::IntArray(out)
            }
            TAG_LONG_ARRAY => {
                let len = read_i32(buf)? as usize;
                let mut out = Vec::with_capacity(len);
                for _ in 0..len {
                    out.push(read_i64(buf)?);
                }
                NbtValue::LongArray(out)
            }
            other => return Err(NbtError::UnsupportedTag(other)),
        })
    }
}

/// Read a full named root tag: tag-kind byte, Short-prefixed name, payload.
/// Returns `(name, value)`, or `("", NbtValue::Compound(vec![]))`-like End marker
/// represented here as `None` when the stream starts with an End tag.
pub fn read_root_named(buf: &mut impl Buf) -> Result<Option<(String, NbtValue)>> {
    let tag_id = read_u8(buf)?;
    if tag_id == TAG_END {
        return Ok(None);
    }
    let name = read_nbt_string(buf)?;
    let value = NbtValue::read_payload(tag_id, buf)?;
    Ok(Some((name, value)))
}

/// Write a named root tag wrapped in gzip, for on-disk formats (schematics).
pub fn write_compressed(name: &str, value: &NbtValue) -> Result<Vec<u8>> {
    let mut raw = BytesMut::new();
    value.write_root_named(name, &mut raw);
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&raw)?;
    Ok(encoder.finish()?)
}

/// Read a gzip-wrapped named root tag, for on-disk formats (schematics).
pub fn read_compressed(data: &[u8]) -> Result<(String, NbtValue)> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut raw = Vec::new();
    decoder.read_to_end(&mut raw)?;
    let mut cursor = raw.as_slice();
    read_root_named(&mut cursor)?.ok_or(NbtError::UnexpectedEof)
}

fn require(buf: &impl Buf, n: usize) -> Result<()> {
    if buf.remaining() < n {
        Err(NbtError::UnexpectedEof)
    } else {
        Ok(())
    }
}

fn read_u8(buf: &mut impl Buf) -> Result<u8> {
    require(buf, 1)?;
    Ok(buf.get_u8())
}

fn read_i8(buf: &mut impl Buf) -> Result<i8> {
    require(buf, 1)?;
    Ok(buf.get_i8())
}

fn read_i16(buf: &mut impl Buf) -> Result<i16> {
    require(buf, 2)?;
    Ok(buf.get_i16())
}

fn read_i32(buf: &mut impl Buf) -> Result<i32> {
    require(buf, 4)?;
    Ok(buf.get_i32())
}

fn read_i64(buf: &mut impl Buf) -> Result<i64> {
    require(buf, 8)?;
    Ok(buf.get_i64())
}

fn read_f32(buf: &mut impl Buf) -> Result<f32> {
    require(buf, 4)?;
    Ok(buf.get_f32())
}

fn read_f64(buf: &mut impl Buf) -> Result<f64> {
    require(buf, 8)?;
    Ok(buf.get_f64())
}

fn read_nbt_string(buf: &mut impl Buf) -> Result<String> {
    require(buf, 2)?;
    let len = buf.get_u16() as usize;
    require(buf, len)?;
    let mut raw = vec![0u8; len];
    buf.copy_to_slice(&mut raw);
    String::from_utf8(raw).map_err(|_| NbtError::InvalidString)
}

fn write_nbt_string(s: &str, buf: &mut BytesMut) {
    let bytes = s.as_bytes();
    buf.put_u16(bytes.len() as u16);
    buf.put_slice(bytes);
}

/// Helper macro for building compound tags.
#[macro_export]
macro_rules! nbt_compound {
    ($($key:expr => $val:expr),* $(,)?) => {
        $crate::NbtValue::Compound(vec![
            $(($key.into(), $val)),*
        ])
    };
}

/// Helper macro for building list tags.
#[macro_export]
macro_rules! nbt_list {
    ($($val:expr),* $(,)?) => {
        $crate::NbtValue::List(vec![$($val),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_simple_compound() {
        let nbt = NbtValue::Compound(vec![
            ("name".into(), NbtValue::String("test".into())),
            ("value".into(), NbtValue::Int(42)),
        ]);
        let mut buf = BytesMut::new();
        nbt.write_root_named("root", &mut buf);
        assert_eq!(buf[0], TAG_COMPOUND);
    }

    #[test]
    fn test_long_array() {
        let nbt = NbtValue::LongArray(vec![1, 2, 3]);
        let mut buf = BytesMut::new();
        nbt.write_payload(&mut buf);
        // 4 bytes length (3) + 3 * 8 bytes = 28 bytes
        assert_eq!(buf.len(), 28);
    }

    #[test]
    fn test_round_trip_nested_compound() {
        let nbt = NbtValue::Compound(vec![
            ("name".into(), NbtValue::String("test".into())),
            ("value".into(), NbtValue::Int(42)),
            (
                "list".into(),
                NbtValue::List(vec![NbtValue::Short(1), NbtValue::Short(2)]),
            ),
            (
                "nested".into(),
                NbtValue::Compound(vec![("flag".into(), NbtValue::Byte(1))]),
            ),
            ("longs".into(), NbtValue::LongArray(vec![-1, 0, 1])),
        ]);
        let mut buf = BytesMut::new();
        nbt.write_root_named("root", &mut buf);
        let mut cursor = &buf[..];
        let (name, decoded) = read_root_named(&mut cursor).unwrap().unwrap();
        assert_eq!(name, "root");
        assert_eq!(decoded, nbt);
    }

    #[test]
    fn test_compressed_round_trip() {
        let nbt = NbtValue::Compound(vec![("a".into(), NbtValue::Int(7))]);
        let bytes = write_compressed("root", &nbt).unwrap();
        let (name, decoded) = read_compressed(&bytes).unwrap();
        assert_eq!(name, "root");
        assert_eq!(decoded, nbt);
    }
}

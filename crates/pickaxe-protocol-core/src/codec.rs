use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("VarInt too big")]
    VarIntTooBig,
    #[error("VarLong too big")]
    VarLongTooBig,
    #[error("unexpected end of data")]
    UnexpectedEof,
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Read a VarInt from the buffer.
pub fn read_varint(buf: &mut BytesMut) -> CodecResult<i32> {
    let mut result: i32 = 0;
    let mut shift: u32 = 0;
    loop {
        if !buf.has_remaining() {
            return Err(CodecError::UnexpectedEof);
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as i32) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 35 {
            return Err(CodecError::VarIntTooBig);
        }
    }
}

/// Write a VarInt to the buffer.
pub fn write_varint(buf: &mut BytesMut, mut value: i32) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u32) >> 7) as i32;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Calculate the byte length of a VarInt.
pub fn varint_len(value: i32) -> usize {
    let mut val = value as u32;
    let mut len = 0;
    loop {
        len += 1;
        val >>= 7;
        if val == 0 {
            break;
        }
    }
    len
}

/// Write a VarInt to a Vec<u8>.
pub fn write_varint_vec(buf: &mut Vec<u8>, mut value: i32) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u32) >> 7) as i32;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Read a VarLong from the buffer.
pub fn read_varlong(buf: &mut BytesMut) -> CodecResult<i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;
    loop {
        if !buf.has_remaining() {
            return Err(CodecError::UnexpectedEof);
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as i64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 70 {
            return Err(CodecError::VarLongTooBig);
        }
    }
}

/// Write a VarLong to the buffer.
pub fn write_varlong(buf: &mut BytesMut, mut value: i64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u64) >> 7) as i64;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Read a protocol string (VarInt-prefixed UTF-8), bounded by `max_len` characters.
///
/// The encoded byte length must satisfy `1 <= len <= (max_len*4)+3`; the decoded
/// character count must not exceed `max_len`.
pub fn read_string(buf: &mut BytesMut, max_len: usize) -> CodecResult<String> {
    let len = read_varint(buf)?;
    if len < 1 || (len as usize) > max_len * 4 + 3 {
        return Err(CodecError::InvalidValue(format!(
            "encoded string length {} out of bounds for max {}",
            len, max_len
        )));
    }
    let len = len as usize;
    if buf.remaining() < len {
        return Err(CodecError::UnexpectedEof);
    }
    let bytes = buf.split_to(len);
    let s = String::from_utf8(bytes.to_vec())
        .map_err(|_| CodecError::InvalidValue("string is not valid UTF-8".into()))?;
    if s.chars().count() > max_len {
        return Err(CodecError::InvalidValue(format!(
            "decoded string length exceeds maximum {}",
            max_len
        )));
    }
    Ok(s)
}

/// Write a protocol string. Fails if the UTF-8 byte length exceeds `max_len`.
pub fn write_string(buf: &mut BytesMut, s: &str, max_len: usize) -> CodecResult<()> {
    let bytes = s.as_bytes();
    if bytes.len() > max_len {
        return Err(CodecError::InvalidValue(format!(
            "string byte length {} exceeds maximum {}",
            bytes.len(),
            max_len
        )));
    }
    write_varint(buf, bytes.len() as i32);
    buf.put_slice(bytes);
    Ok(())
}

/// Read a UUID (128 bits, big endian: high then low).
pub fn read_uuid(buf: &mut BytesMut) -> CodecResult<Uuid> {
    if buf.remaining() < 16 {
        return Err(CodecError::UnexpectedEof);
    }
    let mut bytes = [0u8; 16];
    buf.copy_to_slice(&mut bytes);
    Ok(Uuid::from_bytes(bytes))
}

/// Write a UUID.
pub fn write_uuid(buf: &mut BytesMut, uuid: &Uuid) {
    buf.put_slice(uuid.as_bytes());
}

fn require(buf: &BytesMut, n: usize) -> CodecResult<()> {
    if buf.remaining() < n {
        Err(CodecError::UnexpectedEof)
    } else {
        Ok(())
    }
}

/// Read a big-endian `u8`, failing with `UnexpectedEof` rather than panicking
/// when the buffer is short — per §4.1, every fixed-width read must be
/// EOF-safe since `decode` runs directly on attacker-controlled bytes.
pub fn read_u8(buf: &mut BytesMut) -> CodecResult<u8> {
    require(buf, 1)?;
    Ok(buf.get_u8())
}

pub fn read_i8(buf: &mut BytesMut) -> CodecResult<i8> {
    require(buf, 1)?;
    Ok(buf.get_i8())
}

pub fn read_u16(buf: &mut BytesMut) -> CodecResult<u16> {
    require(buf, 2)?;
    Ok(buf.get_u16())
}

pub fn read_i16(buf: &mut BytesMut) -> CodecResult<i16> {
    require(buf, 2)?;
    Ok(buf.get_i16())
}

pub fn read_u32(buf: &mut BytesMut) -> CodecResult<u32> {
    require(buf, 4)?;
    Ok(buf.get_u32())
}

pub fn read_i32(buf: &mut BytesMut) -> CodecResult<i32> {
    require(buf, 4)?;
    Ok(buf.get_i32())
}

pub fn read_u64(buf: &mut BytesMut) -> CodecResult<u64> {
    require(buf, 8)?;
    Ok(buf.get_u64())
}

pub fn read_i64(buf: &mut BytesMut) -> CodecResult<i64> {
    require(buf, 8)?;
    Ok(buf.get_i64())
}

pub fn read_f32(buf: &mut BytesMut) -> CodecResult<f32> {
    require(buf, 4)?;
    Ok(buf.get_f32())
}

pub fn read_f64(buf: &mut BytesMut) -> CodecResult<f64> {
    require(buf, 8)?;
    Ok(buf.get_f64())
}

/// Read a byte array with VarInt length prefix.
pub fn read_byte_array(buf: &mut BytesMut) -> CodecResult<Vec<u8>> {
    let len = read_varint(buf)? as usize;
    if buf.remaining() < len {
        return Err(CodecError::UnexpectedEof);
    }
    let bytes = buf.split_to(len);
    Ok(bytes.to_vec())
}

/// Write a byte array with VarInt length prefix.
pub fn write_byte_array(buf: &mut BytesMut, data: &[u8]) {
    write_varint(buf, data.len() as i32);
    buf.put_slice(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_roundtrip() {
        let test_cases = vec![
            (0, vec![0x00]),
            (1, vec![0x01]),
            (127, vec![0x7F]),
            (128, vec![0x80, 0x01]),
            (255, vec![0xFF, 0x01]),
            (25565, vec![0xDD, 0xC7, 0x01]),
            (2097151, vec![0xFF, 0xFF, 0x7F]),
            (-1, vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]),
        ];

        for (value, expected_bytes) in test_cases {
            let mut buf = BytesMut::new();
            write_varint(&mut buf, value);
            assert_eq!(
                buf.to_vec(),
                expected_bytes,
                "write_varint({}) failed",
                value
            );
            assert!(buf.len() <= 5);

            let mut buf = BytesMut::from(&expected_bytes[..]);
            let result = read_varint(&mut buf).unwrap();
            assert_eq!(result, value, "read_varint for {} failed", value);
        }
    }

    #[test]
    fn test_varint_random_roundtrip() {
        let mut seed: u32 = 0x1234_5678;
        for _ in 0..2048 {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let value = seed as i32;
            let mut buf = BytesMut::new();
            write_varint(&mut buf, value);
            assert!(buf.len() <= 5);
            let decoded = read_varint(&mut buf).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_varlong_roundtrip() {
        let mut seed: u64 = 0x9E3779B97F4A7C15;
        for _ in 0..2048 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = seed as i64;
            let mut buf = BytesMut::new();
            write_varlong(&mut buf, value);
            assert!(buf.len() <= 10);
            let decoded = read_varlong(&mut buf).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_varint_len() {
        assert_eq!(varint_len(0), 1);
        assert_eq!(varint_len(127), 1);
        assert_eq!(varint_len(128), 2);
        assert_eq!(varint_len(25565), 3);
        assert_eq!(varint_len(-1), 5);
    }

    #[test]
    fn test_string_roundtrip() {
        let test_str = "Hello, Minecraft!";
        let mut buf = BytesMut::new();
        write_string(&mut buf, test_str, 32767).unwrap();
        let result = read_string(&mut buf, 32767).unwrap();
        assert_eq!(result, test_str);
    }

    #[test]
    fn test_write_string_too_long_fails() {
        let mut buf = BytesMut::new();
        let too_long = "x".repeat(10);
        assert!(write_string(&mut buf, &too_long, 5).is_err());
    }

    #[test]
    fn test_read_string_rejects_oversized_length() {
        let mut buf = BytesMut::new();
        // max_len = 5 -> encoded length may not exceed 5*4+3 = 23
        write_varint(&mut buf, 24);
        buf.put_slice(&[b'a'; 24]);
        assert!(read_string(&mut buf, 5).is_err());
    }

    #[test]
    fn test_uuid_roundtrip() {
        let uuid = Uuid::new_v4();
        let mut buf = BytesMut::new();
        write_uuid(&mut buf, &uuid);
        let result = read_uuid(&mut buf).unwrap();
        assert_eq!(result, uuid);
    }

    #[test]
    fn fixed_width_reads_round_trip() {
        let mut buf = BytesMut::new();
        buf.put_u8(0xAB);
        buf.put_u16(25565);
        buf.put_i64(-42);
        buf.put_f32(1.5);
        buf.put_f64(2.5);
        assert_eq!(read_u8(&mut buf).unwrap(), 0xAB);
        assert_eq!(read_u16(&mut buf).unwrap(), 25565);
        assert_eq!(read_i64(&mut buf).unwrap(), -42);
        assert_eq!(read_f32(&mut buf).unwrap(), 1.5);
        assert_eq!(read_f64(&mut buf).unwrap(), 2.5);
    }

    #[test]
    fn fixed_width_reads_fail_on_short_buffer_instead_of_panicking() {
        let mut buf = BytesMut::from(&[0u8; 3][..]);
        assert!(matches!(read_i64(&mut buf), Err(CodecError::UnexpectedEof)));
        let mut buf = BytesMut::new();
        assert!(matches!(read_u8(&mut buf), Err(CodecError::UnexpectedEof)));
        let mut buf = BytesMut::from(&[0u8; 1][..]);
        assert!(matches!(read_u16(&mut buf), Err(CodecError::UnexpectedEof)));
        let mut buf = BytesMut::from(&[0u8; 3][..]);
        assert!(matches!(read_f32(&mut buf), Err(CodecError::UnexpectedEof)));
    }
}

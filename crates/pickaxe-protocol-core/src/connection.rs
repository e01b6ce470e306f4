use crate::codec::{read_varint, varint_len, write_varint, CodecError};
use crate::pool::{global_pool, PooledBuffer};
use bytes::{Buf, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read as _, Write as _};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::trace;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection closed")]
    Closed,
    #[error("connection has been split")]
    Split,
    #[error("frame length {0} is out of bounds")]
    InvalidFrameLength(i64),
    #[error("compressed frame declares uncompressed size {declared}, below the negotiated threshold {threshold}")]
    InvalidCompressedFrame { declared: i32, threshold: i32 },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

type Result<T> = std::result::Result<T, ConnectionError>;

/// A framed Minecraft protocol connection with optional compression.
///
/// Encryption with the official session server is a non-goal of this crate:
/// the connection always operates in offline mode, so no cipher state is
/// carried here.
pub struct Connection {
    stream: Option<TcpStream>,
    read_buf: BytesMut,
    compression_threshold: Option<i32>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream: Some(stream),
            read_buf: BytesMut::with_capacity(4096),
            compression_threshold: None,
        }
    }

    /// Create a dummy connection (used as a placeholder after `into_split`).
    pub fn new_dummy() -> Self {
        Self {
            stream: None,
            read_buf: BytesMut::new(),
            compression_threshold: None,
        }
    }

    /// Enable zlib compression with the given threshold.
    pub fn enable_compression(&mut self, threshold: i32) {
        self.compression_threshold = Some(threshold);
    }

    /// Read a single packet frame, returning (packet_id, payload).
    pub async fn read_packet(&mut self) -> Result<(i32, BytesMut)> {
        let stream = self.stream.as_mut().ok_or(ConnectionError::Split)?;
        loop {
            if let Some(result) = try_parse_packet(&mut self.read_buf, self.compression_threshold)?
            {
                return Ok(result);
            }
            let mut tmp = [0u8; 4096];
            let n = stream.read(&mut tmp).await?;
            if n == 0 {
                return Err(ConnectionError::Closed);
            }
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
    }

    /// Write a packet with the given ID and payload.
    pub async fn write_packet(&mut self, packet_id: i32, payload: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(ConnectionError::Split)?;
        let frame = build_frame(packet_id, payload, self.compression_threshold);
        stream.write_all(&frame).await?;
        Ok(())
    }

    pub fn peer_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.stream
            .as_ref()
            .map(|s| s.peer_addr())
            .unwrap_or(Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "dummy connection",
            )))
    }

    /// Split the connection into read and write halves for concurrent I/O.
    ///
    /// This is how the per-connection write side is serialized without a
    /// lock: the reader keeps sole ownership of the socket's read half, and
    /// the writer — which may be driven from the keep-alive ticker or an
    /// event handler as well as the reader's own task — keeps sole ownership
    /// of the write half, so every encode-then-write sequence is atomic at
    /// packet granularity by construction.
    pub fn into_split(mut self) -> (ConnectionReader, ConnectionWriter) {
        let stream = self.stream.take().expect("cannot split a dummy connection");
        let (read_half, write_half) = stream.into_split();
        (
            ConnectionReader {
                stream: read_half,
                read_buf: self.read_buf,
                compression_threshold: self.compression_threshold,
            },
            ConnectionWriter {
                stream: write_half,
                compression_threshold: self.compression_threshold,
            },
        )
    }
}

/// Read half of a split connection.
pub struct ConnectionReader {
    stream: OwnedReadHalf,
    read_buf: BytesMut,
    compression_threshold: Option<i32>,
}

impl ConnectionReader {
    pub async fn read_packet(&mut self) -> Result<(i32, BytesMut)> {
        loop {
            if let Some(result) =
                try_parse_packet(&mut self.read_buf, self.compression_threshold)?
            {
                return Ok(result);
            }
            let mut tmp = [0u8; 4096];
            let n = self.stream.read(&mut tmp).await?;
            if n == 0 {
                return Err(ConnectionError::Closed);
            }
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
    }
}

/// Write half of a split connection.
pub struct ConnectionWriter {
    stream: OwnedWriteHalf,
    compression_threshold: Option<i32>,
}

impl ConnectionWriter {
    pub async fn write_packet(&mut self, packet_id: i32, payload: &[u8]) -> Result<()> {
        let frame = build_frame(packet_id, payload, self.compression_threshold);
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    /// Switch this half to compressed framing. Called after a `Login/Compression`
    /// write completes, per the fixed post-write side-effect ordering in §4.6.
    pub fn enable_compression(&mut self, threshold: i32) {
        self.compression_threshold = Some(threshold);
    }
}

// === Shared helpers ===

fn try_parse_packet(
    read_buf: &mut BytesMut,
    compression_threshold: Option<i32>,
) -> Result<Option<(i32, BytesMut)>> {
    if read_buf.is_empty() {
        return Ok(None);
    }

    let mut peek = read_buf.clone();
    let length = match read_varint(&mut peek) {
        Ok(len) => len,
        Err(_) => return Ok(None),
    };
    if length < 0 || length as i64 > (2i64.pow(31) - 1) {
        return Err(ConnectionError::InvalidFrameLength(length as i64));
    }
    let length = length as usize;

    let varint_bytes = read_buf.len() - peek.len();

    if peek.remaining() < length {
        return Ok(None);
    }

    read_buf.advance(varint_bytes);
    let mut packet_data = read_buf.split_to(length);

    if let Some(threshold) = compression_threshold {
        let data_length = read_varint(&mut packet_data)?;
        if data_length > 0 {
            if data_length < threshold {
                return Err(ConnectionError::InvalidCompressedFrame {
                    declared: data_length,
                    threshold,
                });
            }
            let mut decompressed = vec![0u8; data_length as usize];
            let mut decoder = ZlibDecoder::new(&packet_data[..]);
            decoder.read_exact(&mut decompressed)?;
            packet_data = BytesMut::from(&decompressed[..]);
        }
    }

    let packet_id = read_varint(&mut packet_data)?;
    trace!(
        "read packet id=0x{:02X} len={}",
        packet_id,
        packet_data.len()
    );

    Ok(Some((packet_id, packet_data)))
}

fn build_frame(
    packet_id: i32,
    payload: &[u8],
    compression_threshold: Option<i32>,
) -> PooledBuffer<'static> {
    let pool = global_pool();
    let mut packet_buf = pool.acquire();
    write_varint(&mut packet_buf, packet_id);
    packet_buf.extend_from_slice(payload);

    let mut frame = pool.acquire();

    if let Some(threshold) = compression_threshold {
        let uncompressed_len = packet_buf.len() as i32;
        if uncompressed_len >= threshold {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            let _ = encoder.write_all(&packet_buf);
            let compressed = encoder.finish().unwrap_or_default();

            let data_length_size = varint_len(uncompressed_len);
            let total_length = data_length_size + compressed.len();
            write_varint(&mut frame, total_length as i32);
            write_varint(&mut frame, uncompressed_len);
            frame.extend_from_slice(&compressed);
        } else {
            let total_length = 1 + packet_buf.len();
            write_varint(&mut frame, total_length as i32);
            write_varint(&mut frame, 0);
            frame.extend_from_slice(&packet_buf);
        }
    } else {
        write_varint(&mut frame, packet_buf.len() as i32);
        frame.extend_from_slice(&packet_buf);
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_frame_round_trips_through_parser() {
        let frame = build_frame(0x00, b"hello", None);
        let mut buf = BytesMut::from(&frame[..]);
        let (id, data) = try_parse_packet(&mut buf, None).unwrap().unwrap();
        assert_eq!(id, 0x00);
        assert_eq!(&data[..], b"hello");
    }

    #[test]
    fn small_payload_under_threshold_is_not_compressed() {
        let frame = build_frame(0x01, b"hi", Some(256));
        let mut buf = BytesMut::from(&frame[..]);
        let (id, data) = try_parse_packet(&mut buf, Some(256)).unwrap().unwrap();
        assert_eq!(id, 0x01);
        assert_eq!(&data[..], b"hi");
    }

    #[test]
    fn large_payload_over_threshold_is_compressed_and_round_trips() {
        let payload = vec![0x42u8; 1024];
        let frame = build_frame(0x02, &payload, Some(64));
        let mut buf = BytesMut::from(&frame[..]);
        let (id, data) = try_parse_packet(&mut buf, Some(64)).unwrap().unwrap();
        assert_eq!(id, 0x02);
        assert_eq!(data.to_vec(), payload);
    }

    #[test]
    fn declared_data_length_below_threshold_is_fatal() {
        // Hand-build a compressed-framing frame whose inner data-length (5)
        // is below the negotiated threshold (64), which must be rejected.
        let mut inner = BytesMut::new();
        write_varint(&mut inner, 5);
        inner.extend_from_slice(b"xxxxx");
        let mut frame = BytesMut::new();
        write_varint(&mut frame, inner.len() as i32);
        frame.extend_from_slice(&inner);

        let mut buf = frame;
        let result = try_parse_packet(&mut buf, Some(64));
        assert!(matches!(
            result,
            Err(ConnectionError::InvalidCompressedFrame { .. })
        ));
    }
}

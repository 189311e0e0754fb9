//! Framing codec for the Chatline wire protocol.
//!
//! Every unit of wire data is a frame: a 4-byte big-endian length prefix
//! followed by that many bytes of UTF-8 JSON. Provides buffer-based
//! encode/decode functions along with async variants that read and write
//! frames directly on a stream.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default maximum allowed frame payload size in bytes (1 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Error type for framing and payload codec operations.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Payload bytes could not be serialized or deserialized as JSON.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    /// The stream closed in the middle of a frame.
    #[error("truncated message: stream closed while reading {0}")]
    TruncatedMessage(String),
    /// A length prefix exceeded the configured maximum frame size.
    #[error("frame of {len} bytes exceeds maximum of {max}")]
    FrameTooLarge {
        /// Advertised payload length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },
    /// Underlying socket error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializes a record and wraps it in a length-prefixed frame.
///
/// Wire format: `[u32 length (BE)][JSON payload bytes]`
///
/// # Errors
///
/// Returns `WireError::MalformedPayload` if the record cannot be serialized,
/// or `WireError::FrameTooLarge` if the payload exceeds `u32::MAX` bytes.
pub fn encode_frame<T: Serialize>(record: &T) -> Result<Vec<u8>, WireError> {
    let payload = encode_payload(record)?;
    let len = u32::try_from(payload.len()).map_err(|_| WireError::FrameTooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Serializes a record into raw JSON payload bytes (no length prefix).
///
/// # Errors
///
/// Returns `WireError::MalformedPayload` if the record cannot be serialized.
pub fn encode_payload<T: Serialize>(record: &T) -> Result<Vec<u8>, WireError> {
    serde_json::to_vec(record).map_err(|e| WireError::MalformedPayload(e.to_string()))
}

/// Deserializes a record from raw JSON payload bytes.
///
/// # Errors
///
/// Returns `WireError::MalformedPayload` if the bytes are not valid JSON for
/// the target type.
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    serde_json::from_slice(bytes).map_err(|e| WireError::MalformedPayload(e.to_string()))
}

/// Decodes one length-prefixed frame from the front of a buffer.
///
/// Returns the decoded record and the total number of bytes consumed
/// (including the 4-byte prefix). Useful when frames arrive batched in a
/// single buffer.
///
/// # Errors
///
/// Returns `WireError::TruncatedMessage` if the buffer holds less data than
/// the prefix advertises, or `WireError::MalformedPayload` if the payload is
/// not valid JSON.
pub fn decode_frame<T: DeserializeOwned>(bytes: &[u8]) -> Result<(T, usize), WireError> {
    if bytes.len() < 4 {
        return Err(WireError::TruncatedMessage(format!(
            "length prefix: need 4 bytes, got {}",
            bytes.len()
        )));
    }
    let prefix: [u8; 4] = bytes[..4]
        .try_into()
        .map_err(|_| WireError::TruncatedMessage("length prefix".to_string()))?;
    let payload_len = u32::from_be_bytes(prefix) as usize;

    let total_len = 4 + payload_len;
    if bytes.len() < total_len {
        return Err(WireError::TruncatedMessage(format!(
            "payload: frame indicates {payload_len} bytes but only {} available",
            bytes.len() - 4
        )));
    }

    let record = decode_payload(&bytes[4..total_len])?;
    Ok((record, total_len))
}

/// Reads one frame from an async stream, returning the raw payload bytes.
///
/// Returns `Ok(None)` when the stream closes cleanly before the first prefix
/// byte — the normal disconnect path, not an error.
///
/// # Errors
///
/// Returns `WireError::TruncatedMessage` if the stream closes after at least
/// one prefix byte but before the full frame, `WireError::FrameTooLarge` if
/// the advertised length exceeds `max_size`, or `WireError::Io` for any
/// other socket failure.
pub async fn read_frame<R>(reader: &mut R, max_size: usize) -> Result<Option<Vec<u8>>, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 4];
    match reader.read(&mut prefix[..1]).await {
        Ok(0) => return Ok(None),
        Ok(_) => {}
        Err(e) => return Err(WireError::Io(e)),
    }
    reader
        .read_exact(&mut prefix[1..])
        .await
        .map_err(|e| eof_as_truncation(e, "length prefix"))?;

    let len = u32::from_be_bytes(prefix) as usize;
    if len > max_size {
        return Err(WireError::FrameTooLarge { len, max: max_size });
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| eof_as_truncation(e, "payload"))?;
    Ok(Some(payload))
}

/// Writes raw payload bytes to an async stream as one length-prefixed frame.
///
/// # Errors
///
/// Returns `WireError::FrameTooLarge` if the payload exceeds `u32::MAX`
/// bytes, or `WireError::Io` on any socket failure.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len()).map_err(|_| WireError::FrameTooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Maps a premature-EOF i/o error to `TruncatedMessage`; passes others through.
fn eof_as_truncation(e: std::io::Error, section: &str) -> WireError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        WireError::TruncatedMessage(section.to_string())
    } else {
        WireError::Io(e)
    }
}

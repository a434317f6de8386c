use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use quorumfs_core::{QfsError, Result};

/// Maximum single-frame payload size. Generous for whole-file content but
/// still bounds a misbehaving peer's ability to make us allocate unbounded
/// memory.
const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

/// Writes `payload` as one length-prefixed frame: a 4-byte big-endian
/// length followed by the bytes themselves.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = payload.len() as u32;
    writer
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|e| QfsError::TransportError(e.to_string()))?;
    writer
        .write_all(payload)
        .await
        .map_err(|e| QfsError::TransportError(e.to_string()))?;
    writer
        .flush()
        .await
        .map_err(|e| QfsError::TransportError(e.to_string()))?;
    Ok(())
}

/// Reads one length-prefixed frame, returning its payload bytes.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut len_bytes = [0u8; 4];
    reader
        .read_exact(&mut len_bytes)
        .await
        .map_err(|e| QfsError::TransportError(e.to_string()))?;
    let len = u32::from_be_bytes(len_bytes);
    if len > MAX_FRAME_LEN {
        return Err(QfsError::TransportError(format!(
            "frame length {len} exceeds maximum {MAX_FRAME_LEN}"
        )));
    }

    let mut buf = vec![0u8; len as usize];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(|e| QfsError::TransportError(e.to_string()))?;
    Ok(buf)
}

//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Length-prefixed framing.
//!
//! Every value on a minirpc stream (the handshake options, each header and
//! each body) is written as one frame:
//!
//! ```text
//! +----------------+------------------+
//! | length: u32 BE | payload (length) |
//! +----------------+------------------+
//! ```
//!
//! Frames are written without flushing so a header and its body can leave
//! in a single flush of a buffered writer.

use crate::codec::{DeserializationError, SerializationError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum payload size of a single frame (16 MiB).
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Size of the length prefix in bytes.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Writes one length-prefixed frame without flushing the writer.
///
/// # Errors
///
/// Returns a [`SerializationError`] if the payload exceeds
/// [`MAX_FRAME_SIZE`] or the writer fails.
///
/// # Examples
///
/// ```rust
/// use minirpc::codec::framing::write_frame;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut buffer = Vec::new();
/// write_frame(&mut buffer, b"Num.Add").await?;
/// assert_eq!(&buffer[0..4], &7u32.to_be_bytes());
/// assert_eq!(&buffer[4..], b"Num.Add");
/// # Ok(())
/// # }
/// ```
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), SerializationError>
where
    W: AsyncWrite + Unpin,
{
    let len = payload.len();
    if len > MAX_FRAME_SIZE as usize {
        return Err(SerializationError::new(format!(
            "Frame size {} exceeds maximum allowed size {}",
            len, MAX_FRAME_SIZE
        )));
    }

    writer
        .write_all(&(len as u32).to_be_bytes())
        .await
        .map_err(|e| SerializationError::with_source("Failed to write frame length", e))?;
    writer
        .write_all(payload)
        .await
        .map_err(|e| SerializationError::with_source("Failed to write frame payload", e))?;

    Ok(())
}

/// Reads one length-prefixed frame.
///
/// A stream that ends cleanly before the length prefix yields an error whose
/// [`is_eof`](DeserializationError::is_eof) is `true`.
///
/// # Errors
///
/// Returns a [`DeserializationError`] if the announced length exceeds
/// [`MAX_FRAME_SIZE`], or the stream fails or ends mid-frame.
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, DeserializationError>
where
    R: AsyncRead + Unpin,
{
    let mut len_bytes = [0u8; FRAME_HEADER_SIZE];
    reader
        .read_exact(&mut len_bytes)
        .await
        .map_err(|e| DeserializationError::with_source("Failed to read frame length", e))?;

    let len = u32::from_be_bytes(len_bytes);
    if len > MAX_FRAME_SIZE {
        return Err(DeserializationError::new(format!(
            "Frame size {} exceeds maximum allowed size {}",
            len, MAX_FRAME_SIZE
        )));
    }

    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| DeserializationError::with_source("Failed to read frame payload", e))?;

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_frame() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, b"Hello, world!").await.unwrap();

        let mut reader = &buffer[..];
        let decoded = read_frame(&mut reader).await.unwrap();
        assert_eq!(decoded, b"Hello, world!");
    }

    #[tokio::test]
    async fn test_empty_frame() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, b"").await.unwrap();
        assert_eq!(buffer.len(), FRAME_HEADER_SIZE);

        let mut reader = &buffer[..];
        assert!(read_frame(&mut reader).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_frame_too_large() {
        let mut buffer = Vec::new();
        let payload = vec![0u8; (MAX_FRAME_SIZE + 1) as usize];

        let err = write_frame(&mut buffer, &payload).await.unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_frame_size() {
        let buffer = (MAX_FRAME_SIZE + 1).to_be_bytes();
        let mut reader = &buffer[..];

        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
        assert!(!err.is_eof());
    }

    #[tokio::test]
    async fn test_clean_eof() {
        let mut reader: &[u8] = &[];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(err.is_eof());
    }

    #[tokio::test]
    async fn test_incomplete_frame() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&10u32.to_be_bytes());
        buffer.extend_from_slice(b"short");

        let mut reader = &buffer[..];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(err.message().contains("payload"));
    }

    #[tokio::test]
    async fn test_multiple_frames() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, b"header").await.unwrap();
        write_frame(&mut buffer, b"body").await.unwrap();

        let mut reader = &buffer[..];
        assert_eq!(read_frame(&mut reader).await.unwrap(), b"header");
        assert_eq!(read_frame(&mut reader).await.unwrap(), b"body");
        assert!(read_frame(&mut reader).await.unwrap_err().is_eof());
    }
}

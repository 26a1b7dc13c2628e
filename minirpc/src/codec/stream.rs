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

//! Codec bound to a connection.

use crate::codec::framing::{read_frame, write_frame};
use crate::codec::{CodecType, DeserializationError, Header, SerializationError};
use crate::transport::{BoxedTransport, Transport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter, ReadHalf, WriteHalf};
use tracing::error;

/// A codec bound to one connection.
///
/// The connection is split so that one task can read while others write;
/// see [`into_split`](Self::into_split).
///
/// # Examples
///
/// ```rust
/// use minirpc::codec::{Codec, CodecType, Header};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (left, right) = tokio::io::duplex(1024);
/// let (_, mut writer) = Codec::new(left, CodecType::Json).into_split();
/// let (mut reader, _) = Codec::new(right, CodecType::Json).into_split();
///
/// writer.write(&Header::new("Num.Add", 1), &(3, 4)).await?;
/// let header = reader.read_header().await?;
/// let body: (i32, i32) = reader.read_body().await?;
/// assert_eq!((header.seq, body), (1, (3, 4)));
/// # Ok(())
/// # }
/// ```
pub struct Codec {
    reader: CodecReader,
    writer: CodecWriter,
}

impl Codec {
    /// Binds a codec to a connection.
    pub fn new<T: Transport>(conn: T, codec_type: CodecType) -> Self {
        Self::from_boxed(Box::new(conn), codec_type)
    }

    /// Binds a codec to an already boxed connection.
    pub fn from_boxed(conn: BoxedTransport, codec_type: CodecType) -> Self {
        let (read_half, write_half) = tokio::io::split(conn);
        Self {
            reader: CodecReader {
                reader: BufReader::new(read_half),
                codec_type,
            },
            writer: CodecWriter {
                writer: BufWriter::new(write_half),
                codec_type,
                closed: false,
            },
        }
    }

    /// Returns the codec in use.
    pub fn codec_type(&self) -> CodecType {
        self.reader.codec_type
    }

    /// Splits the codec into its reading and writing halves.
    pub fn into_split(self) -> (CodecReader, CodecWriter) {
        (self.reader, self.writer)
    }
}

/// Reading half of a [`Codec`].
///
/// Every header read must be followed by exactly one of
/// [`read_body`](Self::read_body), [`read_body_bytes`](Self::read_body_bytes)
/// or [`discard_body`](Self::discard_body) to keep the stream aligned.
pub struct CodecReader {
    reader: BufReader<ReadHalf<BoxedTransport>>,
    codec_type: CodecType,
}

impl CodecReader {
    /// Returns the codec in use.
    pub fn codec_type(&self) -> CodecType {
        self.codec_type
    }

    /// Reads and decodes the next header.
    pub async fn read_header(&mut self) -> Result<Header, DeserializationError> {
        let frame = read_frame(&mut self.reader).await?;
        self.codec_type.decode(&frame)
    }

    /// Reads and decodes the body that follows the last header.
    pub async fn read_body<T: DeserializeOwned>(&mut self) -> Result<T, DeserializationError> {
        let frame = read_frame(&mut self.reader).await?;
        self.codec_type.decode(&frame)
    }

    /// Reads the body that follows the last header without decoding it.
    pub async fn read_body_bytes(&mut self) -> Result<Vec<u8>, DeserializationError> {
        read_frame(&mut self.reader).await
    }

    /// Consumes the body that follows the last header.
    pub async fn discard_body(&mut self) -> Result<(), DeserializationError> {
        read_frame(&mut self.reader).await.map(drop)
    }
}

/// Writing half of a [`Codec`].
///
/// A message is buffered in full and flushed once. Any failure while
/// encoding or writing shuts the connection down, after which every write
/// fails.
pub struct CodecWriter {
    writer: BufWriter<WriteHalf<BoxedTransport>>,
    codec_type: CodecType,
    closed: bool,
}

impl CodecWriter {
    /// Returns the codec in use.
    pub fn codec_type(&self) -> CodecType {
        self.codec_type
    }

    /// Returns `true` once the writer has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Encodes and writes a header and its body as one message.
    pub async fn write<B>(&mut self, header: &Header, body: &B) -> Result<(), SerializationError>
    where
        B: Serialize + ?Sized,
    {
        let body = match self.codec_type.encode(body) {
            Ok(body) => body,
            Err(err) => {
                error!("rpc codec: encoding body error: {err}");
                self.close().await;
                return Err(err);
            }
        };
        self.write_encoded(header, &body).await
    }

    /// Writes a header followed by a body already encoded with this codec.
    pub async fn write_encoded(
        &mut self,
        header: &Header,
        body: &[u8],
    ) -> Result<(), SerializationError> {
        if self.closed {
            return Err(SerializationError::new("codec writer is closed"));
        }

        let result = self.write_message(header, body).await;
        if let Err(err) = &result {
            error!("rpc codec: write error: {err}");
            self.close().await;
        }
        result
    }

    async fn write_message(&mut self, header: &Header, body: &[u8]) -> Result<(), SerializationError> {
        let header = self.codec_type.encode(header)?;
        write_frame(&mut self.writer, &header).await?;
        write_frame(&mut self.writer, body).await?;
        self.writer
            .flush()
            .await
            .map_err(|e| SerializationError::with_source("Failed to flush message", e))
    }

    /// Flushes what is buffered and shuts the write side down.
    ///
    /// Closing twice is a no-op.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.writer.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_request_response_alignment() {
        let (left, right) = tokio::io::duplex(4096);
        let (_, mut writer) = Codec::new(left, CodecType::Postcard).into_split();
        let (mut reader, _) = Codec::new(right, CodecType::Postcard).into_split();

        writer.write(&Header::new("Foo.Sum", 1), &(1i32, 2i32)).await.unwrap();
        writer.write(&Header::new("Foo.Sum", 2), &(5i32, 6i32)).await.unwrap();

        let first = reader.read_header().await.unwrap();
        assert_eq!(first.seq, 1);
        reader.discard_body().await.unwrap();

        let second = reader.read_header().await.unwrap();
        assert_eq!(second.seq, 2);
        let body: (i32, i32) = reader.read_body().await.unwrap();
        assert_eq!(body, (5, 6));
    }

    #[tokio::test]
    async fn test_write_encoded_body() {
        let (left, right) = tokio::io::duplex(4096);
        let (_, mut writer) = Codec::new(left, CodecType::Json).into_split();
        let (mut reader, _) = Codec::new(right, CodecType::Json).into_split();

        let body = CodecType::Json.encode("7").unwrap();
        writer.write_encoded(&Header::new("Num.Add", 9), &body).await.unwrap();

        assert_eq!(reader.read_header().await.unwrap().seq, 9);
        assert_eq!(reader.read_body_bytes().await.unwrap(), b"\"7\"");
    }

    #[tokio::test]
    async fn test_close_shuts_down_stream() {
        let (left, mut right) = tokio::io::duplex(64);
        let (_, mut writer) = Codec::new(left, CodecType::Json).into_split();

        writer.close().await;
        writer.close().await;
        assert!(writer.is_closed());

        let mut buf = Vec::new();
        assert_eq!(right.read_to_end(&mut buf).await.unwrap(), 0);

        let err = writer.write(&Header::new("Num.Add", 1), &()).await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }

    #[tokio::test]
    async fn test_eof_between_messages() {
        let (left, right) = tokio::io::duplex(64);
        drop(left);
        let (mut reader, _) = Codec::new(right, CodecType::Json).into_split();
        assert!(reader.read_header().await.unwrap_err().is_eof());
    }
}

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

//! Connection handshake.
//!
//! The first frame a client sends on a new connection is its [`Options`],
//! always JSON encoded. The server validates the magic number, resolves the
//! codec identifier and from then on both sides speak the selected codec.
//!
//! # Handshake Flow
//!
//! 1. Client writes one JSON [`Options`] frame
//! 2. Server checks [`MAGIC_NUMBER`] and looks the codec up
//! 3. On any mismatch the server closes the connection without a reply
//! 4. Otherwise header/body pairs follow in the selected codec

use crate::codec::framing::{read_frame, write_frame};
use crate::codec::{self, CodecType, DeserializationError, JsonSerializer, SerializationError, Serializer};
use crate::RpcError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Marks a connection as speaking minirpc.
pub const MAGIC_NUMBER: u32 = 0x3bef5c;

/// Default deadline for establishing a client connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-connection settings announced by the client.
///
/// # Examples
///
/// ```rust
/// use minirpc::codec::CodecType;
/// use minirpc::handshake::Options;
/// use std::time::Duration;
///
/// let options = Options::default()
///     .with_codec_type(CodecType::Json)
///     .with_handle_timeout(Duration::from_secs(2));
/// assert_eq!(options.codec_type, "application/json");
/// assert_eq!(options.connect_timeout, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Must equal [`MAGIC_NUMBER`].
    pub magic_number: u32,

    /// Identifier of the codec used after the handshake.
    pub codec_type: String,

    /// Deadline for connecting and completing the handshake on the client.
    ///
    /// Zero means no limit. Default: 10 seconds
    pub connect_timeout: Duration,

    /// Deadline the server applies to each request it handles.
    ///
    /// Zero means no limit. Default: zero
    pub handle_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            magic_number: MAGIC_NUMBER,
            codec_type: CodecType::default().name().to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            handle_timeout: Duration::ZERO,
        }
    }
}

impl Options {
    /// Sets the codec used after the handshake.
    pub fn with_codec_type(mut self, codec_type: CodecType) -> Self {
        self.codec_type = codec_type.name().to_string();
        self
    }

    /// Sets the client connect deadline. Zero disables it.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the server handle deadline. Zero disables it.
    pub fn with_handle_timeout(mut self, timeout: Duration) -> Self {
        self.handle_timeout = timeout;
        self
    }

    /// Normalizes caller supplied options.
    ///
    /// The magic number is always forced and an empty codec identifier falls
    /// back to the default codec. `None` yields [`Options::default`].
    pub fn resolve(options: Option<Options>) -> Options {
        let mut options = options.unwrap_or_default();
        options.magic_number = MAGIC_NUMBER;
        if options.codec_type.is_empty() {
            options.codec_type = CodecType::default().name().to_string();
        }
        options
    }

    /// Resolves the codec identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidCodecType`] for an unregistered identifier.
    pub fn codec(&self) -> Result<CodecType, RpcError> {
        codec::lookup(&self.codec_type)
            .ok_or_else(|| RpcError::InvalidCodecType(self.codec_type.clone()))
    }
}

/// Writes the options frame and flushes it.
pub async fn write_options<W>(writer: &mut W, options: &Options) -> Result<(), SerializationError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = JsonSerializer::new().serialize(options)?;
    write_frame(writer, &bytes).await?;
    writer
        .flush()
        .await
        .map_err(|e| SerializationError::with_source("Failed to flush options", e))
}

/// Reads the options frame.
///
/// Reads exactly one frame, so nothing past the handshake is consumed.
pub async fn read_options<R>(reader: &mut R) -> Result<Options, DeserializationError>
where
    R: AsyncRead + Unpin,
{
    let frame = read_frame(reader).await?;
    JsonSerializer::new().deserialize(&frame)
}

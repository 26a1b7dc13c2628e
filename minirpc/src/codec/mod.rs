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

//! Message codecs.
//!
//! A minirpc message is a [`Header`] followed by a body, each encoded by the
//! codec the peers agreed on during the handshake and carried in its own
//! length-prefixed frame (see [`framing`]).
//!
//! Two codecs are built in:
//!
//! | [`CodecType`]   | Identifier             | Serializer              |
//! |-----------------|------------------------|-------------------------|
//! | `Postcard`      | `application/postcard` | [`PostcardSerializer`]  |
//! | `Json`          | `application/json`     | [`JsonSerializer`]      |
//!
//! The identifier is what travels in the handshake; [`lookup`] resolves it
//! against the process-wide codec table.
//!
//! # Examples
//!
//! ```rust
//! use minirpc::codec::{self, CodecType, Header};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let codec_type = codec::lookup("application/json").expect("json is built in");
//! assert_eq!(codec_type, CodecType::Json);
//!
//! let bytes = codec_type.encode(&Header::new("Num.Add", 1))?;
//! let header: Header = codec_type.decode(&bytes)?;
//! assert_eq!(header.service_method, "Num.Add");
//! # Ok(())
//! # }
//! ```

mod error;
pub mod framing;
mod json;
mod postcard;
mod stream;
mod traits;

pub use error::{DeserializationError, SerializationError};
pub use json::JsonSerializer;
pub use postcard::PostcardSerializer;
pub use stream::{Codec, CodecReader, CodecWriter};
pub use traits::Serializer;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Per-message metadata preceding every request and response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Target in `"Service.Method"` form.
    pub service_method: String,
    /// Sequence number chosen by the client, echoed in the response.
    pub seq: u64,
    /// Empty on success; the failure description otherwise.
    pub error: String,
}

impl Header {
    /// Creates a request header with an empty error.
    pub fn new(service_method: impl Into<String>, seq: u64) -> Self {
        Self {
            service_method: service_method.into(),
            seq,
            error: String::new(),
        }
    }

    /// Returns `true` if the header reports a failure.
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// The wire formats a connection can negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodecType {
    /// Compact binary encoding.
    #[default]
    Postcard,
    /// Textual JSON encoding.
    Json,
}

impl CodecType {
    /// Every built-in codec.
    pub const ALL: [CodecType; 2] = [CodecType::Postcard, CodecType::Json];

    /// Returns the identifier sent in the handshake.
    pub const fn name(self) -> &'static str {
        match self {
            CodecType::Postcard => "application/postcard",
            CodecType::Json => "application/json",
        }
    }

    /// Encodes a value with this codec.
    ///
    /// # Errors
    ///
    /// Returns a [`SerializationError`] if the value cannot be encoded.
    pub fn encode<T>(self, value: &T) -> Result<Vec<u8>, SerializationError>
    where
        T: Serialize + ?Sized,
    {
        match self {
            CodecType::Postcard => PostcardSerializer::new().serialize(value),
            CodecType::Json => JsonSerializer::new().serialize(value),
        }
    }

    /// Decodes a value with this codec.
    ///
    /// # Errors
    ///
    /// Returns a [`DeserializationError`] if the bytes do not describe a `T`.
    pub fn decode<T>(self, bytes: &[u8]) -> Result<T, DeserializationError>
    where
        T: DeserializeOwned,
    {
        match self {
            CodecType::Postcard => PostcardSerializer::new().deserialize(bytes),
            CodecType::Json => JsonSerializer::new().deserialize(bytes),
        }
    }
}

impl fmt::Display for CodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodecType {
    type Err = crate::RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(s).ok_or_else(|| crate::RpcError::InvalidCodecType(s.to_string()))
    }
}

static CODECS: LazyLock<HashMap<&'static str, CodecType>> = LazyLock::new(|| {
    CodecType::ALL
        .iter()
        .map(|codec_type| (codec_type.name(), *codec_type))
        .collect()
});

/// Resolves a codec identifier against the codec table.
///
/// Returns `None` for identifiers no codec is registered under.
pub fn lookup(name: &str) -> Option<CodecType> {
    CODECS.get(name).copied()
}

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

//! JSON serializer, the textual wire format.
//!
//! Also used for the connection handshake, which is always JSON regardless
//! of the codec the peers agree on.

use crate::codec::{DeserializationError, SerializationError, Serializer};

/// Textual serializer backed by `serde_json`.
///
/// # Examples
///
/// ```rust
/// use minirpc::codec::{JsonSerializer, Serializer};
///
/// let serializer = JsonSerializer::new();
/// let bytes = serializer.serialize(&7).unwrap();
/// assert_eq!(bytes, b"7");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    /// Creates a serializer that produces compact JSON.
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for JsonSerializer {
    fn serialize<T>(&self, value: &T) -> Result<Vec<u8>, SerializationError>
    where
        T: serde::Serialize + ?Sized,
    {
        serde_json::to_vec(value).map_err(Into::into)
    }

    fn deserialize<T>(&self, bytes: &[u8]) -> Result<T, DeserializationError>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(bytes).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Reply {
        sum: i64,
        note: String,
    }

    #[test]
    fn test_json_basic() {
        let serializer = JsonSerializer::new();
        let reply = Reply {
            sum: 7,
            note: "héllo \"quoted\"".to_string(),
        };

        let bytes = serializer.serialize(&reply).unwrap();
        let decoded: Reply = serializer.deserialize(&bytes).unwrap();

        assert_eq!(reply, decoded);
    }

    #[test]
    fn test_json_invalid_data() {
        let serializer = JsonSerializer::new();
        let result: Result<Reply, _> = serializer.deserialize(b"{\"sum\":");
        assert!(result.is_err());
    }
}

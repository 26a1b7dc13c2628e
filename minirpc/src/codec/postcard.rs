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

//! Postcard serializer, the binary wire format.
//!
//! Postcard is compact and self-delimiting only per value, so every encoded
//! header and body travels inside its own length-prefixed frame.

use crate::codec::{DeserializationError, SerializationError, Serializer};

/// Binary serializer backed by `postcard`.
///
/// This is the default codec of the runtime, registered under
/// [`CodecType::Postcard`](crate::codec::CodecType::Postcard).
///
/// # Examples
///
/// ```rust
/// use minirpc::codec::{PostcardSerializer, Serializer};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let serializer = PostcardSerializer::new();
/// let bytes = serializer.serialize(&(3u32, "Num.Add"))?;
/// let (n, name): (u32, String) = serializer.deserialize(&bytes)?;
/// assert_eq!((n, name.as_str()), (3, "Num.Add"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PostcardSerializer;

impl PostcardSerializer {
    /// Creates a new postcard serializer.
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for PostcardSerializer {
    fn serialize<T>(&self, value: &T) -> Result<Vec<u8>, SerializationError>
    where
        T: serde::Serialize + ?Sized,
    {
        postcard::to_allocvec(value)
            .map_err(|e| SerializationError::with_source("Postcard serialization failed", e))
    }

    fn deserialize<T>(&self, bytes: &[u8]) -> Result<T, DeserializationError>
    where
        T: serde::de::DeserializeOwned,
    {
        postcard::from_bytes(bytes)
            .map_err(|e| DeserializationError::with_source("Postcard deserialization failed", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Args {
        num1: i64,
        num2: i64,
    }

    #[test]
    fn test_postcard_basic() {
        let serializer = PostcardSerializer::default();
        let args = Args { num1: 3, num2: 4 };

        let bytes = serializer.serialize(&args).unwrap();
        let decoded: Args = serializer.deserialize(&bytes).unwrap();

        assert_eq!(args, decoded);
    }

    #[test]
    fn test_postcard_unit_is_empty() {
        let serializer = PostcardSerializer::default();
        assert!(serializer.serialize(&()).unwrap().is_empty());
        serializer.deserialize::<()>(&[]).unwrap();
    }

    #[test]
    fn test_postcard_truncated_data() {
        let serializer = PostcardSerializer::default();
        let result: Result<String, _> = serializer.deserialize(&[0x05, b'a']);
        assert!(result.is_err());
    }
}

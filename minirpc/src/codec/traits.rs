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

//! Serializer trait definition.

use crate::codec::{DeserializationError, SerializationError};

/// Converts values to and from the bytes carried in a single frame.
///
/// Each wire format the runtime speaks has one `Serializer`. The
/// [`CodecType`](crate::codec::CodecType) table maps a codec identifier to
/// the serializer that implements it.
///
/// # Examples
///
/// ```rust
/// use minirpc::codec::{JsonSerializer, Serializer};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, Debug, PartialEq)]
/// struct Args {
///     num1: i32,
///     num2: i32,
/// }
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let serializer = JsonSerializer::new();
/// let bytes = serializer.serialize(&Args { num1: 3, num2: 4 })?;
/// assert_eq!(bytes, br#"{"num1":3,"num2":4}"#);
/// let args: Args = serializer.deserialize(&bytes)?;
/// assert_eq!(args, Args { num1: 3, num2: 4 });
/// # Ok(())
/// # }
/// ```
pub trait Serializer: Send + Sync + 'static {
    /// Serializes a value to bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`SerializationError`] if the value cannot be represented in
    /// this format.
    fn serialize<T>(&self, value: &T) -> Result<Vec<u8>, SerializationError>
    where
        T: serde::Serialize + ?Sized;

    /// Deserializes bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns a [`DeserializationError`] if the bytes are corrupted, truncated
    /// or describe a different type.
    fn deserialize<T>(&self, bytes: &[u8]) -> Result<T, DeserializationError>
    where
        T: serde::de::DeserializeOwned;
}

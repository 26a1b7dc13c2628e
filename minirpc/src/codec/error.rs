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

//! Codec error types.
//!
//! Encoding failures surface as [`SerializationError`] and decoding or
//! stream read failures as [`DeserializationError`]. Both carry a message and
//! an optional source so the underlying I/O or format error stays reachable.

use std::fmt;
use std::io;

/// Error that occurs while encoding a value or writing a frame.
///
/// # Examples
///
/// ```rust
/// use minirpc::codec::SerializationError;
/// use std::io;
///
/// let io_error = io::Error::new(io::ErrorKind::BrokenPipe, "peer gone");
/// let error = SerializationError::with_source("Failed to write frame payload", io_error);
/// assert!(error.to_string().contains("peer gone"));
/// ```
#[derive(Debug)]
pub struct SerializationError {
    /// The underlying error message
    message: String,
    /// Optional source error
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SerializationError {
    /// Creates a new serialization error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new serialization error with a message and source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the error message without the source chain.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encode error: {}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for SerializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source("JSON encoding failed", err)
    }
}

/// Error that occurs while reading a frame or decoding a value.
///
/// A peer that closes the stream between frames produces an error for
/// which [`is_eof`](Self::is_eof) returns `true`; callers use it to tell an
/// orderly hang-up apart from a corrupted stream.
#[derive(Debug)]
pub struct DeserializationError {
    /// The underlying error message
    message: String,
    /// Optional source error
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DeserializationError {
    /// Creates a new deserialization error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new deserialization error with a message and source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the error message without the source chain.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the stream ended before a complete frame was read.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use minirpc::codec::DeserializationError;
    /// use std::io;
    ///
    /// let eof = io::Error::from(io::ErrorKind::UnexpectedEof);
    /// assert!(DeserializationError::with_source("Failed to read frame length", eof).is_eof());
    /// assert!(!DeserializationError::new("bad header").is_eof());
    /// ```
    pub fn is_eof(&self) -> bool {
        self.source
            .as_ref()
            .and_then(|e| e.downcast_ref::<io::Error>())
            .is_some_and(|e| e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

impl fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decode error: {}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for DeserializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for DeserializationError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source("JSON decoding failed", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_serialization_error_display() {
        let error = SerializationError::new("value too large");
        assert_eq!(error.to_string(), "encode error: value too large");
        assert!(error.source().is_none());
    }

    #[test]
    fn test_deserialization_error_with_source() {
        let io_error = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let error = DeserializationError::with_source("Failed to read frame payload", io_error);
        assert!(error.to_string().contains("caused by: reset"));
        assert!(error.source().is_some());
        assert!(!error.is_eof());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_slice::<u32>(b"not json").unwrap_err();
        let error: DeserializationError = json_error.into();
        assert_eq!(error.message(), "JSON decoding failed");
    }
}

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

//! Error type shared by every minirpc component.
//!
//! Errors fall into a few families, each with a predicate:
//!
//! - **Transport** ([`RpcError::is_transport`]): the connection failed or was
//!   lost. The client that saw it is no longer usable.
//! - **Timeout** ([`RpcError::is_timeout`]): a connect, call or handle
//!   deadline elapsed.
//! - **Remote** ([`RpcError::is_remote`]): the server answered with an error
//!   header. The connection stays usable.
//! - **Shutdown** ([`RpcError::is_shutdown`]): the client was closed.
//!
//! Messages of errors the server reports back to callers are part of the wire
//! contract, since the client sees them as [`RpcError::Remote`] text.
//!
//! # Examples
//!
//! ```rust
//! use minirpc::RpcError;
//! use std::time::Duration;
//!
//! let err = RpcError::ServiceNotFound("Foo".to_string());
//! assert_eq!(err.to_string(), "rpc server: can't find service Foo");
//!
//! let err = RpcError::ConnectTimeout(Duration::from_secs(1));
//! assert!(err.is_timeout());
//! ```

use crate::codec::{DeserializationError, SerializationError};
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Error returned by minirpc operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The client has been closed, or was already closed.
    #[error("connection is shut down")]
    Shutdown,

    /// The connection broke while calls were outstanding.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// What ended the connection.
        reason: String,
    },

    /// Failed to establish a connection.
    #[error("failed to connect to {address}: {source}")]
    ConnectionFailed {
        /// The address that was dialed.
        address: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A value could not be encoded or a frame could not be written.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// A frame could not be read or decoded.
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),

    /// The handshake did not start with the minirpc magic number.
    #[error("rpc server: invalid magic number {0:#x}")]
    InvalidMagicNumber(u32),

    /// No codec is registered under the requested identifier.
    #[error("invalid codec type {0}")]
    InvalidCodecType(String),

    /// A service method name without a `.` separator.
    #[error("rpc server: service/method request ill-formed: {0}")]
    IllFormedServiceMethod(String),

    /// No service is registered under the requested name.
    #[error("rpc server: can't find service {0}")]
    ServiceNotFound(String),

    /// The service exists but does not export the requested method.
    #[error("rpc server: can't find method {0}")]
    MethodNotFound(String),

    /// A service with the same name is already registered.
    #[error("rpc: service already defined: {0}")]
    ServiceAlreadyDefined(String),

    /// The server answered with an error header.
    #[error("{0}")]
    Remote(String),

    /// The response header arrived but its body could not be read.
    #[error("reading body error: {0}")]
    ReadBody(String),

    /// The caller stopped waiting for a response.
    #[error("rpc client: call timeout: service method {0}")]
    CallTimeout(String),

    /// The connection or handshake did not complete in time.
    #[error("rpc client: connect timeout: expect within {0:?}")]
    ConnectTimeout(Duration),

    /// The server gave up on a handler.
    #[error("rpc server: request timeout: expect within {0:?}")]
    HandleTimeout(Duration),

    /// The HTTP `CONNECT` handshake got an unexpected status line.
    #[error("unexpected HTTP response: {0}")]
    UnexpectedHttpResponse(String),

    /// An address not of the form `protocol@addr`.
    #[error("rpc client err: wrong format '{0}', expect protocol@addr")]
    InvalidAddress(String),

    /// Discovery has no servers to offer.
    #[error("rpc discovery: no available servers")]
    NoAvailableServer,

    /// A select mode discovery does not support.
    #[error("rpc discovery: not supported select mode")]
    InvalidSelectMode,

    /// Talking to the registry failed.
    #[error("rpc registry: {0}")]
    Registry(String),

    /// A configuration value was out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl RpcError {
    /// Returns `true` if a deadline elapsed.
    ///
    /// Remote handle timeouts arrive as [`RpcError::Remote`] text and are not
    /// included.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            RpcError::CallTimeout(_) | RpcError::ConnectTimeout(_) | RpcError::HandleTimeout(_)
        )
    }

    /// Returns `true` if the client was closed.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, RpcError::Shutdown)
    }

    /// Returns `true` if the server reported the error.
    pub fn is_remote(&self) -> bool {
        matches!(self, RpcError::Remote(_))
    }

    /// Returns `true` if the connection failed or broke.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use minirpc::RpcError;
    /// use std::io;
    ///
    /// let err = RpcError::ConnectionFailed {
    ///     address: "127.0.0.1:1".to_string(),
    ///     source: io::Error::from(io::ErrorKind::ConnectionRefused),
    /// };
    /// assert!(err.is_transport());
    /// assert!(!RpcError::Remote("boom".to_string()).is_transport());
    /// ```
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RpcError::ConnectionLost { .. }
                | RpcError::ConnectionFailed { .. }
                | RpcError::Io(_)
                | RpcError::Serialization(_)
                | RpcError::Deserialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_messages() {
        assert_eq!(
            RpcError::IllFormedServiceMethod("Foo".to_string()).to_string(),
            "rpc server: service/method request ill-formed: Foo"
        );
        assert_eq!(
            RpcError::MethodNotFound("Bar".to_string()).to_string(),
            "rpc server: can't find method Bar"
        );
        assert_eq!(
            RpcError::HandleTimeout(Duration::from_secs(1)).to_string(),
            "rpc server: request timeout: expect within 1s"
        );
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(RpcError::Shutdown.to_string(), "connection is shut down");
        assert_eq!(
            RpcError::CallTimeout("Foo.Sum".to_string()).to_string(),
            "rpc client: call timeout: service method Foo.Sum"
        );
        assert_eq!(
            RpcError::ConnectTimeout(Duration::from_millis(500)).to_string(),
            "rpc client: connect timeout: expect within 500ms"
        );
    }

    #[test]
    fn test_predicates() {
        assert!(RpcError::Shutdown.is_shutdown());
        assert!(RpcError::CallTimeout("Foo.Sum".to_string()).is_timeout());
        assert!(RpcError::Remote("boom".to_string()).is_remote());
        assert!(!RpcError::Remote("boom".to_string()).is_timeout());
        assert!(
            RpcError::ConnectionLost {
                reason: "eof".to_string()
            }
            .is_transport()
        );
        assert!(RpcError::from(DeserializationError::new("bad frame")).is_transport());
    }

    #[test]
    fn test_io_conversion() {
        let err: RpcError = io::Error::from(io::ErrorKind::BrokenPipe).into();
        assert!(matches!(err, RpcError::Io(_)));
    }
}

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

//! Byte-stream transports.
//!
//! Anything that is `AsyncRead + AsyncWrite` can carry a minirpc connection:
//! a TCP stream, a Unix socket, an upgraded HTTP connection, or an in-memory
//! [`tokio::io::duplex`] pipe in tests. The runtime erases the concrete type
//! behind [`BoxedTransport`].
//!
//! Remote endpoints are addressed as `protocol@addr` strings, parsed into an
//! [`Endpoint`]:
//!
//! | Protocol | Meaning                                         |
//! |----------|-------------------------------------------------|
//! | `tcp`    | Plain TCP connection                            |
//! | `http`   | TCP connection tunneled through HTTP `CONNECT`  |
//! | `unix`   | Unix domain socket (Unix platforms only)        |

use crate::RpcError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

/// A bi-directional byte stream a connection can run over.
///
/// Implemented for every type that satisfies the bounds.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// A type-erased transport.
pub type BoxedTransport = Box<dyn Transport>;

/// A parsed `protocol@addr` endpoint.
///
/// # Examples
///
/// ```rust
/// use minirpc::transport::Endpoint;
///
/// let endpoint: Endpoint = "http@127.0.0.1:9999".parse().unwrap();
/// assert_eq!(endpoint, Endpoint::Http("127.0.0.1:9999".to_string()));
/// assert_eq!(endpoint.to_string(), "http@127.0.0.1:9999");
///
/// assert!("127.0.0.1:9999".parse::<Endpoint>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Plain TCP.
    Tcp(String),
    /// TCP tunneled through HTTP `CONNECT`.
    Http(String),
    /// Unix domain socket path.
    Unix(String),
}

impl Endpoint {
    /// Returns the protocol tag.
    pub fn protocol(&self) -> &'static str {
        match self {
            Endpoint::Tcp(_) => "tcp",
            Endpoint::Http(_) => "http",
            Endpoint::Unix(_) => "unix",
        }
    }

    /// Returns the address part.
    pub fn address(&self) -> &str {
        match self {
            Endpoint::Tcp(addr) | Endpoint::Http(addr) | Endpoint::Unix(addr) => addr,
        }
    }
}

impl FromStr for Endpoint {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RpcError::InvalidAddress(s.to_string());
        let (protocol, addr) = s.split_once('@').ok_or_else(invalid)?;
        if addr.is_empty() {
            return Err(invalid());
        }
        match protocol {
            "tcp" => Ok(Endpoint::Tcp(addr.to_string())),
            "http" => Ok(Endpoint::Http(addr.to_string())),
            "unix" => Ok(Endpoint::Unix(addr.to_string())),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.protocol(), self.address())
    }
}

/// Opens a TCP connection, giving up after `timeout`.
///
/// A zero timeout waits as long as the operating system does.
///
/// # Errors
///
/// Returns [`RpcError::ConnectTimeout`] when the deadline passes and
/// [`RpcError::ConnectionFailed`] when the connection is refused.
pub async fn connect_tcp(address: &str, timeout: Duration) -> Result<TcpStream, RpcError> {
    debug!("rpc transport: connecting to tcp@{address}");
    let connect = TcpStream::connect(address);
    let result = if timeout.is_zero() {
        connect.await
    } else {
        tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| RpcError::ConnectTimeout(timeout))?
    };
    let stream = result.map_err(|source| RpcError::ConnectionFailed {
        address: address.to_string(),
        source,
    })?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Opens a Unix domain socket connection, giving up after `timeout`.
///
/// # Errors
///
/// Same as [`connect_tcp`].
#[cfg(unix)]
pub async fn connect_unix(
    path: &str,
    timeout: Duration,
) -> Result<tokio::net::UnixStream, RpcError> {
    debug!("rpc transport: connecting to unix@{path}");
    let connect = tokio::net::UnixStream::connect(path);
    let result = if timeout.is_zero() {
        connect.await
    } else {
        tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| RpcError::ConnectTimeout(timeout))?
    };
    result.map_err(|source| RpcError::ConnectionFailed {
        address: path.to_string(),
        source,
    })
}

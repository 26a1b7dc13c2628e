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

//! Establishing client connections.
//!
//! Every dial applies [`Options::connect_timeout`] to the whole setup: the
//! transport connect and the handshake together. When the deadline passes,
//! the dial fails with [`RpcError::ConnectTimeout`] and any half-built
//! client is abandoned.

use crate::RpcError;
use crate::client::Client;
use crate::handshake::Options;
use crate::server::{CONNECTED, DEFAULT_RPC_PATH};
use crate::transport::{self, Endpoint, Transport};
use std::future::Future;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

impl Client {
    /// Tunnels through an HTTP `CONNECT` on [`DEFAULT_RPC_PATH`], then
    /// performs the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::UnexpectedHttpResponse`] unless the server answers
    /// with [`CONNECTED`].
    pub async fn new_http<T: Transport>(conn: T, options: Options) -> Result<Self, RpcError> {
        let mut conn = BufReader::new(conn);
        conn.write_all(format!("CONNECT {DEFAULT_RPC_PATH} HTTP/1.0\r\n\r\n").as_bytes())
            .await?;
        conn.flush().await?;

        let mut status_line = String::new();
        conn.read_line(&mut status_line).await?;
        loop {
            let mut line = String::new();
            if conn.read_line(&mut line).await? == 0 || line.trim().is_empty() {
                break;
            }
        }

        let status = status_line
            .trim_end()
            .split_once(' ')
            .map_or("", |(_, status)| status);
        if status != CONNECTED {
            return Err(RpcError::UnexpectedHttpResponse(status_line.trim_end().to_string()));
        }
        Client::new(conn, options).await
    }
}

/// Connects to a raw server over TCP.
///
/// `None` uses [`Options::default`]. Supplied options always get the magic
/// number forced and an empty codec replaced by the default one.
pub async fn dial(address: &str, options: Option<Options>) -> Result<Client, RpcError> {
    let options = Options::resolve(options);
    let deadline = options.connect_timeout;
    let address = address.to_string();
    with_connect_timeout(deadline, async move {
        let conn = transport::connect_tcp(&address, deadline).await?;
        Client::new(conn, options).await
    })
    .await
}

/// Connects to a server's HTTP front end over TCP.
pub async fn dial_http(address: &str, options: Option<Options>) -> Result<Client, RpcError> {
    let options = Options::resolve(options);
    let deadline = options.connect_timeout;
    let address = address.to_string();
    with_connect_timeout(deadline, async move {
        let conn = transport::connect_tcp(&address, deadline).await?;
        Client::new_http(conn, options).await
    })
    .await
}

/// Connects to a raw server over a Unix domain socket.
#[cfg(unix)]
pub async fn dial_unix(path: &str, options: Option<Options>) -> Result<Client, RpcError> {
    let options = Options::resolve(options);
    let deadline = options.connect_timeout;
    let path = path.to_string();
    with_connect_timeout(deadline, async move {
        let conn = transport::connect_unix(&path, deadline).await?;
        Client::new(conn, options).await
    })
    .await
}

/// Connects to a `protocol@addr` endpoint.
///
/// # Examples
///
/// ```rust,no_run
/// use minirpc::client::xdial;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let raw = xdial("tcp@127.0.0.1:9999", None).await?;
/// let tunneled = xdial("http@127.0.0.1:9998", None).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`RpcError::InvalidAddress`] for anything not of that form.
pub async fn xdial(rpc_addr: &str, options: Option<Options>) -> Result<Client, RpcError> {
    match rpc_addr.parse::<Endpoint>()? {
        Endpoint::Tcp(address) => dial(&address, options).await,
        Endpoint::Http(address) => dial_http(&address, options).await,
        #[cfg(unix)]
        Endpoint::Unix(path) => dial_unix(&path, options).await,
        #[cfg(not(unix))]
        Endpoint::Unix(_) => Err(RpcError::InvalidAddress(rpc_addr.to_string())),
    }
}

/// Runs `connect` on its own task and waits at most `deadline` for it.
///
/// A zero deadline waits indefinitely. On timeout the task is left to finish
/// on its own and whatever it produces is dropped.
async fn with_connect_timeout<F>(
    deadline: std::time::Duration,
    connect: F,
) -> Result<Client, RpcError>
where
    F: Future<Output = Result<Client, RpcError>> + Send + 'static,
{
    if deadline.is_zero() {
        return connect.await;
    }
    match tokio::time::timeout(deadline, tokio::spawn(connect)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(RpcError::Io(std::io::Error::other(join_err))),
        Err(_) => Err(RpcError::ConnectTimeout(deadline)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_xdial_rejects_bad_format() {
        let err = xdial("127.0.0.1:9999", None).await.err().unwrap();
        assert_eq!(
            err.to_string(),
            "rpc client err: wrong format '127.0.0.1:9999', expect protocol@addr"
        );
    }

    #[tokio::test]
    async fn test_handshake_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        // Accepts but never answers the CONNECT.
        let _hold = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let _ = stream.read_to_end(&mut buf).await;
        });

        let options = Options::default().with_connect_timeout(Duration::from_millis(100));
        let err = dial_http(&addr, Some(options)).await.err().unwrap();
        assert!(matches!(err, RpcError::ConnectTimeout(d) if d == Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_unexpected_http_response() {
        let (client_side, mut server_side) = tokio::io::duplex(1024);
        let responder = tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let _ = server_side.read(&mut buf).await.unwrap();
            server_side
                .write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n")
                .await
                .unwrap();
            server_side
        });

        let err = Client::new_http(client_side, Options::default()).await.err().unwrap();
        assert!(matches!(err, RpcError::UnexpectedHttpResponse(ref s) if s.contains("405")));
        drop(responder.await.unwrap());
    }
}

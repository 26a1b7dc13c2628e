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

//! A heartbeat-driven directory of live servers.
//!
//! Servers announce themselves with [`heartbeat`], which `POST`s their
//! address in [`SERVER_HEADER`] on a fixed interval. Clients `GET` the same
//! path and receive every live address, comma separated, in
//! [`SERVERS_HEADER`].
//!
//! Entries are never swept in the background. Each listing drops the entries
//! whose last heartbeat is older than the registry timeout.
//!
//! # Examples
//!
//! ```rust,no_run
//! use minirpc::registry::{self, Registry};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::net::TcpListener;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(Registry::default());
//! let listener = TcpListener::bind("127.0.0.1:9999").await?;
//! tokio::spawn(registry.serve(listener));
//!
//! let url = "http://127.0.0.1:9999/_minirpc_/registry";
//! registry::heartbeat(url, "tcp@127.0.0.1:8001", Duration::ZERO);
//! # Ok(())
//! # }
//! ```

mod heartbeat;

pub use heartbeat::{DEFAULT_HEARTBEAT_INTERVAL, heartbeat, send_heartbeat};

use crate::RpcError;
use crate::http::{self, HttpResponse, text_response};
use hyper::header::{HeaderMap, HeaderValue};
use hyper::{Method, StatusCode};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;
use tracing::{debug, info};

/// Path the registry answers on unless configured otherwise.
pub const DEFAULT_REGISTRY_PATH: &str = "/_minirpc_/registry";

/// How long a server stays listed after its last heartbeat.
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Response header carrying the comma separated list of live servers.
pub const SERVERS_HEADER: &str = "X-Minirpc-Servers";

/// Request header carrying the address a heartbeat refreshes.
pub const SERVER_HEADER: &str = "X-Minirpc-Server";

#[derive(Debug, Clone)]
struct ServerItem {
    addr: String,
    last_heartbeat: Instant,
}

/// The server directory.
#[derive(Debug)]
pub struct Registry {
    timeout: Duration,
    path: String,
    servers: Mutex<HashMap<String, ServerItem>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_TIMEOUT)
    }
}

impl Registry {
    /// Creates an empty registry. A zero `timeout` keeps entries forever.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            path: DEFAULT_REGISTRY_PATH.to_string(),
            servers: Mutex::new(HashMap::new()),
        }
    }

    /// Answers on `path` instead of [`DEFAULT_REGISTRY_PATH`].
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Returns the expiry timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the path the registry answers on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Inserts `addr` or refreshes its heartbeat time.
    pub fn register_server(&self, addr: &str) {
        let mut servers = self.servers.lock();
        let now = Instant::now();
        servers
            .entry(addr.to_string())
            .and_modify(|item| item.last_heartbeat = now)
            .or_insert_with(|| ServerItem {
                addr: addr.to_string(),
                last_heartbeat: now,
            });
    }

    /// Returns the live servers, sorted, evicting expired entries.
    pub fn alive_servers(&self) -> Vec<String> {
        let mut servers = self.servers.lock();
        let timeout = self.timeout;
        servers.retain(|addr, item| {
            let alive = timeout.is_zero() || item.last_heartbeat.elapsed() < timeout;
            if !alive {
                debug!("rpc registry: expired {addr}");
            }
            alive
        });
        let mut alive: Vec<String> = servers.values().map(|item| item.addr.clone()).collect();
        alive.sort();
        alive
    }

    /// Returns the number of tracked entries, expired ones included.
    pub fn len(&self) -> usize {
        self.servers.lock().len()
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.servers.lock().is_empty()
    }

    /// Answers one registry request.
    ///
    /// - `GET` lists the live servers in [`SERVERS_HEADER`].
    /// - `POST` refreshes the server named in [`SERVER_HEADER`], or answers
    ///   `400` if the header is missing.
    /// - Other methods get `405`; other paths get `404`.
    pub fn handle(&self, method: &Method, path: &str, headers: &HeaderMap) -> HttpResponse {
        if path != self.path {
            return text_response(StatusCode::NOT_FOUND, "404 page not found\n");
        }
        match *method {
            Method::GET => {
                let alive = self.alive_servers().join(",");
                match HeaderValue::from_str(&alive) {
                    Ok(value) => {
                        let mut response = text_response(StatusCode::OK, "");
                        response.headers_mut().insert(SERVERS_HEADER, value);
                        response
                    }
                    Err(err) => text_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("rpc registry: invalid server list: {err}\n"),
                    ),
                }
            }
            Method::POST => {
                let addr = headers
                    .get(SERVER_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .map(str::trim)
                    .unwrap_or_default();
                if addr.is_empty() {
                    return text_response(
                        StatusCode::BAD_REQUEST,
                        format!("400 missing {SERVER_HEADER}\n"),
                    );
                }
                self.register_server(addr);
                text_response(StatusCode::OK, "")
            }
            _ => text_response(StatusCode::METHOD_NOT_ALLOWED, "405 method not allowed\n"),
        }
    }

    /// Serves the registry over HTTP on `listener`.
    ///
    /// # Errors
    ///
    /// Returns an error when accepting fails.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<(), RpcError> {
        info!("rpc registry path: {}", self.path);
        http::serve(listener, move |req| {
            let registry = Arc::clone(&self);
            async move { registry.handle(req.method(), req.uri().path(), req.headers()) }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(registry: &Registry, addr: &str) -> StatusCode {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER_HEADER, HeaderValue::from_str(addr).unwrap());
        registry
            .handle(&Method::POST, DEFAULT_REGISTRY_PATH, &headers)
            .status()
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_expiry() {
        let registry = Registry::new(Duration::from_secs(10));
        registry.register_server("tcp@127.0.0.1:1");
        registry.register_server("tcp@127.0.0.1:2");
        assert_eq!(registry.alive_servers().len(), 2);

        tokio::time::advance(Duration::from_secs(6)).await;
        registry.register_server("tcp@127.0.0.1:2");
        tokio::time::advance(Duration::from_secs(6)).await;

        // Still tracked until the next listing.
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.alive_servers(), vec!["tcp@127.0.0.1:2".to_string()]);
        assert_eq!(registry.len(), 1);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(registry.alive_servers().is_empty());
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_never_expires() {
        let registry = Registry::new(Duration::ZERO);
        registry.register_server("tcp@127.0.0.1:1");
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(registry.alive_servers().len(), 1);
    }

    #[tokio::test]
    async fn test_get_lists_servers_sorted() {
        let registry = Registry::default();
        assert_eq!(post(&registry, "tcp@127.0.0.1:2"), StatusCode::OK);
        assert_eq!(post(&registry, "tcp@127.0.0.1:1"), StatusCode::OK);

        let response = registry.handle(&Method::GET, DEFAULT_REGISTRY_PATH, &HeaderMap::new());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[SERVERS_HEADER],
            "tcp@127.0.0.1:1,tcp@127.0.0.1:2"
        );
    }

    #[tokio::test]
    async fn test_post_without_server_header() {
        let registry = Registry::default();
        let response = registry.handle(&Method::POST, DEFAULT_REGISTRY_PATH, &HeaderMap::new());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_routing() {
        let registry = Registry::default().with_path("/registry");
        let headers = HeaderMap::new();
        assert_eq!(
            registry.handle(&Method::GET, DEFAULT_REGISTRY_PATH, &headers).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            registry.handle(&Method::DELETE, "/registry", &headers).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            registry.handle(&Method::GET, "/registry", &headers).status(),
            StatusCode::OK
        );
    }
}

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

use crate::RpcError;
use crate::client::{Client, xdial};
use crate::handshake::Options;
use crate::xclient::discovery::{Discovery, SelectMode};
use futures_util::future::join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A client over a set of servers supplied by a [`Discovery`].
///
/// Connections are dialed lazily, one per address, and cached. A cached
/// client that has become unavailable is closed and redialed on next use.
///
/// # Examples
///
/// ```rust,no_run
/// use minirpc::xclient::{MultiServerDiscovery, SelectMode, XClient};
///
/// # async fn example() -> Result<(), minirpc::RpcError> {
/// let discovery = MultiServerDiscovery::new(vec![
///     "tcp@127.0.0.1:9001".to_string(),
///     "http@127.0.0.1:9002".to_string(),
/// ]);
/// let xc = XClient::new(discovery, SelectMode::RoundRobin, None);
/// let sum: i64 = xc.call("Num.Add", &(3i64, 4i64)).await?;
///
/// let mut any = 0i64;
/// xc.broadcast("Num.Add", &(1i64, 1i64), Some(&mut any)).await?;
/// xc.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct XClient<D> {
    discovery: D,
    mode: SelectMode,
    options: Option<Options>,
    clients: Mutex<HashMap<String, Arc<Client>>>,
}

impl<D: Discovery> XClient<D> {
    /// Creates an XClient selecting servers from `discovery` with `mode`.
    ///
    /// `options` is passed to every dial.
    pub fn new(discovery: D, mode: SelectMode, options: Option<Options>) -> Self {
        Self {
            discovery,
            mode,
            options,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the discovery.
    pub fn discovery(&self) -> &D {
        &self.discovery
    }

    /// Returns the selection mode.
    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    /// Returns the cached client for `rpc_addr`, dialing a new one if there
    /// is none or the cached one is no longer available.
    async fn dial(&self, rpc_addr: &str) -> Result<Arc<Client>, RpcError> {
        let mut clients = self.clients.lock().await;
        match clients.get(rpc_addr) {
            Some(client) if client.is_available() => return Ok(Arc::clone(client)),
            Some(_) => {
                if let Some(stale) = clients.remove(rpc_addr) {
                    debug!("rpc xclient: dropping unavailable client for {rpc_addr}");
                    let _ = stale.close().await;
                }
            }
            None => {}
        }

        let client = Arc::new(xdial(rpc_addr, self.options.clone()).await?);
        clients.insert(rpc_addr.to_string(), Arc::clone(&client));
        Ok(client)
    }

    async fn call_on<A, R>(&self, rpc_addr: &str, service_method: &str, args: &A) -> Result<R, RpcError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let client = self.dial(rpc_addr).await?;
        client.call(service_method, args).await
    }

    /// Calls `service_method` on one server chosen by the selection mode.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::NoAvailableServer`] if discovery knows no server,
    /// or the error of the dial or the call.
    pub async fn call<A, R>(&self, service_method: &str, args: &A) -> Result<R, RpcError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let rpc_addr = self.discovery.get(self.mode).await?;
        self.call_on(&rpc_addr, service_method, args).await
    }

    /// Like [`call`](Self::call), giving up after `timeout`.
    pub async fn call_timeout<A, R>(
        &self,
        service_method: &str,
        args: &A,
        timeout: Duration,
    ) -> Result<R, RpcError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        tokio::time::timeout(timeout, self.call(service_method, args))
            .await
            .unwrap_or_else(|_| Err(RpcError::CallTimeout(service_method.to_string())))
    }

    /// Calls `service_method` on every known server concurrently.
    ///
    /// The first failure cancels the calls still waiting and is returned.
    /// If `reply` is given, it receives the first successful reply, even
    /// when another server failed.
    ///
    /// # Errors
    ///
    /// Returns the first error observed, or the discovery error.
    pub async fn broadcast<A, R>(
        &self,
        service_method: &str,
        args: &A,
        reply: Option<&mut R>,
    ) -> Result<(), RpcError>
    where
        A: Serialize + Sync + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let servers = self.discovery.get_all().await?;
        let token = CancellationToken::new();
        let first_err = parking_lot::Mutex::new(None::<RpcError>);
        let first_reply = parking_lot::Mutex::new(None::<R>);

        let calls = servers.iter().map(|rpc_addr| {
            let token = &token;
            let first_err = &first_err;
            let first_reply = &first_reply;
            async move {
                let result = match self.dial(rpc_addr).await {
                    Ok(client) => client.call_with_cancel::<A, R>(token, service_method, args).await,
                    Err(err) => Err(err),
                };
                match result {
                    Ok(value) => {
                        let mut slot = first_reply.lock();
                        if slot.is_none() {
                            *slot = Some(value);
                        }
                    }
                    Err(err) => {
                        let mut slot = first_err.lock();
                        if slot.is_none() {
                            debug!("rpc xclient: broadcast to {rpc_addr} failed: {err}");
                            *slot = Some(err);
                            token.cancel();
                        }
                    }
                }
            }
        });
        join_all(calls).await;

        if let (Some(reply), Some(value)) = (reply, first_reply.into_inner()) {
            *reply = value;
        }
        match first_err.into_inner() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Closes and forgets every cached client.
    pub async fn close(&self) -> Result<(), RpcError> {
        let mut clients = self.clients.lock().await;
        for (rpc_addr, client) in clients.drain() {
            if let Err(err) = client.close().await {
                debug!("rpc xclient: closing {rpc_addr}: {err}");
            }
        }
        Ok(())
    }

    /// Returns the number of cached clients.
    pub async fn cached_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}

impl<D: std::fmt::Debug> std::fmt::Debug for XClient<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XClient")
            .field("discovery", &self.discovery)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Server;
    use crate::service::ServiceBuilder;
    use crate::xclient::MultiServerDiscovery;
    use tokio::net::TcpListener;

    struct Num;

    async fn start_server() -> String {
        let server = Arc::new(Server::new());
        server
            .register_service(
                ServiceBuilder::new("Num", Num)
                    .method("Add", |_: Arc<Num>, (a, b): (i64, i64)| async move {
                        Ok::<_, String>(a + b)
                    })
                    .build(),
            )
            .unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("tcp@{}", listener.local_addr().unwrap());
        tokio::spawn(server.accept(listener));
        addr
    }

    #[tokio::test]
    async fn test_call_without_servers() {
        let xc = XClient::new(MultiServerDiscovery::new(Vec::new()), SelectMode::Random, None);
        let err = xc.call::<_, i64>("Num.Add", &(1i64, 2i64)).await.unwrap_err();
        assert!(matches!(err, RpcError::NoAvailableServer));
    }

    #[tokio::test]
    async fn test_dial_reuses_cached_client() {
        let addr = start_server().await;
        let xc = XClient::new(MultiServerDiscovery::new(vec![addr.clone()]), SelectMode::Random, None);

        let first = xc.dial(&addr).await.unwrap();
        let second = xc.dial(&addr).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(xc.cached_clients().await, 1);
    }

    #[tokio::test]
    async fn test_dial_replaces_unavailable_client() {
        let addr = start_server().await;
        let xc = XClient::new(MultiServerDiscovery::new(vec![addr.clone()]), SelectMode::Random, None);

        let first = xc.dial(&addr).await.unwrap();
        first.close().await.unwrap();
        let second = xc.dial(&addr).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.is_available());

        let sum: i64 = xc.call("Num.Add", &(3i64, 4i64)).await.unwrap();
        assert_eq!(sum, 7);
    }

    #[tokio::test]
    async fn test_close_evicts_all() {
        let addr = start_server().await;
        let xc = XClient::new(MultiServerDiscovery::new(vec![addr]), SelectMode::RoundRobin, None);
        let _: i64 = xc.call("Num.Add", &(1i64, 1i64)).await.unwrap();
        assert_eq!(xc.cached_clients().await, 1);

        xc.close().await.unwrap();
        assert_eq!(xc.cached_clients().await, 0);
    }
}

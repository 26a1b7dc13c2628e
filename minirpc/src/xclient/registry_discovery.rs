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
use crate::http::{HttpClient, http_client};
use crate::registry::SERVERS_HEADER;
use crate::xclient::discovery::{Discovery, MultiServerDiscovery, SelectMode};
use async_trait::async_trait;
use http_body_util::Empty;
use hyper::Request;
use hyper::body::Bytes;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{error, info};

/// How long a pulled server list is trusted before the next pull.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(10);

/// A discovery that pulls its server list from a [`Registry`](crate::Registry).
///
/// Every [`get`](Discovery::get) and [`get_all`](Discovery::get_all) first
/// refreshes the list if it is older than the update interval, so a stale
/// list heals itself on the next access.
pub struct RegistryDiscovery {
    servers: MultiServerDiscovery,
    registry_url: String,
    interval: Duration,
    /// `None` until the first pull.
    last_update: Mutex<Option<Instant>>,
    client: HttpClient,
}

impl RegistryDiscovery {
    /// Creates a discovery pulling from `registry_url` at most once per
    /// `interval`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidConfiguration`] for a zero interval.
    pub fn new(registry_url: impl Into<String>, interval: Duration) -> Result<Self, RpcError> {
        if interval.is_zero() {
            return Err(RpcError::InvalidConfiguration(
                "registry discovery update interval must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            servers: MultiServerDiscovery::new(Vec::new()),
            registry_url: registry_url.into(),
            interval,
            last_update: Mutex::new(None),
            client: http_client(),
        })
    }

    /// Returns the registry URL.
    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    async fn fetch(&self) -> Result<Vec<String>, RpcError> {
        let request = Request::get(self.registry_url.as_str())
            .body(Empty::<Bytes>::new())
            .map_err(|e| RpcError::Registry(e.to_string()))?;
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| RpcError::Registry(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RpcError::Registry(format!(
                "registry answered with status {}",
                response.status()
            )));
        }

        let listed = response
            .headers()
            .get(SERVERS_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        Ok(parse_servers(listed))
    }
}

fn parse_servers(listed: &str) -> Vec<String> {
    listed
        .split(',')
        .map(str::trim)
        .filter(|server| !server.is_empty())
        .map(str::to_string)
        .collect()
}

impl std::fmt::Debug for RegistryDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryDiscovery")
            .field("registry_url", &self.registry_url)
            .field("interval", &self.interval)
            .field("servers", &self.servers)
            .finish()
    }
}

#[async_trait]
impl Discovery for RegistryDiscovery {
    async fn refresh(&self) -> Result<(), RpcError> {
        let mut last_update = self.last_update.lock().await;
        if let Some(at) = *last_update {
            if at.elapsed() < self.interval {
                return Ok(());
            }
        }

        info!("rpc registry: refresh servers from registry {}", self.registry_url);
        let servers = self.fetch().await.inspect_err(|err| {
            error!("rpc registry refresh err: {err}");
        })?;
        self.servers.set_servers(servers);
        *last_update = Some(Instant::now());
        Ok(())
    }

    async fn update(&self, servers: Vec<String>) -> Result<(), RpcError> {
        self.servers.set_servers(servers);
        *self.last_update.lock().await = Some(Instant::now());
        Ok(())
    }

    async fn get(&self, mode: SelectMode) -> Result<String, RpcError> {
        self.refresh().await?;
        self.servers.select(mode)
    }

    async fn get_all(&self) -> Result<Vec<String>, RpcError> {
        self.refresh().await?;
        Ok(self.servers.servers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DEFAULT_REGISTRY_PATH, Registry};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    async fn start_registry() -> (Arc<Registry>, String) {
        let registry = Arc::new(Registry::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}{DEFAULT_REGISTRY_PATH}", listener.local_addr().unwrap());
        tokio::spawn(Arc::clone(&registry).serve(listener));
        (registry, url)
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = RegistryDiscovery::new("http://127.0.0.1:1/registry", Duration::ZERO).unwrap_err();
        assert!(matches!(err, RpcError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_parse_servers() {
        assert_eq!(
            parse_servers(" tcp@a:1, ,http@b:2,"),
            vec!["tcp@a:1".to_string(), "http@b:2".to_string()]
        );
        assert!(parse_servers("").is_empty());
    }

    #[tokio::test]
    async fn test_pulls_from_registry() {
        let (registry, url) = start_registry().await;
        registry.register_server("tcp@127.0.0.1:8001");
        registry.register_server("tcp@127.0.0.1:8002");

        let discovery = RegistryDiscovery::new(url, DEFAULT_UPDATE_INTERVAL).unwrap();
        assert_eq!(
            discovery.get_all().await.unwrap(),
            vec!["tcp@127.0.0.1:8001".to_string(), "tcp@127.0.0.1:8002".to_string()]
        );
    }

    #[tokio::test]
    async fn test_refresh_respects_interval() {
        let (registry, url) = start_registry().await;
        registry.register_server("tcp@127.0.0.1:8001");

        let discovery = RegistryDiscovery::new(url, Duration::from_secs(60)).unwrap();
        assert_eq!(discovery.get_all().await.unwrap().len(), 1);

        // Within the interval the cached list is served.
        registry.register_server("tcp@127.0.0.1:8002");
        assert_eq!(discovery.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_registry() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}{DEFAULT_REGISTRY_PATH}", listener.local_addr().unwrap());
        drop(listener);

        let discovery = RegistryDiscovery::new(url, DEFAULT_UPDATE_INTERVAL).unwrap();
        let err = discovery.get(SelectMode::Random).await.unwrap_err();
        assert!(matches!(err, RpcError::Registry(_)));
    }
}

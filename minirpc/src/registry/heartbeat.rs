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
use crate::registry::{DEFAULT_REGISTRY_TIMEOUT, SERVER_HEADER};
use http_body_util::Empty;
use hyper::Request;
use hyper::body::Bytes;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Interval used when [`heartbeat`] is given zero: one minute short of
/// [`DEFAULT_REGISTRY_TIMEOUT`], so an entry on a default registry is
/// refreshed before it expires.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration =
    Duration::from_secs(DEFAULT_REGISTRY_TIMEOUT.as_secs() - 60);

/// Announces `server_addr` to the registry at `registry_url` until a send
/// fails.
///
/// The first heartbeat goes out immediately, the rest every `interval`. A
/// zero `interval` uses [`DEFAULT_HEARTBEAT_INTERVAL`]. The loop
/// stops for good on the first failure; abort the returned handle to stop it
/// earlier.
pub fn heartbeat(registry_url: &str, server_addr: &str, interval: Duration) -> JoinHandle<()> {
    let interval = heartbeat_interval(interval);
    let registry_url = registry_url.to_string();
    let server_addr = server_addr.to_string();

    tokio::spawn(async move {
        info!("rpc server: heartbeat to {registry_url} every {interval:?}");
        let client = http_client();
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = post(&client, &registry_url, &server_addr).await {
                error!("rpc server: heart beat err: {err}");
                break;
            }
        }
    })
}

fn heartbeat_interval(interval: Duration) -> Duration {
    if interval.is_zero() {
        DEFAULT_HEARTBEAT_INTERVAL
    } else {
        interval
    }
}

/// Sends a single heartbeat for `server_addr`.
///
/// # Errors
///
/// Returns [`RpcError::Registry`] if the request cannot be built or sent, or
/// the registry answers with a non-success status.
pub async fn send_heartbeat(registry_url: &str, server_addr: &str) -> Result<(), RpcError> {
    post(&http_client(), registry_url, server_addr).await
}

async fn post(client: &HttpClient, registry_url: &str, server_addr: &str) -> Result<(), RpcError> {
    debug!("{server_addr} send heart beat to registry {registry_url}");
    let request = Request::post(registry_url)
        .header(SERVER_HEADER, server_addr)
        .body(Empty::<Bytes>::new())
        .map_err(|e| RpcError::Registry(e.to_string()))?;

    let response = client
        .request(request)
        .await
        .map_err(|e| RpcError::Registry(e.to_string()))?;
    if !response.status().is_success() {
        return Err(RpcError::Registry(format!(
            "heartbeat rejected with status {}",
            response.status()
        )));
    }
    Ok(())
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
    fn test_zero_interval_uses_default() {
        assert_eq!(heartbeat_interval(Duration::ZERO), Duration::from_secs(240));
        assert!(DEFAULT_HEARTBEAT_INTERVAL < DEFAULT_REGISTRY_TIMEOUT);
        assert_eq!(heartbeat_interval(Duration::from_secs(3)), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_send_heartbeat_registers() {
        let (registry, url) = start_registry().await;
        send_heartbeat(&url, "tcp@127.0.0.1:7001").await.unwrap();
        assert_eq!(registry.alive_servers(), vec!["tcp@127.0.0.1:7001".to_string()]);
    }

    #[tokio::test]
    async fn test_send_heartbeat_rejected_on_wrong_path() {
        let (_registry, url) = start_registry().await;
        let err = send_heartbeat(&format!("{url}/nope"), "tcp@127.0.0.1:7001")
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Registry(_)));
    }

    #[tokio::test]
    async fn test_heartbeat_sends_immediately() {
        let (registry, url) = start_registry().await;
        let handle = heartbeat(&url, "tcp@127.0.0.1:7002", Duration::from_secs(60));
        for _ in 0..100 {
            if !registry.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(registry.alive_servers(), vec!["tcp@127.0.0.1:7002".to_string()]);
        handle.abort();
    }

    #[tokio::test]
    async fn test_heartbeat_stops_on_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}{DEFAULT_REGISTRY_PATH}", listener.local_addr().unwrap());
        drop(listener);

        let handle = heartbeat(&url, "tcp@127.0.0.1:7003", Duration::from_millis(10));
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("heartbeat loop should end")
            .unwrap();
    }
}

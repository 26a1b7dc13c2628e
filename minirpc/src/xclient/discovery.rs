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

//! Server discovery and selection.

use crate::RpcError;
use async_trait::async_trait;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;

/// How [`Discovery::get`] picks a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectMode {
    /// Uniformly at random.
    #[default]
    Random,
    /// In turn, wrapping around.
    RoundRobin,
}

impl TryFrom<i32> for SelectMode {
    type Error = RpcError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SelectMode::Random),
            1 => Ok(SelectMode::RoundRobin),
            _ => Err(RpcError::InvalidSelectMode),
        }
    }
}

impl FromStr for SelectMode {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(SelectMode::Random),
            "round_robin" | "round-robin" => Ok(SelectMode::RoundRobin),
            _ => Err(RpcError::InvalidSelectMode),
        }
    }
}

impl fmt::Display for SelectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectMode::Random => f.write_str("random"),
            SelectMode::RoundRobin => f.write_str("round_robin"),
        }
    }
}

/// A source of server addresses in `protocol@addr` form.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Reloads the server list from its source, if it has one.
    async fn refresh(&self) -> Result<(), RpcError>;

    /// Replaces the server list.
    async fn update(&self, servers: Vec<String>) -> Result<(), RpcError>;

    /// Picks one server.
    async fn get(&self, mode: SelectMode) -> Result<String, RpcError>;

    /// Returns every known server.
    async fn get_all(&self) -> Result<Vec<String>, RpcError>;
}

struct ServerList {
    servers: Vec<String>,
    /// Next round-robin position.
    index: usize,
    rng: StdRng,
}

/// A discovery over a fixed, user supplied server list.
///
/// The round-robin position starts at a random server so that many clients
/// created at once do not all hit the first one.
///
/// # Examples
///
/// ```rust
/// use minirpc::xclient::{Discovery, MultiServerDiscovery, SelectMode};
///
/// # async fn example() -> Result<(), minirpc::RpcError> {
/// let discovery = MultiServerDiscovery::new(vec![
///     "tcp@127.0.0.1:9001".to_string(),
///     "tcp@127.0.0.1:9002".to_string(),
/// ]);
/// let first = discovery.get(SelectMode::RoundRobin).await?;
/// let second = discovery.get(SelectMode::RoundRobin).await?;
/// assert_ne!(first, second);
/// # Ok(())
/// # }
/// ```
pub struct MultiServerDiscovery {
    list: RwLock<ServerList>,
}

impl MultiServerDiscovery {
    /// Creates a discovery over `servers`.
    pub fn new(servers: Vec<String>) -> Self {
        let mut rng = StdRng::from_entropy();
        let index = if servers.is_empty() {
            0
        } else {
            rng.gen_range(0..servers.len())
        };
        Self {
            list: RwLock::new(ServerList {
                servers,
                index,
                rng,
            }),
        }
    }

    /// Replaces the server list, keeping the round-robin position in range.
    pub fn set_servers(&self, servers: Vec<String>) {
        let mut list = self.list.write();
        list.index = if servers.is_empty() {
            0
        } else {
            list.index % servers.len()
        };
        list.servers = servers;
    }

    /// Picks one server.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::NoAvailableServer`] if the list is empty.
    pub fn select(&self, mode: SelectMode) -> Result<String, RpcError> {
        let mut list = self.list.write();
        let n = list.servers.len();
        if n == 0 {
            return Err(RpcError::NoAvailableServer);
        }
        match mode {
            SelectMode::Random => {
                let i = list.rng.gen_range(0..n);
                Ok(list.servers[i].clone())
            }
            SelectMode::RoundRobin => {
                let i = list.index % n;
                list.index = (i + 1) % n;
                Ok(list.servers[i].clone())
            }
        }
    }

    /// Returns a copy of the server list.
    pub fn servers(&self) -> Vec<String> {
        self.list.read().servers.clone()
    }
}

impl fmt::Debug for MultiServerDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = self.list.read();
        f.debug_struct("MultiServerDiscovery")
            .field("servers", &list.servers)
            .field("index", &list.index)
            .finish()
    }
}

#[async_trait]
impl Discovery for MultiServerDiscovery {
    async fn refresh(&self) -> Result<(), RpcError> {
        Ok(())
    }

    async fn update(&self, servers: Vec<String>) -> Result<(), RpcError> {
        self.set_servers(servers);
        Ok(())
    }

    async fn get(&self, mode: SelectMode) -> Result<String, RpcError> {
        self.select(mode)
    }

    async fn get_all(&self) -> Result<Vec<String>, RpcError> {
        Ok(self.servers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn servers() -> Vec<String> {
        vec![
            "tcp@[::]:46061".to_string(),
            "tcp@[::]:46062".to_string(),
            "tcp@[::]:46063".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_update() {
        let discovery = MultiServerDiscovery::new(vec![
            "tcp@[::]:46059".to_string(),
            "tcp@[::]:46060".to_string(),
        ]);
        discovery.update(servers()).await.unwrap();
        assert_eq!(discovery.get_all().await.unwrap(), servers());
    }

    #[tokio::test]
    async fn test_random_get() {
        let discovery = MultiServerDiscovery::new(servers());
        for _ in 0..10 {
            let server = discovery.get(SelectMode::Random).await.unwrap();
            assert!(servers().contains(&server));
        }
    }

    #[tokio::test]
    async fn test_round_robin_from_zero() {
        let discovery = MultiServerDiscovery::new(servers());
        discovery.list.write().index = 0;

        let expected = servers();
        for i in 0..4 {
            let server = discovery.get(SelectMode::RoundRobin).await.unwrap();
            assert_eq!(server, expected[i % 3]);
        }
    }

    #[tokio::test]
    async fn test_round_robin_visits_all() {
        let discovery = MultiServerDiscovery::new(servers());
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(discovery.get(SelectMode::RoundRobin).await.unwrap());
        }
        seen.sort();
        assert_eq!(seen, servers());
    }

    #[tokio::test]
    async fn test_empty_list() {
        let discovery = MultiServerDiscovery::new(Vec::new());
        let err = discovery.get(SelectMode::Random).await.unwrap_err();
        assert!(matches!(err, RpcError::NoAvailableServer));
        assert!(discovery.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_clamps_index() {
        let discovery = MultiServerDiscovery::new(servers());
        discovery.list.write().index = 2;

        discovery.update(servers()[..2].to_vec()).await.unwrap();
        assert_eq!(discovery.list.read().index, 0);

        discovery.update(Vec::new()).await.unwrap();
        assert_eq!(discovery.list.read().index, 0);
    }

    #[test]
    fn test_select_mode_parsing() {
        assert_eq!(SelectMode::try_from(1).unwrap(), SelectMode::RoundRobin);
        assert!(matches!(SelectMode::try_from(7), Err(RpcError::InvalidSelectMode)));
        assert_eq!("random".parse::<SelectMode>().unwrap(), SelectMode::Random);
        assert!("fastest".parse::<SelectMode>().is_err());
    }
}

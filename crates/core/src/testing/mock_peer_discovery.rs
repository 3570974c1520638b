//! Mock peer discovery for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::dht::{DhtError, PeerDiscovery};

/// Mock implementation of the PeerDiscovery trait.
///
/// Unknown hashes report zero peers. Hashes marked with `fail_for` fail
/// until `recover` is called.
pub struct MockPeerDiscovery {
    peers: Arc<RwLock<HashMap<String, usize>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    lookups: Arc<RwLock<HashMap<String, usize>>>,
}

impl std::fmt::Debug for MockPeerDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPeerDiscovery").finish_non_exhaustive()
    }
}

impl Default for MockPeerDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPeerDiscovery {
    pub fn new() -> Self {
        Self {
            peers: Arc::new(RwLock::new(HashMap::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            lookups: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Set the peer count reported for a hash.
    pub async fn set_peers(&self, info_hash: &str, peers: usize) {
        self.peers.write().await.insert(info_hash.to_string(), peers);
    }

    /// Make lookups for a hash fail.
    pub async fn fail_for(&self, info_hash: &str) {
        self.failing.write().await.insert(info_hash.to_string());
    }

    /// Let lookups for a hash succeed again.
    pub async fn recover(&self, info_hash: &str) {
        self.failing.write().await.remove(info_hash);
    }

    /// Lookups made for a hash.
    pub async fn lookups(&self, info_hash: &str) -> usize {
        self.lookups
            .read()
            .await
            .get(info_hash)
            .copied()
            .unwrap_or(0)
    }

    /// Lookups made for all hashes.
    pub async fn total_lookups(&self) -> usize {
        self.lookups.read().await.values().sum()
    }
}

#[async_trait]
impl PeerDiscovery for MockPeerDiscovery {
    fn name(&self) -> &str {
        "mock"
    }

    async fn lookup(&self, info_hash: &str) -> Result<usize, DhtError> {
        *self
            .lookups
            .write()
            .await
            .entry(info_hash.to_string())
            .or_default() += 1;

        if self.failing.read().await.contains(info_hash) {
            return Err(DhtError::Lookup(format!("simulated failure for {}", info_hash)));
        }
        Ok(self.peers.read().await.get(info_hash).copied().unwrap_or(0))
    }
}

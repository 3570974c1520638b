//! Types for DHT peer discovery.

use std::collections::HashSet;
use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during a DHT lookup.
#[derive(Debug, Error)]
pub enum DhtError {
    #[error("DHT bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("Invalid info hash: {0}")]
    InvalidInfoHash(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),
}

/// One lookup pass against the DHT.
#[async_trait]
pub trait PeerDiscovery: Send + Sync {
    /// Implementation name (for logging).
    fn name(&self) -> &str;

    /// Number of distinct peers observed for `info_hash` before the pass
    /// completes.
    async fn lookup(&self, info_hash: &str) -> Result<usize, DhtError>;
}

/// Distinct peers seen during a lookup.
///
/// Peers are identified by the md5 of their address and port, so the same
/// peer reported by several DHT nodes is counted once.
#[derive(Debug, Default, Clone)]
pub struct PeerSet {
    seen: HashSet<String>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the peer had not been seen before.
    pub fn insert(&mut self, addr: SocketAddr) -> bool {
        self.seen.insert(peer_identity(&addr))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

fn peer_identity(addr: &SocketAddr) -> String {
    format!("{:x}", md5::compute(format!("{}{}", addr.ip(), addr.port())))
}

//! librqbit DHT peer discovery implementation.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use librqbit_dht::{Dht, DhtBuilder};
use tracing::{debug, info};

use super::{DhtError, PeerDiscovery, PeerSet};
use crate::record::parse_info_hash;

/// DHT node backed by librqbit's Kademlia implementation.
///
/// A `get_peers` stream never ends on its own for popular swarms, so a
/// lookup pass is complete when the stream closes or the lookup window
/// elapses, whichever comes first.
pub struct LibrqbitDht {
    dht: Dht,
    lookup_window: Duration,
}

impl LibrqbitDht {
    /// Bootstrap a DHT node.
    pub async fn new(lookup_window: Duration) -> Result<Self, DhtError> {
        let dht = DhtBuilder::new()
            .await
            .map_err(|e| DhtError::Bootstrap(e.to_string()))?;

        info!(
            lookup_window_secs = lookup_window.as_secs(),
            "DHT node started"
        );

        Ok(Self { dht, lookup_window })
    }
}

#[async_trait]
impl PeerDiscovery for LibrqbitDht {
    fn name(&self) -> &str {
        "librqbit-dht"
    }

    async fn lookup(&self, info_hash: &str) -> Result<usize, DhtError> {
        let id = parse_info_hash(info_hash).map_err(|e| DhtError::InvalidInfoHash(e.to_string()))?;

        debug!(info_hash = info_hash, "Scraping DHT peers");

        let stream = self.dht.get_peers(id, None);
        tokio::pin!(stream);

        let deadline = tokio::time::sleep(self.lookup_window);
        tokio::pin!(deadline);

        let mut peers = PeerSet::new();
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                next = stream.next() => match next {
                    Some(addr) => {
                        peers.insert(addr);
                    }
                    None => break,
                },
            }
        }

        debug!(info_hash = info_hash, peers = peers.len(), "DHT scrape complete");
        Ok(peers.len())
    }
}

//! Per-endpoint connection cache.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::debug;

/// One reusable HTTP client per remote endpoint.
///
/// A client is built lazily on first use and replaced after the endpoint
/// reports a dropped connection, an error, or a timeout.
#[derive(Debug)]
pub struct ConnectionCache {
    timeout: Duration,
    clients: RwLock<HashMap<String, Client>>,
}

impl ConnectionCache {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Get the cached client for `endpoint`, connecting if needed.
    pub async fn get(&self, endpoint: &str) -> Result<Client, reqwest::Error> {
        if let Some(client) = self.clients.read().await.get(endpoint) {
            return Ok(client.clone());
        }

        let mut clients = self.clients.write().await;
        // Another caller may have connected while we waited for the lock.
        if let Some(client) = clients.get(endpoint) {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(1)
            .build()?;
        debug!(endpoint = endpoint, "Opened connection");
        clients.insert(endpoint.to_string(), client.clone());
        Ok(client)
    }

    /// Drop the cached client so the next request reconnects.
    pub async fn invalidate(&self, endpoint: &str, reason: &str) {
        if self.clients.write().await.remove(endpoint).is_some() {
            debug!(endpoint = endpoint, reason = reason, "Connection dropped");
        }
    }

    pub async fn is_cached(&self, endpoint: &str) -> bool {
        self.clients.read().await.contains_key(endpoint)
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_reuses_client() {
        let cache = ConnectionCache::new(Duration::from_secs(5));
        assert!(cache.is_empty().await);

        cache.get("http://store.example").await.unwrap();
        cache.get("http://store.example").await.unwrap();
        assert_eq!(cache.len().await, 1);

        cache.get("http://other.example").await.unwrap();
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_invalidate_replaces_on_next_get() {
        let cache = ConnectionCache::new(Duration::from_secs(5));
        cache.get("http://store.example").await.unwrap();

        cache.invalidate("http://store.example", "timeout").await;
        assert!(!cache.is_cached("http://store.example").await);

        cache.get("http://store.example").await.unwrap();
        assert!(cache.is_cached("http://store.example").await);
    }
}

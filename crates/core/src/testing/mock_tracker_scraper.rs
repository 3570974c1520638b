//! Mock tracker scraper for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tracker::{ScrapeStats, TrackerError, TrackerScraper};

/// Mock implementation of the TrackerScraper trait.
///
/// Responses are configured per announce URL. Unknown URLs report zero
/// counts; URLs marked with `fail_for` time out until `recover` is called.
pub struct MockTrackerScraper {
    stats: Arc<RwLock<HashMap<String, ScrapeStats>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    scrapes: Arc<RwLock<HashMap<String, usize>>>,
}

impl std::fmt::Debug for MockTrackerScraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTrackerScraper").finish_non_exhaustive()
    }
}

impl Default for MockTrackerScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTrackerScraper {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(HashMap::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            scrapes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Set the counts reported by an announce URL.
    pub async fn set_stats(&self, announce: &str, stats: ScrapeStats) {
        self.stats.write().await.insert(announce.to_string(), stats);
    }

    /// Make scrapes against an announce URL fail.
    pub async fn fail_for(&self, announce: &str) {
        self.failing.write().await.insert(announce.to_string());
    }

    pub async fn recover(&self, announce: &str) {
        self.failing.write().await.remove(announce);
    }

    /// Scrapes made against an announce URL.
    pub async fn scrapes(&self, announce: &str) -> usize {
        self.scrapes.read().await.get(announce).copied().unwrap_or(0)
    }

    pub async fn total_scrapes(&self) -> usize {
        self.scrapes.read().await.values().sum()
    }
}

#[async_trait]
impl TrackerScraper for MockTrackerScraper {
    fn name(&self) -> &str {
        "mock"
    }

    async fn scrape(&self, _info_hash: &str, announce: &str) -> Result<ScrapeStats, TrackerError> {
        *self
            .scrapes
            .write()
            .await
            .entry(announce.to_string())
            .or_default() += 1;

        if self.failing.read().await.contains(announce) {
            return Err(TrackerError::Timeout);
        }
        Ok(self
            .stats
            .read()
            .await
            .get(announce)
            .copied()
            .unwrap_or_default())
    }
}

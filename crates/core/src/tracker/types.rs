//! Types for tracker scrapes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur scraping a tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid announce URL {0}")]
    InvalidUrl(String),

    #[error("Unsupported tracker scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Tracker does not support scrape: {0}")]
    ScrapeUnsupported(String),

    #[error("Invalid info hash: {0}")]
    InvalidInfoHash(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Tracker rejected request: {0}")]
    Rejected(String),

    #[error("Malformed tracker response: {0}")]
    MalformedResponse(String),

    #[error("Torrent not reported by tracker")]
    NotReported,
}

/// Swarm counts for one info hash as reported by a tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeStats {
    /// Seeders.
    pub complete: u64,
    /// Leechers.
    pub incomplete: u64,
    /// Completed downloads.
    pub downloaded: u64,
}

/// Request/response scrape against one announce URL.
#[async_trait]
pub trait TrackerScraper: Send + Sync {
    /// Implementation name (for logging).
    fn name(&self) -> &str;

    async fn scrape(&self, info_hash: &str, announce: &str) -> Result<ScrapeStats, TrackerError>;
}

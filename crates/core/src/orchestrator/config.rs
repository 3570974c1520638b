//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the scrape orchestrator and its adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Delay after each record, in milliseconds.
    /// Keeps the request rate against trackers and the DHT polite.
    #[serde(default = "default_pacing")]
    pub pacing_ms: u64,

    /// Passes over outstanding records before a run gives up (0 = unlimited).
    /// Records left stale are picked up again by the next run.
    #[serde(default = "default_max_passes")]
    pub max_passes: u32,

    /// How long one DHT lookup pass collects peers (seconds).
    #[serde(default = "default_dht_lookup")]
    pub dht_lookup_secs: u64,

    /// Per-request tracker scrape timeout (seconds).
    #[serde(default = "default_tracker_timeout")]
    pub tracker_timeout_secs: u64,
}

fn default_pacing() -> u64 {
    1000 // 1 second
}

fn default_max_passes() -> u32 {
    25
}

fn default_dht_lookup() -> u64 {
    20
}

fn default_tracker_timeout() -> u64 {
    15
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing(),
            max_passes: default_max_passes(),
            dht_lookup_secs: default_dht_lookup(),
            tracker_timeout_secs: default_tracker_timeout(),
        }
    }
}

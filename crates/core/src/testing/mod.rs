//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the record store, peer
//! discovery and tracker scrape traits, allowing orchestrator and scheduler
//! tests without a store, a DHT or any tracker.
//!
//! # Example
//!
//! ```rust,ignore
//! use swarmscrape_core::testing::{fixtures, MockPeerDiscovery, MockRecordStore, MockTrackerScraper};
//!
//! let store = MockRecordStore::new();
//! let discovery = MockPeerDiscovery::new();
//! let scraper = MockTrackerScraper::new();
//!
//! // Configure mock responses
//! store.set_records(vec![fixtures::record(1, &["udp://t.example:1"])]).await;
//! discovery.set_peers(&fixtures::info_hash(1), 12).await;
//! scraper.fail_for("udp://t.example:1").await;
//! ```

mod mock_peer_discovery;
mod mock_record_store;
mod mock_tracker_scraper;

pub use mock_peer_discovery::MockPeerDiscovery;
pub use mock_record_store::{MockRecordStore, RecordedRequest};
pub use mock_tracker_scraper::MockTrackerScraper;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::collections::BTreeMap;

    use crate::record::{DhtResult, Record, TrackerResult};

    /// A deterministic 40-char hex info hash; ordering follows `n`.
    pub fn info_hash(n: u32) -> String {
        format!("{:040x}", n)
    }

    /// A record with no scrape data.
    pub fn record(n: u32, trackers: &[&str]) -> Record {
        Record::new(info_hash(n)).with_trackers(trackers.iter().copied())
    }

    /// A tracker result stamped at `scraped_date`.
    pub fn tracker_result(scraped_date: i64) -> TrackerResult {
        TrackerResult {
            complete: 10,
            incomplete: 2,
            downloaded: 100,
            scraped_date,
            extra: Default::default(),
        }
    }

    /// A record whose every facet was scraped at `scraped_date`.
    pub fn scraped_record(n: u32, trackers: &[&str], scraped_date: i64) -> Record {
        let mut record = record(n, trackers);
        record.dht_data = Some(DhtResult {
            info_hash: record.id.clone(),
            peers: 5,
            scraped_date,
        });
        record.tracker_data = Some(
            trackers
                .iter()
                .map(|t| (t.to_string(), tracker_result(scraped_date)))
                .collect::<BTreeMap<_, _>>(),
        );
        record
    }
}

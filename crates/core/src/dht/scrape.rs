//! DHT facet adapter.

use std::time::Instant;

use super::{DhtError, PeerDiscovery};
use crate::metrics;
use crate::record::{DhtResult, Record};

/// Run one lookup pass for `record` and store the result as its DHT facet.
///
/// On failure the record is left untouched.
pub async fn scrape_dht(
    record: &mut Record,
    discovery: &dyn PeerDiscovery,
    now: i64,
) -> Result<usize, DhtError> {
    let started = Instant::now();
    let result = discovery.lookup(&record.id).await;
    metrics::SCRAPE_DURATION
        .with_label_values(&["dht"])
        .observe(started.elapsed().as_secs_f64());

    match result {
        Ok(peers) => {
            let previous = record.dht_data.as_ref().map_or(i64::MIN, |d| d.scraped_date);
            record.dht_data = Some(DhtResult {
                info_hash: record.id.clone(),
                peers,
                scraped_date: now.max(previous),
            });
            metrics::SCRAPE_ATTEMPTS
                .with_label_values(&["dht", "success"])
                .inc();
            Ok(peers)
        }
        Err(e) => {
            metrics::SCRAPE_ATTEMPTS
                .with_label_values(&["dht", "error"])
                .inc();
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPeerDiscovery;

    const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    #[tokio::test]
    async fn test_success_writes_dht_data() {
        let discovery = MockPeerDiscovery::new();
        discovery.set_peers(HASH, 12).await;

        let mut record = Record::new(HASH);
        let peers = scrape_dht(&mut record, &discovery, 1_700_000_000).await.unwrap();

        assert_eq!(peers, 12);
        let dht = record.dht_data.unwrap();
        assert_eq!(dht.info_hash, HASH);
        assert_eq!(dht.peers, 12);
        assert_eq!(dht.scraped_date, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_failure_leaves_record_untouched() {
        let discovery = MockPeerDiscovery::new();
        discovery.fail_for(HASH).await;

        let mut record = Record::new(HASH);
        record.dht_data = Some(DhtResult {
            info_hash: HASH.to_string(),
            peers: 3,
            scraped_date: 100,
        });
        let before = record.clone();

        assert!(scrape_dht(&mut record, &discovery, 1_700_000_000).await.is_err());
        assert_eq!(record, before);
    }

    #[tokio::test]
    async fn test_scraped_date_never_moves_backwards() {
        let discovery = MockPeerDiscovery::new();
        discovery.set_peers(HASH, 1).await;

        let mut record = Record::new(HASH);
        record.dht_data = Some(DhtResult {
            info_hash: HASH.to_string(),
            peers: 3,
            scraped_date: 2_000,
        });

        scrape_dht(&mut record, &discovery, 1_000).await.unwrap();
        assert_eq!(record.dht_data.unwrap().scraped_date, 2_000);
    }
}

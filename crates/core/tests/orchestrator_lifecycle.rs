//! Orchestrator lifecycle integration tests.
//!
//! These tests drive complete runs through the pipeline against mock
//! collaborators: fetch -> shard -> stale filter -> merge -> scrape -> put

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::sync::broadcast;

use swarmscrape_core::{
    config::InputsConfig,
    testing::{fixtures, MockPeerDiscovery, MockRecordStore, MockTrackerScraper},
    CollectionPaths, FixedClock, RunPipeline, ScrapeConfig, ScrapeOrchestrator, ScrapeOutcome,
    ScrapeStats, ShardAssignment, StalenessPolicy,
};

const NOW: i64 = 1_700_000_000;
const MAX_STALE: u64 = 3600;
const TRACKER_A: &str = "udp://a.example:6969";
const TRACKER_B: &str = "http://b.example/announce";

/// Test helper to create all dependencies for pipeline testing.
struct TestHarness {
    store: Arc<MockRecordStore>,
    discovery: Arc<MockPeerDiscovery>,
    scraper: Arc<MockTrackerScraper>,
    clock: Arc<FixedClock>,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            store: Arc::new(MockRecordStore::new()),
            discovery: Arc::new(MockPeerDiscovery::new()),
            scraper: Arc::new(MockTrackerScraper::new()),
            clock: Arc::new(FixedClock::new(NOW)),
        }
    }

    fn pipeline(
        &self,
        count: usize,
        index: usize,
        max_passes: u32,
        inputs: InputsConfig,
    ) -> RunPipeline {
        let paths = CollectionPaths::new("torrents");
        let config = ScrapeConfig {
            pacing_ms: 0,
            max_passes,
            ..Default::default()
        };
        let orchestrator = ScrapeOrchestrator::new(
            config,
            StalenessPolicy::new(MAX_STALE),
            self.clock.clone(),
            self.store.clone(),
            paths.clone(),
            self.discovery.clone(),
            self.scraper.clone(),
        );
        RunPipeline::new(
            self.store.clone(),
            paths,
            ShardAssignment::new(count, index).unwrap(),
            inputs,
            orchestrator,
        )
    }

    fn single_worker(&self) -> RunPipeline {
        self.pipeline(1, 1, 10, InputsConfig::default())
    }
}

fn json_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[tokio::test]
async fn test_expired_dht_facet_is_rescraped() {
    let h = TestHarness::new();
    let mut record = fixtures::scraped_record(1, &[TRACKER_A], NOW - 10);
    record.dht_data.as_mut().unwrap().scraped_date = NOW - 3601;
    h.store.set_records(vec![record.clone()]).await;
    h.discovery.set_peers(&record.id, 42).await;

    let (_tx, mut rx) = broadcast::channel(1);
    let summary = h.single_worker().run_once(&mut rx).await.unwrap();

    assert_eq!(summary.stale, 1);
    assert_eq!(summary.persisted, 1);
    assert_eq!(h.discovery.lookups(&record.id).await, 1);
    // Fresh tracker is left alone.
    assert_eq!(h.scraper.scrapes(TRACKER_A).await, 0);

    let written = h.store.written().await;
    let dht = written[0].dht_data.as_ref().unwrap();
    assert_eq!(dht.peers, 42);
    assert_eq!(dht.scraped_date, NOW);
}

#[tokio::test]
async fn test_fresh_tracker_is_not_scraped() {
    let h = TestHarness::new();
    let mut record = fixtures::scraped_record(1, &[TRACKER_A, TRACKER_B], NOW - 10);
    // Only B is stale.
    record
        .tracker_data
        .as_mut()
        .unwrap()
        .insert(TRACKER_B.to_string(), fixtures::tracker_result(NOW - 7200));
    h.store.set_records(vec![record]).await;

    let (_tx, mut rx) = broadcast::channel(1);
    let summary = h.single_worker().run_once(&mut rx).await.unwrap();

    assert_eq!(summary.persisted, 1);
    assert_eq!(h.scraper.scrapes(TRACKER_A).await, 0);
    assert_eq!(h.scraper.scrapes(TRACKER_B).await, 1);
    assert_eq!(h.discovery.total_lookups().await, 0);
}

#[tokio::test]
async fn test_fresh_records_are_skipped_entirely() {
    let h = TestHarness::new();
    h.store
        .set_records(vec![
            fixtures::scraped_record(1, &[TRACKER_A], NOW),
            fixtures::scraped_record(2, &[TRACKER_A], NOW - MAX_STALE as i64),
        ])
        .await;

    let (_tx, mut rx) = broadcast::channel(1);
    let summary = h.single_worker().run_once(&mut rx).await.unwrap();

    assert_eq!(summary.shard_size, 2);
    assert_eq!(summary.stale, 0);
    assert_eq!(summary.passes, 0);
    assert!(h.store.written().await.is_empty());
}

#[tokio::test]
async fn test_failing_tracker_blocks_persistence_but_keeps_result() {
    let h = TestHarness::new();
    let record = fixtures::record(1, &[TRACKER_A, TRACKER_B]);
    h.store.set_records(vec![record.clone()]).await;
    h.scraper
        .set_stats(
            TRACKER_A,
            ScrapeStats {
                complete: 8,
                incomplete: 1,
                downloaded: 30,
            },
        )
        .await;
    h.scraper.fail_for(TRACKER_B).await;

    let (_tx, mut rx) = broadcast::channel(1);
    let summary = h
        .pipeline(1, 1, 2, InputsConfig::default())
        .run_once(&mut rx)
        .await
        .unwrap();

    assert_eq!(summary.persisted, 0);
    assert_eq!(summary.abandoned, 1);
    assert_eq!(summary.tracker_failures, 2);
    assert_eq!(summary.outcome, ScrapeOutcome::Exhausted);
    assert!(h.store.written().await.is_empty());
    // A was scraped once; it stayed fresh on the second pass.
    assert_eq!(h.scraper.scrapes(TRACKER_A).await, 1);
    assert_eq!(h.scraper.scrapes(TRACKER_B).await, 2);
}

#[tokio::test]
async fn test_recovering_tracker_persists_on_later_pass() {
    let h = TestHarness::new();
    let record = fixtures::record(1, &[TRACKER_A]);
    h.store.set_records(vec![record]).await;
    h.scraper.fail_for(TRACKER_A).await;

    let (_tx, mut rx) = broadcast::channel(1);
    let pipeline = h.pipeline(1, 1, 1, InputsConfig::default());
    let first = pipeline.run_once(&mut rx).await.unwrap();
    assert_eq!(first.persisted, 0);

    h.scraper.recover(TRACKER_A).await;
    let second = pipeline.run_once(&mut rx).await.unwrap();
    assert_eq!(second.persisted, 1);
    assert_eq!(second.outcome, ScrapeOutcome::Completed);

    let stored = h.store.records().await;
    assert_eq!(stored[0].tracker_result(TRACKER_A).unwrap().scraped_date, NOW);
}

#[tokio::test]
async fn test_workers_cover_every_record_once() {
    let h = TestHarness::new();
    // Stored out of order; every worker sorts before slicing.
    let records: Vec<_> = (1..=10).rev().map(|n| fixtures::record(n, &[])).collect();
    h.store.set_records(records).await;

    let (_tx, mut rx) = broadcast::channel(1);
    let mut sizes = Vec::new();
    for index in 1..=3 {
        let summary = h
            .pipeline(3, index, 10, InputsConfig::default())
            .run_once(&mut rx)
            .await
            .unwrap();
        sizes.push(summary.shard_size);
    }
    assert_eq!(sizes, vec![4, 4, 2]);

    let mut ids: Vec<_> = h.store.written().await.into_iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), 10);
    ids.dedup();
    assert_eq!(ids.len(), 10);
    assert_eq!(ids[0], fixtures::info_hash(1));
    assert_eq!(ids[4], fixtures::info_hash(5));
}

#[tokio::test]
async fn test_corrections_and_extra_trackers_are_merged() {
    let h = TestHarness::new();
    let mut record = fixtures::record(1, &[TRACKER_A]);
    record.name = Some("Old Name".to_string());
    record.link = Some("http://old".to_string());
    h.store.set_records(vec![record.clone()]).await;

    let updates = json_file(&format!(
        r#"[{{"_id": "{}", "name": "New Name"}}]"#,
        record.id
    ));
    let trackers = json_file(&format!(r#"["{}", "{}", "{}"]"#, TRACKER_A, TRACKER_B, TRACKER_B));
    let inputs = InputsConfig {
        trackers_file: Some(PathBuf::from(trackers.path())),
        updates_file: Some(PathBuf::from(updates.path())),
    };

    let (_tx, mut rx) = broadcast::channel(1);
    let summary = h.pipeline(1, 1, 10, inputs).run_once(&mut rx).await.unwrap();
    assert_eq!(summary.persisted, 1);

    let written = &h.store.written().await[0];
    assert_eq!(written.name.as_deref(), Some("New Name"));
    assert_eq!(written.link.as_deref(), Some("http://old"));
    assert_eq!(written.trackers, vec![TRACKER_A, TRACKER_B]);
    assert!(written.tracker_result(TRACKER_B).is_some());
}

#[tokio::test]
async fn test_malformed_updates_file_fails_run() {
    let h = TestHarness::new();
    h.store.set_records(vec![fixtures::record(1, &[])]).await;
    let updates = json_file("{ not json");
    let inputs = InputsConfig {
        trackers_file: None,
        updates_file: Some(PathBuf::from(updates.path())),
    };

    let (_tx, mut rx) = broadcast::channel(1);
    let result = h.pipeline(1, 1, 10, inputs).run_once(&mut rx).await;

    assert!(result.is_err());
    assert!(h.store.requests().await.is_empty());
}

#[tokio::test]
async fn test_store_read_failure_fails_run() {
    let h = TestHarness::new();
    h.store
        .fail_next_fetch(swarmscrape_core::StoreError::EmptyResponse)
        .await;

    let (_tx, mut rx) = broadcast::channel(1);
    let result = h.single_worker().run_once(&mut rx).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_unknown_fields_survive_write_back() {
    let h = TestHarness::new();
    let mut record = fixtures::record(1, &[]);
    record
        .extra
        .insert("mirror".to_string(), serde_json::json!({"region": "eu"}));
    h.store.set_records(vec![record]).await;

    let (_tx, mut rx) = broadcast::channel(1);
    h.single_worker().run_once(&mut rx).await.unwrap();

    let json = serde_json::to_value(&h.store.written().await[0]).unwrap();
    assert_eq!(json["mirror"]["region"], "eu");
    assert_eq!(json["trackerData"], serde_json::json!({}));
    assert!(json["dhtData"]["scraped_date"].is_i64());
}

#[tokio::test]
async fn test_put_goes_to_collection_put_path() {
    let h = TestHarness::new();
    h.store.set_records(vec![fixtures::record(1, &[])]).await;

    let (_tx, mut rx) = broadcast::channel(1);
    h.single_worker().run_once(&mut rx).await.unwrap();

    let requests = h.store.requests().await;
    let ops: Vec<_> = requests.iter().map(|r| (r.operation, r.path.as_str())).collect();
    assert_eq!(
        ops,
        vec![("fetch_all", "db/torrents/all"), ("put", "db/torrents/put")]
    );
}

#[tokio::test]
async fn test_duplicate_ids_are_scraped_and_written_once() {
    let h = TestHarness::new();
    let mut older = fixtures::record(1, &[TRACKER_A]);
    older.name = Some("First Copy".to_string());
    let mut newer = fixtures::record(1, &[TRACKER_A]);
    newer.name = Some("Second Copy".to_string());
    h.store
        .set_records(vec![older, fixtures::record(2, &[]), newer])
        .await;

    let (_tx, mut rx) = broadcast::channel(1);
    let summary = h.single_worker().run_once(&mut rx).await.unwrap();

    assert_eq!(summary.total_records, 3);
    assert_eq!(summary.stale, 2);
    assert_eq!(summary.persisted, 2);
    assert_eq!(h.scraper.scrapes(TRACKER_A).await, 1);
    assert_eq!(h.discovery.lookups(&fixtures::info_hash(1)).await, 1);

    let written = h.store.written().await;
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].id, fixtures::info_hash(1));
    assert_eq!(written[0].name.as_deref(), Some("Second Copy"));
}

//! Scrape orchestrator implementation.
//!
//! Works through the stale records of one shard in repeated passes:
//! - DHT and tracker facets are refreshed only when stale
//! - A record is written back as soon as every facet is fresh
//! - Anything still stale waits for the next pass

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::dht::{scrape_dht, PeerDiscovery};
use crate::metrics;
use crate::record::Record;
use crate::staleness::{Clock, StalenessPolicy};
use crate::store::{CollectionPaths, RecordStore, StoreError};
use crate::tracker::{scrape_tracker, TrackerScraper};

use super::config::ScrapeConfig;
use super::types::{ScrapeOutcome, ScrapeReport};

/// The scrape orchestrator - refreshes stale records until they are fresh.
pub struct ScrapeOrchestrator {
    config: ScrapeConfig,
    policy: StalenessPolicy,
    clock: Arc<dyn Clock>,
    store: Arc<dyn RecordStore>,
    paths: CollectionPaths,
    discovery: Arc<dyn PeerDiscovery>,
    scraper: Arc<dyn TrackerScraper>,
}

impl ScrapeOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: ScrapeConfig,
        policy: StalenessPolicy,
        clock: Arc<dyn Clock>,
        store: Arc<dyn RecordStore>,
        paths: CollectionPaths,
        discovery: Arc<dyn PeerDiscovery>,
        scraper: Arc<dyn TrackerScraper>,
    ) -> Self {
        Self {
            config,
            policy,
            clock,
            store,
            paths,
            discovery,
            scraper,
        }
    }

    pub fn policy(&self) -> &StalenessPolicy {
        &self.policy
    }

    /// Current time in epoch seconds, from the orchestrator's clock.
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Scrape `records` until each is fresh and persisted, the pass budget
    /// runs out, or shutdown is signalled.
    ///
    /// Records are visited in the order given, on every pass.
    pub async fn scrape_all(
        &self,
        records: Vec<Record>,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> ScrapeReport {
        let mut report = ScrapeReport {
            stale: records.len(),
            ..ScrapeReport::default()
        };
        let mut outstanding = records;
        metrics::OUTSTANDING_RECORDS.set(outstanding.len() as i64);

        'passes: while !outstanding.is_empty() {
            if self.config.max_passes > 0 && report.passes >= self.config.max_passes {
                warn!(
                    passes = report.passes,
                    outstanding = outstanding.len(),
                    "Pass budget exhausted, leaving records stale"
                );
                report.outcome = ScrapeOutcome::Exhausted;
                break;
            }

            report.passes += 1;
            metrics::PASSES.inc();
            info!(
                pass = report.passes,
                outstanding = outstanding.len(),
                "Starting pass"
            );

            let mut still_stale = Vec::with_capacity(outstanding.len());
            let mut queue = outstanding.into_iter();

            while let Some(mut record) = queue.next() {
                self.refresh(&mut record, &mut report).await;

                if self.policy.is_stale(&record, self.clock.now()) {
                    debug!(id = %record.id, "Record still stale");
                    still_stale.push(record);
                } else {
                    match self.persist(&record).await {
                        Ok(()) => {
                            report.persisted += 1;
                            metrics::RECORDS_PERSISTED.inc();
                            info!(id = %record.id, "Record persisted");
                        }
                        Err(e) => {
                            warn!(id = %record.id, error = %e, "Failed to persist record");
                            report.store_failures += 1;
                            still_stale.push(record);
                        }
                    }
                }

                metrics::OUTSTANDING_RECORDS.set((still_stale.len() + queue.len()) as i64);

                if self.pace(shutdown).await {
                    info!("Shutdown requested, stopping scrape");
                    report.outcome = ScrapeOutcome::Interrupted;
                    still_stale.extend(queue);
                    outstanding = still_stale;
                    break 'passes;
                }
            }

            outstanding = still_stale;
        }

        report.abandoned = outstanding.len();
        metrics::OUTSTANDING_RECORDS.set(0);
        report
    }

    /// Scrape every stale facet of one record.
    ///
    /// Failures are counted and logged; the facet stays stale.
    async fn refresh(&self, record: &mut Record, report: &mut ScrapeReport) {
        let now = self.clock.now();

        if self.policy.is_dht_stale(record, now) {
            if let Err(e) = scrape_dht(record, self.discovery.as_ref(), now).await {
                warn!(id = %record.id, error = %e, "DHT scrape failed");
                report.dht_failures += 1;
            }
        }

        let stale_trackers = self.policy.stale_trackers(record, now);
        for announce in &stale_trackers {
            let now = self.clock.now();
            if let Err(e) = scrape_tracker(record, announce, self.scraper.as_ref(), now).await {
                warn!(id = %record.id, tracker = %announce, error = %e, "Tracker scrape failed");
                report.tracker_failures += 1;
            }
        }

        // A record that has been through a pass always carries a tracker map,
        // even when it lists no trackers.
        record.tracker_data.get_or_insert_with(BTreeMap::new);
    }

    async fn persist(&self, record: &Record) -> Result<(), StoreError> {
        let ack = self.store.put(&self.paths.put(), record).await?;
        debug!(id = %record.id, ack = %ack, "Store acknowledged write");
        Ok(())
    }

    /// Wait out the pacing delay. Returns `true` if shutdown was signalled.
    async fn pace(&self, shutdown: &mut broadcast::Receiver<()>) -> bool {
        match shutdown.try_recv() {
            Err(TryRecvError::Empty) => {}
            _ => return true,
        }

        if self.config.pacing_ms == 0 {
            return false;
        }

        tokio::select! {
            _ = shutdown.recv() => true,
            _ = tokio::time::sleep(Duration::from_millis(self.config.pacing_ms)) => false,
        }
    }
}

//! One run: fetch, partition, filter, merge, scrape.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::InputsConfig;
use crate::merger::UpdateMerger;
use crate::orchestrator::{OrchestratorError, ScrapeOrchestrator};
use crate::record::Record;
use crate::shard::{select_shard, sort_records, ShardAssignment};
use crate::store::{CollectionPaths, RecordStore};

use super::types::RunSummary;

/// Everything one run needs, fixed at startup.
pub struct RunPipeline {
    store: Arc<dyn RecordStore>,
    paths: CollectionPaths,
    assignment: ShardAssignment,
    inputs: InputsConfig,
    orchestrator: ScrapeOrchestrator,
}

impl RunPipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        paths: CollectionPaths,
        assignment: ShardAssignment,
        inputs: InputsConfig,
        orchestrator: ScrapeOrchestrator,
    ) -> Self {
        Self {
            store,
            paths,
            assignment,
            inputs,
            orchestrator,
        }
    }

    pub fn assignment(&self) -> &ShardAssignment {
        &self.assignment
    }

    /// Execute one run inside a `run` span carrying a fresh run id.
    pub async fn run_once(
        &self,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<RunSummary, OrchestratorError> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "run",
            run_id = %run_id,
            worker = self.assignment.worker_index(),
            workers = self.assignment.worker_count()
        );
        self.execute(run_id, shutdown).instrument(span).await
    }

    async fn execute(
        &self,
        run_id: String,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<RunSummary, OrchestratorError> {
        let started_at = Utc::now();
        let timer = Instant::now();

        // Inputs are re-read every run so edits apply without a restart.
        let merger = UpdateMerger::load(
            self.inputs.trackers_file.as_deref(),
            self.inputs.updates_file.as_deref(),
        )
        .await?;

        let mut records = self.store.fetch_all(&self.paths.all()).await?;
        let total_records = records.len();
        sort_records(&mut records);

        let shard = select_shard(&records, &self.assignment);
        info!(
            total = total_records,
            shard_size = shard.len(),
            "Loaded records"
        );

        let mut stale = self.stale_subset(shard);
        info!(stale = stale.len(), "Stale records selected");

        for record in &mut stale {
            let report = merger.merge(record);
            if !report.is_unchanged() {
                debug!(
                    id = %record.id,
                    fields = ?report.fields_updated,
                    trackers_added = report.trackers_added,
                    "Merged updates"
                );
            }
        }

        let shard_size = shard.len();
        let report = self.orchestrator.scrape_all(stale, shutdown).await;

        let summary = RunSummary::from_report(
            run_id,
            started_at,
            total_records,
            shard_size,
            report,
            timer.elapsed().as_millis() as u64,
        );
        info!(
            persisted = summary.persisted,
            abandoned = summary.abandoned,
            passes = summary.passes,
            outcome = summary.outcome.as_str(),
            duration_ms = summary.duration_ms,
            "Run finished"
        );
        Ok(summary)
    }

    /// Shard records that need scraping, in shard order, one per id.
    fn stale_subset(&self, shard: &[Record]) -> Vec<Record> {
        let policy = self.orchestrator.policy();
        let now = self.orchestrator.now();

        let mut stale: Vec<Record> = Vec::new();
        let mut duplicates = 0;
        for record in shard.iter().filter(|record| policy.is_stale(record, now)) {
            // Sorted input keeps duplicates adjacent; the later copy wins.
            match stale.last_mut() {
                Some(last) if last.id == record.id => {
                    *last = record.clone();
                    duplicates += 1;
                }
                _ => stale.push(record.clone()),
            }
        }
        if duplicates > 0 {
            warn!(count = duplicates, "Duplicate record ids in shard, scraping each once");
        }

        let without_trackers = stale.iter().filter(|r| r.trackers.is_empty()).count();
        if without_trackers > 0 {
            warn!(
                count = without_trackers,
                "Stale records without trackers, only the DHT will be scraped"
            );
        }

        stale
    }
}

//! Types for the run scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::orchestrator::{ScrapeOutcome, ScrapeReport};

/// Outcome of one fetch → partition → merge → scrape cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Correlates log lines of one run.
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Records in the store when the run started.
    pub total_records: usize,
    /// Records in this worker's shard.
    pub shard_size: usize,
    /// Shard records that were stale before scraping.
    pub stale: usize,
    pub persisted: usize,
    /// Records left stale for the next run.
    pub abandoned: usize,
    pub passes: u32,
    pub dht_failures: usize,
    pub tracker_failures: usize,
    pub store_failures: usize,
    pub duration_ms: u64,
    pub outcome: ScrapeOutcome,
}

impl RunSummary {
    pub(crate) fn from_report(
        run_id: String,
        started_at: DateTime<Utc>,
        total_records: usize,
        shard_size: usize,
        report: ScrapeReport,
        duration_ms: u64,
    ) -> Self {
        Self {
            run_id,
            started_at,
            total_records,
            shard_size,
            stale: report.stale,
            persisted: report.persisted,
            abandoned: report.abandoned,
            passes: report.passes,
            dht_failures: report.dht_failures,
            tracker_failures: report.tracker_failures,
            store_failures: report.store_failures,
            duration_ms,
            outcome: report.outcome,
        }
    }
}

/// Current status of the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Whether the tick loop is running.
    pub running: bool,
    /// Whether a run is executing right now.
    pub run_in_progress: bool,
    /// Runs started since startup.
    pub runs_started: u64,
    /// Ticks dropped because a run was still executing.
    pub runs_skipped: u64,
    /// Last run that finished without a run-level error.
    pub last_run: Option<RunSummary>,
    /// Error that ended the most recent failed run.
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
}

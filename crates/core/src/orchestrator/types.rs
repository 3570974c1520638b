//! Types for the scrape orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that end a run before or while scraping.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Record store error.
    #[error("record store error: {0}")]
    Store(#[from] crate::store::StoreError),

    /// Invalid shard assignment.
    #[error("shard error: {0}")]
    Shard(#[from] crate::shard::ShardError),

    /// Corrections or trackers file could not be loaded.
    #[error("merge input error: {0}")]
    Merge(#[from] crate::merger::MergeError),
}

/// How the pass loop ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeOutcome {
    /// Every stale record became fresh and was persisted.
    #[default]
    Completed,
    /// The pass budget ran out with records still stale.
    Exhausted,
    /// Shutdown was requested mid-run.
    Interrupted,
}

impl ScrapeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeOutcome::Completed => "completed",
            ScrapeOutcome::Exhausted => "exhausted",
            ScrapeOutcome::Interrupted => "interrupted",
        }
    }
}

/// Counters for one call to `scrape_all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeReport {
    /// Records handed to the orchestrator.
    pub stale: usize,
    /// Records written back.
    pub persisted: usize,
    /// Records still stale when the loop ended.
    pub abandoned: usize,
    /// Passes started.
    pub passes: u32,
    pub dht_failures: usize,
    pub tracker_failures: usize,
    pub store_failures: usize,
    pub outcome: ScrapeOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_default() {
        let report = ScrapeReport::default();
        assert_eq!(report.passes, 0);
        assert_eq!(report.outcome, ScrapeOutcome::Completed);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&ScrapeOutcome::Exhausted).unwrap();
        assert_eq!(json, "\"exhausted\"");
        assert_eq!(ScrapeOutcome::Interrupted.as_str(), "interrupted");
    }

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::from(crate::store::StoreError::EmptyResponse);
        assert_eq!(err.to_string(), "record store error: Empty response");

        let err = OrchestratorError::from(crate::shard::ShardError::NoWorkers);
        assert!(err.to_string().starts_with("shard error: "));
    }
}

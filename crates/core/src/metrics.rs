//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Record store requests
//! - DHT and tracker scrapes
//! - Runs and passes of the scrape orchestrator

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Record Store Metrics
// =============================================================================

/// Record store requests total by operation and status.
pub static STORE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "swarmscrape_store_requests_total",
            "Total record store requests",
        ),
        &["operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Record store request duration in seconds.
pub static STORE_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "swarmscrape_store_request_duration_seconds",
            "Duration of record store requests",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Scrape Metrics
// =============================================================================

/// Scrape attempts by facet and result.
pub static SCRAPE_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("swarmscrape_scrape_attempts_total", "Total scrape attempts"),
        &["facet", "result"], // facet: "dht", "tracker"
    )
    .unwrap()
});

/// Scrape duration in seconds by facet.
pub static SCRAPE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "swarmscrape_scrape_duration_seconds",
            "Duration of a single scrape",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]),
        &["facet"],
    )
    .unwrap()
});

// =============================================================================
// Run Metrics
// =============================================================================

/// Runs total by result.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("swarmscrape_runs_total", "Total scrape runs"),
        &["result"], // "completed", "exhausted", "interrupted", "failed"
    )
    .unwrap()
});

/// Run duration in seconds.
pub static RUN_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("swarmscrape_run_duration_seconds", "Duration of scrape runs")
            .buckets(vec![1.0, 10.0, 30.0, 60.0, 300.0, 600.0, 1800.0, 3600.0, 14400.0]),
    )
    .unwrap()
});

/// Ticks dropped because a run was still in progress.
pub static TICKS_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "swarmscrape_ticks_skipped_total",
        "Scheduler ticks skipped because a run was already in progress",
    )
    .unwrap()
});

/// Passes over outstanding records.
pub static PASSES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("swarmscrape_passes_total", "Total orchestrator passes").unwrap()
});

/// Records written back after becoming fresh.
pub static RECORDS_PERSISTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "swarmscrape_records_persisted_total",
        "Total records persisted to the record store",
    )
    .unwrap()
});

/// Records still stale in the current run.
pub static OUTSTANDING_RECORDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "swarmscrape_outstanding_records",
        "Stale records not yet persisted in the current run",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Store
        Box::new(STORE_REQUESTS.clone()),
        Box::new(STORE_REQUEST_DURATION.clone()),
        // Scrapes
        Box::new(SCRAPE_ATTEMPTS.clone()),
        Box::new(SCRAPE_DURATION.clone()),
        // Runs
        Box::new(RUNS_TOTAL.clone()),
        Box::new(RUN_DURATION.clone()),
        Box::new(TICKS_SKIPPED.clone()),
        Box::new(PASSES.clone()),
        Box::new(RECORDS_PERSISTED.clone()),
        Box::new(OUTSTANDING_RECORDS.clone()),
    ]
}

//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring a scraper worker:
//! - HTTP request metrics for the status surface
//! - Scheduler state (collected dynamically)
//! - Everything registered by the core crate (store, scrapes, runs)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "swarmscrape_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("swarmscrape_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "swarmscrape_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Scheduler Metrics (collected dynamically)
// =============================================================================

/// Scheduler running state (1 = running, 0 = stopped).
pub static SCHEDULER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "swarmscrape_scheduler_running",
        "Whether the run scheduler is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Whether a run is executing right now.
pub static RUN_IN_PROGRESS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "swarmscrape_run_in_progress",
        "Whether a scrape run is executing (1) or idle (0)",
    )
    .unwrap()
});

/// Unix time of the last run that finished without a run-level error.
pub static LAST_RUN_TIMESTAMP: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "swarmscrape_last_run_timestamp_seconds",
        "Start time of the last completed run",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Scheduler
    registry
        .register(Box::new(SCHEDULER_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(RUN_IN_PROGRESS.clone()))
        .unwrap();
    registry
        .register(Box::new(LAST_RUN_TIMESTAMP.clone()))
        .unwrap();

    // Core metrics (store, scrapes, runs)
    for metric in swarmscrape_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with the
/// scheduler's current values.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.scheduler().status().await;
    SCHEDULER_RUNNING.set(if status.running { 1 } else { 0 });
    RUN_IN_PROGRESS.set(if status.run_in_progress { 1 } else { 0 });
    if let Some(run) = status.last_run {
        LAST_RUN_TIMESTAMP.set(run.started_at.timestamp());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("swarmscrape_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        // Prometheus only outputs vec metrics that have a child
        swarmscrape_core::metrics::SCRAPE_ATTEMPTS
            .with_label_values(&["dht", "success"])
            .inc_by(0);
        swarmscrape_core::metrics::RECORDS_PERSISTED.inc_by(0);
        SCHEDULER_RUNNING.set(0);

        let output = encode_metrics();

        assert!(output.contains("swarmscrape_scrape_attempts_total"));
        assert!(output.contains("swarmscrape_records_persisted_total"));
        assert!(output.contains("swarmscrape_scheduler_running"));
        assert!(output.contains("swarmscrape_ticks_skipped_total"));
    }
}

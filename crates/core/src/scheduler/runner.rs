//! Run scheduler implementation.
//!
//! Triggers a run immediately on start and then on every interval tick.
//! At most one run executes at a time; a tick that arrives while a run is
//! still executing is dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::ScheduleConfig;
use crate::metrics;

use super::pipeline::RunPipeline;
use super::types::SchedulerStatus;

/// How long `stop` waits for an executing run to notice the shutdown.
const STOP_GRACE: Duration = Duration::from_secs(30);

/// The run scheduler - owns the tick loop and the reentrancy guard.
pub struct RunScheduler {
    config: ScheduleConfig,
    pipeline: Arc<RunPipeline>,

    // Runtime state
    running: Arc<AtomicBool>,
    in_progress: Arc<AtomicBool>,
    status: Arc<RwLock<SchedulerStatus>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl RunScheduler {
    /// Create a new scheduler.
    pub fn new(config: ScheduleConfig, pipeline: Arc<RunPipeline>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            pipeline,
            running: Arc::new(AtomicBool::new(false)),
            in_progress: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(SchedulerStatus::default())),
            shutdown_tx,
        }
    }

    /// Start the tick loop (spawns a background task).
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return;
        }

        info!(interval_secs = self.config.interval_secs, "Starting run scheduler");
        self.spawn_tick_loop();
    }

    /// Stop the tick loop and signal any executing run to wind down.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Scheduler not running");
            return;
        }

        info!("Stopping run scheduler");
        let _ = self.shutdown_tx.send(());

        let idle = async {
            while self.in_progress.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        if tokio::time::timeout(STOP_GRACE, idle).await.is_err() {
            warn!("Run did not stop within {:?}", STOP_GRACE);
        }

        info!("Run scheduler stopped");
    }

    /// Get current scheduler status.
    pub async fn status(&self) -> SchedulerStatus {
        let mut status = self.status.read().await.clone();
        status.running = self.running.load(Ordering::Relaxed);
        status.run_in_progress = self.in_progress.load(Ordering::Relaxed);
        status
    }

    /// Start a run unless one is already executing.
    ///
    /// Returns the run's task handle, or `None` if the trigger was dropped.
    pub async fn trigger(&self) -> Option<JoinHandle<()>> {
        Self::trigger_run(
            &self.pipeline,
            &self.in_progress,
            &self.status,
            &self.shutdown_tx,
        )
        .await
    }

    fn spawn_tick_loop(&self) {
        let running = Arc::clone(&self.running);
        let pipeline = Arc::clone(&self.pipeline);
        let in_progress = Arc::clone(&self.in_progress);
        let status = Arc::clone(&self.status);
        let shutdown_tx = self.shutdown_tx.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = Duration::from_secs(self.config.interval_secs);

        tokio::spawn(async move {
            info!("Tick loop started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Tick loop received shutdown signal");
                        break;
                    }
                    // The first tick completes immediately.
                    _ = ticker.tick() => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        Self::trigger_run(&pipeline, &in_progress, &status, &shutdown_tx).await;
                    }
                }
            }
            info!("Tick loop stopped");
        });
    }

    async fn trigger_run(
        pipeline: &Arc<RunPipeline>,
        in_progress: &Arc<AtomicBool>,
        status: &Arc<RwLock<SchedulerStatus>>,
        shutdown_tx: &broadcast::Sender<()>,
    ) -> Option<JoinHandle<()>> {
        if in_progress.swap(true, Ordering::SeqCst) {
            info!("Run already in progress, skipping tick");
            metrics::TICKS_SKIPPED.inc();
            status.write().await.runs_skipped += 1;
            return None;
        }

        status.write().await.runs_started += 1;

        let pipeline = Arc::clone(pipeline);
        let guard = RunGuard(Arc::clone(in_progress));
        let status = Arc::clone(status);
        let mut shutdown_rx = shutdown_tx.subscribe();

        Some(tokio::spawn(async move {
            let _guard = guard;
            let timer = std::time::Instant::now();
            let result = pipeline.run_once(&mut shutdown_rx).await;
            metrics::RUN_DURATION.observe(timer.elapsed().as_secs_f64());

            {
                let mut status = status.write().await;
                match result {
                    Ok(summary) => {
                        metrics::RUNS_TOTAL
                            .with_label_values(&[summary.outcome.as_str()])
                            .inc();
                        status.last_run = Some(summary);
                    }
                    Err(e) => {
                        error!(error = %e, "Run failed");
                        metrics::RUNS_TOTAL.with_label_values(&["failed"]).inc();
                        status.last_error = Some(e.to_string());
                        status.last_error_at = Some(Utc::now());
                    }
                }
            }
        }))
    }
}

/// Clears the in-progress flag when a run task ends, including by panic.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

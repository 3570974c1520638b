//! Run scheduler.
//!
//! Each run loads the full record set, takes this worker's shard, keeps the
//! stale records, merges external corrections into them and hands them to
//! the scrape orchestrator. Runs start on a fixed interval and never
//! overlap.

mod pipeline;
mod runner;
mod types;

pub use pipeline::RunPipeline;
pub use runner::RunScheduler;
pub use types::{RunSummary, SchedulerStatus};

//! Scrape orchestrator.
//!
//! The retry engine of a run: refreshes the stale facets of each record,
//! writes back records once they are fresh, and repeats passes over
//! whatever is still stale until nothing is left, the pass budget runs out
//! or shutdown is requested.

mod config;
mod runner;
mod types;

pub use config::ScrapeConfig;
pub use runner::ScrapeOrchestrator;
pub use types::{OrchestratorError, ScrapeOutcome, ScrapeReport};

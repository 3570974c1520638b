//! Status surface and process wiring for a scraper worker.

pub mod api;
pub mod metrics;
pub mod state;

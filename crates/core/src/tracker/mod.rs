//! Tracker scrape abstraction.
//!
//! This module provides a `TrackerScraper` trait for asking one announce URL
//! about one swarm, HTTP and UDP implementations, and the adapter that turns
//! a scrape into a record's `trackerData` entry.

mod http;
mod scheme;
mod scrape;
mod types;
mod udp;

pub use http::{scrape_url, HttpTrackerScraper};
pub use scheme::SchemeTrackerScraper;
pub use scrape::scrape_tracker;
pub use types::*;
pub use udp::UdpTrackerScraper;

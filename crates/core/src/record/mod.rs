//! Record data model.
//!
//! A record is one content entry (keyed by its info hash) whose liveness
//! facets are refreshed by the scraper: the DHT peer count and one swarm
//! snapshot per announce URL.

mod types;

pub use types::*;

//! Peer discovery over the BitTorrent DHT.
//!
//! This module provides a `PeerDiscovery` trait for a single lookup pass
//! and the adapter that turns a pass into a record's `dhtData` facet.

mod librqbit;
mod scrape;
mod types;

pub use librqbit::LibrqbitDht;
pub use scrape::scrape_dht;
pub use types::*;

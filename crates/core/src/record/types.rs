//! Record, tracker and DHT result types as stored in the record store.

use std::collections::BTreeMap;
use std::str::FromStr;

use librqbit_core::Id20;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Error returned when a record id is not a valid 40-char hex info hash.
#[derive(Debug, Error)]
#[error("invalid info hash {id:?}: {reason}")]
pub struct InvalidInfoHash {
    pub id: String,
    pub reason: String,
}

/// Parse a record id into a 20-byte info hash.
pub fn parse_info_hash(id: &str) -> Result<Id20, InvalidInfoHash> {
    if id.len() != 40 {
        return Err(InvalidInfoHash {
            id: id.to_string(),
            reason: format!("expected 40 hex characters, got {}", id.len()),
        });
    }
    Id20::from_str(id).map_err(|e| InvalidInfoHash {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

/// A content record tracked for liveness.
///
/// Field names follow the stored JSON documents. Fields this crate does not
/// know about are kept in `extra` so a write-back never drops data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Content identifier (info hash, hex). Primary key.
    #[serde(rename = "_id")]
    pub id: String,
    /// Announce URLs, in first-appearance order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub trackers: Vec<String>,
    /// Last successful scrape per announce URL.
    #[serde(
        rename = "trackerData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tracker_data: Option<BTreeMap<String, TrackerResult>>,
    /// Last successful DHT lookup.
    #[serde(rename = "dhtData", default, skip_serializing_if = "Option::is_none")]
    pub dht_data: Option<DhtResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_unix: Option<i64>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Create an empty record with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            trackers: Vec::new(),
            tracker_data: None,
            dht_data: None,
            name: None,
            link: None,
            kind: None,
            size_bytes: None,
            created_unix: None,
            extra: Map::new(),
        }
    }

    /// Builder-style helper to set the tracker list.
    pub fn with_trackers<I, S>(mut self, trackers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trackers = trackers.into_iter().map(Into::into).collect();
        self
    }

    /// Stored result for an announce URL, if any.
    pub fn tracker_result(&self, announce: &str) -> Option<&TrackerResult> {
        self.tracker_data.as_ref()?.get(announce)
    }

    pub fn has_tracker(&self, announce: &str) -> bool {
        self.trackers.iter().any(|t| t == announce)
    }
}

/// Swarm counts reported by a tracker scrape, stamped with the scrape time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerResult {
    /// Seeders.
    #[serde(default)]
    pub complete: u64,
    /// Leechers.
    #[serde(default)]
    pub incomplete: u64,
    /// Completed downloads.
    #[serde(default)]
    pub downloaded: u64,
    /// Epoch seconds of the last successful scrape.
    #[serde(default)]
    pub scraped_date: i64,
    /// Extra protocol fields, opaque to the scraper.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Distinct peers seen during the last DHT lookup pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhtResult {
    #[serde(rename = "infoHash")]
    pub info_hash: String,
    #[serde(default)]
    pub peers: usize,
    /// Epoch seconds of the last successful lookup.
    #[serde(default)]
    pub scraped_date: i64,
}

/// Stored documents occasionally carry `"trackers": null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

//! Staleness policy.
//!
//! Decides, per facet and per record, whether data needs refreshing. Every
//! decision is a pure function of the record, the configured threshold and
//! the `now` passed in by the caller.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use crate::record::Record;

/// Source of the current time in epoch seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Manually driven clock for tests.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Staleness thresholds for record facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    max_stale: i64,
}

impl StalenessPolicy {
    pub fn new(max_stale_secs: u64) -> Self {
        Self {
            max_stale: i64::try_from(max_stale_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn max_stale_secs(&self) -> i64 {
        self.max_stale
    }

    /// A scrape stamped at `scraped_date` is stale once
    /// `scraped_date + max_stale < now`. The boundary itself is fresh.
    pub fn is_expired(&self, scraped_date: i64, now: i64) -> bool {
        scraped_date.saturating_add(self.max_stale) < now
    }

    /// Whether the facet for one announce URL needs a scrape.
    pub fn is_tracker_stale(&self, record: &Record, announce: &str, now: i64) -> bool {
        match record.tracker_result(announce) {
            Some(result) => self.is_expired(result.scraped_date, now),
            None => true,
        }
    }

    /// Whether the DHT facet needs a lookup.
    pub fn is_dht_stale(&self, record: &Record, now: i64) -> bool {
        match &record.dht_data {
            Some(dht) => self.is_expired(dht.scraped_date, now),
            None => true,
        }
    }

    /// Announce URLs whose facet is stale, in tracker-list order.
    pub fn stale_trackers(&self, record: &Record, now: i64) -> Vec<String> {
        record
            .trackers
            .iter()
            .filter(|announce| self.is_tracker_stale(record, announce, now))
            .cloned()
            .collect()
    }

    /// A record is done only when every facet is fresh at the same time.
    pub fn is_stale(&self, record: &Record, now: i64) -> bool {
        record.tracker_data.is_none()
            || self.is_dht_stale(record, now)
            || record
                .trackers
                .iter()
                .any(|announce| self.is_tracker_stale(record, announce, now))
    }
}

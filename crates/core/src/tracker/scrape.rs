//! Tracker facet adapter.

use std::collections::BTreeMap;
use std::time::Instant;

use serde_json::{Map, Value};

use super::{TrackerError, TrackerScraper};
use crate::metrics;
use crate::record::{Record, TrackerResult};

/// Scrape one announce URL for `record` and store the result under
/// `trackerData[announce]`.
///
/// Entries carry `announce` and `infoHash` alongside the counts, matching
/// documents already in the store. On failure the record is left untouched.
pub async fn scrape_tracker(
    record: &mut Record,
    announce: &str,
    scraper: &dyn TrackerScraper,
    now: i64,
) -> Result<(), TrackerError> {
    let started = Instant::now();
    let result = scraper.scrape(&record.id, announce).await;
    metrics::SCRAPE_DURATION
        .with_label_values(&["tracker"])
        .observe(started.elapsed().as_secs_f64());

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            metrics::SCRAPE_ATTEMPTS
                .with_label_values(&["tracker", "error"])
                .inc();
            return Err(e);
        }
    };

    let info_hash = record.id.clone();
    let data = record.tracker_data.get_or_insert_with(BTreeMap::new);
    let previous = data.get(announce).map_or(i64::MIN, |r| r.scraped_date);
    let mut extra = data
        .get(announce)
        .map(|r| r.extra.clone())
        .unwrap_or_else(Map::new);
    extra
        .entry("announce")
        .or_insert_with(|| Value::String(announce.to_string()));
    extra
        .entry("infoHash")
        .or_insert_with(|| Value::String(info_hash));

    data.insert(
        announce.to_string(),
        TrackerResult {
            complete: stats.complete,
            incomplete: stats.incomplete,
            downloaded: stats.downloaded,
            scraped_date: now.max(previous),
            extra,
        },
    );

    metrics::SCRAPE_ATTEMPTS
        .with_label_values(&["tracker", "success"])
        .inc();
    Ok(())
}

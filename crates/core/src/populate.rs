//! Seeding of the record collection from a local JSON file.
//!
//! Compares the file against the collection by `_id` and writes only the
//! records the store does not have yet. Existing records are never
//! overwritten, so seeding is safe to repeat.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::record::Record;
use crate::store::{CollectionPaths, RecordStore, StoreError};

/// Errors seeding the collection.
#[derive(Debug, Error)]
pub enum PopulateError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("record store error: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of a seeding pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopulateReport {
    /// Records already in the collection.
    pub existing: usize,
    /// Records in the seed file.
    pub seeded: usize,
    /// Records written.
    pub written: usize,
}

/// Read a JSON array of records.
pub async fn load_seed_records(path: &Path) -> Result<Vec<Record>, PopulateError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PopulateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| PopulateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write every record in `records` whose id is missing from the collection.
///
/// Records are written in file order; a repeated id in the file is written
/// once. The first failed write stops the pass.
pub async fn populate(
    store: &dyn RecordStore,
    paths: &CollectionPaths,
    records: Vec<Record>,
) -> Result<PopulateReport, PopulateError> {
    let existing: HashSet<String> = store
        .fetch_all(&paths.all())
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();

    let mut report = PopulateReport {
        existing: existing.len(),
        seeded: records.len(),
        written: 0,
    };

    let mut seen = HashSet::new();
    let missing: Vec<Record> = records
        .into_iter()
        .filter(|r| !existing.contains(&r.id) && seen.insert(r.id.clone()))
        .collect();

    info!(
        existing = report.existing,
        seeded = report.seeded,
        missing = missing.len(),
        "Seeding record collection"
    );

    for record in &missing {
        store.put(&paths.put(), record).await?;
        debug!(id = %record.id, "Seeded record");
        report.written += 1;
    }

    info!(written = report.written, "Seeding finished");
    Ok(report)
}

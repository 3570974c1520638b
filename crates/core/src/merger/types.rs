//! Correction and extra-tracker inputs for the update merger.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading merger inputs.
#[derive(Debug, Error)]
pub enum MergeError {
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
}

/// Externally sourced values for a record's descriptive fields.
///
/// Absent fields never overwrite stored values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub created_unix: Option<i64>,
}

/// Corrections keyed by record id.
#[derive(Debug, Clone, Default)]
pub struct CorrectionSet {
    by_id: HashMap<String, Correction>,
}

impl CorrectionSet {
    /// Build from a list; a later entry for the same id replaces an earlier one.
    pub fn new(corrections: impl IntoIterator<Item = Correction>) -> Self {
        Self {
            by_id: corrections
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
        }
    }

    /// Load a JSON array of correction records.
    pub async fn load(path: &Path) -> Result<Self, MergeError> {
        let corrections: Vec<Correction> = read_json(path).await?;
        Ok(Self::new(corrections))
    }

    pub fn get(&self, id: &str) -> Option<&Correction> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Announce URLs to add to every merged record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraTrackers {
    urls: Vec<String>,
}

impl ExtraTrackers {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a JSON array of announce URLs.
    pub async fn load(path: &Path) -> Result<Self, MergeError> {
        let urls: Vec<String> = read_json(path).await?;
        Ok(Self { urls })
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// What a merge changed on one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Descriptive fields overwritten from a correction.
    pub fields_updated: Vec<&'static str>,
    /// Announce URLs appended.
    pub trackers_added: usize,
}

impl MergeReport {
    pub fn is_unchanged(&self) -> bool {
        self.fields_updated.is_empty() && self.trackers_added == 0
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, MergeError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| MergeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| MergeError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

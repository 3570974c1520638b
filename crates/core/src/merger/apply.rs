//! Merge logic.

use std::path::Path;

use tracing::debug;

use super::{Correction, CorrectionSet, ExtraTrackers, MergeError, MergeReport};
use crate::record::Record;

/// Overwrite descriptive fields that are absent or differ from the
/// correction. Returns the names of the fields that changed.
pub fn apply_correction(record: &mut Record, correction: &Correction) -> Vec<&'static str> {
    let mut updated = Vec::new();

    if replace_if_differs(&mut record.name, &correction.name) {
        updated.push("name");
    }
    if replace_if_differs(&mut record.link, &correction.link) {
        updated.push("link");
    }
    if replace_if_differs(&mut record.kind, &correction.kind) {
        updated.push("type");
    }
    if replace_if_differs(&mut record.size_bytes, &correction.size_bytes) {
        updated.push("size_bytes");
    }
    if replace_if_differs(&mut record.created_unix, &correction.created_unix) {
        updated.push("created_unix");
    }

    updated
}

/// Append announce URLs not already present, keeping first-appearance order.
pub fn append_trackers(record: &mut Record, extra: &[String]) -> usize {
    let mut added = 0;
    for announce in extra {
        if !record.has_tracker(announce) {
            record.trackers.push(announce.clone());
            debug!(id = %record.id, tracker = %announce, "Added tracker");
            added += 1;
        }
    }
    added
}

fn replace_if_differs<T: Clone + PartialEq>(current: &mut Option<T>, incoming: &Option<T>) -> bool {
    match incoming {
        Some(value) if current.as_ref() != Some(value) => {
            *current = Some(value.clone());
            true
        }
        _ => false,
    }
}

/// Corrections and extra trackers loaded for one run.
#[derive(Debug, Clone, Default)]
pub struct UpdateMerger {
    corrections: CorrectionSet,
    extra_trackers: ExtraTrackers,
}

impl UpdateMerger {
    pub fn new(corrections: CorrectionSet, extra_trackers: ExtraTrackers) -> Self {
        Self {
            corrections,
            extra_trackers,
        }
    }

    /// Load whichever input files are configured.
    pub async fn load(
        trackers_file: Option<&Path>,
        updates_file: Option<&Path>,
    ) -> Result<Self, MergeError> {
        let extra_trackers = match trackers_file {
            Some(path) => {
                let trackers = ExtraTrackers::load(path).await?;
                debug!("Loaded {} trackers", trackers.len());
                trackers
            }
            None => ExtraTrackers::default(),
        };

        let corrections = match updates_file {
            Some(path) => {
                let corrections = CorrectionSet::load(path).await?;
                debug!("Loaded {} updates", corrections.len());
                corrections
            }
            None => CorrectionSet::default(),
        };

        Ok(Self::new(corrections, extra_trackers))
    }

    pub fn corrections(&self) -> &CorrectionSet {
        &self.corrections
    }

    pub fn extra_trackers(&self) -> &ExtraTrackers {
        &self.extra_trackers
    }

    /// Apply extra trackers, then the record's correction if one exists.
    pub fn merge(&self, record: &mut Record) -> MergeReport {
        let trackers_added = append_trackers(record, self.extra_trackers.urls());
        let fields_updated = match self.corrections.get(&record.id) {
            Some(correction) => apply_correction(record, correction),
            None => Vec::new(),
        };
        MergeReport {
            fields_updated,
            trackers_added,
        }
    }
}

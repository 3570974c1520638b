//! Deterministic work splitting across scraper workers.
//!
//! Every worker loads the same sorted snapshot and takes one contiguous
//! slice of it. Membership can shift between runs when the total record
//! count changes.

use std::ops::Range;

use serde::Serialize;
use thiserror::Error;

use crate::record::Record;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShardError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("worker index {index} is outside 1..={count}")]
    IndexOutOfRange { index: usize, count: usize },
}

/// This worker's position in the fleet. `worker_index` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShardAssignment {
    worker_count: usize,
    worker_index: usize,
}

impl ShardAssignment {
    pub fn new(worker_count: usize, worker_index: usize) -> Result<Self, ShardError> {
        if worker_count == 0 {
            return Err(ShardError::NoWorkers);
        }
        if worker_index == 0 || worker_index > worker_count {
            return Err(ShardError::IndexOutOfRange {
                index: worker_index,
                count: worker_count,
            });
        }
        Ok(Self {
            worker_count,
            worker_index,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn worker_index(&self) -> usize {
        self.worker_index
    }

    /// Index range of this worker's slice within `total` records.
    pub fn bounds(&self, total: usize) -> Range<usize> {
        shard_bounds(total, self.worker_count, self.worker_index)
    }
}

/// `[size * (index - 1), size * index)` clamped to `total`, where
/// `size = ceil(total / count)`.
pub fn shard_bounds(total: usize, worker_count: usize, worker_index: usize) -> Range<usize> {
    if worker_count == 0 || worker_index == 0 {
        return 0..0;
    }
    let size = total.div_ceil(worker_count);
    let start = size.saturating_mul(worker_index - 1).min(total);
    let end = size.saturating_mul(worker_index).min(total);
    start..end
}

/// Sort records by id so every worker sees the same order.
pub fn sort_records(records: &mut [Record]) {
    records.sort_by(|a, b| a.id.cmp(&b.id));
}

/// This worker's slice of an already sorted record set.
pub fn select_shard<'a>(records: &'a [Record], assignment: &ShardAssignment) -> &'a [Record] {
    &records[assignment.bounds(records.len())]
}

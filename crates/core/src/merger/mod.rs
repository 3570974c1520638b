//! Update merger.
//!
//! Applies externally supplied corrections to descriptive record fields and
//! appends extra announce URLs to each record's tracker list.

mod apply;
mod types;

pub use apply::{append_trackers, apply_correction, UpdateMerger};
pub use types::*;

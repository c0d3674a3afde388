// SPDX-License-Identifier: MIT

//! A dataset's unit of parallel work (spec section 3.2, grounded on
//! `dataset.py`'s `Partition`): which dataset it belongs to, its index,
//! and (for datasets computed from others) the source partition(s) it
//! recomputes from.

use bndl_core::{DatasetId, WorkerName};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Partition {
    pub dataset_id: DatasetId,
    pub idx: usize,
    /// Source partition(s) this partition recomputes from, e.g. the two
    /// sides zipped by `zip_partitions` or the union branch a unioned
    /// partition came from. Empty for a dataset with no upstream source
    /// (`Lineage::Iterable`).
    pub sources: Vec<Arc<Partition>>,
    /// The worker last known to hold this partition's materialized output,
    /// set once a cache write-through lands (spec section 4.6's `cache`).
    pub cache_loc: Option<WorkerName>,
}

impl Partition {
    pub fn new(dataset_id: DatasetId, idx: usize) -> Self {
        Self { dataset_id, idx, sources: Vec::new(), cache_loc: None }
    }

    pub fn with_sources(dataset_id: DatasetId, idx: usize, sources: Vec<Arc<Partition>>) -> Self {
        Self { dataset_id, idx, sources, cache_loc: None }
    }
}

#[cfg(test)]
#[path = "partition_tests.rs"]
mod tests;

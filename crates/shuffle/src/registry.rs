// SPDX-License-Identifier: MIT

//! Per-worker storage for shuffle buckets, keyed by writer dataset and
//! destination partition index (spec section 4.7's "Memory" paragraph,
//! grounded on `dataset.py`'s `ShuffleWritingPartition._ensure_buckets`).
//!
//! The original lazily allocates a worker's bucket vector the first time
//! any source partition touches it, with a `# TODO lock` marking that
//! concurrent partition-write tasks race on that allocation. Allocation
//! and every subsequent write here run under one lock instead.

use crate::bucket::{Bucket, BucketKind};
use crate::combiner::Combiner;
use bndl_core::DatasetId;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Default)]
pub struct BucketRegistry {
    buckets: Mutex<HashMap<DatasetId, Vec<Bucket>>>,
}

impl BucketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `value` into bucket `idx` of `dataset_id`'s bucket vector,
    /// allocating the vector (sized `pcount`, every slot of kind `kind`) on
    /// first touch.
    pub fn insert(&self, dataset_id: DatasetId, pcount: usize, kind: BucketKind, idx: usize, value: Value) {
        let mut buckets = self.buckets.lock();
        let slots = buckets.entry(dataset_id).or_insert_with(|| (0..pcount.max(1)).map(|_| Bucket::new(kind)).collect());
        if let Some(bucket) = slots.get_mut(idx) {
            bucket.insert(value);
        }
    }

    /// Reduce every non-empty bucket of `dataset_id` with `combiner`,
    /// matching the writer's post-ingest `comb` pass.
    pub fn combine(&self, dataset_id: DatasetId, combiner: &dyn Combiner) {
        let mut buckets = self.buckets.lock();
        if let Some(slots) = buckets.get_mut(&dataset_id) {
            for bucket in slots.iter_mut().filter(|b| !b.is_empty()) {
                bucket.combine(combiner);
            }
        }
    }

    /// A snapshot of bucket `idx` for `dataset_id`, serving a reader's
    /// local-then-remote fetch.
    pub fn get(&self, dataset_id: DatasetId, idx: usize) -> Option<Bucket> {
        self.buckets.lock().get(&dataset_id).and_then(|slots| slots.get(idx)).cloned()
    }

    /// Drop every bucket belonging to `dataset_id`: the cleanup RPC
    /// fan-out a shuffle writer registers against its job.
    pub fn clear(&self, dataset_id: DatasetId) {
        self.buckets.lock().remove(&dataset_id);
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

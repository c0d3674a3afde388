// SPDX-License-Identifier: MIT

//! How a dataset's partitions were derived (spec section 9's Design Note:
//! "an enum of transformation kinds", grounded on `dataset.py`'s family of
//! `Dataset` subclasses — `TransformingDataset`, `UnionDataset`,
//! `MaskPartitionsDataset`, `ShuffleWritingDataset`, `ShuffleReadingDataset`,
//! `ZipPartitionsDataset`, `CachedDataset` — collapsed into one tagged
//! union instead of a class per kind).

use crate::dataset::Dataset;
use bndl_shuffle::{BucketKind, PartitionerSpec};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub enum Lineage {
    /// A literal, driver-supplied collection with no upstream source.
    Iterable { elements: Arc<Vec<Value>> },
    /// One partition's worth of `src`, run through a named
    /// [`crate::transform::PartitionTransform`] and its captured payload.
    /// Backs `map`/`filter`/`flatmap`/`key_by`/`glom`/`concat`/`map_partitions`.
    MapPartitions { src: Arc<Dataset>, decoder: String, payload: Value },
    /// `left`'s and `right`'s partitions paired up positionally and run
    /// through a named [`crate::zip::ZipTransform`].
    Zip { left: Arc<Dataset>, right: Arc<Dataset>, decoder: String, payload: Value },
    /// Every source's partitions, concatenated in order.
    Union { sources: Vec<Arc<Dataset>> },
    /// A subset (and possible reordering) of `src`'s partitions.
    Mask { src: Arc<Dataset>, partitions: Vec<usize> },
    /// A shuffle-barrier stage boundary: every `src` partition's `[key,
    /// value]` records get routed into `pcount` per-destination buckets.
    /// Requires a synchronization point — every writer task must finish
    /// before any reader task starts.
    ShuffleWrite { src: Arc<Dataset>, pcount: usize, partitioner: PartitionerSpec, bucket_kind: BucketKind, comb: Option<String> },
    /// Reads back the bucket `writer` routed to this partition's index,
    /// local-first then fanned out to every other worker that wrote one.
    ShuffleRead { writer: Arc<Dataset> },
    /// `src`, materialized once and served from cache on every subsequent
    /// read instead of recomputed.
    Cached { src: Arc<Dataset> },
}

impl Lineage {
    /// Whether a scheduler must treat this dataset's construction as a
    /// stage boundary (every upstream task must finish before any
    /// downstream task starts), rather than something that can be pipelined
    /// into the same task as its source.
    pub fn requires_sync(&self) -> bool {
        matches!(self, Lineage::ShuffleWrite { .. })
    }
}

#[cfg(test)]
#[path = "lineage_tests.rs"]
mod tests;

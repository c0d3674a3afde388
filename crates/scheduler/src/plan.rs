// SPDX-License-Identifier: MIT

//! A serializable projection of a [`bndl_dataset::Dataset`]'s lineage (spec
//! section 4.8's backward lineage walk), built once per job on the driver
//! and shipped to workers so a task can materialize its partition without
//! holding a live `Arc<Dataset>` — process-local pointers that [`Lineage`]
//! embeds and that cannot cross the wire.
//!
//! [`LineagePlan::ShuffleRead`] carries only the writer's `DatasetId`, not
//! its nested plan: by the time a reader-stage task runs, the writer stage
//! already completed and its buckets exist keyed by that id on every
//! worker, so there is nothing left upstream of a shuffle read worth
//! re-describing. This is exactly where [`plan_dataset`] stops recursing,
//! matching the stage boundary [`crate::build::build_job`] cuts at the same
//! point.

use bndl_core::DatasetId;
use bndl_dataset::{Dataset, Lineage};
use bndl_shuffle::{BucketKind, PartitionerSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LineagePlan {
    Iterable { elements: Arc<Vec<Value>> },
    MapPartitions { src: Arc<DatasetPlan>, decoder: String, payload: Value },
    Zip { left: Arc<DatasetPlan>, right: Arc<DatasetPlan>, decoder: String, payload: Value },
    Union { sources: Vec<Arc<DatasetPlan>> },
    Mask { src: Arc<DatasetPlan>, partitions: Vec<usize> },
    ShuffleWrite { src: Arc<DatasetPlan>, pcount: usize, partitioner: PartitionerSpec, bucket_kind: BucketKind, comb: Option<String> },
    ShuffleRead { writer_dataset_id: DatasetId, bucket_kind: BucketKind },
    Cached { src: Arc<DatasetPlan> },
}

/// The wire-shaped counterpart to [`Dataset`], keyed by [`DatasetId`]
/// instead of holding `Arc<Dataset>`. Every decoder/combiner name inside
/// must already be registered under the same name on the receiving worker
/// (see `bndl_dataset::Registries`) — Rust has no way to pickle an
/// arbitrary closure across a process boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetPlan {
    pub id: DatasetId,
    pub pcount: usize,
    pub lineage: LineagePlan,
}

/// Walk `ds`'s lineage into a serializable plan, recursing through every
/// pipeline-fusible (non-barrier) source and stopping at a
/// [`Lineage::ShuffleRead`], whose writer is described only by id.
pub fn plan_dataset(ds: &Dataset) -> DatasetPlan {
    let lineage = match &ds.lineage {
        Lineage::Iterable { elements } => LineagePlan::Iterable { elements: elements.clone() },
        Lineage::MapPartitions { src, decoder, payload } => {
            LineagePlan::MapPartitions { src: Arc::new(plan_dataset(src)), decoder: decoder.clone(), payload: payload.clone() }
        }
        Lineage::Zip { left, right, decoder, payload } => LineagePlan::Zip {
            left: Arc::new(plan_dataset(left)),
            right: Arc::new(plan_dataset(right)),
            decoder: decoder.clone(),
            payload: payload.clone(),
        },
        Lineage::Union { sources } => LineagePlan::Union { sources: sources.iter().map(|s| Arc::new(plan_dataset(s))).collect() },
        Lineage::Mask { src, partitions } => LineagePlan::Mask { src: Arc::new(plan_dataset(src)), partitions: partitions.clone() },
        Lineage::ShuffleWrite { src, pcount, partitioner, bucket_kind, comb } => LineagePlan::ShuffleWrite {
            src: Arc::new(plan_dataset(src)),
            pcount: *pcount,
            partitioner: partitioner.clone(),
            bucket_kind: *bucket_kind,
            comb: comb.clone(),
        },
        Lineage::ShuffleRead { writer } => {
            let bucket_kind = match &writer.lineage {
                Lineage::ShuffleWrite { bucket_kind, .. } => *bucket_kind,
                _ => BucketKind::List,
            };
            LineagePlan::ShuffleRead { writer_dataset_id: writer.id(), bucket_kind }
        }
        Lineage::Cached { src } => LineagePlan::Cached { src: Arc::new(plan_dataset(src)) },
    };
    DatasetPlan { id: ds.id(), pcount: ds.pcount(), lineage }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;

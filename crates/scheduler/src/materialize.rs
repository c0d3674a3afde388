// SPDX-License-Identifier: MIT

//! Local partition materialization: given a [`DatasetPlan`] and a partition
//! index, recompute that partition's elements by recursing through its
//! non-barrier sources and running the named transforms a worker already
//! has registered (spec section 4.6/4.7, grounded on `dataset.py`'s
//! `Partition.compute`).
//!
//! This is the one piece of code both [`crate::executor::TaskExecutorService`]
//! (materializing a task's output) and a shuffle-write task (routing a
//! source partition into destination buckets before any of it is read)
//! share.

use crate::plan::{DatasetPlan, LineagePlan};
use bndl_core::BndlError;
use bndl_dataset::{Partition, PartitionIter, Registries};
use bndl_net::PeerRegistry;
use bndl_shuffle::{BucketRegistry, ShuffleReader, ShuffleWriter};
use bndl_store::CacheProvider;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

type MaterializeFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Value>, BndlError>> + Send + 'a>>;

pub struct Materializer {
    registries: Registries,
    buckets: Arc<BucketRegistry>,
    peers: PeerRegistry,
    cache: Arc<CacheProvider>,
    shuffle_timeout: Duration,
}

impl Materializer {
    pub fn new(registries: Registries, buckets: Arc<BucketRegistry>, peers: PeerRegistry, cache: Arc<CacheProvider>, shuffle_timeout: Duration) -> Self {
        Self { registries, buckets, peers, cache, shuffle_timeout }
    }

    /// Recompute partition `idx` of `plan`. Boxed because the lineage walk
    /// recurses through an async fn, which Rust cannot size otherwise.
    pub fn materialize<'a>(&'a self, plan: &'a DatasetPlan, idx: usize) -> MaterializeFuture<'a> {
        Box::pin(async move {
            match &plan.lineage {
                LineagePlan::Iterable { elements } => Ok(iterable_slice(elements, plan.pcount, idx)),

                LineagePlan::MapPartitions { src, decoder, payload } => {
                    let input = self.materialize(src, idx).await?;
                    let partition = Partition::new(plan.id, idx);
                    let iter: PartitionIter = Box::new(input.into_iter());
                    let out = self.registries.transforms.apply(decoder, &partition, payload, iter)?;
                    Ok(out.collect())
                }

                LineagePlan::Zip { left, right, decoder, payload } => {
                    let (l, r) = (self.materialize(left, idx).await?, self.materialize(right, idx).await?);
                    let partition = Partition::new(plan.id, idx);
                    let left_iter: PartitionIter = Box::new(l.into_iter());
                    let right_iter: PartitionIter = Box::new(r.into_iter());
                    let out = self.registries.zips.apply(decoder, &partition, payload, left_iter, right_iter)?;
                    Ok(out.collect())
                }

                LineagePlan::Union { sources } => {
                    let mut remaining = idx;
                    for src in sources {
                        if remaining < src.pcount {
                            return self.materialize(src, remaining).await;
                        }
                        remaining -= src.pcount;
                    }
                    Err(BndlError::ProtocolError(format!("union partition {idx} out of range")))
                }

                LineagePlan::Mask { src, partitions } => {
                    let src_idx = *partitions
                        .get(idx)
                        .ok_or_else(|| BndlError::ProtocolError(format!("mask partition {idx} out of range")))?;
                    self.materialize(src, src_idx).await
                }

                LineagePlan::ShuffleWrite { .. } => {
                    Err(BndlError::ProtocolError("a shuffle-write dataset has no readable partitions; run its write task instead".into()))
                }

                LineagePlan::ShuffleRead { writer_dataset_id, bucket_kind } => {
                    let reader = ShuffleReader::new(self.buckets.clone(), self.peers.clone());
                    reader.read(*writer_dataset_id, *bucket_kind, idx, self.shuffle_timeout).await
                }

                LineagePlan::Cached { src } => {
                    let obj_key = idx.to_string();
                    if self.cache.contains(&plan.id, &obj_key) {
                        let bytes = self.cache.read(plan.id, &obj_key)?;
                        return decode_values(&bytes);
                    }
                    let values = self.materialize(src, idx).await?;
                    let bytes = encode_values(&values)?;
                    self.cache
                        .write(plan.id, obj_key, bytes)
                        .map_err(|e| BndlError::ProtocolError(format!("failed to write cached partition: {e}")))?;
                    Ok(values)
                }
            }
        })
    }

    /// Run one shuffle-write task: materialize `plan`'s source partition
    /// `idx` and route every `[key, value]` record into this write's
    /// destination buckets.
    pub async fn run_shuffle_write(&self, plan: &DatasetPlan, idx: usize) -> Result<(), BndlError> {
        let LineagePlan::ShuffleWrite { src, pcount, partitioner, bucket_kind, comb } = &plan.lineage else {
            return Err(BndlError::ProtocolError("run_shuffle_write called on a non-ShuffleWrite plan".into()));
        };
        let records = self.materialize(src, idx).await?;
        let combiner = match comb {
            Some(name) => Some(
                self.registries
                    .combiners
                    .get(name)
                    .ok_or_else(|| BndlError::TaskFailure(format!("no combiner registered for {name:?}")))?,
            ),
            None => None,
        };
        let writer = ShuffleWriter::new(plan.id, *pcount, partitioner.clone(), *bucket_kind, combiner, self.buckets.clone());
        writer.write_partition(records)
    }
}

/// Divide `elements` into `pcount` near-equal contiguous slices and return
/// slice `idx`, mirroring `dataset.py`'s `IterableDataset.partition_data`.
fn iterable_slice(elements: &[Value], pcount: usize, idx: usize) -> Vec<Value> {
    let pcount = pcount.max(1);
    let len = elements.len();
    let base = len / pcount;
    let extra = len % pcount;
    let start = idx * base + idx.min(extra);
    let end = start + base + usize::from(idx < extra);
    elements.get(start..end.min(len)).map(|s| s.to_vec()).unwrap_or_default()
}

fn encode_values(values: &[Value]) -> Result<Vec<u8>, BndlError> {
    serde_json::to_vec(values).map_err(|e| BndlError::ProtocolError(format!("failed to encode cached partition: {e}")))
}

fn decode_values(bytes: &[u8]) -> Result<Vec<Value>, BndlError> {
    serde_json::from_slice(bytes).map_err(|e| BndlError::ProtocolError(format!("failed to decode cached partition: {e}")))
}

#[cfg(test)]
#[path = "materialize_tests.rs"]
mod tests;

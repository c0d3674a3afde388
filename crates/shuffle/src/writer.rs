// SPDX-License-Identifier: MIT

//! The writer half of a shuffle (spec section 4.7, grounded on
//! `dataset.py`'s `ShuffleWritingDataset`/`ShuffleWritingPartition`).

use crate::bucket::BucketKind;
use crate::combiner::Combiner;
use crate::partitioner::PartitionerSpec;
use crate::registry::BucketRegistry;
use bndl_core::{BndlError, DatasetId};
use serde_json::Value;
use std::sync::Arc;

/// Ingests one source partition's `(key, value)` records into this
/// shuffle's destination buckets on the local worker.
pub struct ShuffleWriter {
    dataset_id: DatasetId,
    pcount: usize,
    partitioner: PartitionerSpec,
    bucket_kind: BucketKind,
    combiner: Option<Arc<dyn Combiner>>,
    registry: Arc<BucketRegistry>,
}

impl ShuffleWriter {
    pub fn new(
        dataset_id: DatasetId,
        pcount: usize,
        partitioner: PartitionerSpec,
        bucket_kind: BucketKind,
        combiner: Option<Arc<dyn Combiner>>,
        registry: Arc<BucketRegistry>,
    ) -> Self {
        Self { dataset_id, pcount, partitioner, bucket_kind, combiner, registry }
    }

    /// Route every `[key, value]` record into `partitioner(key) mod
    /// pcount`, then, if a combiner is configured, reduce every bucket
    /// this call touched. `pcount == 0` is the degenerate case: every
    /// record collapses into bucket 0 regardless of key, and the combiner
    /// runs over the whole stream.
    pub fn write_partition<I>(&self, records: I) -> Result<(), BndlError>
    where
        I: IntoIterator<Item = Value>,
    {
        let pcount = self.pcount.max(1);
        for record in records {
            let (key, value) = split_pair(&record)?;
            let idx = if self.pcount == 0 { 0 } else { self.partitioner.partition(&key, pcount) };
            self.registry.insert(self.dataset_id, pcount, self.bucket_kind, idx, value);
        }
        if let Some(combiner) = &self.combiner {
            self.registry.combine(self.dataset_id, combiner.as_ref());
        }
        Ok(())
    }
}

fn split_pair(record: &Value) -> Result<(Value, Value), BndlError> {
    match record.as_array() {
        Some(pair) if pair.len() == 2 => Ok((pair[0].clone(), pair[1].clone())),
        _ => Err(BndlError::ProtocolError(format!("shuffle record is not a [key, value] pair: {record}"))),
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;

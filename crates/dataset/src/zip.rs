// SPDX-License-Identifier: MIT

//! Positional pairing of two partitions (spec section 4.6's
//! `zip_partitions(other, comb)`, grounded on `dataset.py`'s
//! `ZipPartitionsDataset`). `comb` takes two full iterators rather than
//! one, so it gets its own small named registry instead of reusing
//! [`crate::transform::TransformRegistry`].

use crate::partition::Partition;
use crate::transform::PartitionIter;
use bndl_core::BndlError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub trait ZipTransform: Send + Sync {
    fn apply(&self, partition: &Partition, payload: &Value, left: PartitionIter, right: PartitionIter) -> Result<PartitionIter, BndlError>;
}

impl<F> ZipTransform for F
where
    F: Fn(&Partition, &Value, PartitionIter, PartitionIter) -> Result<PartitionIter, BndlError> + Send + Sync,
{
    fn apply(&self, partition: &Partition, payload: &Value, left: PartitionIter, right: PartitionIter) -> Result<PartitionIter, BndlError> {
        self(partition, payload, left, right)
    }
}

#[derive(Default, Clone)]
pub struct ZipRegistry {
    transforms: Arc<parking_lot::RwLock<HashMap<String, Arc<dyn ZipTransform>>>>,
}

impl ZipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, transform: Arc<dyn ZipTransform>) {
        self.transforms.write().insert(name.into(), transform);
    }

    pub fn apply(&self, name: &str, partition: &Partition, payload: &Value, left: PartitionIter, right: PartitionIter) -> Result<PartitionIter, BndlError> {
        let transform = self
            .transforms
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| BndlError::TaskFailure(format!("no named zip transform registered for {name:?}")))?;
        transform.apply(partition, payload, left, right)
    }
}

#[cfg(test)]
#[path = "zip_tests.rs"]
mod tests;

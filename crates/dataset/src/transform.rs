// SPDX-License-Identifier: MIT

//! Partition-mapping closures, registered by name instead of serialized
//! (spec.md section 9's Design Note: "the closure itself is a serialized
//! bytestring plus a decoder identifier"). Grounded on `dataset.py`'s
//! `TransformingDataset`, whose single `func(partition, iterator)`
//! argument covers `map`/`filter`/`flatmap`/`glom`/`concat`/`key_by`/etc;
//! here that argument is a named, pre-registered [`PartitionTransform`]
//! plus a JSON `payload` carrying whatever the closure captured (a
//! separator, a constant, nothing at all).
//!
//! Mirrors `bndl-accumulator`'s `NamedOpRegistry`: Rust has no equivalent
//! of pickling an arbitrary closure across a process boundary, so the
//! transform body must already exist, under the same name, in every
//! worker process before a task referencing it runs.

use crate::partition::Partition;
use bndl_core::BndlError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub type PartitionIter = Box<dyn Iterator<Item = Value> + Send>;

pub trait PartitionTransform: Send + Sync {
    /// Apply this transform to one partition's input elements, given the
    /// payload captured when the transform was attached to a dataset
    /// (e.g. `concat`'s separator, `key_by`'s nothing).
    fn apply(&self, partition: &Partition, payload: &Value, input: PartitionIter) -> Result<PartitionIter, BndlError>;
}

impl<F> PartitionTransform for F
where
    F: Fn(&Partition, &Value, PartitionIter) -> Result<PartitionIter, BndlError> + Send + Sync,
{
    fn apply(&self, partition: &Partition, payload: &Value, input: PartitionIter) -> Result<PartitionIter, BndlError> {
        self(partition, payload, input)
    }
}

#[derive(Default, Clone)]
pub struct TransformRegistry {
    transforms: Arc<parking_lot::RwLock<HashMap<String, Arc<dyn PartitionTransform>>>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, transform: Arc<dyn PartitionTransform>) {
        self.transforms.write().insert(name.into(), transform);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PartitionTransform>> {
        self.transforms.read().get(name).cloned()
    }

    pub fn apply(&self, name: &str, partition: &Partition, payload: &Value, input: PartitionIter) -> Result<PartitionIter, BndlError> {
        let transform = self
            .get(name)
            .ok_or_else(|| BndlError::TaskFailure(format!("no named partition transform registered for {name:?}")))?;
        transform.apply(partition, payload, input)
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;

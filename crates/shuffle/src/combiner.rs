// SPDX-License-Identifier: MIT

//! User-supplied bucket reduction (spec section 4.7's writer-side `comb`,
//! grounded on `dataset.py`'s `aggregate`/`combine_by_key`). `comb` only
//! ever runs locally, inside the worker that owns the bucket, so it is
//! registered by name the same way `bndl-accumulator`'s named operators
//! are rather than serialized across the wire.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub trait Combiner: Send + Sync {
    /// Fold a non-empty bucket's elements down to a single value.
    fn combine(&self, values: Vec<Value>) -> Value;
}

impl<F> Combiner for F
where
    F: Fn(Vec<Value>) -> Value + Send + Sync,
{
    fn combine(&self, values: Vec<Value>) -> Value {
        self(values)
    }
}

#[derive(Default, Clone)]
pub struct CombinerRegistry {
    combiners: Arc<parking_lot::RwLock<HashMap<String, Arc<dyn Combiner>>>>,
}

impl CombinerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, combiner: Arc<dyn Combiner>) {
        self.combiners.write().insert(name.into(), combiner);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Combiner>> {
        self.combiners.read().get(name).cloned()
    }
}

#[cfg(test)]
#[path = "combiner_tests.rs"]
mod tests;

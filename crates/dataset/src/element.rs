// SPDX-License-Identifier: MIT

//! Per-element functions, the building block `map`/`filter`/`flatmap`/
//! `key_by` all reduce to (spec section 4.6, grounded on `dataset.py`'s
//! `map`/`filter`/`flatmap`, each defined as `map_partitions(partial(...,
//! func))` around one per-element `func`). Registered by name for the same
//! reason [`crate::transform::PartitionTransform`] is: the function has to
//! already exist, identically, in the worker process that runs it.

use bndl_core::BndlError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub trait ElementFn: Send + Sync {
    /// Zero or more outputs for one input element: empty drops it
    /// (`filter`), one transforms it (`map`, `key_by`), more than one
    /// expands it (`flatmap`).
    fn apply(&self, element: &Value) -> Result<Vec<Value>, BndlError>;
}

impl<F> ElementFn for F
where
    F: Fn(&Value) -> Result<Vec<Value>, BndlError> + Send + Sync,
{
    fn apply(&self, element: &Value) -> Result<Vec<Value>, BndlError> {
        self(element)
    }
}

#[derive(Default, Clone)]
pub struct ElementRegistry {
    functions: Arc<parking_lot::RwLock<HashMap<String, Arc<dyn ElementFn>>>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, f: Arc<dyn ElementFn>) {
        self.functions.write().insert(name.into(), f);
    }

    pub fn apply(&self, name: &str, element: &Value) -> Result<Vec<Value>, BndlError> {
        let f = self
            .functions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| BndlError::TaskFailure(format!("no named element function registered for {name:?}")))?;
        f.apply(element)
    }
}

#[cfg(test)]
#[path = "element_tests.rs"]
mod tests;

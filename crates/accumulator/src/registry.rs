// SPDX-License-Identifier: MIT

//! A runtime registry of named-operator appliers, replacing the original's
//! `getattr(accumulator.value, op)(value)` dynamic dispatch (spec.md §9
//! Design Note: Rust has no generic runtime method lookup, so named ops
//! are registered ahead of time by whoever defines the accumulator).

use bndl_core::BndlError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub trait NamedOpApplier: Send + Sync {
    fn apply(&self, current: &Value, delta: &Value) -> Result<Value, BndlError>;
}

impl<F> NamedOpApplier for F
where
    F: Fn(&Value, &Value) -> Result<Value, BndlError> + Send + Sync,
{
    fn apply(&self, current: &Value, delta: &Value) -> Result<Value, BndlError> {
        self(current, delta)
    }
}

#[derive(Default, Clone)]
pub struct NamedOpRegistry {
    appliers: Arc<parking_lot::RwLock<HashMap<String, Arc<dyn NamedOpApplier>>>>,
}

impl NamedOpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, applier: Arc<dyn NamedOpApplier>) {
        self.appliers.write().insert(name.into(), applier);
    }

    pub fn apply(&self, name: &str, current: &Value, delta: &Value) -> Result<Value, BndlError> {
        let applier = self
            .appliers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| BndlError::TaskFailure(format!("no named accumulator operator registered for {name:?}")))?;
        applier.apply(current, delta)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

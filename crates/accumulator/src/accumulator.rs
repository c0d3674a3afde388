// SPDX-License-Identifier: MIT

//! The driver-resident accumulator value itself (spec section 4.4,
//! grounded on `accumulate.py`'s `Accumulator`).

use crate::op::{apply_fixed, AccumOp};
use crate::registry::NamedOpRegistry;
use bndl_core::{AccumulatorId, BndlError, WorkerName};
use parking_lot::Mutex;
use serde_json::Value;

/// A value on which commutative/associative updates are applied from
/// remote workers, at-least-once, and read back on the driver.
pub struct Accumulator {
    pub id: AccumulatorId,
    /// The worker (driver) this accumulator lives on; proxies address
    /// their updates here.
    pub host: WorkerName,
    value: Mutex<Value>,
}

impl Accumulator {
    pub fn new(host: WorkerName, initial: Value) -> Self {
        Self { id: AccumulatorId::new(), host, value: Mutex::new(initial) }
    }

    pub fn value(&self) -> Value {
        self.value.lock().clone()
    }

    pub fn set(&self, value: Value) {
        *self.value.lock() = value;
    }

    /// Apply one update in place, taking the registry of named-op
    /// appliers for the case `op` isn't one of the eight fixed operators.
    pub fn apply(&self, op: &AccumOp, delta: &Value, registry: &NamedOpRegistry) -> Result<(), BndlError> {
        let mut value = self.value.lock();
        let updated = if op.is_fixed() { apply_fixed(op, &value, delta)? } else { registry.apply(&op.code(), &value, delta)? };
        *value = updated;
        Ok(())
    }
}

#[cfg(test)]
#[path = "accumulator_tests.rs"]
mod tests;

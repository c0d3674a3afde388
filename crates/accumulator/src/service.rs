// SPDX-License-Identifier: MIT

//! The RMI-facing half of the accumulator subsystem: the driver registers
//! this once and workers' [`crate::proxy::AccumulatorProxy`]s call into it
//! (spec section 4.4, grounded on `accumulate.py`'s `AccumulatorService`).

use crate::accumulator::Accumulator;
use crate::op::AccumOp;
use crate::registry::NamedOpRegistry;
use async_trait::async_trait;
use bndl_core::{AccumulatorId, BndlError};
use bndl_net::{Dispatch, Service};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

pub const ACCUMULATOR_SERVICE_NAME: &str = "accumulator";

/// Holds every accumulator the driver has created, by weak reference so a
/// dropped [`Accumulator`] silently stops accepting updates instead of
/// leaking — the Rust analogue of the original's `weakref.proxy` plus
/// its deregistration callback.
#[derive(Default, Clone)]
pub struct AccumulatorService {
    accumulators: Arc<RwLock<HashMap<AccumulatorId, Weak<Accumulator>>>>,
    registry: NamedOpRegistry,
}

impl AccumulatorService {
    pub fn new(registry: NamedOpRegistry) -> Self {
        Self { accumulators: Arc::new(RwLock::new(HashMap::new())), registry }
    }

    /// Register `accumulator` by weak reference and return the handle that
    /// reclaims its entry again once dropped — the explicit replacement for
    /// the original's weakref-proxy finalizer (spec section 4.4). Callers
    /// must hold the returned handle for as long as they want updates
    /// delivered; dropping it deregisters immediately, regardless of
    /// whether `accumulator` itself is still alive.
    pub fn register_accumulator(&self, accumulator: &Arc<Accumulator>) -> AccumulatorHandle {
        self.accumulators.write().insert(accumulator.id, Arc::downgrade(accumulator));
        AccumulatorHandle { id: accumulator.id, service: self.clone() }
    }

    pub fn deregister_accumulator(&self, id: &AccumulatorId) {
        self.accumulators.write().remove(id);
    }

    fn update(&self, id: AccumulatorId, op: &AccumOp, delta: &Value) -> Result<(), BndlError> {
        let accumulator = match self.accumulators.read().get(&id).and_then(Weak::upgrade) {
            Some(a) => a,
            None => {
                tracing::debug!(%id, "received update for unknown accumulator");
                return Ok(());
            }
        };
        if let Err(e) = accumulator.apply(op, delta, &self.registry) {
            tracing::warn!(%id, error = %e, "unable to apply accumulator update");
        }
        Ok(())
    }
}

/// Deregisters its accumulator from the [`AccumulatorService`] it was
/// issued by when dropped. Carrying this alongside an `Arc<Accumulator>`
/// (rather than relying on the weak reference's own finalizer) is what
/// the redesign note in spec section 9 asks for.
pub struct AccumulatorHandle {
    id: AccumulatorId,
    service: AccumulatorService,
}

impl Drop for AccumulatorHandle {
    fn drop(&mut self) {
        self.service.deregister_accumulator(&self.id);
    }
}

#[async_trait]
impl Service for AccumulatorService {
    async fn call(&self, method: &str, args: Vec<Value>, _kwargs: HashMap<String, Value>) -> Result<Value, BndlError> {
        if method != "update_accumulator" {
            return Err(BndlError::InvocationFailure {
                peer: "driver".into(),
                method: method.to_string(),
                message: "no such method on accumulator service".into(),
                remote_trace: None,
            });
        }
        let mut args = args.into_iter();
        let id = args
            .next()
            .and_then(|v| v.as_str().map(AccumulatorId::from_string))
            .ok_or_else(|| BndlError::ProtocolError("update_accumulator expects an accumulator id".into()))?;
        let op = args
            .next()
            .and_then(|v| v.as_str().map(AccumOp::from_code))
            .ok_or_else(|| BndlError::ProtocolError("update_accumulator expects an operator code".into()))?;
        let delta = args.next().unwrap_or(Value::Null);

        self.update(id, &op, &delta)?;
        Ok(Value::Null)
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::OnDemandThread
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

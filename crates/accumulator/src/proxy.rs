// SPDX-License-Identifier: MIT

//! `AccumulatorProxy`: the handle a worker task holds to update a
//! driver-resident accumulator over RMI (spec section 4.4, grounded on
//! `accumulate.py`'s `AccumulatorProxy`/`__iadd__` family).
//!
//! Updates are sent fire-and-forget at-least-once, matching the original:
//! a task that's retried after a partial failure may apply an update more
//! than once, which is why accumulators only support commutative,
//! associative operations in the first place.

use crate::op::AccumOp;
use crate::service::ACCUMULATOR_SERVICE_NAME;
use bndl_core::{AccumulatorId, BndlError, WorkerName};
use bndl_net::PeerRegistry;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AccumulatorProxy {
    pub id: AccumulatorId,
    pub host: WorkerName,
    peers: PeerRegistry,
}

impl AccumulatorProxy {
    pub fn new(id: AccumulatorId, host: WorkerName, peers: PeerRegistry) -> Self {
        Self { id, host, peers }
    }

    pub async fn update(&self, op: AccumOp, value: Value) -> Result<(), BndlError> {
        let peer = self.peers.get_or_err(&self.host)?;
        bndl_net::call(
            &peer,
            ACCUMULATOR_SERVICE_NAME,
            "update_accumulator",
            vec![json!(self.id.to_string()), json!(op.code()), value],
            DEFAULT_UPDATE_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    pub async fn add(&self, value: Value) -> Result<(), BndlError> {
        self.update(AccumOp::Add, value).await
    }

    pub async fn sub(&self, value: Value) -> Result<(), BndlError> {
        self.update(AccumOp::Sub, value).await
    }

    pub async fn mul(&self, value: Value) -> Result<(), BndlError> {
        self.update(AccumOp::Mul, value).await
    }

    pub async fn div(&self, value: Value) -> Result<(), BndlError> {
        self.update(AccumOp::Div, value).await
    }

    pub async fn named(&self, op: impl Into<String>, value: Value) -> Result<(), BndlError> {
        self.update(AccumOp::Named(op.into()), value).await
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;

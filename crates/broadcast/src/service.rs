// SPDX-License-Identifier: MIT

//! The RMI-facing half of the broadcast subsystem: lets a seeder tell a
//! worker to drop a broadcast value's blocks (spec section 4.5, grounded
//! on `broadcast.py`'s `BroadcastManager.unpersist_broadcast_values`).

use async_trait::async_trait;
use bndl_core::{BlockName, BndlError};
use bndl_net::{Dispatch, Service};
use bndl_store::BlockStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub const BROADCAST_SERVICE_NAME: &str = "broadcast";

pub struct BroadcastService {
    block_store: Arc<BlockStore>,
}

impl BroadcastService {
    pub fn new(block_store: Arc<BlockStore>) -> Self {
        Self { block_store }
    }
}

#[async_trait]
impl Service for BroadcastService {
    async fn call(&self, method: &str, args: Vec<Value>, _kwargs: HashMap<String, Value>) -> Result<Value, BndlError> {
        match method {
            "unpersist_broadcast_values" => {
                let names: Vec<BlockName> = args.iter().filter_map(Value::as_str).map(BlockName::from_string).collect();
                self.block_store.remove_blocks(&names);
                Ok(Value::Null)
            }
            other => Err(BndlError::InvocationFailure {
                peer: "worker".into(),
                method: other.to_string(),
                message: "no such method on broadcast service".into(),
                remote_trace: None,
            }),
        }
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::OnDemandThread
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

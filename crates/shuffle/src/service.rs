// SPDX-License-Identifier: MIT

//! The RMI-facing half of the shuffle subsystem: lets a reader fetch a
//! remote worker's bucket, and lets the cluster clear every worker's
//! buckets for a finished job (spec section 4.7's "Reader"/"Cleanup"
//! paragraphs, grounded on `dataset.py`'s `ShuffleReadingPartition`).

use crate::registry::BucketRegistry;
use async_trait::async_trait;
use bndl_core::{BndlError, DatasetId};
use bndl_net::{Dispatch, Service};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub const SHUFFLE_SERVICE_NAME: &str = "shuffle";

pub struct ShuffleService {
    registry: Arc<BucketRegistry>,
}

impl ShuffleService {
    pub fn new(registry: Arc<BucketRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Service for ShuffleService {
    async fn call(&self, method: &str, args: Vec<Value>, _kwargs: HashMap<String, Value>) -> Result<Value, BndlError> {
        match method {
            "get_bucket" => {
                let dataset_id = parse_dataset_id(args.first())?;
                let idx = parse_index(args.get(1))?;
                let values = self.registry.get(dataset_id, idx).map(|b| b.into_values()).unwrap_or_default();
                serde_json::to_value(values).map_err(|e| BndlError::ProtocolError(format!("failed to encode shuffle bucket: {e}")))
            }
            "clear_bucket" => {
                let dataset_id = parse_dataset_id(args.first())?;
                self.registry.clear(dataset_id);
                Ok(Value::Null)
            }
            other => Err(BndlError::InvocationFailure {
                peer: "worker".into(),
                method: other.to_string(),
                message: "no such method on shuffle service".into(),
                remote_trace: None,
            }),
        }
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::OnDemandThread
    }
}

fn parse_dataset_id(arg: Option<&Value>) -> Result<DatasetId, BndlError> {
    arg.and_then(Value::as_str)
        .map(DatasetId::from_string)
        .ok_or_else(|| BndlError::ProtocolError("expected a dataset id argument".into()))
}

fn parse_index(arg: Option<&Value>) -> Result<usize, BndlError> {
    arg.and_then(Value::as_u64)
        .map(|i| i as usize)
        .ok_or_else(|| BndlError::ProtocolError("expected a bucket index argument".into()))
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

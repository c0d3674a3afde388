// SPDX-License-Identifier: MIT

//! The RMI-facing half of task execution: lets the driver ask a worker to
//! materialize a partition, or to run a shuffle-write task, by name (spec
//! section 4.8, grounded on the original's `Worker.execute_task`).

use crate::materialize::Materializer;
use crate::plan::DatasetPlan;
use async_trait::async_trait;
use bndl_core::BndlError;
use bndl_net::{Dispatch, Service};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub const TASK_SERVICE_NAME: &str = "executor";

pub struct TaskExecutorService {
    materializer: Arc<Materializer>,
}

impl TaskExecutorService {
    pub fn new(materializer: Arc<Materializer>) -> Self {
        Self { materializer }
    }
}

#[async_trait]
impl Service for TaskExecutorService {
    async fn call(&self, method: &str, args: Vec<Value>, _kwargs: HashMap<String, Value>) -> Result<Value, BndlError> {
        let plan: DatasetPlan = serde_json::from_value(args.first().cloned().unwrap_or(Value::Null))
            .map_err(|e| BndlError::ProtocolError(format!("invalid task plan: {e}")))?;
        let idx = args
            .get(1)
            .and_then(Value::as_u64)
            .ok_or_else(|| BndlError::ProtocolError("expected a partition index argument".into()))? as usize;

        match method {
            "materialize" => {
                let values = self.materializer.materialize(&plan, idx).await?;
                serde_json::to_value(values).map_err(|e| BndlError::ProtocolError(format!("failed to encode task result: {e}")))
            }
            "shuffle_write" => {
                self.materializer.run_shuffle_write(&plan, idx).await?;
                Ok(Value::Null)
            }
            // Acknowledged but not acted on: a running materialize/shuffle_write
            // call has no cancellation token to check, so it simply runs to
            // completion. The driver's cancel fan-out is still useful as a
            // record that the job no longer wants the result.
            "cancel" => Ok(Value::Null),
            other => Err(BndlError::InvocationFailure {
                peer: "worker".into(),
                method: other.to_string(),
                message: "no such method on executor service".into(),
                remote_trace: None,
            }),
        }
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::OnDemandThread
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

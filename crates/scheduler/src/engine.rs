// SPDX-License-Identifier: MIT

//! The driver-side execution loop (spec section 4.8): a worker-availability
//! queue hands tasks out to whichever connected worker becomes free next,
//! preferring a task's preferred workers, falling back to any allowed one,
//! and retrying a failed task on a different worker where possible.

use crate::executor::TASK_SERVICE_NAME;
use crate::plan::LineagePlan;
use crate::types::{Job, Stage, Task, TaskStatus};
use bndl_core::{BndlError, WorkerName};
use bndl_net::PeerRegistry;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::task::JoinSet;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How many tasks a single worker may run at once.
    pub concurrency_per_worker: usize,
    /// Total attempts (including the first) before a task's failure is
    /// propagated to the caller.
    pub max_attempts: u32,
    pub task_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { concurrency_per_worker: 1, max_attempts: 1, task_timeout: Duration::from_secs(60) }
    }
}

pub struct Engine {
    peers: PeerRegistry,
    config: EngineConfig,
}

impl Engine {
    pub fn new(peers: PeerRegistry, config: EngineConfig) -> Self {
        Self { peers, config }
    }

    /// Run every stage of `job` in order, returning the last stage's
    /// per-partition results in partition order. Earlier stages' results
    /// (shuffle writes) are discarded — their effect is the buckets they
    /// leave behind on each worker, not a value the driver needs.
    pub async fn run(&self, job: &mut Job) -> Result<Vec<Vec<Value>>, BndlError> {
        let mut last = Vec::new();
        let mut failure = None;
        for stage in &mut job.stages {
            match self.run_stage(stage, None).await {
                Ok(v) => last = v,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        if let Some(e) = failure {
            self.cancel(job).await;
            return Err(e);
        }
        Ok(last)
    }

    /// Like [`Self::run`], but invokes `on_result(partition_idx, values)`
    /// as soon as each task of the job's *last* stage finishes, for
    /// terminal actions that want to consume results as they arrive rather
    /// than waiting for the whole stage.
    pub async fn run_streaming(&self, job: &mut Job, mut on_result: impl FnMut(usize, &[Value])) -> Result<Vec<Vec<Value>>, BndlError> {
        let n = job.stages.len();
        let mut last = Vec::new();
        let mut failure = None;
        for (i, stage) in job.stages.iter_mut().enumerate() {
            let callback = if i == n - 1 { Some(&mut on_result as &mut dyn FnMut(usize, &[Value])) } else { None };
            match self.run_stage(stage, callback).await {
                Ok(v) => last = v,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        if let Some(e) = failure {
            self.cancel(job).await;
            return Err(e);
        }
        Ok(last)
    }

    async fn run_stage(&self, stage: &mut Stage, mut on_result: Option<&mut dyn FnMut(usize, &[Value])>) -> Result<Vec<Vec<Value>>, BndlError> {
        let method = if matches!(stage.plan.lineage, LineagePlan::ShuffleWrite { .. }) { "shuffle_write" } else { "materialize" };
        let plan_arg =
            serde_json::to_value(&*stage.plan).map_err(|e| BndlError::ProtocolError(format!("failed to encode stage plan: {e}")))?;

        let all_workers: Vec<WorkerName> = self.peers.all().into_iter().map(|p| p.name.clone()).collect();
        if all_workers.is_empty() {
            return Err(BndlError::not_connected("no workers connected"));
        }

        let mut results: Vec<Option<Vec<Value>>> = vec![None; stage.tasks.len()];
        let mut pending: VecDeque<usize> = (0..stage.tasks.len()).collect();
        let mut available: VecDeque<WorkerName> = VecDeque::new();
        for name in &all_workers {
            for _ in 0..self.config.concurrency_per_worker.max(1) {
                available.push_back(name.clone());
            }
        }

        let mut in_flight = JoinSet::new();

        loop {
            let mut spins = 0;
            while !pending.is_empty() {
                let Some(worker_name) = available.pop_front() else { break };
                let Some(task_idx) = pick_task(&stage.tasks, &pending, &worker_name) else {
                    available.push_back(worker_name);
                    spins += 1;
                    if spins > available.len() {
                        break;
                    }
                    continue;
                };
                spins = 0;
                pending.retain(|&p| p != task_idx);

                let peer = match self.peers.get_or_err(&worker_name) {
                    Ok(p) => p,
                    Err(_) => {
                        pending.push_back(task_idx);
                        continue;
                    }
                };

                let task = &mut stage.tasks[task_idx];
                task.status = TaskStatus::Running;
                task.attempted.push(worker_name.clone());

                let args = vec![plan_arg.clone(), json!(stage.tasks[task_idx].partition_idx)];
                let timeout = self.config.task_timeout;
                let method = method.to_string();
                in_flight.spawn(async move {
                    let result = bndl_net::call(&peer, TASK_SERVICE_NAME, &method, args, timeout).await;
                    (task_idx, worker_name, result)
                });
            }

            let Some(joined) = in_flight.join_next().await else { break };
            let (task_idx, worker_name, result) = joined.map_err(|e| BndlError::ProtocolError(format!("task panicked: {e}")))?;

            match result {
                Ok(value) => {
                    let values: Vec<Value> = serde_json::from_value(value).unwrap_or_default();
                    if let Some(cb) = on_result.as_deref_mut() {
                        cb(stage.tasks[task_idx].partition_idx, &values);
                    }
                    stage.tasks[task_idx].status = TaskStatus::Succeeded;
                    results[task_idx] = Some(values);
                    available.push_back(worker_name);
                }
                Err(e) => {
                    let task = &mut stage.tasks[task_idx];
                    if task.attempted.len() as u32 >= self.config.max_attempts.max(1) {
                        task.status = TaskStatus::Failed;
                        return Err(e);
                    }
                    task.status = TaskStatus::Pending;
                    pending.push_back(task_idx);
                    available.push_back(worker_name);
                }
            }
        }

        Ok(results.into_iter().map(|r| r.unwrap_or_default()).collect())
    }

    /// Cancel every outstanding task of `job`: mark it cancelled and send a
    /// best-effort cancel RPC to each worker it was last attempted on. Run
    /// on a job's first unrecoverable task failure so the rest of the
    /// cluster stops working on a job whose result will never be used.
    /// Tasks already `Succeeded`, `Cancelled`, or `Failed` (the one that
    /// triggered this call) are left alone. Errors during cancellation are
    /// logged, never raised, matching the cluster's other cleanup fan-outs.
    pub async fn cancel(&self, job: &mut Job) {
        for stage in &mut job.stages {
            for task in &mut stage.tasks {
                if matches!(task.status, TaskStatus::Succeeded | TaskStatus::Cancelled | TaskStatus::Failed) {
                    continue;
                }
                task.status = TaskStatus::Cancelled;
                if let Some(worker_name) = task.attempted.last() {
                    if let Ok(peer) = self.peers.get_or_err(worker_name) {
                        let args = vec![json!(task.dataset_id.to_string()), json!(task.partition_idx)];
                        if let Err(e) = bndl_net::call(&peer, TASK_SERVICE_NAME, "cancel", args, self.config.task_timeout).await {
                            tracing::warn!(task = %task.id, worker = %worker_name, error = %e, "error while cancelling task");
                        }
                    }
                }
            }
        }
    }
}

/// Choose the next pending task index `worker` should run: first a
/// preferred task it hasn't already tried, then any eligible task it
/// hasn't tried, then (as a last resort, e.g. a single-worker cluster
/// retrying) any eligible task regardless of attempt history.
fn pick_task(tasks: &[Task], pending: &VecDeque<usize>, worker: &WorkerName) -> Option<usize> {
    let eligible = |&i: &usize| tasks[i].may_run_on(worker);
    pending
        .iter()
        .copied()
        .find(|&i| eligible(&i) && tasks[i].preferred.contains(worker) && !tasks[i].attempted.contains(worker))
        .or_else(|| pending.iter().copied().find(|&i| eligible(&i) && !tasks[i].attempted.contains(worker)))
        .or_else(|| pending.iter().copied().find(|&i| eligible(&i)))
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

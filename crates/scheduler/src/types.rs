// SPDX-License-Identifier: MIT

//! Job/Stage/Task (spec section 3.3): a job is an ordered list of stages, a
//! stage is a barrier-free run of tasks over one dataset's partitions, and
//! a task is one partition's worth of work dispatched to a worker.

use crate::plan::DatasetPlan;
use bndl_core::{DatasetId, JobId, StageId, TaskId, WorkerName};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// One partition's worth of work: which dataset and partition index it
/// computes, which workers it may (and should prefer to) run on, and the
/// workers already tried.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub stage_id: StageId,
    pub dataset_id: DatasetId,
    pub partition_idx: usize,
    /// Workers to try first, e.g. a known cache location. Empty means no
    /// preference.
    pub preferred: Vec<WorkerName>,
    /// Workers this task may run on at all. `None` means any connected
    /// worker.
    pub allowed: Option<Vec<WorkerName>>,
    pub attempted: Vec<WorkerName>,
    pub status: TaskStatus,
}

impl Task {
    pub fn new(stage_id: StageId, dataset_id: DatasetId, partition_idx: usize) -> Self {
        Self {
            id: TaskId::new(),
            stage_id,
            dataset_id,
            partition_idx,
            preferred: Vec::new(),
            allowed: None,
            attempted: Vec::new(),
            status: TaskStatus::Pending,
        }
    }

    /// Whether `worker` is eligible per this task's allow-list.
    pub fn may_run_on(&self, worker: &WorkerName) -> bool {
        self.allowed.as_ref().map(|allowed| allowed.contains(worker)).unwrap_or(true)
    }
}

/// A barrier-free run of tasks over one dataset's partitions. Stages run in
/// list order; a stage whose dataset's lineage is a
/// [`bndl_dataset::Lineage::ShuffleWrite`] must fully complete before the
/// next stage (its reader) starts.
pub struct Stage {
    pub id: StageId,
    pub plan: Arc<DatasetPlan>,
    pub tasks: Vec<Task>,
    /// Whether this stage's results stream to the caller as each task
    /// finishes (`true`, the default for every stage but the last) or are
    /// buffered until the whole stage completes.
    pub eager: bool,
}

impl Stage {
    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(|t| matches!(t.status, TaskStatus::Succeeded))
    }
}

pub struct Job {
    pub id: JobId,
    pub stages: Vec<Stage>,
}

impl Job {
    pub fn is_cancelled(&self) -> bool {
        self.stages.iter().flat_map(|s| &s.tasks).any(|t| matches!(t.status, TaskStatus::Cancelled))
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

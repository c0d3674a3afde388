// SPDX-License-Identifier: MIT

//! The backward lineage walk that turns a terminal dataset into a [`Job`]
//! (spec section 4.8): every [`Lineage::ShuffleWrite`] found walking
//! backward becomes its own earlier stage, in dependency order, ending
//! with the terminal dataset's own stage. A dataset whose lineage has no
//! shuffle boundary at all becomes a single-stage job.

use crate::plan::plan_dataset;
use crate::types::{Job, Stage, Task};
use bndl_core::{DatasetId, JobId, StageId, WorkerName};
use bndl_dataset::{Dataset, Lineage};
use std::collections::HashSet;
use std::sync::Arc;

fn collect_barriers(ds: &Arc<Dataset>, out: &mut Vec<Arc<Dataset>>, seen: &mut HashSet<DatasetId>) {
    if !seen.insert(ds.id()) {
        return;
    }
    match &ds.lineage {
        Lineage::Iterable { .. } => {}
        Lineage::ShuffleRead { writer } => {
            collect_barriers(writer, out, seen);
            out.push(writer.clone());
        }
        Lineage::MapPartitions { src, .. } | Lineage::Cached { src } | Lineage::Mask { src, .. } | Lineage::ShuffleWrite { src, .. } => {
            collect_barriers(src, out, seen)
        }
        Lineage::Union { sources } => {
            for s in sources {
                collect_barriers(s, out, seen);
            }
        }
        Lineage::Zip { left, right, .. } => {
            collect_barriers(left, out, seen);
            collect_barriers(right, out, seen);
        }
    }
}

/// This dataset's effective allow-list: its own filter if set, else
/// propagated down from its single source, else `None` (any worker). A
/// multi-source dataset (`Union`/`Zip`) does not propagate, since which
/// branch's policy should win is ambiguous.
fn effective_allowed(ds: &Dataset, all_workers: &[WorkerName]) -> Option<Vec<WorkerName>> {
    if let Some(filter) = ds.worker_filter() {
        return Some(all_workers.iter().filter(|w| filter(w)).cloned().collect());
    }
    match &ds.lineage {
        Lineage::MapPartitions { src, .. } | Lineage::Cached { src } | Lineage::Mask { src, .. } | Lineage::ShuffleWrite { src, .. } => {
            effective_allowed(src, all_workers)
        }
        Lineage::ShuffleRead { writer } => effective_allowed(writer, all_workers),
        _ => None,
    }
}

fn effective_preferred(ds: &Dataset, allowed: &[WorkerName]) -> Vec<WorkerName> {
    if let Some(preference) = ds.worker_preference() {
        return preference(allowed);
    }
    match &ds.lineage {
        Lineage::MapPartitions { src, .. } | Lineage::Cached { src } | Lineage::Mask { src, .. } | Lineage::ShuffleWrite { src, .. } => {
            effective_preferred(src, allowed)
        }
        Lineage::ShuffleRead { writer } => effective_preferred(writer, allowed),
        _ => Vec::new(),
    }
}

fn build_stage(ds: &Arc<Dataset>, all_workers: &[WorkerName], eager: bool) -> Stage {
    let plan = Arc::new(plan_dataset(ds));
    let stage_id = StageId::new();
    let allowed = effective_allowed(ds, all_workers);
    let allow_pool: Vec<WorkerName> = allowed.clone().unwrap_or_else(|| all_workers.to_vec());
    let preferred = effective_preferred(ds, &allow_pool);

    let tasks = ds
        .partitions()
        .into_iter()
        .map(|p| {
            let mut task = Task::new(stage_id, ds.id(), p.idx);
            task.allowed = allowed.clone();
            task.preferred = ds.cache_loc(p.idx).map(|w| vec![w]).unwrap_or_else(|| preferred.clone());
            task
        })
        .collect();

    Stage { id: stage_id, plan, tasks, eager }
}

/// Build a job from a terminal dataset against the set of currently
/// connected workers. Every stage but the last runs eagerly (spec section
/// 4.8's "eager by default" rule).
pub fn build_job(terminal: &Arc<Dataset>, all_workers: &[WorkerName]) -> Job {
    let mut barriers = Vec::new();
    let mut seen = HashSet::new();
    collect_barriers(terminal, &mut barriers, &mut seen);

    let mut stages: Vec<Stage> = barriers.iter().map(|ds| build_stage(ds, all_workers, true)).collect();
    stages.push(build_stage(terminal, all_workers, false));

    Job { id: JobId::new(), stages }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT

//! Job planning and execution (spec section 4.8): [`plan_dataset`] turns a
//! driver-resident [`bndl_dataset::Dataset`] into a serializable
//! [`DatasetPlan`], [`build_job`] walks its lineage backward into a
//! multi-stage [`Job`], [`Materializer`] recomputes a single partition
//! locally from a plan, [`TaskExecutorService`] exposes that over RMI, and
//! [`Engine`] drives a job's stages to completion against the cluster's
//! connected workers.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod actions;
mod build;
mod engine;
mod executor;
mod materialize;
mod plan;
mod types;

pub use actions::{
    aggregate, collect, count, execute, first, foreach, histogram, join, max, mean, min, reduce, sort, stats, sum, take, Stats,
};
pub use build::build_job;
pub use engine::{Engine, EngineConfig};
pub use executor::{TaskExecutorService, TASK_SERVICE_NAME};
pub use materialize::Materializer;
pub use plan::{plan_dataset, DatasetPlan, LineagePlan};
pub use types::{Job, Stage, Task, TaskStatus};

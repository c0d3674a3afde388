// SPDX-License-Identifier: MIT

//! [`Context`]: a driver's handle on a connected cluster. Bundles the
//! [`Registries`] new datasets are built against with the [`Engine`] and
//! worker list their jobs run on, the way `oj-daemon`'s top-level state
//! bundles a connection pool with the engine that drives it.

use bndl_core::{BndlError, Config, WorkerName};
use bndl_dataset::{Dataset, Registries};
use bndl_net::Node;
use bndl_scheduler::{self as scheduler, Engine, EngineConfig, Stats};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub struct Context {
    registries: Registries,
    engine: Engine,
    workers: Vec<WorkerName>,
}

impl Context {
    /// Dial every seed named in `config.net_seeds`, naming each peer by
    /// its dial address (an accepting [`Node`] would later replace that
    /// with a handshake-advertised name; no handshake exists yet, so the
    /// driver and its workers agree on addresses instead).
    pub async fn connect(config: &Config) -> Result<Self, BndlError> {
        let node = Node::new(WorkerName::new("driver"), config.execute_concurrency.max(1) as usize);
        let mut workers = Vec::with_capacity(config.net_seeds.len());
        for seed in &config.net_seeds {
            let name = WorkerName::new(seed.as_str());
            node.connect(seed, name.clone()).await?;
            workers.push(name);
        }

        let engine_config = EngineConfig {
            concurrency_per_worker: config.execute_concurrency.max(1) as usize,
            max_attempts: config.execute_attempts.max(1),
            task_timeout: Duration::from_secs(60),
        };
        Ok(Self { registries: Registries::new(), engine: Engine::new(node.peers().clone(), engine_config), workers })
    }

    /// The named-decoder registries every dataset built from this context
    /// shares. Application code registers its `ElementFn`s/`PartitionTransform`s/
    /// `Combiner`s here before building datasets that reference them by name.
    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn workers(&self) -> &[WorkerName] {
        &self.workers
    }

    /// A dataset over an in-memory collection, split into `pcount` partitions.
    pub fn from_iterable(&self, elements: Vec<Value>, pcount: usize) -> Arc<Dataset> {
        Dataset::from_iterable(self.registries.clone(), elements, pcount)
    }

    pub async fn collect(&self, ds: &Arc<Dataset>) -> Result<Vec<Value>, BndlError> {
        scheduler::collect(&self.engine, ds, &self.workers).await
    }

    pub async fn take(&self, ds: &Arc<Dataset>, n: usize) -> Result<Vec<Value>, BndlError> {
        scheduler::take(&self.engine, ds, &self.workers, n).await
    }

    pub async fn first(&self, ds: &Arc<Dataset>) -> Result<Value, BndlError> {
        scheduler::first(&self.engine, ds, &self.workers).await
    }

    pub async fn foreach(&self, ds: &Arc<Dataset>, f: impl FnMut(&Value)) -> Result<(), BndlError> {
        scheduler::foreach(&self.engine, ds, &self.workers, f).await
    }

    pub async fn execute(&self, ds: &Arc<Dataset>) -> Result<(), BndlError> {
        scheduler::execute(&self.engine, ds, &self.workers).await
    }

    pub async fn count(&self, ds: &Arc<Dataset>) -> Result<usize, BndlError> {
        scheduler::count(&self.engine, ds, &self.workers).await
    }

    pub async fn sum(&self, ds: &Arc<Dataset>) -> Result<f64, BndlError> {
        scheduler::sum(&self.engine, ds, &self.workers).await
    }

    pub async fn mean(&self, ds: &Arc<Dataset>) -> Result<f64, BndlError> {
        scheduler::mean(&self.engine, ds, &self.workers).await
    }

    pub async fn stats(&self, ds: &Arc<Dataset>) -> Result<Stats, BndlError> {
        scheduler::stats(&self.engine, ds, &self.workers).await
    }

    pub async fn reduce(&self, ds: &Arc<Dataset>, f: impl Fn(Value, Value) -> Value) -> Result<Value, BndlError> {
        scheduler::reduce(&self.engine, ds, &self.workers, f).await
    }

    pub async fn max(&self, ds: &Arc<Dataset>) -> Result<Value, BndlError> {
        scheduler::max(&self.engine, ds, &self.workers).await
    }

    pub async fn min(&self, ds: &Arc<Dataset>) -> Result<Value, BndlError> {
        scheduler::min(&self.engine, ds, &self.workers).await
    }

    pub async fn histogram(&self, ds: &Arc<Dataset>, bins: usize) -> Result<(Vec<u64>, Vec<f64>), BndlError> {
        scheduler::histogram(&self.engine, ds, &self.workers, bins).await
    }

    pub async fn sort(&self, ds: &Arc<Dataset>, pcount: usize, reverse: bool) -> Result<Arc<Dataset>, BndlError> {
        scheduler::sort(&self.engine, ds, &self.workers, pcount, reverse).await
    }

    pub fn join(&self, left: Arc<Dataset>, right: Arc<Dataset>, pcount: usize) -> Arc<Dataset> {
        scheduler::join(left, right, pcount)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

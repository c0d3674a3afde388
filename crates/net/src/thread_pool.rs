// SPDX-License-Identifier: MIT

//! A bounded on-demand thread pool for the `OnDemandThread` dispatch mode.
//!
//! Ported from the original's `OnDemandThreadedExecutor`: rather than
//! maintaining a fixed set of worker threads, a new OS thread is spawned for
//! every call and torn down when it completes. A semaphore caps how many run
//! concurrently, so a burst of slow handlers queues instead of unbounded
//! thread creation.

use bndl_core::BndlError;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, Semaphore};

#[derive(Clone)]
pub struct OnDemandThreadPool {
    limit: Arc<Semaphore>,
}

impl OnDemandThreadPool {
    pub fn new(max_concurrency: usize) -> Self {
        Self { limit: Arc::new(Semaphore::new(max_concurrency.max(1))) }
    }

    /// Run `work` (an async future) on a dedicated OS thread, blocking that
    /// thread on the caller's tokio runtime via `Handle::block_on`. Honors
    /// the pool's concurrency limit before spawning.
    pub async fn spawn<F, T>(&self, work: F) -> Result<T, BndlError>
    where
        F: std::future::Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BndlError::Cancelled("on-demand thread pool is shutting down".into()))?;
        let handle = Handle::current();
        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || {
            let _permit = permit;
            let result = handle.block_on(work);
            let _ = tx.send(result);
        });
        rx.await.map_err(|_| BndlError::Cancelled("worker thread dropped its result without sending one".into()))
    }
}

#[cfg(test)]
#[path = "thread_pool_tests.rs"]
mod tests;

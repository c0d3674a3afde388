// SPDX-License-Identifier: MIT

//! Services: the callee side of an RMI exchange (spec section 4.2).
//!
//! A `Service` is anything another peer can invoke methods on by name. Each
//! registered service also carries a [`Dispatch`] mode, mirroring the
//! original's choice between calling a handler inline, awaiting a coroutine,
//! or handing it to a bounded worker-thread pool so a slow handler can't
//! stall the connection's read loop.

use async_trait::async_trait;
use bndl_core::BndlError;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// How a service's methods should be run relative to the connection's
/// read loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Run inline, on the task driving the connection. Only safe for
    /// handlers that do not block and do not themselves perform RMI calls
    /// that could deadlock against the same connection.
    Direct,
    /// Await the handler as an independent async task, letting the
    /// connection's read loop continue servicing other requests/responses
    /// concurrently.
    Coroutine,
    /// Hand the call to the node's bounded on-demand thread pool. The
    /// default, and the only safe choice for handlers that block.
    OnDemandThread,
}

impl Default for Dispatch {
    fn default() -> Self {
        Dispatch::OnDemandThread
    }
}

/// Something another peer can invoke methods on by name.
#[async_trait]
pub trait Service: Send + Sync {
    /// Invoke `method` with positional `args` and keyword `kwargs`, returning
    /// the JSON-encodable result or an application error. The RMI layer
    /// turns `Err` into a `RemoteException` sent back to the caller; it
    /// never tears down the connection because of one.
    async fn call(
        &self,
        method: &str,
        args: Vec<Value>,
        kwargs: HashMap<String, Value>,
    ) -> Result<Value, BndlError>;

    /// Dispatch mode this service's methods should run under. Defaults to
    /// the bounded thread pool.
    fn dispatch(&self) -> Dispatch {
        Dispatch::OnDemandThread
    }
}

/// The set of services a node exposes to its peers, keyed by name.
#[derive(Default, Clone)]
pub struct ServiceRegistry {
    services: Arc<RwLock<HashMap<String, Arc<dyn Service>>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, service: Arc<dyn Service>) {
        self.services.write().insert(name.into(), service);
    }

    pub fn deregister(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services.read().get(name).cloned()
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

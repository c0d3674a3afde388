// SPDX-License-Identifier: MIT

//! The request/response envelope exchanged by the RMI layer (spec section 6).

use bndl_core::WorkerName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A remote method invocation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub req_id: u64,
    pub service: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
    #[serde(default)]
    pub kwargs: HashMap<String, serde_json::Value>,
}

impl Request {
    pub fn new(req_id: u64, service: impl Into<String>, method: impl Into<String>) -> Self {
        Self { req_id, service: service.into(), method: method.into(), args: Vec::new(), kwargs: HashMap::new() }
    }

    pub fn with_args(mut self, args: Vec<serde_json::Value>) -> Self {
        self.args = args;
        self
    }
}

/// A pickled-equivalent remote exception: the original exception's type,
/// message, and (if available) a rendered remote traceback. Carried as
/// plain strings since Rust has no generic pickling; the caller reconstructs
/// a `BndlError::InvocationFailure` from this, preserving type/message/trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteException {
    pub type_name: String,
    pub message: String,
    pub remote_trace: Option<String>,
}

/// The response to a [`Request`], correlated by `req_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub req_id: u64,
    pub value: Option<serde_json::Value>,
    pub exception: Option<RemoteException>,
}

impl Response {
    pub fn ok(req_id: u64, value: serde_json::Value) -> Self {
        Self { req_id, value: Some(value), exception: None }
    }

    pub fn err(req_id: u64, exception: RemoteException) -> Self {
        Self { req_id, value: None, exception: Some(exception) }
    }
}

/// Describes a named immutable byte stream served in chunks by the block
/// store (spec section 3.5 / 4.3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockSpec {
    pub name: String,
    pub seeder: WorkerName,
    /// Size in bytes of each chunk, in order.
    pub chunk_sizes: Vec<u32>,
    /// Optional per-chunk checksum (e.g. crc32) for integrity verification.
    #[serde(default)]
    pub digests: Option<Vec<u32>>,
}

impl BlockSpec {
    pub fn chunk_count(&self) -> usize {
        self.chunk_sizes.len()
    }

    pub fn total_size(&self) -> u64 {
        self.chunk_sizes.iter().map(|&s| s as u64).sum()
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

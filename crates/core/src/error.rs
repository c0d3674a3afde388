// SPDX-License-Identifier: MIT

//! The error taxonomy shared across the cluster (spec section 7).
//!
//! Every crate that can fail in a way visible to another component maps its
//! local errors onto one of these kinds at the boundary, so the scheduler
//! and the RMI layer only ever have to reason about one enum.

use thiserror::Error;

/// A kind of failure recognized across the cluster, independent of which
/// crate raised it.
#[derive(Debug, Error)]
pub enum BndlError {
    /// A peer closed the connection, or the transport otherwise dropped.
    #[error("not connected to {peer}")]
    NotConnected { peer: String },

    /// A local wait exceeded its deadline. The remote work is not aborted.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The operation or task was cancelled, locally or by the remote peer.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// A remote method invocation raised an exception on the callee.
    #[error("invocation of {method} on {peer} failed: {message}")]
    InvocationFailure { peer: String, method: String, message: String, remote_trace: Option<String> },

    /// A recoverable compute error in a task body; eligible for retry.
    #[error("task failed: {0}")]
    TaskFailure(String),

    /// A cached partition is no longer present at its recorded location.
    #[error("cache miss for {cache_key}/{obj_key}")]
    CacheMiss { cache_key: String, obj_key: String },

    /// Malformed configuration; fatal at startup.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A frame or schema violation; fatal for the connection it occurred on.
    #[error("protocol error: {0}")]
    ProtocolError(String),
}

impl BndlError {
    pub fn not_connected(peer: impl Into<String>) -> Self {
        Self::NotConnected { peer: peer.into() }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TaskFailure(_) | Self::CacheMiss { .. } | Self::NotConnected { .. })
    }
}

pub type Result<T> = std::result::Result<T, BndlError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

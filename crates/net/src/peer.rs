// SPDX-License-Identifier: MIT

//! Peer bookkeeping: one [`PeerHandle`] per connected worker, tracking the
//! connection itself plus the outstanding calls awaiting a response
//! (spec section 4.2, grounded on the original's `RMIPeerNode`).

use crate::connection::Connection;
use bndl_core::{BndlError, WorkerName};
use bndl_wire::Response;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{oneshot, Mutex as AsyncMutex};

pub type TcpConnection = Connection<OwnedReadHalf, OwnedWriteHalf>;

/// One connected peer: its transport plus request/response correlation.
/// Generic over the stream halves so tests can wire it up with an in-memory
/// duplex pipe instead of a real socket; [`TcpConnection`] is the concrete
/// type a running [`crate::node::Node`] actually uses.
pub struct PeerHandle<R = OwnedReadHalf, W = OwnedWriteHalf> {
    pub name: WorkerName,
    pub conn: Arc<Connection<R, W>>,
    next_req_id: AtomicU64,
    pending: AsyncMutex<HashMap<u64, oneshot::Sender<Response>>>,
}

impl<R, W> PeerHandle<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(name: WorkerName, conn: Arc<Connection<R, W>>) -> Self {
        Self { name, conn, next_req_id: AtomicU64::new(1), pending: AsyncMutex::new(HashMap::new()) }
    }

    pub fn next_req_id(&self) -> u64 {
        self.next_req_id.fetch_add(1, Ordering::SeqCst)
    }

    pub async fn register_pending(&self, req_id: u64) -> oneshot::Receiver<Response> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(req_id, tx);
        rx
    }

    /// Complete a pending call with its response, dropping it silently if
    /// the caller already gave up (timed out).
    pub async fn complete(&self, response: Response) {
        if let Some(tx) = self.pending.lock().await.remove(&response.req_id) {
            let _ = tx.send(response);
        }
    }

    /// Fail every outstanding call on this peer, e.g. because the
    /// connection just dropped. Mirrors the original's `disconnect()`,
    /// which unblocks every waiter rather than leaving it hanging forever.
    pub async fn fail_all_pending(&self) {
        let mut pending = self.pending.lock().await;
        for (_, tx) in pending.drain() {
            drop(tx);
        }
    }
}

/// The set of currently connected peers, keyed by worker name.
pub struct PeerRegistry<R = OwnedReadHalf, W = OwnedWriteHalf> {
    peers: Arc<RwLock<HashMap<WorkerName, Arc<PeerHandle<R, W>>>>>,
}

impl<R, W> Default for PeerRegistry<R, W> {
    fn default() -> Self {
        Self { peers: Arc::new(RwLock::new(HashMap::new())) }
    }
}

impl<R, W> Clone for PeerRegistry<R, W> {
    fn clone(&self) -> Self {
        Self { peers: self.peers.clone() }
    }
}

impl<R, W> PeerRegistry<R, W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, peer: Arc<PeerHandle<R, W>>) {
        self.peers.write().insert(peer.name.clone(), peer);
    }

    pub fn get(&self, name: &WorkerName) -> Option<Arc<PeerHandle<R, W>>> {
        self.peers.read().get(name).cloned()
    }

    pub fn remove(&self, name: &WorkerName) -> Option<Arc<PeerHandle<R, W>>> {
        self.peers.write().remove(name)
    }

    pub fn all(&self) -> Vec<Arc<PeerHandle<R, W>>> {
        self.peers.read().values().cloned().collect()
    }

    pub fn get_or_err(&self, name: &WorkerName) -> Result<Arc<PeerHandle<R, W>>, BndlError> {
        self.get(name).ok_or_else(|| BndlError::not_connected(name.to_string()))
    }
}

#[cfg(test)]
#[path = "peer_tests.rs"]
mod tests;

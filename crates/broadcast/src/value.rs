// SPDX-License-Identifier: MIT

//! The broadcast value itself: published once on the seeder, lazily
//! fetched and cached on every other worker (spec section 4.5, grounded
//! on `broadcast.py`'s `broadcast()`/`BroadcastValue`).

use crate::chunk;
use crate::codec::BroadcastCodec;
use crate::service::BROADCAST_SERVICE_NAME;
use bndl_core::{BlockName, BndlError, Coordinator, WorkerName};
use bndl_net::PeerRegistry;
use bndl_store::{BlockStore, StorageKind};
use bndl_wire::BlockSpec;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_UNPERSIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Broadcast `value` from `worker` (the seeder) to the cluster: serialize
/// with `codec`, split into chunks sized by
/// `clamp(worker_count * 2, min_block_size, max_block_size)` bytes, and
/// publish each chunk to the local block store under a fresh key.
#[allow(clippy::too_many_arguments)]
pub fn broadcast<T>(
    worker: WorkerName,
    block_store: Arc<BlockStore>,
    peers: PeerRegistry,
    value: T,
    codec: BroadcastCodec,
    worker_count: usize,
    min_block_size: u64,
    max_block_size: u64,
) -> Result<BroadcastValue<T>, BndlError>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let data = codec.encode(&value)?;
    let size = chunk::chunk_size(worker_count, min_block_size, max_block_size);
    let key = uuid::Uuid::new_v4();

    let mut chunks = Vec::new();
    for (idx, bytes) in chunk::split(&data, size).into_iter().enumerate() {
        let name = BlockName::from_string(format!("{key}-{idx}"));
        let spec = block_store
            .put(name, bytes, StorageKind::Memory)
            .map_err(|e| BndlError::ProtocolError(format!("failed to publish broadcast chunk: {e}")))?;
        chunks.push(spec);
    }

    Ok(BroadcastValue {
        worker: worker.clone(),
        seeder: worker,
        chunks,
        codec,
        block_store,
        peers,
        seeder_value: Some(Arc::new(value)),
        fetch: Coordinator::new(),
        unpersisted: AtomicBool::new(false),
    })
}

/// A read-only value pushed once to a seeder's block store and retrieved
/// lazily, by peer-assisted chunk fetch, on every other worker.
pub struct BroadcastValue<T> {
    worker: WorkerName,
    seeder: WorkerName,
    chunks: Vec<BlockSpec>,
    codec: BroadcastCodec,
    block_store: Arc<BlockStore>,
    peers: PeerRegistry,
    /// Populated only on the seeder, short-circuiting `.value()` without
    /// a round trip through the block store.
    seeder_value: Option<Arc<T>>,
    /// Single-flights concurrent first-use downloads; keyed by `()` since
    /// each `BroadcastValue` already names exactly one value.
    fetch: Coordinator<(), Result<Arc<T>, String>>,
    unpersisted: AtomicBool,
}

impl<T> BroadcastValue<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    pub fn seeder(&self) -> &WorkerName {
        &self.seeder
    }

    /// The deserialized value: the in-memory copy on the seeder, or a
    /// single-flighted download-then-deserialize-then-cache on any other
    /// worker.
    pub async fn value(&self) -> Result<Arc<T>, BndlError> {
        if let Some(v) = &self.seeder_value {
            return Ok(v.clone());
        }
        self.fetch.coordinate((), || self.fetch_and_cache()).await.map_err(BndlError::ProtocolError)
    }

    async fn fetch_and_cache(&self) -> Result<Arc<T>, String> {
        let mut data = Vec::new();
        for spec in &self.chunks {
            let chunk = self.block_store.get(spec, &self.peers).await.map_err(|e| e.to_string())?;
            data.extend_from_slice(&chunk);
        }
        let value: T = self.codec.decode(&data).map_err(|e| e.to_string())?;

        // Reclaim the local copy once downloaded; the seeder keeps serving
        // from its own block store for any later first-use elsewhere.
        if self.worker != self.seeder {
            self.block_store.remove_blocks(&self.chunk_names());
        }

        Ok(Arc::new(value))
    }

    fn chunk_names(&self) -> Vec<BlockName> {
        self.chunks.iter().map(|s| BlockName::from_string(&s.name)).collect()
    }

    /// Remove this value's blocks from the seeder and fan the removal out
    /// to every known peer. Per-peer errors, including timeouts, are
    /// logged, never raised, matching the original's best-effort cleanup.
    /// Only valid on the seeder.
    pub async fn unpersist(&self, timeout: Option<Duration>) {
        if self.worker != self.seeder {
            tracing::warn!(worker = %self.worker, "unpersist called on a non-seeder; ignoring");
            return;
        }
        self.unpersisted.store(true, Ordering::SeqCst);
        self.block_store.remove_blocks(&self.chunk_names());

        let names: Vec<Value> = self.chunk_names().iter().map(|n| Value::String(n.to_string())).collect();
        let timeout = timeout.unwrap_or(DEFAULT_UNPERSIST_TIMEOUT);
        for peer in self.peers.all() {
            let peer_name = peer.name.clone();
            let result = bndl_net::call(&peer, BROADCAST_SERVICE_NAME, "unpersist_broadcast_values", names.clone(), timeout).await;
            if let Err(e) = result {
                tracing::warn!(peer = %peer_name, error = %e, "error while unpersisting broadcast blocks");
            }
        }
    }
}

impl<T> Drop for BroadcastValue<T> {
    /// Dropping the seeder's proxy implicitly reclaims its local blocks,
    /// matching the original's `__del__`. Unlike `unpersist()`, `Drop`
    /// cannot await the peer fan-out RPC — call `unpersist()` explicitly
    /// before dropping a value other workers may still be downloading.
    fn drop(&mut self) {
        if self.worker == self.seeder && !self.unpersisted.load(Ordering::SeqCst) {
            let names: Vec<BlockName> = self.chunks.iter().map(|s| BlockName::from_string(&s.name)).collect();
            self.block_store.remove_blocks(&names);
        }
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT

//! The chunked block store (spec section 4.3): workers hold named blocks
//! (shuffle buckets, broadcast chunks, task results shipped by reference)
//! and serve them to peers over RMI. A local `get` is a plain container
//! read; a remote `get` calls the seeding peer's `blockstore` service and
//! is single-flighted through [`Coordinator`] so a burst of local readers
//! asking for the same block only pulls it over the wire once.

use crate::container::{StorageContainer, StorageKind};
use async_trait::async_trait;
use bndl_core::{BlockName, BndlError, Coordinator, WorkerName};
use bndl_net::{Dispatch, PeerRegistry, Service};
use bndl_wire::BlockSpec;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const SERVICE_NAME: &str = "blockstore";
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct BlockStore {
    worker: WorkerName,
    spill_dir: PathBuf,
    blocks: RwLock<HashMap<BlockName, Arc<StorageContainer>>>,
    /// Keyed on the block name; `Result`'s error side carries the error's
    /// rendered message rather than `BndlError` itself, since `Coordinator`
    /// requires its value type to be `Clone` and `BndlError` is not.
    fetch_coordinator: Coordinator<BlockName, Result<Vec<u8>, String>>,
}

impl BlockStore {
    pub fn new(worker: WorkerName, spill_dir: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            worker,
            spill_dir,
            blocks: RwLock::new(HashMap::new()),
            fetch_coordinator: Coordinator::new(),
        })
    }

    /// Publish `data` under `name`, returning the spec peers use to fetch
    /// it back. A single chunk is used for every block; `BlockSpec`'s
    /// multi-chunk shape exists for callers that want to fetch partial
    /// ranges, which this reference store does not need.
    pub fn put(&self, name: BlockName, data: Vec<u8>, kind: StorageKind) -> std::io::Result<BlockSpec> {
        let size = data.len() as u32;
        let container = Arc::new(StorageContainer::new(name.as_str(), self.spill_dir.clone()));
        container.write(data, kind)?;
        self.blocks.write().insert(name.clone(), container);
        Ok(BlockSpec { name: name.to_string(), seeder: self.worker.clone(), chunk_sizes: vec![size], digests: None })
    }

    /// Read a block this worker is holding.
    pub fn serve(&self, name: &BlockName) -> Result<Vec<u8>, BndlError> {
        let container = self
            .blocks
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| BndlError::CacheMiss { cache_key: SERVICE_NAME.into(), obj_key: name.to_string() })?;
        container.read()
    }

    pub fn remove(&self, name: &BlockName) {
        if let Some(container) = self.blocks.write().remove(name) {
            container.clear();
        }
    }

    /// Drop every block this store is holding, e.g. at job/stage cleanup.
    pub fn remove_blocks(&self, names: &[BlockName]) {
        for name in names {
            self.remove(name);
        }
    }

    /// Fetch a block described by `spec`, serving it locally if this
    /// worker is the seeder and otherwise calling out to the seeder over
    /// RMI, with concurrent callers for the same block collapsed into one
    /// fetch.
    pub async fn get(&self, spec: &BlockSpec, peers: &PeerRegistry) -> Result<Vec<u8>, BndlError> {
        let name = BlockName::from_string(&spec.name);
        if spec.seeder == self.worker {
            return self.serve(&name);
        }

        let seeder = spec.seeder.clone();
        let peers = peers.clone();
        let name_for_fetch = name.clone();
        let result = self
            .fetch_coordinator
            .coordinate(name, move || {
                let peers = peers.clone();
                let seeder = seeder.clone();
                let name = name_for_fetch.clone();
                async move { fetch_remote(&peers, &seeder, &name).await.map_err(|e| e.to_string()) }
            })
            .await;
        result.map_err(BndlError::ProtocolError)
    }
}

async fn fetch_remote(peers: &PeerRegistry, seeder: &WorkerName, name: &BlockName) -> Result<Vec<u8>, BndlError> {
    let peer = peers.get_or_err(seeder)?;
    let value = bndl_net::call(&peer, SERVICE_NAME, "serve", vec![Value::String(name.to_string())], DEFAULT_FETCH_TIMEOUT).await?;
    decode_bytes(value)
}

fn decode_bytes(value: Value) -> Result<Vec<u8>, BndlError> {
    serde_json::from_value(value).map_err(|e| BndlError::ProtocolError(format!("invalid block payload: {e}")))
}

/// The RMI-facing half of the block store: lets peers fetch a locally held
/// block by name.
pub struct BlockStoreService {
    store: Arc<BlockStore>,
}

impl BlockStoreService {
    pub fn new(store: Arc<BlockStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Service for BlockStoreService {
    async fn call(&self, method: &str, args: Vec<Value>, _kwargs: HashMap<String, Value>) -> Result<Value, BndlError> {
        match method {
            "serve" => {
                let name = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| BndlError::ProtocolError("serve expects a block name argument".into()))?;
                let bytes = self.store.serve(&BlockName::from_string(name))?;
                serde_json::to_value(bytes).map_err(|e| BndlError::ProtocolError(format!("failed to encode block payload: {e}")))
            }
            other => Err(BndlError::InvocationFailure {
                peer: self.store.worker.to_string(),
                method: other.to_string(),
                message: "no such method on blockstore service".into(),
                remote_trace: None,
            }),
        }
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::OnDemandThread
    }
}

pub const BLOCKSTORE_SERVICE_NAME: &str = SERVICE_NAME;

#[cfg(test)]
#[path = "block_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT

//! The reader half of a shuffle (spec section 4.7, grounded on
//! `dataset.py`'s `ShuffleReadingDataset`/`ShuffleReadingPartition`).

use crate::bucket::{Bucket, BucketKind};
use crate::registry::BucketRegistry;
use crate::service::SHUFFLE_SERVICE_NAME;
use bndl_core::{BndlError, DatasetId};
use bndl_net::PeerRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

pub struct ShuffleReader {
    registry: Arc<BucketRegistry>,
    peers: PeerRegistry,
}

impl ShuffleReader {
    pub fn new(registry: Arc<BucketRegistry>, peers: PeerRegistry) -> Self {
        Self { registry, peers }
    }

    /// Every element destined for partition `idx` of `writer_dataset_id`:
    /// the local bucket first, then every remote worker's bucket fetched in
    /// parallel over RMI, merged into one bucket of `kind` rather than
    /// concatenated in arrival order. A `SortedList` bucket from a single
    /// worker is already ordered, but concatenating several such buckets
    /// only leaves the result piecewise sorted once more than one worker
    /// contributes to the partition — `Bucket::merge` re-inserts every
    /// remote element through `kind`'s own insertion rule instead, so the
    /// merged result keeps the same ordering/dedup guarantee a single
    /// writer's bucket would have had.
    pub async fn read(&self, writer_dataset_id: DatasetId, kind: BucketKind, idx: usize, timeout: Duration) -> Result<Vec<Value>, BndlError> {
        let mut merged = self.registry.get(writer_dataset_id, idx).unwrap_or_else(|| Bucket::new(kind));

        let mut fetches = JoinSet::new();
        for peer in self.peers.all() {
            fetches.spawn(async move {
                let args = vec![json!(writer_dataset_id.to_string()), json!(idx)];
                let peer_name = peer.name.clone();
                let result = bndl_net::call(&peer, SHUFFLE_SERVICE_NAME, "get_bucket", args, timeout).await;
                (peer_name, result)
            });
        }

        while let Some(joined) = fetches.join_next().await {
            let (peer_name, result) = joined.map_err(|e| BndlError::ProtocolError(format!("shuffle fetch task panicked: {e}")))?;
            match result {
                Ok(value) => {
                    let values: Vec<Value> = serde_json::from_value(value)
                        .map_err(|e| BndlError::ProtocolError(format!("invalid shuffle bucket payload from {peer_name}: {e}")))?;
                    merged.merge(Bucket::List(values));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(merged.into_values())
    }

    /// Clear this dataset's buckets locally and fan the clear out to every
    /// peer, best-effort: errors are logged, never raised, matching the
    /// cleanup paragraph's "errors during cleanup are logged, never
    /// raised."
    pub async fn cleanup(&self, writer_dataset_id: DatasetId, timeout: Duration) {
        self.registry.clear(writer_dataset_id);
        for peer in self.peers.all() {
            let peer_name = peer.name.clone();
            let args = vec![json!(writer_dataset_id.to_string())];
            if let Err(e) = bndl_net::call(&peer, SHUFFLE_SERVICE_NAME, "clear_bucket", args, timeout).await {
                tracing::warn!(peer = %peer_name, error = %e, "error while clearing shuffle buckets");
            }
        }
    }
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;

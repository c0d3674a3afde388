// SPDX-License-Identifier: MIT

//! The block store and cache provider: workers' local storage for shuffle
//! buckets, broadcast chunks, and cached partitions (spec components C3/C9).

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod block;
mod cache;
mod container;

pub use block::{BlockStore, BlockStoreService, BLOCKSTORE_SERVICE_NAME};
pub use cache::CacheProvider;
pub use container::{StorageContainer, StorageKind};

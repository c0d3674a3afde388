// SPDX-License-Identifier: MIT

//! `CacheProvider`: the process-wide `cache_key -> obj_key -> container`
//! map behind `Dataset::cache()` (spec section 4.9, grounded on
//! `bndl/compute/cache.py`).

use crate::container::{StorageContainer, StorageKind};
use bndl_core::{BndlError, DatasetId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

pub struct CacheProvider {
    spill_dir: PathBuf,
    default_kind: StorageKind,
    caches: RwLock<HashMap<DatasetId, HashMap<String, Arc<StorageContainer>>>>,
}

impl CacheProvider {
    pub fn new(spill_dir: PathBuf, default_kind: StorageKind) -> Self {
        Self { spill_dir, default_kind, caches: RwLock::new(HashMap::new()) }
    }

    pub fn write(&self, cache_key: DatasetId, obj_key: impl Into<String>, data: Vec<u8>) -> std::io::Result<()> {
        let obj_key = obj_key.into();
        let container = Arc::new(StorageContainer::new(format!("{cache_key}/{obj_key}"), self.spill_dir.clone()));
        container.write(data, self.default_kind)?;
        self.caches.write().entry(cache_key).or_default().insert(obj_key, container);
        Ok(())
    }

    pub fn read(&self, cache_key: DatasetId, obj_key: &str) -> Result<Vec<u8>, BndlError> {
        let container = self
            .caches
            .read()
            .get(&cache_key)
            .and_then(|objs| objs.get(obj_key))
            .cloned()
            .ok_or_else(|| BndlError::CacheMiss { cache_key: cache_key.to_string(), obj_key: obj_key.to_string() })?;
        container.read()
    }

    pub fn contains(&self, cache_key: &DatasetId, obj_key: &str) -> bool {
        self.caches.read().get(cache_key).map(|objs| objs.contains_key(obj_key)).unwrap_or(false)
    }

    /// Drop one cached object, or every object under `cache_key` when
    /// `obj_key` is `None` (mirrors `CacheProvider.clear`'s two forms).
    pub fn clear(&self, cache_key: &DatasetId, obj_key: Option<&str>) {
        let mut caches = self.caches.write();
        match obj_key {
            Some(key) => {
                if let Some(objs) = caches.get_mut(cache_key) {
                    if let Some(container) = objs.remove(key) {
                        container.clear();
                    }
                }
            }
            None => {
                if let Some(objs) = caches.remove(cache_key) {
                    for container in objs.into_values() {
                        container.clear();
                    }
                }
            }
        }
    }

    /// Drop everything cached by every dataset, e.g. at process shutdown
    /// (mirrors the original's `atexit`-registered `clear_all`).
    pub fn clear_all(&self) {
        let mut caches = self.caches.write();
        for objs in caches.values() {
            for container in objs.values() {
                container.clear();
            }
        }
        caches.clear();
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;

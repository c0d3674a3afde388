// SPDX-License-Identifier: MIT

//! Single-flight coordination of work shared across concurrent callers.
//!
//! Used by the broadcast subsystem (coordinating concurrent first-use
//! fetches of the same block) and by the block store (coordinating
//! concurrent `get` calls for the same block on the same node).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Notify;

struct Slot<V> {
    notify: Arc<Notify>,
    result: Mutex<Option<V>>,
}

/// Coordinates concurrent callers keyed by `K` so that work for a given key
/// runs exactly once; late callers observe the winner's result.
pub struct Coordinator<K, V> {
    slots: Mutex<HashMap<K, Arc<Slot<V>>>>,
}

impl<K, V> Default for Coordinator<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }
}

impl<K, V> Coordinator<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure that `work` runs exactly once for `key` among concurrent
    /// callers; losers await the winner's result instead of repeating it.
    pub async fn coordinate<F, Fut>(&self, key: K, work: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let (slot, is_winner) = {
            let mut slots = self.slots.lock();
            if let Some(slot) = slots.get(&key) {
                (slot.clone(), false)
            } else {
                let slot = Arc::new(Slot { notify: Arc::new(Notify::new()), result: Mutex::new(None) });
                slots.insert(key, slot.clone());
                (slot, true)
            }
        };

        if is_winner {
            let result = work().await;
            *slot.result.lock() = Some(result.clone());
            slot.notify.notify_waiters();
            result
        } else {
            loop {
                if let Some(result) = slot.result.lock().clone() {
                    return result;
                }
                slot.notify.notified().await;
            }
        }
    }

    /// Reset any progress flag and cached result for `key`, so a subsequent
    /// `coordinate` call runs `work` again.
    pub fn clear(&self, key: &K) {
        self.slots.lock().remove(key);
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;

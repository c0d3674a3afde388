// SPDX-License-Identifier: MIT

//! Where a shuffled key lands (spec section 4.7, grounded on `dataset.py`'s
//! `portable_hash`-keyed default partitioning and `RangePartitioner`).
//!
//! Python's default hashes with the process's (randomized) `hash()`, which
//! only needs to agree within one interpreter. A shuffle's writer and
//! reader run in separate processes here, so the hash must be identical
//! across them: FNV-1a over the key's canonical JSON encoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// How a shuffle key is routed to one of `pcount` destination buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PartitionerSpec {
    /// `portable_hash(key) % pcount`, the default for every shuffle except
    /// `sort`.
    Hash,
    /// Bucket `i` holds keys in `(boundaries[i-1], boundaries[i]]`;
    /// `boundaries.len()` should be `pcount - 1`. Used by `sort`.
    Range { boundaries: Vec<Value>, reverse: bool },
}

impl PartitionerSpec {
    pub fn partition(&self, key: &Value, pcount: usize) -> usize {
        if pcount <= 1 {
            return 0;
        }
        let idx = match self {
            PartitionerSpec::Hash => (portable_hash(key) % pcount as u64) as usize,
            PartitionerSpec::Range { boundaries, reverse } => {
                let rank = boundaries.iter().take_while(|b| compare_values(b, key) != Ordering::Greater).count();
                if *reverse {
                    pcount - 1 - rank.min(pcount - 1)
                } else {
                    rank
                }
            }
        };
        idx.min(pcount - 1)
    }
}

/// A deterministic, cross-process hash of a JSON value: FNV-1a over the
/// value's canonical (sorted-key) encoding.
pub fn portable_hash(value: &Value) -> u64 {
    fnv1a(&serde_json::to_vec(value).unwrap_or_default())
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Order two JSON scalars; mismatched or non-scalar shapes fall back to
/// comparing their canonical string encodings so the comparison is always
/// total, even if not always meaningful.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => canonical_string(a).cmp(&canonical_string(b)),
    }
}

fn canonical_string(v: &Value) -> String {
    serde_json::to_string(v).unwrap_or_default()
}

#[cfg(test)]
#[path = "partitioner_tests.rs"]
mod tests;

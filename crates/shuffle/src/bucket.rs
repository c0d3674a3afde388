// SPDX-License-Identifier: MIT

//! The four bucket shapes a shuffle writer can route elements into (spec
//! section 4.7, grounded on `dataset.py`'s `ListBucket`/`SetBucket`/
//! `SortedListBucket` and the counter bucket `count_by_value` shuffles
//! into).
//!
//! `serde_json::Value` has no `Hash` impl, so set/counter membership is
//! tracked by the element's canonical (sorted-key) JSON string instead of
//! the value itself.

use crate::combiner::Combiner;
use crate::partitioner::compare_values;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketKind {
    List,
    Set,
    SortedList,
    Counter,
}

/// One destination slot of a shuffle write: the elements a single worker
/// routed to it, accumulated across every source partition it processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Bucket {
    List(Vec<Value>),
    Set(HashMap<String, Value>),
    SortedList(Vec<Value>),
    /// Canonical key string -> (one representative value, running count).
    Counter(HashMap<String, (Value, i64)>),
}

impl Bucket {
    pub fn new(kind: BucketKind) -> Self {
        match kind {
            BucketKind::List => Bucket::List(Vec::new()),
            BucketKind::Set => Bucket::Set(HashMap::new()),
            BucketKind::SortedList => Bucket::SortedList(Vec::new()),
            BucketKind::Counter => Bucket::Counter(HashMap::new()),
        }
    }

    pub fn kind(&self) -> BucketKind {
        match self {
            Bucket::List(_) => BucketKind::List,
            Bucket::Set(_) => BucketKind::Set,
            Bucket::SortedList(_) => BucketKind::SortedList,
            Bucket::Counter(_) => BucketKind::Counter,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Bucket::List(v) | Bucket::SortedList(v) => v.is_empty(),
            Bucket::Set(m) => m.is_empty(),
            Bucket::Counter(m) => m.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Bucket::List(v) | Bucket::SortedList(v) => v.len(),
            Bucket::Set(m) => m.len(),
            Bucket::Counter(m) => m.len(),
        }
    }

    /// Route one shuffled value into this bucket.
    pub fn insert(&mut self, value: Value) {
        match self {
            Bucket::List(v) => v.push(value),
            Bucket::SortedList(v) => {
                let pos = v.partition_point(|existing| compare_values(existing, &value) != std::cmp::Ordering::Greater);
                v.insert(pos, value);
            }
            Bucket::Set(m) => {
                m.insert(canonical_key(&value), value);
            }
            Bucket::Counter(m) => {
                let key = canonical_key(&value);
                m.entry(key).and_modify(|(_, count)| *count += 1).or_insert((value, 1));
            }
        }
    }

    /// Fold `other`'s contents into this bucket, e.g. merging a remote
    /// worker's partial counter into a pairwise sum.
    pub fn merge(&mut self, other: Bucket) {
        for value in other.into_values() {
            self.insert(value);
        }
    }

    /// Reduce every element down to a single combined value, matching
    /// `aggregate`'s `comb` fold over a non-empty bucket. The bucket
    /// collapses to a one-element list holding the result.
    pub fn combine(&mut self, combiner: &dyn Combiner) {
        if self.is_empty() {
            return;
        }
        let combined = combiner.combine(std::mem::replace(self, Bucket::List(Vec::new())).into_values());
        *self = Bucket::List(vec![combined]);
    }

    /// Flatten this bucket to the values a shuffle reader streams out.
    /// Counter entries are emitted as `[value, count]` pairs.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Bucket::List(v) | Bucket::SortedList(v) => v,
            Bucket::Set(m) => m.into_values().collect(),
            Bucket::Counter(m) => m.into_values().map(|(value, count)| json!([value, count])).collect(),
        }
    }
}

fn canonical_key(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
#[path = "bucket_tests.rs"]
mod tests;

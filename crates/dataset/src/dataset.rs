// SPDX-License-Identifier: MIT

//! The lazy, driver-resident handle to a distributed collection (spec
//! section 4.6, grounded on `dataset.py`'s `Dataset` base class). A
//! `Dataset` is untyped — every element is a `serde_json::Value`, matching
//! the RMI layer's wire convention — and every transformation method
//! consumes the `Arc<Dataset>` it's called on and returns a new one, the
//! same immutable-handle style `dataset.py`'s methods follow.
//!
//! Terminal actions (`collect`, `reduce`, `take`, ...) are not methods
//! here: running one means scheduling and executing tasks, which would
//! make this crate depend on `bndl-scheduler` while the scheduler depends
//! on this crate's [`Partition`] and [`Lineage`] to plan a job. They live
//! as free functions in `bndl-scheduler` instead, operating over a
//! `Dataset` handle.

use crate::builtin;
use crate::lineage::Lineage;
use crate::partition::Partition;
use crate::registries::Registries;
use bndl_core::{DatasetId, WorkerName};
use bndl_shuffle::{BucketKind, PartitionerSpec};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

type WorkerPreference = Arc<dyn Fn(&[WorkerName]) -> Vec<WorkerName> + Send + Sync>;
type WorkerFilter = Arc<dyn Fn(&WorkerName) -> bool + Send + Sync>;

pub struct Dataset {
    pub id: DatasetId,
    pub lineage: Lineage,
    pcount: usize,
    registries: Registries,
    /// Driver-side hint cache: which worker last materialized a cached
    /// partition. Never consulted by a worker, only by the scheduler
    /// deciding where to send a task.
    cache_locs: Mutex<HashMap<usize, WorkerName>>,
    worker_preference: Mutex<Option<WorkerPreference>>,
    worker_filter: Mutex<Option<WorkerFilter>>,
}

impl Dataset {
    /// A literal driver-supplied collection, split into `pcount` partitions.
    pub fn from_iterable(registries: Registries, elements: Vec<Value>, pcount: usize) -> Arc<Dataset> {
        Arc::new(Dataset {
            id: DatasetId::new(),
            lineage: Lineage::Iterable { elements: Arc::new(elements) },
            pcount,
            registries,
            cache_locs: Mutex::new(HashMap::new()),
            worker_preference: Mutex::new(None),
            worker_filter: Mutex::new(None),
        })
    }

    pub fn id(&self) -> DatasetId {
        self.id
    }

    pub fn pcount(&self) -> usize {
        self.pcount
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    fn child(&self, lineage: Lineage, pcount: usize) -> Arc<Dataset> {
        Arc::new(Dataset {
            id: DatasetId::new(),
            lineage,
            pcount,
            registries: self.registries.clone(),
            cache_locs: Mutex::new(HashMap::new()),
            worker_preference: Mutex::new(None),
            worker_filter: Mutex::new(None),
        })
    }

    /// This dataset's partitions, each carrying the source partition(s) it
    /// recomputes from. A scheduler walks this backward from a terminal
    /// action's dataset to build a job's stages; [`Lineage::ShuffleRead`]
    /// partitions carry no sources, since they're fetched over the network
    /// rather than recomputed, which is exactly where a stage boundary
    /// belongs.
    pub fn partitions(&self) -> Vec<Arc<Partition>> {
        match &self.lineage {
            Lineage::Iterable { .. } | Lineage::ShuffleRead { .. } => (0..self.pcount).map(|i| Arc::new(Partition::new(self.id, i))).collect(),
            Lineage::MapPartitions { src, .. } | Lineage::Cached { src } => {
                src.partitions().into_iter().map(|p| Arc::new(Partition::with_sources(self.id, p.idx, vec![p]))).collect()
            }
            Lineage::ShuffleWrite { src, .. } => src.partitions().into_iter().map(|p| Arc::new(Partition::with_sources(self.id, p.idx, vec![p]))).collect(),
            Lineage::Mask { src, partitions } => {
                let src_parts = src.partitions();
                partitions
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &src_idx)| src_parts.get(src_idx).cloned().map(|p| Arc::new(Partition::with_sources(self.id, i, vec![p]))))
                    .collect()
            }
            Lineage::Union { sources } => {
                let mut out = Vec::new();
                for src in sources {
                    for p in src.partitions() {
                        let idx = out.len();
                        out.push(Arc::new(Partition::with_sources(self.id, idx, vec![p])));
                    }
                }
                out
            }
            Lineage::Zip { left, right, .. } => left
                .partitions()
                .into_iter()
                .zip(right.partitions())
                .enumerate()
                .map(|(i, (l, r))| Arc::new(Partition::with_sources(self.id, i, vec![l, r])))
                .collect(),
        }
    }

    /// The general escape hatch behind `map`/`filter`/`glom`/etc: run
    /// `decoder`, a [`crate::transform::PartitionTransform`] every worker
    /// registered under that name, over each partition with `payload`.
    pub fn map_partitions(self: Arc<Self>, decoder: impl Into<String>, payload: Value) -> Arc<Dataset> {
        let pcount = self.pcount;
        let lineage = Lineage::MapPartitions { src: self.clone(), decoder: decoder.into(), payload };
        self.child(lineage, pcount)
    }

    fn element_map(self: Arc<Self>, element_fn: impl Into<String>) -> Arc<Dataset> {
        self.map_partitions(builtin::ELEMENT_MAP, json!(element_fn.into()))
    }

    /// Transform each element one-to-one through a named [`crate::element::ElementFn`].
    pub fn map(self: Arc<Self>, element_fn: impl Into<String>) -> Arc<Dataset> {
        self.element_map(element_fn)
    }

    /// Keep only elements for which the named [`crate::element::ElementFn`]
    /// returns a non-empty output.
    pub fn filter(self: Arc<Self>, element_fn: impl Into<String>) -> Arc<Dataset> {
        self.element_map(element_fn)
    }

    /// Expand each element into zero or more through a named
    /// [`crate::element::ElementFn`].
    pub fn flat_map(self: Arc<Self>, element_fn: impl Into<String>) -> Arc<Dataset> {
        self.element_map(element_fn)
    }

    /// Derive a `[key, value]` pair from each element through a named
    /// [`crate::element::ElementFn`], the input every `*_by_key` operation
    /// and `distinct`/`count_by_value` expect.
    pub fn key_by(self: Arc<Self>, element_fn: impl Into<String>) -> Arc<Dataset> {
        self.element_map(element_fn)
    }

    /// Pair each element with a value derived from it through a named
    /// [`crate::element::ElementFn`] that returns `[element, value]` pairs
    /// (spec section 6's `with_value`). A constant value is simply an
    /// `ElementFn` that ignores its argument and always pairs the element
    /// with the same value — this is the same `element_map` wrapper
    /// `key_by` is, just with the pair built the other way round.
    pub fn with_value(self: Arc<Self>, value_fn: impl Into<String>) -> Arc<Dataset> {
        self.element_map(value_fn)
    }

    /// Key every element with a globally unique integer id (spec section
    /// 6's `key_by_id`): partition `idx`'s `i`-th element gets `idx + i *
    /// pcount`, so ids never collide across partitions without needing a
    /// job to compute per-partition offsets first, unlike
    /// [`Self::key_by_idx_with_offsets`].
    pub fn key_by_id(self: Arc<Self>) -> Arc<Dataset> {
        let pcount = self.pcount;
        self.map_partitions(builtin::KEY_BY_ID, json!(pcount))
    }

    /// Key every element with its position in collection order, given
    /// each partition's precomputed starting offset (spec section 6's
    /// `key_by_idx`). Computing `offsets` needs a job that sums partition
    /// sizes, so it lives on `bndl-scheduler`'s `key_by_idx` action, which
    /// runs that job before calling this.
    pub fn key_by_idx_with_offsets(self: Arc<Self>, offsets: Vec<usize>) -> Arc<Dataset> {
        self.map_partitions(builtin::KEY_BY_IDX, json!(offsets))
    }

    /// Collapse each partition into a single `[elements...]` array.
    pub fn glom(self: Arc<Self>) -> Arc<Dataset> {
        self.map_partitions(builtin::GLOM, Value::Null)
    }

    /// Join each partition's (string) elements with `separator`, appended
    /// after every element.
    pub fn concat(self: Arc<Self>, separator: impl Into<String>) -> Arc<Dataset> {
        self.map_partitions(builtin::CONCAT, json!(separator.into()))
    }

    /// Concatenate this dataset's partitions with `others`', flattening
    /// any operand that is itself already a union instead of nesting.
    pub fn union(self: Arc<Self>, others: Vec<Arc<Dataset>>) -> Arc<Dataset> {
        let mut sources = Vec::new();
        for ds in std::iter::once(self.clone()).chain(others) {
            match &ds.lineage {
                Lineage::Union { sources: inner } => sources.extend(inner.iter().cloned()),
                _ => sources.push(ds),
            }
        }
        let pcount = sources.iter().map(|d| d.pcount).sum();
        self.child(Lineage::Union { sources }, pcount)
    }

    /// Keep only the listed source partition indices, in the given order
    /// (a reordering as well as a subset).
    pub fn mask_partitions(self: Arc<Self>, partitions: Vec<usize>) -> Arc<Dataset> {
        let pcount = partitions.len();
        let src = self.clone();
        self.child(Lineage::Mask { src, partitions }, pcount)
    }

    /// Pair this dataset's partitions positionally with `other`'s, running
    /// a named [`crate::zip::ZipTransform`] over each pair. The shorter
    /// side bounds the partition count.
    pub fn zip_partitions(self: Arc<Self>, other: Arc<Dataset>, decoder: impl Into<String>, payload: Value) -> Arc<Dataset> {
        let pcount = self.pcount.min(other.pcount);
        let left = self.clone();
        self.child(Lineage::Zip { left, right: other, decoder: decoder.into(), payload }, pcount)
    }

    /// Pair this dataset's elements positionally with `other`'s,
    /// truncating to the shorter side (spec section 6's `zip`): a
    /// `zip_partitions` whose combiner does nothing but pairing.
    pub fn zip(self: Arc<Self>, other: Arc<Dataset>) -> Arc<Dataset> {
        self.zip_partitions(other, builtin::ZIP_PAIRS, Value::Null)
    }

    /// Materialize once and serve every subsequent read from cache instead
    /// of recomputing.
    pub fn cache(self: Arc<Self>) -> Arc<Dataset> {
        let pcount = self.pcount;
        let src = self.clone();
        self.child(Lineage::Cached { src }, pcount)
    }

    /// Peel back a `cache()` wrapper, restoring direct recomputation. A
    /// no-op on a dataset that isn't cached.
    pub fn uncache(self: Arc<Self>) -> Arc<Dataset> {
        match &self.lineage {
            Lineage::Cached { src } => src.clone(),
            _ => self,
        }
    }

    /// Route this dataset's `[key, value]` records into `pcount`
    /// per-destination buckets and read them back: the shuffle-write /
    /// shuffle-read pair every `*_by_key` operation is built from.
    fn shuffle(self: Arc<Self>, pcount: usize, partitioner: PartitionerSpec, bucket_kind: BucketKind, comb: Option<String>) -> Arc<Dataset> {
        let src = self.clone();
        let writer = self.child(Lineage::ShuffleWrite { src, pcount, partitioner, bucket_kind, comb }, pcount);
        let reader_src = writer.clone();
        writer.child(Lineage::ShuffleRead { writer: reader_src }, pcount)
    }

    /// Group every value sharing a key into `[key, [values...]]`, with no
    /// pre-combine (spec section 4.6's `group_by_key`).
    pub fn group_by_key(self: Arc<Self>, pcount: usize) -> Arc<Dataset> {
        self.shuffle(pcount, PartitionerSpec::Hash, BucketKind::List, None).map_partitions(builtin::GROUP_RUNS, Value::Null)
    }

    /// Pre-combine each partition's values per key with `local`, shuffle
    /// the partials, then fold them per key with `merge` (spec section
    /// 4.6's `combine_by_key`).
    pub fn combine_by_key(self: Arc<Self>, pcount: usize, local: impl Into<String>, merge: impl Into<String>) -> Arc<Dataset> {
        let premerged = self.map_partitions(builtin::PREMERGE_BY_KEY, json!(local.into()));
        premerged.shuffle(pcount, PartitionerSpec::Hash, BucketKind::List, None).map_partitions(builtin::FINALIZE_BY_KEY, json!(merge.into()))
    }

    /// `combine_by_key` with the same combiner on both sides (spec section
    /// 4.6: "`reduce_by_key(f)` is `combine_by_key(id, f, f)`").
    pub fn reduce_by_key(self: Arc<Self>, pcount: usize, combiner: impl Into<String>) -> Arc<Dataset> {
        let combiner = combiner.into();
        self.combine_by_key(pcount, combiner.clone(), combiner)
    }

    /// Deduplicate elements across the whole dataset: a per-worker set
    /// bucket already dedups within one worker, so a `SET_UNION` pass
    /// after shuffle-read dedups across workers sharing a destination
    /// bucket index too.
    pub fn distinct(self: Arc<Self>, pcount: usize) -> Arc<Dataset> {
        self.map_partitions(builtin::SELF_PAIR, Value::Null)
            .shuffle(pcount, PartitionerSpec::Hash, BucketKind::Set, None)
            .map_partitions(builtin::SET_UNION, Value::Null)
    }

    /// Count occurrences of each distinct element across the whole
    /// dataset, emitting `[value, count]` pairs.
    pub fn count_by_value(self: Arc<Self>, pcount: usize) -> Arc<Dataset> {
        self.map_partitions(builtin::SELF_PAIR, Value::Null)
            .shuffle(pcount, PartitionerSpec::Hash, BucketKind::Counter, None)
            .map_partitions(builtin::SUM_COUNTS, Value::Null)
    }

    /// Range-shuffle into `pcount` buckets whose elements are already
    /// sorted within each bucket. `boundaries` (`pcount - 1` of them) must
    /// already be known, e.g. from a prior sampling job; computing them is
    /// `bndl-scheduler`'s job, not this crate's.
    pub fn sort_with_boundaries(self: Arc<Self>, pcount: usize, boundaries: Vec<Value>, reverse: bool) -> Arc<Dataset> {
        self.map_partitions(builtin::SELF_PAIR, Value::Null).shuffle(pcount, PartitionerSpec::Range { boundaries, reverse }, BucketKind::SortedList, None)
    }

    /// A random subset of this dataset's elements, sized by `fraction`
    /// (spec section 6's `sample`). `fraction <= 0.0` yields nothing;
    /// `fraction >= 1.0` returns this dataset unchanged, matching the
    /// original's exact-`1.0` shortcut.
    pub fn sample(self: Arc<Self>, fraction: f64, with_replacement: bool, seed: u64) -> Arc<Dataset> {
        if fraction <= 0.0 {
            return Dataset::from_iterable(self.registries.clone(), Vec::new(), self.pcount);
        }
        if fraction >= 1.0 {
            return self;
        }
        let payload = json!({"fraction": fraction, "seed": seed, "with_replacement": with_replacement});
        self.map_partitions(builtin::SAMPLE, payload)
    }

    pub fn cache_loc(&self, idx: usize) -> Option<WorkerName> {
        self.cache_locs.lock().get(&idx).cloned()
    }

    pub fn set_cache_loc(&self, idx: usize, worker: WorkerName) {
        self.cache_locs.lock().insert(idx, worker);
    }

    pub fn clear_cache_locs(&self) {
        self.cache_locs.lock().clear();
    }

    /// A driver-local hint the scheduler may use to pick among otherwise
    /// equal candidate workers for a task, e.g. to spread load. Never
    /// serialized: only the driver-resident scheduler evaluates it.
    pub fn set_worker_preference(&self, f: WorkerPreference) {
        *self.worker_preference.lock() = Some(f);
    }

    pub fn worker_preference(&self) -> Option<WorkerPreference> {
        self.worker_preference.lock().clone()
    }

    /// A driver-local hard constraint on which workers may run this
    /// dataset's tasks at all.
    pub fn set_worker_filter(&self, f: WorkerFilter) {
        *self.worker_filter.lock() = Some(f);
    }

    pub fn worker_filter(&self) -> Option<WorkerFilter> {
        self.worker_filter.lock().clone()
    }
}

#[cfg(test)]
#[path = "dataset_tests.rs"]
mod tests;

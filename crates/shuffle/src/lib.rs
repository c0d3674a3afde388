// SPDX-License-Identifier: MIT

//! Shuffle (spec section 4.7, grounded on `dataset.py`'s
//! `ShuffleWritingDataset`/`ShuffleReadingDataset`): each worker routes a
//! source partition's elements into per-destination buckets
//! ([`bucket`]/[`registry`]/[`writer`]), and a destination partition reads
//! its bucket back from every worker that wrote one ([`reader`]/
//! [`service`]), local-first then parallel-remote.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod bucket;
mod combiner;
mod partitioner;
mod reader;
mod registry;
mod service;
mod writer;

pub use bucket::{Bucket, BucketKind};
pub use combiner::{Combiner, CombinerRegistry};
pub use partitioner::{portable_hash, PartitionerSpec};
pub use reader::ShuffleReader;
pub use registry::BucketRegistry;
pub use service::{ShuffleService, SHUFFLE_SERVICE_NAME};
pub use writer::ShuffleWriter;

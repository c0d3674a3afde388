// SPDX-License-Identifier: MIT

//! Lazy dataset lineage (spec section 4.6, grounded on `dataset.py`): a
//! [`Dataset`] is a driver-resident description of how to compute a
//! distributed collection's partitions, built up by chaining
//! transformation methods rather than running anything. [`Partition`] is
//! its unit of parallel work; [`Lineage`] records how each dataset's
//! partitions were derived from their sources, which a scheduler walks
//! backward to plan a job's stages.
//!
//! Every transform body is registered by name in a [`Registries`] bundle
//! instead of serialized, the same way `bndl-accumulator` and
//! `bndl-shuffle` register named operators: Rust has no way to pickle an
//! arbitrary closure across a process boundary, so worker and driver must
//! agree on the registered name ahead of time.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod builtin;
mod dataset;
mod element;
mod hll;
mod lineage;
mod partition;
mod registries;
mod transform;
mod zip;

pub use builtin::install_builtins;
pub use dataset::Dataset;
pub use element::{ElementFn, ElementRegistry};
pub use hll::HyperLogLog;
pub use lineage::Lineage;
pub use partition::Partition;
pub use registries::Registries;
pub use transform::{PartitionIter, PartitionTransform, TransformRegistry};
pub use zip::{ZipRegistry, ZipTransform};

// SPDX-License-Identifier: MIT

//! `bndl-driver`: the driver-side facade over a connected cluster (spec
//! component summary for `bndl-driver`). [`Context`] dials a cluster's
//! workers and exposes dataset construction plus the terminal actions in
//! `bndl-scheduler` without the caller having to juggle an [`bndl_scheduler::Engine`]
//! and worker list directly.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod context;

pub use context::Context;

// SPDX-License-Identifier: MIT

//! Driver-resident accumulators workers update via RMI (spec section 4.4,
//! grounded on `accumulate.py`). Mirrors `bndl-store`'s split between the
//! value itself, the RMI-facing service, and the proxy a caller holds.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod accumulator;
mod op;
mod proxy;
mod registry;
mod service;

pub use accumulator::Accumulator;
pub use op::{apply_fixed, AccumOp};
pub use proxy::AccumulatorProxy;
pub use registry::{NamedOpApplier, NamedOpRegistry};
pub use service::{AccumulatorHandle, AccumulatorService, ACCUMULATOR_SERVICE_NAME};

// SPDX-License-Identifier: MIT

//! Seeder-to-workers distribution of large read-only values (spec section
//! 4.5, grounded on `broadcast.py`).

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod chunk;
mod codec;
mod service;
mod value;

pub use chunk::{chunk_size, split};
pub use codec::BroadcastCodec;
pub use service::{BroadcastService, BROADCAST_SERVICE_NAME};
pub use value::{broadcast, BroadcastValue};

// SPDX-License-Identifier: MIT

//! The RMI transport: framed connections, peer bookkeeping, and the service
//! dispatch loop that together implement the cluster's remote method
//! invocation layer (spec components C1/C2).

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod attachment;
mod connection;
mod invocation;
mod message;
mod node;
mod peer;
mod service;
mod thread_pool;

pub use attachment::{IncomingAttachment, OutgoingAttachment};
pub use connection::Connection;
pub use invocation::call;
pub use message::Message;
pub use node::Node;
pub use peer::{PeerHandle, PeerRegistry, TcpConnection};
pub use service::{Dispatch, Service, ServiceRegistry};
pub use thread_pool::OnDemandThreadPool;

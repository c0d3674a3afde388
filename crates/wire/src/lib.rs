// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bndl-wire: the framed wire schema shared by every peer — frame layout,
//! the request/response envelope, and block specs (spec sections 4.1 and 6).
//!
//! Wire format: 1-byte flags + optional attachments + a length-prefixed body.

mod codec;
mod frame;
mod types;

pub use codec::{decode, encode};
pub use frame::{read_frame, write_frame, ProtocolError, RawAttachment, RawFrame, FLAG_ATTACHMENTS, FLAG_FAST_CODEC};
pub use types::{BlockSpec, RemoteException, Request, Response};

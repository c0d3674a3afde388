// SPDX-License-Identifier: MIT

//! The envelope carried inside a frame's body: either side of an RMI
//! exchange, tagged so a single read loop can dispatch either way.

use bndl_wire::{Request, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Message {
    Request(Request),
    Response(Response),
}

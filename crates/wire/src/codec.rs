// SPDX-License-Identifier: MIT

//! Body (de)serialization for the two codecs a frame's fast bit selects
//! between: `bincode` for the common fast path, `serde_json` as the
//! generic/"auto" fallback (spec section 4.5's broadcast `serialization`
//! options reuse the same choice).

use crate::frame::ProtocolError;
use serde::{de::DeserializeOwned, Serialize};

pub fn encode(value: &impl Serialize, fast: bool) -> Result<Vec<u8>, ProtocolError> {
    if fast {
        Ok(bincode::serialize(value)?)
    } else {
        Ok(serde_json::to_vec(value)?)
    }
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8], fast: bool) -> Result<T, ProtocolError> {
    if fast {
        Ok(bincode::deserialize(bytes)?)
    } else {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT

//! Serialization for broadcast values (spec section 4.5, grounded on
//! `broadcast.py`'s `serialization` parameter). The original chooses among
//! pickle/marshal/json/binary/text at the call site depending on what the
//! value happens to be; here `T` is fixed by the type system at compile
//! time, so there is no dynamic "can this marshal" fallback to make —
//! `Auto` always resolves to the fast binary codec.

use bndl_core::BndlError;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastCodec {
    /// The fast binary codec, matching the original's default when the
    /// value marshals cleanly.
    #[default]
    Auto,
    Bincode,
    Json,
}

impl BroadcastCodec {
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, BndlError> {
        match self {
            BroadcastCodec::Auto | BroadcastCodec::Bincode => bincode::serialize(value)
                .map_err(|e| BndlError::ProtocolError(format!("broadcast bincode encode failed: {e}"))),
            BroadcastCodec::Json => {
                serde_json::to_vec(value).map_err(|e| BndlError::ProtocolError(format!("broadcast json encode failed: {e}")))
            }
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, BndlError> {
        match self {
            BroadcastCodec::Auto | BroadcastCodec::Bincode => bincode::deserialize(bytes)
                .map_err(|e| BndlError::ProtocolError(format!("broadcast bincode decode failed: {e}"))),
            BroadcastCodec::Json => {
                serde_json::from_slice(bytes).map_err(|e| BndlError::ProtocolError(format!("broadcast json decode failed: {e}")))
            }
        }
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;

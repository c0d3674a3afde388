// SPDX-License-Identifier: MIT

//! Attachments: the escape hatch for large binary payloads that should not
//! transit the body codec (spec section 4.1).
//!
//! On the wire each attachment's byte string carries a leading marker:
//! `r` (remote) means the remaining bytes are the payload itself; `l`
//! (local) means the remaining bytes are a UTF-8 filesystem path that both
//! peers can read directly because they are co-located on the same host.
//! The local shortcut puts zero payload bytes on the wire beyond the path.

use std::path::PathBuf;

const MARKER_REMOTE: u8 = b'r';
const MARKER_LOCAL: u8 = b'l';

/// An attachment as the sender sees it, before it is resolved onto the wire.
#[derive(Debug, Clone)]
pub enum OutgoingAttachment {
    /// Ship these bytes over the socket.
    Bytes(Vec<u8>),
    /// Both peers are on the same host: tell the receiver to read this path
    /// directly instead of waiting for bytes on the wire.
    LocalPath(PathBuf),
}

impl OutgoingAttachment {
    /// Resolve into the marker-prefixed bytes that actually cross the wire.
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        match self {
            OutgoingAttachment::Bytes(b) => {
                let mut out = Vec::with_capacity(b.len() + 1);
                out.push(MARKER_REMOTE);
                out.extend_from_slice(b);
                out
            }
            OutgoingAttachment::LocalPath(p) => {
                let mut out = Vec::new();
                out.push(MARKER_LOCAL);
                out.extend_from_slice(p.to_string_lossy().as_bytes());
                out
            }
        }
    }
}

/// An attachment as the receiver sees it, after resolving the marker.
#[derive(Debug, Clone)]
pub enum IncomingAttachment {
    Bytes(Vec<u8>),
    LocalPath(PathBuf),
}

impl IncomingAttachment {
    pub fn from_wire_bytes(mut raw: Vec<u8>) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        let marker = raw.remove(0);
        match marker {
            MARKER_REMOTE => Some(IncomingAttachment::Bytes(raw)),
            MARKER_LOCAL => {
                let path = String::from_utf8(raw).ok()?;
                Some(IncomingAttachment::LocalPath(PathBuf::from(path)))
            }
            _ => None,
        }
    }

    /// Read the attachment's bytes, following the local-path shortcut if
    /// that's what the sender negotiated.
    pub async fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        match self {
            IncomingAttachment::Bytes(b) => Ok(b),
            IncomingAttachment::LocalPath(p) => tokio::fs::read(p).await,
        }
    }
}

#[cfg(test)]
#[path = "attachment_tests.rs"]
mod tests;

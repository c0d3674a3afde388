// SPDX-License-Identifier: MIT

//! The framed wire format (spec section 4.1 / 6):
//!
//! ```text
//! 1 byte  flags   bit0 = fast binary codec used for the body
//!                 bit1 = attachments present
//! [if attachments: u32 count, then per attachment: u32 key_len, key,
//!                  u32 size, bytes]
//! u32 body_len, body bytes
//! ```
//!
//! This module only frames raw byte buffers; `bndl-net`'s `Connection`
//! layers the read/write mutexes, `is_connected` bookkeeping, and the
//! attachment sender/local-path shortcut on top of it.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const FLAG_FAST_CODEC: u8 = 0b0000_0001;
pub const FLAG_ATTACHMENTS: u8 = 0b0000_0010;

/// A frame or schema violation; fatal for the connection it occurred on.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed (not connected)")]
    NotConnected,
    #[error("frame body exceeds the maximum allowed size ({0} bytes)")]
    FrameTooLarge(u32),
    #[error("i/o error reading frame: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid utf-8 in attachment key")]
    InvalidKey,
    #[error("fast-codec decode failed: {0}")]
    FastCodec(#[from] bincode::Error),
    #[error("json codec decode failed: {0}")]
    JsonCodec(#[from] serde_json::Error),
}

/// Upper bound on a single frame body, guarding against a corrupt length
/// prefix turning into an unbounded allocation.
pub const MAX_FRAME_LEN: u32 = 256 * 1024 * 1024;

/// A raw attachment: a key and its bytes, read off the wire as-is.
pub struct RawAttachment {
    pub key: String,
    pub bytes: Vec<u8>,
}

/// A decoded frame: the raw body bytes plus any attachments, with the fast
/// bit still carried so the caller knows which codec to decode the body
/// with.
pub struct RawFrame {
    pub fast_codec: bool,
    pub attachments: Vec<RawAttachment>,
    pub body: Vec<u8>,
}

/// Write one frame: flags, optional attachments, then the length-prefixed
/// body. Does not flush; callers decide when to `drain`/`flush`.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    w: &mut W,
    fast_codec: bool,
    attachments: &[(String, Vec<u8>)],
    body: &[u8],
) -> Result<(), ProtocolError> {
    let mut flags = 0u8;
    if fast_codec {
        flags |= FLAG_FAST_CODEC;
    }
    if !attachments.is_empty() {
        flags |= FLAG_ATTACHMENTS;
    }
    w.write_u8(flags).await?;

    if !attachments.is_empty() {
        w.write_u32(attachments.len() as u32).await?;
        for (key, bytes) in attachments {
            w.write_u32(key.len() as u32).await?;
            w.write_all(key.as_bytes()).await?;
            w.write_u32(bytes.len() as u32).await?;
            w.write_all(bytes).await?;
        }
    }

    if body.len() as u64 > MAX_FRAME_LEN as u64 {
        return Err(ProtocolError::FrameTooLarge(body.len() as u32));
    }
    w.write_u32(body.len() as u32).await?;
    w.write_all(body).await?;
    Ok(())
}

/// Read one frame. Returns `Err(ProtocolError::NotConnected)` when the peer
/// closed cleanly before any bytes of a new frame arrived; any other
/// truncation is a `ProtocolError::Io` (unexpected EOF mid-frame).
pub async fn read_frame<R: AsyncRead + Unpin>(r: &mut R) -> Result<RawFrame, ProtocolError> {
    let flags = match r.read_u8().await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(ProtocolError::NotConnected),
        Err(e) => return Err(e.into()),
    };
    let fast_codec = flags & FLAG_FAST_CODEC != 0;
    let has_attachments = flags & FLAG_ATTACHMENTS != 0;

    let mut attachments = Vec::new();
    if has_attachments {
        let count = r.read_u32().await?;
        for _ in 0..count {
            let key_len = r.read_u32().await?;
            if key_len > MAX_FRAME_LEN {
                return Err(ProtocolError::FrameTooLarge(key_len));
            }
            let mut key_buf = vec![0u8; key_len as usize];
            r.read_exact(&mut key_buf).await?;
            let key = String::from_utf8(key_buf).map_err(|_| ProtocolError::InvalidKey)?;

            let size = r.read_u32().await?;
            if size > MAX_FRAME_LEN {
                return Err(ProtocolError::FrameTooLarge(size));
            }
            let mut bytes = vec![0u8; size as usize];
            r.read_exact(&mut bytes).await?;
            attachments.push(RawAttachment { key, bytes });
        }
    }

    let body_len = r.read_u32().await?;
    if body_len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(body_len));
    }
    let mut body = vec![0u8; body_len as usize];
    r.read_exact(&mut body).await?;

    Ok(RawFrame { fast_codec, attachments, body })
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;

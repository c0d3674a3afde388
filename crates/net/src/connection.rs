// SPDX-License-Identifier: MIT

//! A bidirectional framed stream connection (spec section 4.1).
//!
//! Independent read and write locks allow concurrent send/recv on the two
//! directions while serializing each direction against itself. `is_connected`
//! flips to false once the reader hits EOF or the writer starts closing;
//! sending after that point fails fast with `NotConnected` rather than
//! attempting the write.

use crate::attachment::{IncomingAttachment, OutgoingAttachment};
use crate::message::Message;
use bndl_core::BndlError;
use bndl_wire::{read_frame, write_frame, ProtocolError};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

pub struct Connection<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
    connected: AtomicBool,
    pub bytes_sent: std::sync::atomic::AtomicU64,
    pub bytes_received: std::sync::atomic::AtomicU64,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            connected: AtomicBool::new(true),
            bytes_sent: Default::default(),
            bytes_received: Default::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send a message, using the fast binary codec unless `use_json` asks
    /// for the generic fallback, with the given attachments.
    pub async fn send(
        &self,
        msg: &Message,
        use_json: bool,
        attachments: &[(String, OutgoingAttachment)],
    ) -> Result<(), BndlError> {
        if !self.is_connected() {
            return Err(BndlError::not_connected("peer"));
        }
        let body = bndl_wire::encode(msg, !use_json).map_err(proto_to_bndl)?;
        let wire_atts: Vec<(String, Vec<u8>)> =
            attachments.iter().map(|(k, v)| (k.clone(), v.to_wire_bytes())).collect();

        let mut writer = self.writer.lock().await;
        if write_frame(&mut *writer, !use_json, &wire_atts, &body).await.is_err() {
            self.connected.store(false, Ordering::SeqCst);
            return Err(BndlError::not_connected("peer"));
        }
        writer.flush().await.map_err(|e| BndlError::ProtocolError(e.to_string()))?;
        let sent: u64 = body.len() as u64 + wire_atts.iter().map(|(_, b)| b.len() as u64).sum::<u64>();
        self.bytes_sent.fetch_add(sent, Ordering::Relaxed);
        Ok(())
    }

    /// Receive the next message and its resolved attachments.
    pub async fn recv(&self) -> Result<(Message, Vec<(String, IncomingAttachment)>), BndlError> {
        if !self.is_connected() {
            return Err(BndlError::not_connected("peer"));
        }
        let mut reader = self.reader.lock().await;
        let frame = match read_frame(&mut *reader).await {
            Ok(f) => f,
            Err(ProtocolError::NotConnected) => {
                self.connected.store(false, Ordering::SeqCst);
                return Err(BndlError::not_connected("peer"));
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                return Err(BndlError::ProtocolError(e.to_string()));
            }
        };
        drop(reader);

        self.bytes_received.fetch_add(frame.body.len() as u64, Ordering::Relaxed);
        let msg: Message = bndl_wire::decode(&frame.body, frame.fast_codec).map_err(proto_to_bndl)?;
        let attachments = frame
            .attachments
            .into_iter()
            .filter_map(|a| IncomingAttachment::from_wire_bytes(a.bytes).map(|resolved| (a.key, resolved)))
            .collect();
        Ok((msg, attachments))
    }

    /// Close the write side; subsequent sends fail with `NotConnected`.
    pub async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
    }
}

fn proto_to_bndl(e: ProtocolError) -> BndlError {
    BndlError::ProtocolError(e.to_string())
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT

//! The caller side of an RMI call: correlate a `Request` with its eventual
//! `Response`, enforce a timeout, and turn a remote exception back into a
//! `BndlError` (spec section 4.2, grounded on the original's `Invocation`).

use crate::message::Message;
use crate::peer::PeerHandle;
use bndl_core::BndlError;
use bndl_wire::{Request, Response};
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Call `method` on `service` over `peer`, waiting up to `timeout` for a
/// response. A response carrying an exception is turned into
/// `BndlError::InvocationFailure`; the deadline expiring leaves the call
/// registered (it will simply be dropped when the response eventually
/// arrives, or cleared by [`PeerHandle::fail_all_pending`] on disconnect).
pub async fn call<R, W>(
    peer: &PeerHandle<R, W>,
    service: &str,
    method: &str,
    args: Vec<Value>,
    timeout: Duration,
) -> Result<Value, BndlError>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let req_id = peer.next_req_id();
    let rx = peer.register_pending(req_id).await;

    let request = Request::new(req_id, service, method).with_args(args);
    peer.conn.send(&Message::Request(request), true, &[]).await?;

    let response = tokio::time::timeout(timeout, rx)
        .await
        .map_err(|_| BndlError::Timeout(timeout))?
        .map_err(|_| BndlError::not_connected(peer.name.to_string()))?;

    response_to_result(response, &peer.name, method)
}

fn response_to_result(response: Response, peer_name: &bndl_core::WorkerName, method: &str) -> Result<Value, BndlError> {
    if let Some(exception) = response.exception {
        return Err(BndlError::InvocationFailure {
            peer: peer_name.to_string(),
            method: method.to_string(),
            message: exception.message,
            remote_trace: exception.remote_trace,
        });
    }
    Ok(response.value.unwrap_or(Value::Null))
}

#[cfg(test)]
#[path = "invocation_tests.rs"]
mod tests;

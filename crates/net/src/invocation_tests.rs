// SPDX-License-Identifier: MIT

use super::*;
use crate::connection::Connection;
use bndl_core::WorkerName;
use bndl_wire::RemoteException;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::duplex;

fn make_pair() -> (
    PeerHandle<tokio::io::DuplexStream, tokio::io::DuplexStream>,
    Connection<tokio::io::DuplexStream, tokio::io::DuplexStream>,
) {
    let (a_r, b_w) = duplex(64 * 1024);
    let (b_r, a_w) = duplex(64 * 1024);
    let peer = PeerHandle::new(WorkerName::new("callee"), Arc::new(Connection::new(a_r, a_w)));
    (peer, Connection::new(b_r, b_w))
}

#[tokio::test]
async fn successful_call_returns_the_response_value() {
    let (peer, callee) = make_pair();

    let callee_task = tokio::spawn(async move {
        let (msg, _) = callee.recv().await.unwrap();
        let req_id = match msg {
            Message::Request(r) => r.req_id,
            _ => panic!("expected request"),
        };
        callee.send(&Message::Response(Response::ok(req_id, json!("pong"))), true, &[]).await.unwrap();
    });

    let result = call(&peer, "echo", "ping", vec![], Duration::from_secs(1)).await.unwrap();
    assert_eq!(result, json!("pong"));
    callee_task.await.unwrap();
}

#[tokio::test]
async fn remote_exception_becomes_an_invocation_failure() {
    let (peer, callee) = make_pair();

    let callee_task = tokio::spawn(async move {
        let (msg, _) = callee.recv().await.unwrap();
        let req_id = match msg {
            Message::Request(r) => r.req_id,
            _ => panic!("expected request"),
        };
        let exc = RemoteException { type_name: "ValueError".into(), message: "bad input".into(), remote_trace: None };
        callee.send(&Message::Response(Response::err(req_id, exc)), true, &[]).await.unwrap();
    });

    let err = call(&peer, "echo", "ping", vec![], Duration::from_secs(1)).await.unwrap_err();
    match err {
        BndlError::InvocationFailure { message, .. } => assert_eq!(message, "bad input"),
        other => panic!("unexpected error: {other:?}"),
    }
    callee_task.await.unwrap();
}

#[tokio::test]
async fn no_response_within_deadline_times_out() {
    let (peer, _callee) = make_pair();
    let err = call(&peer, "echo", "ping", vec![], Duration::from_millis(20)).await.unwrap_err();
    assert!(matches!(err, BndlError::Timeout(_)));
}

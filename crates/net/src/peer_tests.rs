// SPDX-License-Identifier: MIT

use super::*;
use bndl_wire::Response;
use serde_json::json;
use tokio::io::duplex;

fn duplex_connection() -> Connection<tokio::io::DuplexStream, tokio::io::DuplexStream> {
    let (r, w) = duplex(1024);
    Connection::new(r, w)
}

#[tokio::test]
async fn completing_a_registered_call_wakes_its_waiter() {
    let peer = PeerHandle::new(WorkerName::new("w-1"), Arc::new(duplex_connection()));

    let req_id = peer.next_req_id();
    let rx = peer.register_pending(req_id).await;
    peer.complete(Response::ok(req_id, json!(42))).await;

    let response = rx.await.unwrap();
    assert_eq!(response.value, Some(json!(42)));
}

#[tokio::test]
async fn completing_an_unknown_request_id_is_a_silent_no_op() {
    let peer = PeerHandle::new(WorkerName::new("w-1"), Arc::new(duplex_connection()));
    peer.complete(Response::ok(999, json!(null))).await;
}

#[test]
fn registry_round_trips_insert_get_remove() {
    let registry = PeerRegistry::new();
    let name = WorkerName::new("w-2");
    let peer = Arc::new(PeerHandle::new(name.clone(), Arc::new(duplex_connection())));
    registry.insert(peer);

    assert!(registry.get(&name).is_some());
    assert!(registry.remove(&name).is_some());
    assert!(registry.get(&name).is_none());
}

#[test]
fn get_or_err_reports_not_connected_for_unknown_peer() {
    let registry = PeerRegistry::new();
    let err = registry.get_or_err(&WorkerName::new("ghost")).unwrap_err();
    assert!(matches!(err, BndlError::NotConnected { .. }));
}

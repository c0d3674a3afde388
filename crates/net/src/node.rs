// SPDX-License-Identifier: MIT

//! The top-level RMI node: accepts and dials connections, and drives each
//! connection's read loop, routing requests to registered services and
//! responses back to the caller that's waiting on them (spec section 4.2,
//! grounded on the original's `RMIPeerNode._dispatch`/`_handle_request`/
//! `_handle_response`/`disconnect`).

use crate::connection::Connection;
use crate::message::Message;
use crate::peer::{PeerHandle, PeerRegistry};
use crate::service::{Dispatch, ServiceRegistry};
use crate::thread_pool::OnDemandThreadPool;
use bndl_core::{BndlError, WorkerName};
use bndl_wire::{RemoteException, Request, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

pub struct Node {
    pub name: WorkerName,
    services: ServiceRegistry,
    peers: PeerRegistry,
    thread_pool: OnDemandThreadPool,
}

impl Node {
    pub fn new(name: WorkerName, thread_pool_concurrency: usize) -> Arc<Self> {
        Arc::new(Self {
            name,
            services: ServiceRegistry::new(),
            peers: PeerRegistry::new(),
            thread_pool: OnDemandThreadPool::new(thread_pool_concurrency),
        })
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    /// Dial a peer and start servicing its connection in the background.
    pub async fn connect(self: &Arc<Self>, addr: &str, peer_name: WorkerName) -> Result<Arc<PeerHandle>, BndlError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| BndlError::ProtocolError(format!("connect to {addr}: {e}")))?;
        let (r, w) = stream.into_split();
        let conn = Arc::new(Connection::new(r, w));
        let peer = Arc::new(PeerHandle::new(peer_name, conn));
        self.peers.insert(peer.clone());

        let node = self.clone();
        let loop_peer = peer.clone();
        tokio::spawn(async move { node.read_loop(loop_peer).await });
        Ok(peer)
    }

    /// Accept inbound connections forever, spawning a read loop for each.
    /// Each inbound peer is named after its socket address until a future
    /// handshake (out of scope here) replaces it with its advertised name.
    pub async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        loop {
            let (stream, addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            };
            let node = self.clone();
            tokio::spawn(async move { node.accept_one(stream, addr).await });
        }
    }

    async fn accept_one(self: Arc<Self>, stream: TcpStream, addr: SocketAddr) {
        let (r, w) = stream.into_split();
        let conn = Arc::new(Connection::new(r, w));
        let peer = Arc::new(PeerHandle::new(WorkerName::new(addr.to_string()), conn));
        self.peers.insert(peer.clone());
        self.read_loop(peer).await;
    }

    /// Drive one connection until it closes: requests are dispatched per
    /// their service's [`Dispatch`] mode, responses are routed back to
    /// whichever call registered the matching `req_id`.
    async fn read_loop(self: Arc<Self>, peer: Arc<PeerHandle>) {
        loop {
            let (msg, _attachments) = match peer.conn.recv().await {
                Ok(pair) => pair,
                Err(_) => {
                    peer.fail_all_pending().await;
                    self.peers.remove(&peer.name);
                    tracing::debug!(peer = %peer.name, "connection closed");
                    return;
                }
            };

            match msg {
                Message::Request(req) => self.dispatch(peer.clone(), req).await,
                Message::Response(resp) => peer.complete(resp).await,
            }
        }
    }

    async fn dispatch(self: &Arc<Self>, peer: Arc<PeerHandle>, req: Request) {
        let service = match self.services.get(&req.service) {
            Some(s) => s,
            None => {
                let exc = RemoteException {
                    type_name: "NoSuchService".into(),
                    message: format!("no service named {:?}", req.service),
                    remote_trace: None,
                };
                self.reply(&peer, Response::err(req.req_id, exc)).await;
                return;
            }
        };

        match service.dispatch() {
            Dispatch::Direct => {
                let response = self.invoke(service, req).await;
                self.reply(&peer, response).await;
            }
            Dispatch::Coroutine => {
                let node = self.clone();
                let peer = peer.clone();
                tokio::spawn(async move {
                    let response = node.invoke(service, req).await;
                    node.reply(&peer, response).await;
                });
            }
            Dispatch::OnDemandThread => {
                let node = self.clone();
                let peer = peer.clone();
                let pool = self.thread_pool.clone();
                let req_id = req.req_id;
                tokio::spawn(async move {
                    let invoker = node.clone();
                    let response = match pool.spawn(async move { invoker.invoke(service, req).await }).await {
                        Ok(response) => response,
                        Err(e) => Response::err(
                            req_id,
                            RemoteException { type_name: error_type_name(&e), message: e.to_string(), remote_trace: None },
                        ),
                    };
                    node.reply(&peer, response).await;
                });
            }
        }
    }

    async fn invoke(&self, service: Arc<dyn crate::service::Service>, req: Request) -> Response {
        match service.call(&req.method, req.args, req.kwargs).await {
            Ok(value) => Response::ok(req.req_id, value),
            Err(e) => Response::err(
                req.req_id,
                RemoteException { type_name: error_type_name(&e), message: e.to_string(), remote_trace: None },
            ),
        }
    }

    async fn reply(&self, peer: &PeerHandle, response: Response) {
        if let Err(e) = peer.conn.send(&Message::Response(response), true, &[]).await {
            tracing::debug!(peer = %peer.name, error = %e, "failed to deliver response");
        }
    }

    /// Tear down a peer, unblocking anything waiting on one of its calls.
    pub async fn disconnect(&self, name: &WorkerName) {
        if let Some(peer) = self.peers.remove(name) {
            peer.fail_all_pending().await;
            peer.conn.close().await;
        }
    }
}

fn error_type_name(e: &BndlError) -> String {
    match e {
        BndlError::NotConnected { .. } => "NotConnected",
        BndlError::Timeout(_) => "Timeout",
        BndlError::Cancelled(_) => "Cancelled",
        BndlError::InvocationFailure { .. } => "InvocationFailure",
        BndlError::TaskFailure(_) => "TaskFailure",
        BndlError::CacheMiss { .. } => "CacheMiss",
        BndlError::ConfigError(_) => "ConfigError",
        BndlError::ProtocolError(_) => "ProtocolError",
    }
    .to_string()
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;

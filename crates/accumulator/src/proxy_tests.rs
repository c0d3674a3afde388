// SPDX-License-Identifier: MIT

use super::*;
use crate::accumulator::Accumulator;
use crate::registry::NamedOpRegistry;
use crate::service::AccumulatorService;
use bndl_net::Node;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::test]
async fn proxy_update_reaches_the_driver_accumulator() {
    let acc = Arc::new(Accumulator::new(WorkerName::new("driver"), json!(0)));
    let service = AccumulatorService::new(NamedOpRegistry::new());
    service.register_accumulator(&acc);

    let driver_node = Node::new(WorkerName::new("driver"), 2);
    driver_node.services().register(ACCUMULATOR_SERVICE_NAME, Arc::new(service));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(driver_node.clone().accept_loop(listener));

    let worker_node = Node::new(WorkerName::new("worker"), 2);
    worker_node.connect(&addr.to_string(), WorkerName::new("driver")).await.unwrap();

    let proxy = AccumulatorProxy::new(acc.id, WorkerName::new("driver"), worker_node.peers().clone());
    proxy.add(json!(3)).await.unwrap();
    proxy.add(json!(4)).await.unwrap();

    // give the driver's read loop a moment to apply both updates.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(acc.value(), json!(7.0));
}

// SPDX-License-Identifier: MIT

use super::*;
use bndl_core::WorkerName;
use bndl_net::{Node, PeerRegistry};
use bndl_scheduler::{Materializer, TaskExecutorService, TASK_SERVICE_NAME};
use bndl_shuffle::BucketRegistry;
use bndl_store::{CacheProvider, StorageKind};
use serde_json::json;
use std::path::PathBuf;
use tokio::net::TcpListener;

async fn spawn_worker() -> std::net::SocketAddr {
    let node = Node::new(WorkerName::new("worker"), 2);
    let materializer = Materializer::new(
        Registries::new(),
        Arc::new(BucketRegistry::new()),
        PeerRegistry::new(),
        Arc::new(CacheProvider::new(PathBuf::new(), StorageKind::Memory)),
        Duration::from_secs(5),
    );
    node.services().register(TASK_SERVICE_NAME, Arc::new(TaskExecutorService::new(Arc::new(materializer))));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(node.accept_loop(listener));
    addr
}

fn config_with_seed(seed: String) -> Config {
    let mut config = Config::default();
    config.net_seeds = vec![seed];
    config.execute_concurrency = 2;
    config
}

#[tokio::test]
async fn connect_dials_every_configured_seed() {
    let addr = spawn_worker().await;
    let ctx = Context::connect(&config_with_seed(addr.to_string())).await.expect("connect");
    assert_eq!(ctx.workers().len(), 1);
}

#[tokio::test]
async fn sum_runs_a_job_across_the_connected_worker() {
    let addr = spawn_worker().await;
    let ctx = Context::connect(&config_with_seed(addr.to_string())).await.expect("connect");

    let ds = ctx.from_iterable((1..=4).map(Value::from).collect(), 2);
    assert_eq!(ctx.sum(&ds).await.expect("sum"), 10.0);
    assert_eq!(ctx.count(&ds).await.expect("count"), 4);
}

#[tokio::test]
async fn collect_and_first_read_back_the_elements() {
    let addr = spawn_worker().await;
    let ctx = Context::connect(&config_with_seed(addr.to_string())).await.expect("connect");

    let ds = ctx.from_iterable(vec![json!("a"), json!("b")], 1);
    assert_eq!(ctx.collect(&ds).await.expect("collect"), vec![json!("a"), json!("b")]);
    assert_eq!(ctx.first(&ds).await.expect("first"), json!("a"));
}

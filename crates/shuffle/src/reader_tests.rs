// SPDX-License-Identifier: MIT

use super::*;
use crate::bucket::BucketKind;
use crate::service::ShuffleService;
use bndl_core::WorkerName;
use bndl_net::Node;
use serde_json::json;
use tokio::net::TcpListener;

#[tokio::test]
async fn reads_the_local_bucket_with_no_peers_connected() {
    let registry = Arc::new(BucketRegistry::new());
    let dataset_id = DatasetId::new();
    registry.insert(dataset_id, 1, BucketKind::List, 0, json!("local"));

    let reader = ShuffleReader::new(registry, PeerRegistry::new());
    let values = reader.read(dataset_id, BucketKind::List, 0, Duration::from_secs(1)).await.unwrap();
    assert_eq!(values, vec![json!("local")]);
}

#[tokio::test]
async fn merges_local_and_remote_bucket_contents() {
    let dataset_id = DatasetId::new();

    let local_registry = Arc::new(BucketRegistry::new());
    local_registry.insert(dataset_id, 1, BucketKind::List, 0, json!("local"));

    let remote_registry = Arc::new(BucketRegistry::new());
    remote_registry.insert(dataset_id, 1, BucketKind::List, 0, json!("remote"));

    let remote_node = Node::new(WorkerName::new("remote"), 2);
    remote_node.services().register(SHUFFLE_SERVICE_NAME, Arc::new(ShuffleService::new(remote_registry)));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(remote_node.clone().accept_loop(listener));

    let local_node = Node::new(WorkerName::new("local"), 2);
    local_node.connect(&addr.to_string(), WorkerName::new("remote")).await.unwrap();

    let reader = ShuffleReader::new(local_registry, local_node.peers().clone());
    let mut values = reader.read(dataset_id, BucketKind::List, 0, Duration::from_secs(1)).await.unwrap();
    values.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
    assert_eq!(values, vec![json!("local"), json!("remote")]);
}

#[tokio::test]
async fn merges_sorted_list_buckets_from_multiple_workers_into_one_sorted_stream() {
    let dataset_id = DatasetId::new();

    let local_registry = Arc::new(BucketRegistry::new());
    for v in [2, 5, 8] {
        local_registry.insert(dataset_id, 1, BucketKind::SortedList, 0, json!(v));
    }

    let remote_registry = Arc::new(BucketRegistry::new());
    for v in [1, 3, 9] {
        remote_registry.insert(dataset_id, 1, BucketKind::SortedList, 0, json!(v));
    }

    let remote_node = Node::new(WorkerName::new("remote"), 2);
    remote_node.services().register(SHUFFLE_SERVICE_NAME, Arc::new(ShuffleService::new(remote_registry)));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(remote_node.clone().accept_loop(listener));

    let local_node = Node::new(WorkerName::new("local"), 2);
    local_node.connect(&addr.to_string(), WorkerName::new("remote")).await.unwrap();

    let reader = ShuffleReader::new(local_registry, local_node.peers().clone());
    let values = reader.read(dataset_id, BucketKind::SortedList, 0, Duration::from_secs(1)).await.unwrap();
    assert_eq!(values, vec![json!(1), json!(2), json!(3), json!(5), json!(8), json!(9)]);
}

#[tokio::test]
async fn cleanup_clears_the_local_registry() {
    let registry = Arc::new(BucketRegistry::new());
    let dataset_id = DatasetId::new();
    registry.insert(dataset_id, 1, BucketKind::List, 0, json!("local"));

    let reader = ShuffleReader::new(registry.clone(), PeerRegistry::new());
    reader.cleanup(dataset_id, Duration::from_secs(1)).await;

    assert!(registry.get(dataset_id, 0).is_none());
}

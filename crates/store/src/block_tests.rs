// SPDX-License-Identifier: MIT

use super::*;
use bndl_net::Node;
use tempfile::tempdir;
use tokio::net::TcpListener;

#[test]
fn put_then_serve_round_trips_locally() {
    let dir = tempdir().unwrap();
    let store = BlockStore::new(WorkerName::new("w-1"), dir.path().to_path_buf());
    let spec = store.put(BlockName::new(), b"hello".to_vec(), StorageKind::Memory).unwrap();
    assert_eq!(spec.seeder, WorkerName::new("w-1"));
    assert_eq!(spec.total_size(), 5);

    let name = BlockName::from_string(&spec.name);
    assert_eq!(store.serve(&name).unwrap(), b"hello".to_vec());
}

#[test]
fn serving_an_unknown_block_is_a_cache_miss() {
    let dir = tempdir().unwrap();
    let store = BlockStore::new(WorkerName::new("w-1"), dir.path().to_path_buf());
    let err = store.serve(&BlockName::new()).unwrap_err();
    assert!(matches!(err, BndlError::CacheMiss { .. }));
}

#[test]
fn remove_blocks_clears_every_named_block() {
    let dir = tempdir().unwrap();
    let store = BlockStore::new(WorkerName::new("w-1"), dir.path().to_path_buf());
    let spec = store.put(BlockName::new(), vec![1, 2, 3], StorageKind::Disk).unwrap();
    let name = BlockName::from_string(&spec.name);

    store.remove_blocks(&[name.clone()]);
    assert!(matches!(store.serve(&name).unwrap_err(), BndlError::CacheMiss { .. }));
}

#[tokio::test]
async fn get_serves_locally_when_this_worker_is_the_seeder() {
    let dir = tempdir().unwrap();
    let store = BlockStore::new(WorkerName::new("w-1"), dir.path().to_path_buf());
    let spec = store.put(BlockName::new(), vec![9, 9], StorageKind::Memory).unwrap();

    let peers = bndl_net::PeerRegistry::new();
    let data = store.get(&spec, &peers).await.unwrap();
    assert_eq!(data, vec![9, 9]);
}

#[tokio::test]
async fn get_fetches_a_remote_block_over_rmi() {
    let seeder_dir = tempdir().unwrap();
    let seeder_store = BlockStore::new(WorkerName::new("seeder"), seeder_dir.path().to_path_buf());
    let spec = seeder_store.put(BlockName::new(), b"remote-bytes".to_vec(), StorageKind::Memory).unwrap();

    let seeder_node = Node::new(WorkerName::new("seeder"), 2);
    seeder_node.services().register(BLOCKSTORE_SERVICE_NAME, Arc::new(BlockStoreService::new(seeder_store)));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(seeder_node.clone().accept_loop(listener));

    let fetcher_dir = tempdir().unwrap();
    let fetcher_store = BlockStore::new(WorkerName::new("fetcher"), fetcher_dir.path().to_path_buf());
    let fetcher_node = Node::new(WorkerName::new("fetcher"), 2);
    fetcher_node.connect(&addr.to_string(), WorkerName::new("seeder")).await.unwrap();

    let data = fetcher_store.get(&spec, fetcher_node.peers()).await.unwrap();
    assert_eq!(data, b"remote-bytes".to_vec());
}

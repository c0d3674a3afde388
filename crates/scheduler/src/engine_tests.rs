// SPDX-License-Identifier: MIT

use super::*;
use crate::build::build_job;
use crate::executor::TaskExecutorService;
use crate::materialize::Materializer;
use bndl_core::WorkerName;
use bndl_dataset::{builtin, Dataset, Registries};
use bndl_net::{Node, PeerRegistry};
use bndl_shuffle::BucketRegistry;
use bndl_store::{CacheProvider, StorageKind};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn_worker(registries: Registries) -> std::net::SocketAddr {
    let node = Node::new(WorkerName::new("worker"), 2);
    let materializer = Materializer::new(
        registries,
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

fn test_config() -> EngineConfig {
    EngineConfig { concurrency_per_worker: 2, max_attempts: 2, task_timeout: Duration::from_secs(5) }
}

#[tokio::test]
async fn run_materializes_every_partition_of_a_single_stage_job() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), (0..4).map(Value::from).collect(), 2);
    let addr = spawn_worker(registries).await;

    let client = Node::new(WorkerName::new("driver"), 2);
    let worker_name = WorkerName::new("w0");
    client.connect(&addr.to_string(), worker_name.clone()).await.expect("connect");

    let mut job = build_job(&src, &[worker_name]);
    let engine = Engine::new(client.peers().clone(), test_config());
    let results = engine.run(&mut job).await.expect("run");

    assert_eq!(results, vec![vec![json!(0), json!(1)], vec![json!(2), json!(3)]]);
    assert!(job.stages.last().expect("stage").is_complete());
}

#[tokio::test]
async fn run_fails_fast_when_no_workers_are_connected() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), vec![json!(1)], 1);
    let mut job = build_job(&src, &[]);
    let engine = Engine::new(PeerRegistry::new(), test_config());

    let err = engine.run(&mut job).await.unwrap_err();
    assert!(matches!(err, BndlError::NotConnected { .. }));
}

#[tokio::test]
async fn run_streaming_invokes_the_callback_per_partition() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), (0..3).map(Value::from).collect(), 3);
    let addr = spawn_worker(registries).await;

    let client = Node::new(WorkerName::new("driver"), 2);
    let worker_name = WorkerName::new("w0");
    client.connect(&addr.to_string(), worker_name.clone()).await.expect("connect");

    let mut job = build_job(&src, &[worker_name]);
    let engine = Engine::new(client.peers().clone(), test_config());

    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let collected = seen.clone();
    engine
        .run_streaming(&mut job, |idx, values| collected.lock().push((idx, values.to_vec())))
        .await
        .expect("run_streaming");

    let mut seen = seen.lock().clone();
    seen.sort_by_key(|(idx, _)| *idx);
    assert_eq!(seen, vec![(0, vec![json!(0)]), (1, vec![json!(1)]), (2, vec![json!(2)])]);
}

#[tokio::test]
async fn map_partitions_stage_runs_the_registered_transform_on_the_worker() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), vec![json!(1), json!(2), json!(3)], 1);
    let glommed = src.map_partitions(builtin::GLOM, Value::Null);
    let addr = spawn_worker(registries).await;

    let client = Node::new(WorkerName::new("driver"), 2);
    let worker_name = WorkerName::new("w0");
    client.connect(&addr.to_string(), worker_name.clone()).await.expect("connect");

    let mut job = build_job(&glommed, &[worker_name]);
    let engine = Engine::new(client.peers().clone(), test_config());
    let results = engine.run(&mut job).await.expect("run");

    assert_eq!(results, vec![vec![json!([1, 2, 3])]]);
}

#[test]
fn pick_task_prefers_an_unattempted_preferred_task() {
    let stage_id = bndl_core::StageId::new();
    let dataset_id = bndl_core::DatasetId::new();
    let w0 = WorkerName::new("w0");

    let plain = Task::new(stage_id, dataset_id, 0);
    let mut preferred = Task::new(stage_id, dataset_id, 1);
    preferred.preferred.push(w0.clone());
    let tasks = vec![plain, preferred];
    let pending: VecDeque<usize> = (0..tasks.len()).collect();

    assert_eq!(pick_task(&tasks, &pending, &w0), Some(1));
}

#[test]
fn pick_task_falls_back_through_its_tiers_as_options_are_exhausted() {
    let stage_id = bndl_core::StageId::new();
    let dataset_id = bndl_core::DatasetId::new();
    let w0 = WorkerName::new("w0");

    let mut preferred = Task::new(stage_id, dataset_id, 0);
    preferred.preferred.push(w0.clone());
    preferred.attempted.push(w0.clone());
    let mut plain = Task::new(stage_id, dataset_id, 1);
    let tasks = vec![preferred, plain.clone()];
    let pending: VecDeque<usize> = (0..tasks.len()).collect();

    // Preferred task already tried by w0: falls to the unattempted plain task.
    assert_eq!(pick_task(&tasks, &pending, &w0), Some(1));

    // Once every eligible task has been tried by w0, the last-resort tier
    // still returns something rather than stalling the only worker forever.
    plain.attempted.push(w0.clone());
    let mut preferred = tasks[0].clone();
    preferred.attempted.push(w0.clone());
    let tasks = vec![preferred, plain];
    assert!(pick_task(&tasks, &pending, &w0).is_some());
}

#[test]
fn pick_task_respects_the_allow_list() {
    let stage_id = bndl_core::StageId::new();
    let dataset_id = bndl_core::DatasetId::new();
    let w0 = WorkerName::new("w0");
    let w1 = WorkerName::new("w1");

    let mut restricted = Task::new(stage_id, dataset_id, 0);
    restricted.allowed = Some(vec![w1.clone()]);
    let tasks = vec![restricted];
    let pending: VecDeque<usize> = (0..tasks.len()).collect();

    assert_eq!(pick_task(&tasks, &pending, &w0), None);
    assert_eq!(pick_task(&tasks, &pending, &w1), Some(0));
}

#[tokio::test]
async fn run_cancels_remaining_tasks_after_a_final_task_failure() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), (0..3).map(Value::from).collect(), 3);
    let broken = src.map_partitions("no.such.transform", Value::Null);
    let addr = spawn_worker(registries).await;

    let client = Node::new(WorkerName::new("driver"), 2);
    let worker_name = WorkerName::new("w0");
    client.connect(&addr.to_string(), worker_name.clone()).await.expect("connect");

    let mut job = build_job(&broken, &[worker_name]);
    let config = EngineConfig { concurrency_per_worker: 1, max_attempts: 1, task_timeout: Duration::from_secs(5) };
    let engine = Engine::new(client.peers().clone(), config);

    let err = engine.run(&mut job).await.unwrap_err();
    assert!(matches!(err, BndlError::TaskFailure { .. }));

    let tasks = &job.stages.last().expect("stage").tasks;
    assert!(tasks.iter().any(|t| matches!(t.status, TaskStatus::Failed)));
    assert!(tasks.iter().any(|t| matches!(t.status, TaskStatus::Cancelled)));
    assert!(tasks.iter().all(|t| !matches!(t.status, TaskStatus::Pending | TaskStatus::Running)));
}

#[tokio::test]
async fn cancel_marks_every_unfinished_task_cancelled() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), vec![json!(1)], 1);
    let mut job = build_job(&src, &[WorkerName::new("w0")]);
    let engine = Engine::new(PeerRegistry::new(), test_config());

    engine.cancel(&mut job).await;
    assert!(job.is_cancelled());
    assert!(job.stages.iter().all(|s| s.tasks.iter().all(|t| matches!(t.status, TaskStatus::Cancelled))));
}

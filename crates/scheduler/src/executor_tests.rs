// SPDX-License-Identifier: MIT

use super::*;
use crate::materialize::Materializer;
use crate::plan::plan_dataset;
use bndl_dataset::{builtin, Dataset, Registries};
use bndl_net::PeerRegistry;
use bndl_shuffle::BucketRegistry;
use bndl_store::{CacheProvider, StorageKind};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

fn service(registries: Registries) -> TaskExecutorService {
    let materializer = Materializer::new(
        registries,
        Arc::new(BucketRegistry::new()),
        PeerRegistry::new(),
        Arc::new(CacheProvider::new(PathBuf::new(), StorageKind::Memory)),
        Duration::from_secs(5),
    );
    TaskExecutorService::new(Arc::new(materializer))
}

#[tokio::test]
async fn materialize_returns_the_named_partition_s_elements() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), vec![json!(1), json!(2)], 1);
    let glommed = src.map_partitions(builtin::GLOM, Value::Null);
    let plan = serde_json::to_value(plan_dataset(&glommed)).unwrap();
    let svc = service(registries);

    let out = svc.call("materialize", vec![plan, json!(0)], HashMap::new()).await.unwrap();
    assert_eq!(out, json!([[1, 2]]));
}

#[tokio::test]
async fn an_unknown_method_is_reported_as_an_invocation_failure() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), vec![json!(1)], 1);
    let plan = serde_json::to_value(plan_dataset(&src)).unwrap();
    let svc = service(registries);

    let err = svc.call("bogus", vec![plan, json!(0)], HashMap::new()).await.unwrap_err();
    assert!(matches!(err, BndlError::InvocationFailure { .. }));
}

#[tokio::test]
async fn cancel_is_acknowledged_without_requiring_a_plan() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), vec![json!(1)], 1);
    let plan = serde_json::to_value(plan_dataset(&src)).unwrap();
    let svc = service(registries);

    let out = svc.call("cancel", vec![plan, json!(0)], HashMap::new()).await.unwrap();
    assert_eq!(out, Value::Null);
}

#[tokio::test]
async fn a_missing_partition_index_is_a_protocol_error() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), vec![json!(1)], 1);
    let plan = serde_json::to_value(plan_dataset(&src)).unwrap();
    let svc = service(registries);

    let err = svc.call("materialize", vec![plan], HashMap::new()).await.unwrap_err();
    assert!(matches!(err, BndlError::ProtocolError(_)));
}

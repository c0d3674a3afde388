// SPDX-License-Identifier: MIT

use super::*;
use crate::bucket::BucketKind;
use bndl_core::DatasetId;
use serde_json::json;

#[tokio::test]
async fn get_bucket_returns_the_registered_values() {
    let registry = Arc::new(BucketRegistry::new());
    let dataset_id = DatasetId::new();
    registry.insert(dataset_id, 2, BucketKind::List, 0, json!("a"));

    let service = ShuffleService::new(registry);
    let result = service.call("get_bucket", vec![json!(dataset_id.to_string()), json!(0)], HashMap::new()).await.unwrap();
    assert_eq!(result, json!(["a"]));
}

#[tokio::test]
async fn get_bucket_on_an_unknown_dataset_returns_empty() {
    let service = ShuffleService::new(Arc::new(BucketRegistry::new()));
    let result = service.call("get_bucket", vec![json!(DatasetId::new().to_string()), json!(0)], HashMap::new()).await.unwrap();
    assert_eq!(result, json!([]));
}

#[tokio::test]
async fn clear_bucket_drops_the_dataset() {
    let registry = Arc::new(BucketRegistry::new());
    let dataset_id = DatasetId::new();
    registry.insert(dataset_id, 1, BucketKind::List, 0, json!("a"));

    let service = ShuffleService::new(registry.clone());
    service.call("clear_bucket", vec![json!(dataset_id.to_string())], HashMap::new()).await.unwrap();

    assert!(registry.get(dataset_id, 0).is_none());
}

#[tokio::test]
async fn unknown_method_is_an_invocation_failure() {
    let service = ShuffleService::new(Arc::new(BucketRegistry::new()));
    let err = service.call("frobnicate", vec![], HashMap::new()).await.unwrap_err();
    assert!(matches!(err, BndlError::InvocationFailure { .. }));
}

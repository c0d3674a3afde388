// SPDX-License-Identifier: MIT

use super::*;
use bndl_core::DatasetId;
use serde_json::json;

#[test]
fn routes_records_by_hash_of_their_key() {
    let registry = Arc::new(BucketRegistry::new());
    let dataset_id = DatasetId::new();
    let writer = ShuffleWriter::new(dataset_id, 4, PartitionerSpec::Hash, BucketKind::List, None, registry.clone());

    writer.write_partition(vec![json!([1, "a"]), json!([2, "b"])]).unwrap();

    let total: usize = (0..4).map(|i| registry.get(dataset_id, i).map(|b| b.len()).unwrap_or(0)).sum();
    assert_eq!(total, 2);
}

#[test]
fn rejects_records_that_are_not_key_value_pairs() {
    let registry = Arc::new(BucketRegistry::new());
    let writer = ShuffleWriter::new(DatasetId::new(), 2, PartitionerSpec::Hash, BucketKind::List, None, registry);
    let err = writer.write_partition(vec![json!(42)]).unwrap_err();
    assert!(matches!(err, BndlError::ProtocolError(_)));
}

#[test]
fn combiner_reduces_every_touched_bucket_after_ingest() {
    let registry = Arc::new(BucketRegistry::new());
    let dataset_id = DatasetId::new();
    let sum: Arc<dyn Combiner> = Arc::new(|values: Vec<serde_json::Value>| json!(values.iter().filter_map(serde_json::Value::as_f64).sum::<f64>()));
    let writer = ShuffleWriter::new(dataset_id, 1, PartitionerSpec::Hash, BucketKind::List, Some(sum), registry.clone());

    writer.write_partition(vec![json!(["k", 1]), json!(["k", 2]), json!(["k", 3])]).unwrap();

    assert_eq!(registry.get(dataset_id, 0).unwrap().into_values(), vec![json!(6.0)]);
}

#[test]
fn zero_pcount_collapses_everything_into_bucket_zero() {
    let registry = Arc::new(BucketRegistry::new());
    let dataset_id = DatasetId::new();
    let writer = ShuffleWriter::new(dataset_id, 0, PartitionerSpec::Hash, BucketKind::List, None, registry.clone());

    writer.write_partition(vec![json!([1, "a"]), json!([2, "b"])]).unwrap();

    assert_eq!(registry.get(dataset_id, 0).unwrap().len(), 2);
}

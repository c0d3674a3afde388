// SPDX-License-Identifier: MIT

use super::*;
use bndl_core::DatasetId;
use serde_json::json;

fn partition() -> Partition {
    Partition::new(DatasetId::new(), 0)
}

#[test]
fn registry_pairs_two_iterators_positionally() {
    let registry = ZipRegistry::new();
    registry.register(
        "pair",
        Arc::new(|_: &Partition, _: &Value, left: PartitionIter, right: PartitionIter| -> Result<PartitionIter, BndlError> {
            let out: Vec<Value> = left.zip(right).map(|(l, r)| json!([l, r])).collect();
            Ok(Box::new(out.into_iter()))
        }),
    );

    let left: PartitionIter = Box::new(vec![json!(1), json!(2)].into_iter());
    let right: PartitionIter = Box::new(vec![json!("a"), json!("b")].into_iter());
    let out: Vec<Value> = registry.apply("pair", &partition(), &Value::Null, left, right).unwrap().collect();
    assert_eq!(out, vec![json!([1, "a"]), json!([2, "b"])]);
}

#[test]
fn unknown_name_is_a_task_failure() {
    let registry = ZipRegistry::new();
    let left: PartitionIter = Box::new(std::iter::empty());
    let right: PartitionIter = Box::new(std::iter::empty());
    let err = registry.apply("missing", &partition(), &Value::Null, left, right).unwrap_err();
    assert!(matches!(err, BndlError::TaskFailure(_)));
}

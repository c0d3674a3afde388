// SPDX-License-Identifier: MIT

use super::*;
use crate::builtin;
use crate::partition::Partition;
use bndl_core::{BndlError, DatasetId};
use serde_json::{json, Value};

#[test]
fn new_bundle_has_builtins_preinstalled() {
    let registries = Registries::new();
    let partition = Partition::new(DatasetId::new(), 0);
    let input: crate::transform::PartitionIter = Box::new(vec![json!(1), json!(2)].into_iter());
    let out: Vec<Value> = registries.transforms.apply(builtin::GLOM, &partition, &Value::Null, input).unwrap().collect();
    assert_eq!(out, vec![json!([1, 2])]);
}

#[test]
fn cloning_the_bundle_shares_the_same_registrations() {
    let registries = Registries::new();
    let clone = registries.clone();
    clone.elements.register("noop", std::sync::Arc::new(|v: &Value| -> Result<Vec<Value>, BndlError> { Ok(vec![v.clone()]) }));
    assert!(registries.elements.apply("noop", &json!(1)).is_ok());
}

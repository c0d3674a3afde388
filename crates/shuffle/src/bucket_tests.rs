// SPDX-License-Identifier: MIT

use super::*;
use crate::combiner::Combiner;
use serde_json::json;

struct SumCombiner;
impl Combiner for SumCombiner {
    fn combine(&self, values: Vec<Value>) -> Value {
        json!(values.iter().filter_map(Value::as_f64).sum::<f64>())
    }
}

#[test]
fn list_bucket_preserves_insertion_order() {
    let mut b = Bucket::new(BucketKind::List);
    b.insert(json!(1));
    b.insert(json!(2));
    assert_eq!(b.into_values(), vec![json!(1), json!(2)]);
}

#[test]
fn sorted_list_bucket_stays_sorted_on_insert() {
    let mut b = Bucket::new(BucketKind::SortedList);
    for v in [json!(3), json!(1), json!(2)] {
        b.insert(v);
    }
    assert_eq!(b.into_values(), vec![json!(1), json!(2), json!(3)]);
}

#[test]
fn set_bucket_deduplicates_equal_elements() {
    let mut b = Bucket::new(BucketKind::Set);
    b.insert(json!({"a": 1}));
    b.insert(json!({"a": 1}));
    b.insert(json!({"a": 2}));
    assert_eq!(b.len(), 2);
}

#[test]
fn counter_bucket_sums_repeated_elements() {
    let mut b = Bucket::new(BucketKind::Counter);
    b.insert(json!("x"));
    b.insert(json!("x"));
    b.insert(json!("y"));
    let values = b.into_values();
    assert_eq!(values.len(), 2);
    assert!(values.contains(&json!(["x", 2])));
    assert!(values.contains(&json!(["y", 1])));
}

#[test]
fn merge_folds_counters_pairwise() {
    let mut a = Bucket::new(BucketKind::Counter);
    a.insert(json!("x"));
    let mut b = Bucket::new(BucketKind::Counter);
    b.insert(json!("x"));
    b.insert(json!("x"));
    a.merge(b);
    assert_eq!(a.into_values(), vec![json!(["x", 3])]);
}

#[test]
fn combine_collapses_a_non_empty_bucket_to_one_value() {
    let mut b = Bucket::new(BucketKind::List);
    b.insert(json!(1));
    b.insert(json!(2));
    b.insert(json!(3));
    b.combine(&SumCombiner);
    assert_eq!(b.into_values(), vec![json!(6.0)]);
}

#[test]
fn combine_is_a_no_op_on_an_empty_bucket() {
    let mut b = Bucket::new(BucketKind::List);
    b.combine(&SumCombiner);
    assert!(b.is_empty());
}

// SPDX-License-Identifier: MIT

use super::*;
use serde_json::json;

#[test]
fn hash_partitioning_is_stable_across_calls() {
    let key = json!({"user": 42, "region": "eu"});
    let a = PartitionerSpec::Hash.partition(&key, 8);
    let b = PartitionerSpec::Hash.partition(&key, 8);
    assert_eq!(a, b);
    assert!(a < 8);
}

#[test]
fn hash_partitioning_spreads_distinct_keys() {
    let buckets: Vec<usize> = (0..50).map(|i| PartitionerSpec::Hash.partition(&json!(i), 8)).collect();
    let distinct: std::collections::HashSet<_> = buckets.iter().collect();
    assert!(distinct.len() > 1, "50 distinct integer keys landed in a single bucket");
}

#[test]
fn pcount_of_one_always_lands_in_bucket_zero() {
    assert_eq!(PartitionerSpec::Hash.partition(&json!("anything"), 1), 0);
    assert_eq!(PartitionerSpec::Hash.partition(&json!("anything"), 0), 0);
}

#[test]
fn range_partitioner_places_keys_in_ascending_intervals() {
    let p = PartitionerSpec::Range { boundaries: vec![json!(10), json!(20)], reverse: false };
    assert_eq!(p.partition(&json!(5), 3), 0);
    assert_eq!(p.partition(&json!(10), 3), 0);
    assert_eq!(p.partition(&json!(15), 3), 1);
    assert_eq!(p.partition(&json!(25), 3), 2);
}

#[test]
fn range_partitioner_can_run_in_reverse() {
    let p = PartitionerSpec::Range { boundaries: vec![json!(10), json!(20)], reverse: true };
    assert_eq!(p.partition(&json!(5), 3), 2);
    assert_eq!(p.partition(&json!(25), 3), 0);
}

#[test]
fn compare_values_orders_numbers_and_strings() {
    assert_eq!(compare_values(&json!(1), &json!(2)), Ordering::Less);
    assert_eq!(compare_values(&json!("a"), &json!("b")), Ordering::Less);
}

// SPDX-License-Identifier: MIT

use super::*;
use serde_json::json;

#[test]
fn estimate_of_an_empty_sketch_is_zero() {
    let hll = HyperLogLog::new(0.05);
    assert_eq!(hll.estimate(), 0);
}

#[test]
fn estimate_is_within_tolerance_of_the_true_cardinality() {
    let mut hll = HyperLogLog::new(0.02);
    for i in 0..5000 {
        hll.add(&json!(i));
    }
    let estimate = hll.estimate() as f64;
    assert!((estimate - 5000.0).abs() / 5000.0 < 0.1, "estimate {estimate} too far from 5000");
}

#[test]
fn adding_the_same_value_repeatedly_does_not_inflate_the_estimate() {
    let mut hll = HyperLogLog::new(0.05);
    for _ in 0..1000 {
        hll.add(&json!("same"));
    }
    assert!(hll.estimate() <= 5);
}

#[test]
fn merging_two_disjoint_sketches_approximates_the_union_cardinality() {
    let mut a = HyperLogLog::new(0.02);
    let mut b = HyperLogLog::new(0.02);
    for i in 0..2000 {
        a.add(&json!(i));
    }
    for i in 2000..4000 {
        b.add(&json!(i));
    }
    a.merge(&b);
    let estimate = a.estimate() as f64;
    assert!((estimate - 4000.0).abs() / 4000.0 < 0.1, "merged estimate {estimate} too far from 4000");
}

#[test]
fn merging_overlapping_sketches_does_not_double_count() {
    let mut a = HyperLogLog::new(0.02);
    let mut b = HyperLogLog::new(0.02);
    for i in 0..3000 {
        a.add(&json!(i));
    }
    for i in 0..3000 {
        b.add(&json!(i));
    }
    a.merge(&b);
    let estimate = a.estimate() as f64;
    assert!((estimate - 3000.0).abs() / 3000.0 < 0.1, "merged estimate {estimate} too far from 3000");
}

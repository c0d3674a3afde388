// SPDX-License-Identifier: MIT

use super::*;
use bndl_dataset::{builtin, Dataset, Registries};
use serde_json::json;

#[test]
fn plan_dataset_mirrors_a_map_partitions_chain() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries, vec![json!(1), json!(2)], 2);
    let mapped = src.clone().map_partitions(builtin::GLOM, Value::Null);

    let plan = plan_dataset(&mapped);
    assert_eq!(plan.id, mapped.id());
    assert_eq!(plan.pcount, 2);
    match plan.lineage {
        LineagePlan::MapPartitions { src: inner, decoder, .. } => {
            assert_eq!(decoder, builtin::GLOM);
            assert_eq!(inner.id, src.id());
            assert!(matches!(inner.lineage, LineagePlan::Iterable { .. }));
        }
        _ => panic!("expected a MapPartitions plan"),
    }
}

#[test]
fn plan_dataset_stops_at_a_shuffle_read_without_recursing_into_the_writer() {
    let registries = Registries::new();
    let pairs = Dataset::from_iterable(registries, vec![json!(["a", 1])], 1);
    let grouped = pairs.group_by_key(2);

    let plan = plan_dataset(&grouped);
    match plan.lineage {
        LineagePlan::MapPartitions { src, .. } => match &src.lineage {
            LineagePlan::ShuffleRead { writer_dataset_id, bucket_kind } => {
                assert_ne!(*writer_dataset_id, plan.id);
                assert_eq!(*bucket_kind, BucketKind::List);
            }
            _ => panic!("expected a ShuffleRead plan"),
        },
        _ => panic!("expected a MapPartitions plan"),
    }
}

#[test]
fn plan_dataset_serializes_round_trip_through_json() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries, vec![json!(1)], 1);
    let masked = src.mask_partitions(vec![0]);

    let plan = plan_dataset(&masked);
    let encoded = serde_json::to_string(&plan).expect("plan should serialize");
    let decoded: DatasetPlan = serde_json::from_str(&encoded).expect("plan should deserialize");
    assert_eq!(decoded.id, plan.id);
}

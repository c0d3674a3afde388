// SPDX-License-Identifier: MIT

use super::*;
use crate::plan::{plan_dataset, DatasetPlan, LineagePlan};
use bndl_core::DatasetId;
use bndl_dataset::{builtin, Dataset, Registries};
use bndl_net::PeerRegistry;
use bndl_store::{CacheProvider, StorageKind};
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

fn materializer(registries: Registries) -> Materializer {
    Materializer::new(
        registries,
        Arc::new(BucketRegistry::new()),
        PeerRegistry::new(),
        Arc::new(CacheProvider::new(PathBuf::new(), StorageKind::Memory)),
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn iterable_slices_are_contiguous_and_near_equal() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), (0..5).map(Value::from).collect(), 2);
    let plan = plan_dataset(&src);
    let m = materializer(registries);

    let first = m.materialize(&plan, 0).await.expect("partition 0");
    let second = m.materialize(&plan, 1).await.expect("partition 1");
    assert_eq!(first, vec![json!(0), json!(1), json!(2)]);
    assert_eq!(second, vec![json!(3), json!(4)]);
}

#[tokio::test]
async fn map_partitions_runs_the_named_decoder_over_its_recomputed_source() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), vec![json!(1), json!(2)], 1);
    let glommed = src.map_partitions(builtin::GLOM, Value::Null);
    let plan = plan_dataset(&glommed);
    let m = materializer(registries);

    let out = m.materialize(&plan, 0).await.expect("glom");
    assert_eq!(out, vec![json!([1, 2])]);
}

#[tokio::test]
async fn union_maps_a_global_index_to_the_right_source_and_local_index() {
    let registries = Registries::new();
    let a = Dataset::from_iterable(registries.clone(), vec![json!("a0"), json!("a1")], 2);
    let b = Dataset::from_iterable(registries.clone(), vec![json!("b0")], 1);
    let unioned = a.union(vec![b]);
    let plan = plan_dataset(&unioned);
    let m = materializer(registries);

    assert_eq!(m.materialize(&plan, 0).await.unwrap(), vec![json!("a0")]);
    assert_eq!(m.materialize(&plan, 1).await.unwrap(), vec![json!("a1")]);
    assert_eq!(m.materialize(&plan, 2).await.unwrap(), vec![json!("b0")]);
}

#[tokio::test]
async fn mask_partitions_redirects_to_the_listed_source_index() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), vec![json!("p0"), json!("p1"), json!("p2")], 3);
    let masked = src.mask_partitions(vec![2, 0]);
    let plan = plan_dataset(&masked);
    let m = materializer(registries);

    assert_eq!(m.materialize(&plan, 0).await.unwrap(), vec![json!("p2")]);
    assert_eq!(m.materialize(&plan, 1).await.unwrap(), vec![json!("p0")]);
}

#[tokio::test]
async fn cached_partitions_are_recomputed_once_and_served_from_cache_after() {
    let registries = Registries::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    registries.elements.register(
        "count_calls",
        Arc::new(move |v: &Value| -> Result<Vec<Value>, BndlError> {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(vec![v.clone()])
        }),
    );
    let src = Dataset::from_iterable(registries.clone(), vec![json!(1)], 1);
    let cached = src.map("count_calls").cache();
    let plan = plan_dataset(&cached);
    let m = materializer(registries);

    assert_eq!(m.materialize(&plan, 0).await.unwrap(), vec![json!(1)]);
    assert_eq!(m.materialize(&plan, 0).await.unwrap(), vec![json!(1)]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn run_shuffle_write_rejects_a_non_shuffle_write_plan() {
    let registries = Registries::new();
    let src = Dataset::from_iterable(registries.clone(), vec![json!(1)], 1);
    let plan = plan_dataset(&src);
    let m = materializer(registries);
    assert!(m.run_shuffle_write(&plan, 0).await.is_err());
}

#[test]
fn iterable_slice_handles_an_empty_dataset() {
    let plan = DatasetPlan { id: DatasetId::new(), pcount: 2, lineage: LineagePlan::Iterable { elements: Arc::new(vec![]) } };
    match &plan.lineage {
        LineagePlan::Iterable { elements } => assert_eq!(iterable_slice(elements, plan.pcount, 0), Vec::<Value>::new()),
        _ => unreachable!(),
    }
}

// SPDX-License-Identifier: MIT

use super::*;
use tempfile::tempdir;

#[test]
fn write_then_read_round_trips() {
    let dir = tempdir().unwrap();
    let cache = CacheProvider::new(dir.path().to_path_buf(), StorageKind::Memory);
    let ds = DatasetId::new();
    cache.write(ds, "p0", vec![1, 2, 3]).unwrap();
    assert_eq!(cache.read(ds, "p0").unwrap(), vec![1, 2, 3]);
}

#[test]
fn reading_an_uncached_partition_is_a_cache_miss() {
    let dir = tempdir().unwrap();
    let cache = CacheProvider::new(dir.path().to_path_buf(), StorageKind::Memory);
    let ds = DatasetId::new();
    assert!(matches!(cache.read(ds, "p0").unwrap_err(), BndlError::CacheMiss { .. }));
}

#[test]
fn clear_one_object_leaves_siblings_in_place() {
    let dir = tempdir().unwrap();
    let cache = CacheProvider::new(dir.path().to_path_buf(), StorageKind::Memory);
    let ds = DatasetId::new();
    cache.write(ds, "p0", vec![1]).unwrap();
    cache.write(ds, "p1", vec![2]).unwrap();

    cache.clear(&ds, Some("p0"));
    assert!(!cache.contains(&ds, "p0"));
    assert!(cache.contains(&ds, "p1"));
}

#[test]
fn clear_without_obj_key_drops_the_whole_dataset() {
    let dir = tempdir().unwrap();
    let cache = CacheProvider::new(dir.path().to_path_buf(), StorageKind::Memory);
    let ds = DatasetId::new();
    cache.write(ds, "p0", vec![1]).unwrap();
    cache.write(ds, "p1", vec![2]).unwrap();

    cache.clear(&ds, None);
    assert!(!cache.contains(&ds, "p0"));
    assert!(!cache.contains(&ds, "p1"));
}

#[test]
fn clear_all_empties_every_dataset() {
    let dir = tempdir().unwrap();
    let cache = CacheProvider::new(dir.path().to_path_buf(), StorageKind::Disk);
    let a = DatasetId::new();
    let b = DatasetId::new();
    cache.write(a, "p0", vec![9]).unwrap();
    cache.write(b, "p0", vec![9]).unwrap();

    cache.clear_all();
    assert!(!cache.contains(&a, "p0"));
    assert!(!cache.contains(&b, "p0"));
}

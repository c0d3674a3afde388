// SPDX-License-Identifier: MIT

use super::*;
use bndl_core::DatasetId;

#[test]
fn new_partition_has_no_sources_or_cache_location() {
    let p = Partition::new(DatasetId::new(), 3);
    assert_eq!(p.idx, 3);
    assert!(p.sources.is_empty());
    assert!(p.cache_loc.is_none());
}

#[test]
fn with_sources_tracks_the_partitions_it_recomputes_from() {
    let src = Arc::new(Partition::new(DatasetId::new(), 0));
    let p = Partition::with_sources(DatasetId::new(), 0, vec![src.clone()]);
    assert_eq!(p.sources.len(), 1);
    assert_eq!(p.sources[0].idx, src.idx);
}

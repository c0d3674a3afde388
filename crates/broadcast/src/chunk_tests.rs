// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn chunk_size_clamps_to_the_configured_bounds() {
    assert_eq!(chunk_size(1, 4, 16), 4);
    assert_eq!(chunk_size(20, 4, 16), 16);
    assert_eq!(chunk_size(4, 4, 16), 8);
}

#[test]
fn chunk_size_handles_equal_bounds() {
    assert_eq!(chunk_size(100, 8, 8), 8);
}

#[test]
fn split_divides_data_into_equal_chunks_with_a_remainder() {
    let data = vec![0u8; 10];
    let chunks = split(&data, 4);
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].len(), 4);
    assert_eq!(chunks[1].len(), 4);
    assert_eq!(chunks[2].len(), 2);
}

#[test]
fn split_of_empty_data_yields_one_empty_chunk() {
    let chunks = split(&[], 4);
    assert_eq!(chunks, vec![Vec::<u8>::new()]);
}

#[test]
fn split_with_chunk_size_larger_than_data_yields_one_chunk() {
    let data = vec![1, 2, 3];
    let chunks = split(&data, 100);
    assert_eq!(chunks, vec![vec![1, 2, 3]]);
}

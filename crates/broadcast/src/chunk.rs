// SPDX-License-Identifier: MIT

//! Chunk sizing and splitting for broadcast blocks (spec section 4.5,
//! grounded on `broadcast.py`'s `block_size` computation).

/// `clamp(worker_count * 2, min_block_size, max_block_size)`, all in bytes.
/// The original short-circuits to `max_block_size` when the two bounds are
/// equal; that's an optimization, not a correctness requirement, so this
/// always computes the clamp directly.
pub fn chunk_size(worker_count: usize, min_block_size: u64, max_block_size: u64) -> u64 {
    let target = (worker_count as u64).saturating_mul(2);
    target.clamp(min_block_size, max_block_size)
}

/// Split `data` into chunks of at most `size` bytes. Always yields at
/// least one (possibly empty) chunk so a zero-length broadcast value
/// still has a servable block.
pub fn split(data: &[u8], size: u64) -> Vec<Vec<u8>> {
    let size = size.max(1) as usize;
    if data.is_empty() {
        return vec![Vec::new()];
    }
    data.chunks(size).map(<[u8]>::to_vec).collect()
}

#[cfg(test)]
#[path = "chunk_tests.rs"]
mod tests;

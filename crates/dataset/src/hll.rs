// SPDX-License-Identifier: MIT

//! A small HyperLogLog cardinality sketch backing `count_distinct_approx`
//! (spec section 6). A simple reference implementation — register count
//! and bias correction follow the textbook estimator, not the bias-table
//! refinements of a production HyperLogLog++.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Clone, Serialize, Deserialize)]
pub struct HyperLogLog {
    registers: Vec<u8>,
    p: u32,
}

impl HyperLogLog {
    /// A sketch sized for roughly `err` relative standard error (e.g.
    /// `0.01` for about 1%), following `p = ceil(2 * ln(1.04/err) /
    /// ln(2))`, clamped to a sane register-count range.
    pub fn new(err: f64) -> Self {
        let err = if err > 0.0 { err } else { 0.01 };
        let raw_p = (2.0 * (1.04 / err).ln() / std::f64::consts::LN_2).ceil() as u32;
        let p = raw_p.clamp(4, 16);
        Self { registers: vec![0; 1usize << p], p }
    }

    /// Fold one value into this sketch: the low `p` bits of its hash pick
    /// a register, the remaining bits' leading run of zeros is the
    /// candidate rank, kept if higher than what's already there.
    pub fn add(&mut self, value: &Value) {
        let mut hasher = DefaultHasher::new();
        serde_json::to_string(value).unwrap_or_default().hash(&mut hasher);
        let hash = hasher.finish();
        let idx = (hash & ((1u64 << self.p) - 1)) as usize;
        let rest = hash >> self.p;
        let rank = (rest.trailing_zeros() + 1).min(64 - self.p) as u8;
        if rank > self.registers[idx] {
            self.registers[idx] = rank;
        }
    }

    /// Fold another sketch of the same precision into this one,
    /// register-wise max — the operation `distinct` counting via
    /// `count_distinct_approx` depends on to combine one sketch per
    /// partition into a dataset-wide estimate.
    pub fn merge(&mut self, other: &Self) {
        for (a, b) in self.registers.iter_mut().zip(other.registers.iter()) {
            if *b > *a {
                *a = *b;
            }
        }
    }

    pub fn estimate(&self) -> u64 {
        let m = self.registers.len() as f64;
        let alpha = match self.registers.len() {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / m),
        };
        let sum: f64 = self.registers.iter().map(|&r| 2f64.powi(-(r as i32))).sum();
        let raw = alpha * m * m / sum;

        let zeros = self.registers.iter().filter(|&&r| r == 0).count();
        if raw <= 2.5 * m && zeros > 0 {
            (m * (m / zeros as f64).ln()).round() as u64
        } else {
            raw.round() as u64
        }
    }
}

#[cfg(test)]
#[path = "hll_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT

//! The fixed set of partition transforms every worker registers itself,
//! composing user-registered [`ElementFn`]s and [`bndl_shuffle::Combiner`]s
//! into the higher-level operations spec section 4.6 describes (`map`,
//! `filter`, `flatmap`, `glom`, `concat`, `key_by`, `group_by_key`,
//! `combine_by_key`, `join`). Unlike [`PartitionTransform`]s a caller registers
//! under a name it chose, these ship with the crate and are installed
//! once, by [`install_builtins`], under fixed `core.*` names.

use crate::element::ElementRegistry;
use crate::hll::HyperLogLog;
use crate::partition::Partition;
use crate::transform::{PartitionIter, PartitionTransform, TransformRegistry};
use crate::zip::ZipRegistry;
use bndl_core::BndlError;
use bndl_shuffle::CombinerRegistry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const ELEMENT_MAP: &str = "core.element_map";
pub const SELF_PAIR: &str = "core.self_pair";
pub const GLOM: &str = "core.glom";
pub const CONCAT: &str = "core.concat";
pub const GROUP_RUNS: &str = "core.group_runs";
pub const SET_UNION: &str = "core.set_union";
pub const SUM_COUNTS: &str = "core.sum_counts";
pub const PREMERGE_BY_KEY: &str = "core.premerge_by_key";
pub const FINALIZE_BY_KEY: &str = "core.finalize_by_key";
pub const TAG_SIDE: &str = "core.tag_side";
pub const LOCAL_JOIN: &str = "core.local_join";
pub const KEY_BY_ID: &str = "core.key_by_id";
pub const KEY_BY_IDX: &str = "core.key_by_idx";
pub const PARTITION_SIZE: &str = "core.partition_size";
pub const SAMPLE: &str = "core.sample";
pub const TO_JSON_STRING: &str = "core.to_json_string";
pub const ZIP_PAIRS: &str = "core.zip_pairs";
pub const HLL_SKETCH: &str = "core.hll_sketch";

/// Install every `core.*` transform into `transforms` and `zips`,
/// resolving per-element work against `elements` and per-key combination
/// against `combiners`. Must be called identically on every worker before
/// any dataset built with these built-ins runs a task.
pub fn install_builtins(transforms: &TransformRegistry, elements: ElementRegistry, combiners: CombinerRegistry, zips: &ZipRegistry) {
    elements.register(TO_JSON_STRING, Arc::new(|v: &Value| -> Result<Vec<Value>, BndlError> { Ok(vec![json!(v.to_string())]) }));

    let elem = elements.clone();
    transforms.register(ELEMENT_MAP, Arc::new(move |_: &Partition, payload: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let name = payload_name(payload)?;
        let elem = elem.clone();
        let out: Vec<Value> = input.map(|v| elem.apply(&name, &v)).collect::<Result<Vec<Vec<Value>>, BndlError>>()?.into_iter().flatten().collect();
        Ok(Box::new(out.into_iter()))
    }));

    transforms.register(SELF_PAIR, Arc::new(|_: &Partition, _: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let out: Vec<Value> = input.map(|v| json!([v.clone(), v])).collect();
        Ok(Box::new(out.into_iter()))
    }));

    transforms.register(GLOM, Arc::new(|_: &Partition, _: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let collected: Vec<Value> = input.collect();
        Ok(Box::new(std::iter::once(Value::Array(collected))))
    }));

    transforms.register(CONCAT, Arc::new(|_: &Partition, payload: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let sep = payload.as_str().unwrap_or("").to_string();
        let mut out = String::new();
        for v in input {
            out.push_str(v.as_str().unwrap_or_default());
            out.push_str(&sep);
        }
        Ok(Box::new(std::iter::once(Value::String(out))))
    }));

    transforms.register(GROUP_RUNS, Arc::new(|_: &Partition, _: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let mut pairs: Vec<(Value, Value)> = input.map(split_pair).collect::<Result<_, _>>()?;
        pairs.sort_by(|a, b| compare_canonical(&a.0, &b.0));
        Ok(Box::new(run_length_group(pairs).into_iter()))
    }));

    transforms.register(SET_UNION, Arc::new(|_: &Partition, _: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for v in input {
            let key = serde_json::to_string(&v).unwrap_or_default();
            if seen.insert(key) {
                out.push(v);
            }
        }
        Ok(Box::new(out.into_iter()))
    }));

    transforms.register(SUM_COUNTS, Arc::new(|_: &Partition, _: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let mut totals: HashMap<String, (Value, i64)> = HashMap::new();
        for v in input {
            let pair = v.as_array().ok_or_else(|| BndlError::ProtocolError("expected a [value, count] pair".into()))?;
            let (value, count) = (pair.first().cloned().unwrap_or(Value::Null), pair.get(1).and_then(Value::as_i64).unwrap_or(0));
            let key = serde_json::to_string(&value).unwrap_or_default();
            totals.entry(key).and_modify(|(_, c)| *c += count).or_insert((value, count));
        }
        let out: Vec<Value> = totals.into_values().map(|(v, c)| json!([v, c])).collect();
        Ok(Box::new(out.into_iter()))
    }));

    let local = combiners.clone();
    transforms.register(PREMERGE_BY_KEY, Arc::new(move |_: &Partition, payload: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let combiner_name = payload_name(payload)?;
        let combiner = local.get(&combiner_name).ok_or_else(|| BndlError::TaskFailure(format!("no combiner registered for {combiner_name:?}")))?;
        let mut groups: HashMap<String, (Value, Vec<Value>)> = HashMap::new();
        for pair in input.map(split_pair).collect::<Result<Vec<_>, _>>()? {
            let (key, value) = pair;
            let canon = serde_json::to_string(&key).unwrap_or_default();
            groups.entry(canon).or_insert_with(|| (key, Vec::new())).1.push(value);
        }
        let out: Vec<Value> = groups.into_values().map(|(key, values)| json!([key, combiner.combine(values)])).collect();
        Ok(Box::new(out.into_iter()))
    }));

    let merge = combiners;
    transforms.register(FINALIZE_BY_KEY, Arc::new(move |_: &Partition, payload: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let combiner_name = payload_name(payload)?;
        let combiner = merge.get(&combiner_name).ok_or_else(|| BndlError::TaskFailure(format!("no combiner registered for {combiner_name:?}")))?;
        let mut pairs: Vec<(Value, Value)> = input.map(split_pair).collect::<Result<_, _>>()?;
        pairs.sort_by(|a, b| compare_canonical(&a.0, &b.0));
        let grouped = run_length_group(pairs);
        let out: Result<Vec<Value>, BndlError> = grouped
            .into_iter()
            .map(|g| {
                let pair = g.as_array().ok_or_else(|| BndlError::ProtocolError("group_runs emitted a non-array group".into()))?;
                let key = pair.first().cloned().unwrap_or(Value::Null);
                let values = pair.get(1).and_then(Value::as_array).cloned().unwrap_or_default();
                Ok(json!([key, combiner.combine(values)]))
            })
            .collect();
        Ok(Box::new(out?.into_iter()))
    }));

    transforms.register(TAG_SIDE, Arc::new(|_: &Partition, payload: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let side = payload.as_i64().ok_or_else(|| BndlError::ProtocolError("expected a 0/1 side tag".into()))?;
        let out: Vec<Value> = input
            .map(split_pair)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(key, value)| json!([key, [side, value]]))
            .collect();
        Ok(Box::new(out.into_iter()))
    }));

    transforms.register(LOCAL_JOIN, Arc::new(|_: &Partition, _: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let mut out = Vec::new();
        for group in input {
            let pair = group.as_array().ok_or_else(|| BndlError::ProtocolError("group_by_key emitted a non-array group".into()))?;
            let key = pair.first().cloned().unwrap_or(Value::Null);
            let (mut left, mut right) = (Vec::new(), Vec::new());
            for tagged in pair.get(1).and_then(Value::as_array).cloned().unwrap_or_default() {
                let (side, value) = split_pair(tagged)?;
                match side.as_i64() {
                    Some(0) => left.push(value),
                    _ => right.push(value),
                }
            }
            if left.is_empty() || right.is_empty() {
                continue;
            }
            let product: Vec<Value> = left.iter().flat_map(|l| right.iter().map(move |r| json!([l.clone(), r.clone()]))).collect();
            out.push(json!([key, product]));
        }
        Ok(Box::new(out.into_iter()))
    }));

    transforms.register(KEY_BY_ID, Arc::new(|partition: &Partition, payload: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let pcount = payload.as_u64().ok_or_else(|| BndlError::ProtocolError("key_by_id expects the dataset's partition count as payload".into()))? as usize;
        let idx = partition.idx;
        let out: Vec<Value> = input.enumerate().map(|(i, v)| json!([idx + i * pcount.max(1), v])).collect();
        Ok(Box::new(out.into_iter()))
    }));

    transforms.register(KEY_BY_IDX, Arc::new(|partition: &Partition, payload: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let offsets = payload.as_array().ok_or_else(|| BndlError::ProtocolError("key_by_idx expects an array of per-partition offsets".into()))?;
        let offset = offsets
            .get(partition.idx)
            .and_then(Value::as_u64)
            .ok_or_else(|| BndlError::ProtocolError("key_by_idx offsets array is missing this partition's entry".into()))? as usize;
        let out: Vec<Value> = input.enumerate().map(|(i, v)| json!([offset + i, v])).collect();
        Ok(Box::new(out.into_iter()))
    }));

    transforms.register(PARTITION_SIZE, Arc::new(|_: &Partition, _: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        Ok(Box::new(std::iter::once(json!(input.count()))))
    }));

    transforms.register(SAMPLE, Arc::new(|partition: &Partition, payload: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let fraction = payload.get("fraction").and_then(Value::as_f64).ok_or_else(|| BndlError::ProtocolError("sample payload missing fraction".into()))?;
        let seed = payload.get("seed").and_then(Value::as_u64).unwrap_or(0);
        let with_replacement = payload.get("with_replacement").and_then(Value::as_bool).unwrap_or(false);
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(partition.idx as u64));
        let mut out = Vec::new();
        for v in input {
            if with_replacement {
                // Poisson(fraction) approximated as a sum of Bernoulli trials
                // over each whole-and-fractional unit of `fraction`, good
                // enough for a reference sampler, not a statistically exact one.
                let mut remaining = fraction;
                while remaining > 0.0 {
                    if rng.gen::<f64>() < remaining.min(1.0) {
                        out.push(v.clone());
                    }
                    remaining -= 1.0;
                }
            } else if rng.gen::<f64>() < fraction {
                out.push(v);
            }
        }
        Ok(Box::new(out.into_iter()))
    }));

    zips.register(ZIP_PAIRS, Arc::new(|_: &Partition, _: &Value, left: PartitionIter, right: PartitionIter| -> Result<PartitionIter, BndlError> {
        let out: Vec<Value> = left.zip(right).map(|(l, r)| json!([l, r])).collect();
        Ok(Box::new(out.into_iter()))
    }));

    transforms.register(HLL_SKETCH, Arc::new(|_: &Partition, payload: &Value, input: PartitionIter| -> Result<PartitionIter, BndlError> {
        let err = payload.as_f64().unwrap_or(0.01);
        let mut sketch = HyperLogLog::new(err);
        for v in input {
            sketch.add(&v);
        }
        let encoded = serde_json::to_value(&sketch).map_err(|e| BndlError::ProtocolError(format!("failed to encode hll sketch: {e}")))?;
        Ok(Box::new(std::iter::once(encoded)))
    }));
}

/// Order two JSON values by their canonical (sorted-key) encoding. Any
/// total order works for grouping purposes; this one doesn't try to make
/// numbers sort numerically.
fn compare_canonical(a: &Value, b: &Value) -> std::cmp::Ordering {
    serde_json::to_string(a).unwrap_or_default().cmp(&serde_json::to_string(b).unwrap_or_default())
}

fn payload_name(payload: &Value) -> Result<String, BndlError> {
    payload.as_str().map(str::to_string).ok_or_else(|| BndlError::ProtocolError("expected a named decoder in the payload".into()))
}

fn split_pair(record: Value) -> Result<(Value, Value), BndlError> {
    match record.as_array() {
        Some(pair) if pair.len() == 2 => Ok((pair[0].clone(), pair[1].clone())),
        _ => Err(BndlError::ProtocolError(format!("record is not a [key, value] pair: {record}"))),
    }
}

/// Fold a key-sorted `(key, value)` sequence into `[key, [values...]]`
/// groups of contiguous same-key runs.
fn run_length_group(pairs: Vec<(Value, Value)>) -> Vec<Value> {
    let mut out = Vec::new();
    let mut iter = pairs.into_iter().peekable();
    while let Some((key, value)) = iter.next() {
        let mut values = vec![value];
        while iter.peek().map(|(next_key, _)| compare_canonical(next_key, &key) == std::cmp::Ordering::Equal).unwrap_or(false) {
            if let Some((_, v)) = iter.next() {
                values.push(v);
            }
        }
        out.push(json!([key, values]));
    }
    out
}

#[cfg(test)]
#[path = "builtin_tests.rs"]
mod tests;

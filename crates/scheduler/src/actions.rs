// SPDX-License-Identifier: MIT

//! Terminal actions over a [`Dataset`] (spec section 4.7, grounded on
//! `dataset.py`'s `collect`/`aggregate`/`sort`/`join` family): each one
//! schedules and runs a job, then folds the results into whatever shape
//! the caller asked for.
//!
//! Every action here collects its job's results to the driver before
//! doing anything with them, rather than running a true distributed
//! reduction (a per-partition `local` step on the worker, combined on the
//! driver). For the partition counts this system targets that's an
//! acceptable simplification; see `DESIGN.md` for the tradeoff.

use crate::build::build_job;
use crate::engine::Engine;
use bndl_core::{BndlError, WorkerName};
use bndl_dataset::{builtin, Dataset, HyperLogLog};
use flate2::write::GzEncoder;
use flate2::Compression;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Run `ds`'s job to completion, returning its last stage's results one
/// `Vec<Value>` per partition, in partition order.
async fn run_job(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<Vec<Vec<Value>>, BndlError> {
    let mut job = build_job(ds, workers);
    engine.run(&mut job).await
}

/// Collect every element of `ds` to the driver.
pub async fn collect(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<Vec<Value>, BndlError> {
    Ok(run_job(engine, ds, workers).await?.into_iter().flatten().collect())
}

/// The first `n` elements of `ds`. Unlike the original's `itake`, this
/// materializes every partition before truncating: there is no per-task
/// early-exit signal a worker would notice mid-computation.
pub async fn take(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName], n: usize) -> Result<Vec<Value>, BndlError> {
    let mut values = collect(engine, ds, workers).await?;
    values.truncate(n);
    Ok(values)
}

pub async fn first(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<Value, BndlError> {
    take(engine, ds, workers, 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BndlError::TaskFailure("dataset is empty".into()))
}

/// Run `f` over every element of `ds` as its partitions finish, rather
/// than buffering the whole dataset first.
pub async fn foreach(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName], mut f: impl FnMut(&Value)) -> Result<(), BndlError> {
    let mut job = build_job(ds, workers);
    engine.run_streaming(&mut job, |_idx, values| values.iter().for_each(&mut f)).await?;
    Ok(())
}

/// Run `ds`'s job purely for its side effects, discarding the results.
pub async fn execute(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<(), BndlError> {
    run_job(engine, ds, workers).await?;
    Ok(())
}

/// Fold `ds`'s partitions with `local`, then fold those partials with
/// `comb` (spec section 4.7's `aggregate`).
pub async fn aggregate<T>(
    engine: &Engine,
    ds: &Arc<Dataset>,
    workers: &[WorkerName],
    local: impl Fn(&[Value]) -> T,
    comb: impl Fn(Vec<T>) -> T,
) -> Result<T, BndlError> {
    let partitions = run_job(engine, ds, workers).await?;
    let partials: Vec<T> = partitions.iter().map(|p| local(p)).collect();
    Ok(comb(partials))
}

pub async fn count(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<usize, BndlError> {
    aggregate(engine, ds, workers, |p| p.len(), |partials| partials.into_iter().sum()).await
}

pub async fn sum(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<f64, BndlError> {
    aggregate(
        engine,
        ds,
        workers,
        |p| p.iter().filter_map(Value::as_f64).sum::<f64>(),
        |partials| partials.into_iter().sum(),
    )
    .await
}

/// Compare two JSON values for ordering purposes: numerically when both
/// are numbers, by their rendered text otherwise. Good enough for `max`,
/// `min`, and picking sort boundaries; not a general total order.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

pub async fn max(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<Value, BndlError> {
    reduce(engine, ds, workers, |a, b| if compare_values(&a, &b) == Ordering::Less { b } else { a }).await
}

pub async fn min(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<Value, BndlError> {
    reduce(engine, ds, workers, |a, b| if compare_values(&a, &b) == Ordering::Greater { b } else { a }).await
}

/// Pairwise-reduce every element of `ds` into one, in the order
/// partitions and their elements were collected.
pub async fn reduce(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName], f: impl Fn(Value, Value) -> Value) -> Result<Value, BndlError> {
    let mut values = collect(engine, ds, workers).await?.into_iter();
    let first = values.next().ok_or_else(|| BndlError::TaskFailure("dataset is empty".into()))?;
    Ok(values.fold(first, f))
}

pub async fn mean(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<f64, BndlError> {
    Ok(stats(engine, ds, workers).await?.mean)
}

/// Count, mean, min, max, variance and standard deviation of a numeric
/// dataset (spec section 4.7's `stats`; skew/kurtosis are out of scope).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub variance: f64,
    pub stdev: f64,
}

pub async fn stats(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<Stats, BndlError> {
    let values = collect(engine, ds, workers).await?;
    let numbers: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
    if numbers.is_empty() {
        return Err(BndlError::TaskFailure("dataset is empty".into()));
    }
    let count = numbers.len();
    let mean = numbers.iter().sum::<f64>() / count as f64;
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = numbers.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    Ok(Stats { count, mean, min, max, variance, stdev: variance.sqrt() })
}

/// The histogram of a numeric dataset over evenly spaced bins between its
/// min and max, plus the bin edges (spec section 4.7's `histogram`).
pub async fn histogram(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName], bins: usize) -> Result<(Vec<u64>, Vec<f64>), BndlError> {
    let bins = bins.max(1);
    let values = collect(engine, ds, workers).await?;
    let numbers: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
    if numbers.is_empty() {
        return Err(BndlError::TaskFailure("dataset is empty".into()));
    }
    let (min, max) = (numbers.iter().copied().fold(f64::INFINITY, f64::min), numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max));
    if min == max || bins == 1 {
        return Ok((vec![numbers.len() as u64], vec![min, max]));
    }
    let step = (max - min) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| min + i as f64 * step).collect();
    let mut counts = vec![0u64; bins];
    for v in numbers {
        let idx = (((v - min) / step) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Ok((counts, edges))
}

/// Range-partition `ds` into `pcount` sorted partitions (spec section
/// 4.7's `sort`). The original samples a fraction of the dataset at
/// random to pick boundaries; this collects the dataset once and spaces
/// boundaries evenly through its sorted values instead, since worker-side
/// random sampling would need a new named transform this system hasn't
/// grown yet. An empty dataset is returned unchanged.
pub async fn sort(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName], pcount: usize, reverse: bool) -> Result<Arc<Dataset>, BndlError> {
    let mut values = collect(engine, ds, workers).await?;
    if values.is_empty() {
        return Ok(ds.clone());
    }
    values.sort_by(compare_values);
    values.dedup_by(|a, b| compare_values(a, b) == Ordering::Equal);
    if reverse {
        values.reverse();
    }
    let pcount = pcount.max(1);
    let boundaries: Vec<Value> = (1..pcount).map(|i| values[values.len() * i / pcount].clone()).collect();
    Ok(ds.clone().sort_with_boundaries(pcount, boundaries, reverse))
}

/// Inner-join two `[key, value]` datasets on their key (spec section
/// 4.7's `join`): each side is wrapped with a side marker, unioned,
/// grouped by key, and reduced to the cartesian product of both sides'
/// values per key. Keys present on only one side are dropped.
pub fn join(left: Arc<Dataset>, right: Arc<Dataset>, pcount: usize) -> Arc<Dataset> {
    let tagged_left = left.map_partitions(builtin::TAG_SIDE, json!(0));
    let tagged_right = right.map_partitions(builtin::TAG_SIDE, json!(1));
    tagged_left.union(vec![tagged_right]).group_by_key(pcount).map_partitions(builtin::LOCAL_JOIN, Value::Null)
}

/// The `num` largest elements of `ds`, descending (spec section 6's
/// `nlargest`). `num == 1` shortcuts to [`max`], which a single reduce
/// settles without collecting the whole dataset to sort it.
pub async fn nlargest(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName], num: usize) -> Result<Vec<Value>, BndlError> {
    if num == 1 {
        return Ok(vec![max(engine, ds, workers).await?]);
    }
    let mut values = collect(engine, ds, workers).await?;
    values.sort_by(|a, b| compare_values(b, a));
    values.truncate(num);
    Ok(values)
}

/// The `num` smallest elements of `ds`, ascending (spec section 6's
/// `nsmallest`). See [`nlargest`] for the `num == 1` shortcut.
pub async fn nsmallest(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName], num: usize) -> Result<Vec<Value>, BndlError> {
    if num == 1 {
        return Ok(vec![min(engine, ds, workers).await?]);
    }
    let mut values = collect(engine, ds, workers).await?;
    values.sort_by(compare_values);
    values.truncate(num);
    Ok(values)
}

/// Collect `ds`'s `[key, value]` pairs into a map keyed by the rendered
/// text of each key (spec section 6's `collect_as_map`). Later pairs win
/// on a repeated key, matching `dict()` over a pair stream.
pub async fn collect_as_map(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<HashMap<String, Value>, BndlError> {
    let pairs = collect(engine, ds, workers).await?;
    let mut map = HashMap::new();
    for pair in pairs {
        let arr = pair.as_array().filter(|a| a.len() >= 2).ok_or_else(|| BndlError::TaskFailure("collect_as_map expects [key, value] pairs".into()))?;
        let key = arr[0].as_str().map(str::to_string).unwrap_or_else(|| arr[0].to_string());
        map.insert(key, arr[1].clone());
    }
    Ok(map)
}

/// Collect `ds`'s distinct elements (spec section 6's `collect_as_set`).
/// `serde_json::Value` has no `Hash` impl, so this sorts and dedups
/// instead of building an actual `HashSet`; the result is an unordered
/// set regardless of the sort used to produce it.
pub async fn collect_as_set(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<Vec<Value>, BndlError> {
    let mut values = collect(engine, ds, workers).await?;
    values.sort_by(compare_values);
    values.dedup_by(|a, b| compare_values(a, b) == Ordering::Equal);
    Ok(values)
}

/// Approximate the number of distinct elements in `ds` with a HyperLogLog
/// sketch (spec section 6's `count_distinct_approx`): each partition folds
/// its elements into a sketch sized for `err` relative error, and the
/// driver merges the collected sketches before reading off the estimate.
pub async fn count_distinct_approx(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName], err: f64) -> Result<u64, BndlError> {
    let sketched = ds.clone().map_partitions(builtin::HLL_SKETCH, json!(err));
    let partitions = run_job(engine, &sketched, workers).await?;
    let mut merged = HyperLogLog::new(err);
    for values in partitions {
        for v in values {
            let sketch: HyperLogLog = serde_json::from_value(v).map_err(|e| BndlError::ProtocolError(format!("invalid hll sketch payload: {e}")))?;
            merged.merge(&sketch);
        }
    }
    Ok(merged.estimate())
}

/// Key every element of `ds` with its position in collection order (spec
/// section 6's `key_by_idx`). Runs a `PARTITION_SIZE` job to sum up each
/// partition's element count into cumulative offsets before delegating to
/// [`Dataset::key_by_idx_with_offsets`]; a single-partition dataset needs
/// no job, since its only offset is zero.
pub async fn key_by_idx(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName]) -> Result<Arc<Dataset>, BndlError> {
    let pcount = ds.pcount();
    if pcount <= 1 {
        return Ok(ds.clone().key_by_idx_with_offsets(vec![0; pcount]));
    }
    let sized = ds.clone().map_partitions(builtin::PARTITION_SIZE, Value::Null);
    let sizes = run_job(engine, &sized, workers).await?;
    let mut offsets = Vec::with_capacity(pcount);
    let mut running = 0usize;
    for partition in sizes {
        offsets.push(running);
        running += partition.first().and_then(Value::as_u64).unwrap_or(0) as usize;
    }
    Ok(ds.clone().key_by_idx_with_offsets(offsets))
}

/// Draw exactly `num` elements uniformly at random from `ds` (spec section
/// 6's `take_sample`), following the original's estimate-a-fraction /
/// resample-if-short strategy: a fraction is picked to land just over
/// `num` expected matches, [`Dataset::sample`] is run and recollected
/// under a fresh seed until it meets `num`, then shuffled and truncated so
/// the surplus doesn't bias which elements are dropped.
pub async fn take_sample(
    engine: &Engine,
    ds: &Arc<Dataset>,
    workers: &[WorkerName],
    num: usize,
    with_replacement: bool,
    seed: Option<u64>,
) -> Result<Vec<Value>, BndlError> {
    if num == 0 {
        return Ok(Vec::new());
    }
    let total = count(engine, ds, workers).await?;
    if total == 0 {
        return Ok(Vec::new());
    }

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    if !with_replacement && num >= total {
        let mut values = collect(engine, ds, workers).await?;
        values.shuffle(&mut rng);
        return Ok(values);
    }

    let total = total as f64;
    let fraction = num as f64 / total;
    let fraction = if with_replacement {
        let num_stdev = if num < 12 { 9.0 } else { 5.0 };
        (fraction + num_stdev * (fraction / total).sqrt()).min(1.0)
    } else {
        let delta = 0.00005_f64;
        let gamma = -delta.ln() / total;
        (fraction + gamma + (gamma * gamma + 2.0 * gamma * fraction).sqrt()).min(1.0)
    };

    let mut seed = seed.unwrap_or_else(|| rng.gen());
    let mut values = collect(engine, &ds.clone().sample(fraction, with_replacement, seed), workers).await?;
    while values.len() < num {
        seed = rng.gen();
        values = collect(engine, &ds.clone().sample(fraction, with_replacement, seed), workers).await?;
    }
    values.shuffle(&mut rng);
    values.truncate(num);
    Ok(values)
}

/// gzip-compress `bytes` at the default compression level (spec section
/// 6's `collect_as_*` compress option).
fn gzip_compress(bytes: &[u8]) -> Result<Vec<u8>, BndlError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(|e| BndlError::TaskFailure(format!("gzip compressing: {e}")))?;
    encoder.finish().map_err(|e| BndlError::TaskFailure(format!("gzip compressing: {e}")))
}

/// Write each of `ds`'s partitions to its own file under `directory`,
/// named by partition index plus `ext` (spec section 6's
/// `collect_as_files`, the common tail `collect_as_pickles` and
/// `collect_as_json` both delegate to). `encode` turns a partition's
/// elements into the bytes to write; when `gzip` is set the whole
/// partition's encoded bytes are compressed as one unit rather than
/// element by element, appending `.gz` to the name.
async fn write_partitions(
    engine: &Engine,
    ds: &Arc<Dataset>,
    workers: &[WorkerName],
    directory: &Path,
    ext: &str,
    gzip: bool,
    encode: impl Fn(&[Value]) -> Result<Vec<u8>, BndlError>,
) -> Result<(), BndlError> {
    let partitions = run_job(engine, ds, workers).await?;
    std::fs::create_dir_all(directory).map_err(|e| BndlError::TaskFailure(format!("creating {}: {e}", directory.display())))?;
    for (idx, values) in partitions.iter().enumerate() {
        let mut bytes = encode(values)?;
        let mut name = format!("{idx}{ext}");
        if gzip {
            bytes = gzip_compress(&bytes)?;
            name.push_str(".gz");
        }
        let path = directory.join(name);
        std::fs::write(&path, bytes).map_err(|e| BndlError::TaskFailure(format!("writing {}: {e}", path.display())))?;
    }
    Ok(())
}

/// Write every element of `ds` into its own per-partition file under
/// `directory` (spec section 6's `collect_as_files`). Elements must be
/// strings; they're concatenated in partition order with no separator,
/// matching the original's `writelines` over each partition's elements.
pub async fn collect_as_files(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName], directory: &Path, ext: &str, gzip: bool) -> Result<(), BndlError> {
    write_partitions(engine, ds, workers, directory, ext, gzip, |values| {
        let mut bytes = Vec::new();
        for v in values {
            let s = v.as_str().ok_or_else(|| BndlError::TaskFailure("collect_as_files expects string elements".into()))?;
            bytes.extend_from_slice(s.as_bytes());
        }
        Ok(bytes)
    })
    .await
}

/// Collect `ds` as one line-separated JSON file per partition (spec
/// section 6's `collect_as_json`).
pub async fn collect_as_json(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName], directory: &Path, gzip: bool) -> Result<(), BndlError> {
    let jsoned = ds.clone().map(builtin::TO_JSON_STRING).concat("\n");
    collect_as_files(engine, &jsoned, workers, directory, ".json", gzip).await
}

/// Collect `ds` as one `bincode`-encoded file per partition (spec section
/// 6's `collect_as_pickles`): `bincode` stands in for the original's
/// `pickle`, since there is no Rust equivalent of pickling an arbitrary
/// Python object. Each partition is glommed into a single array first, so
/// one file holds the whole partition rather than one file per element.
pub async fn collect_as_pickles(engine: &Engine, ds: &Arc<Dataset>, workers: &[WorkerName], directory: &Path, gzip: bool) -> Result<(), BndlError> {
    let globbed = ds.clone().glom();
    write_partitions(engine, &globbed, workers, directory, ".p", gzip, |values| {
        let value = values.first().cloned().unwrap_or_else(|| json!([]));
        bincode::serialize(&value).map_err(|e| BndlError::TaskFailure(format!("encoding pickle: {e}")))
    })
    .await
}

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;

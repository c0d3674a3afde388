// SPDX-License-Identifier: MIT

//! Cluster configuration: the recognized keys, their defaults, and a loader
//! that merges a TOML file over the built-in defaults and then over
//! `BNDL_*` environment variable overrides.

use crate::error::BndlError;
use std::path::Path;

/// Cluster-wide configuration, one field per recognized key.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `bndl.compute.broadcast.min_block_size` (MB), default 4.
    pub broadcast_min_block_size_mb: f64,
    /// `bndl.compute.broadcast.max_block_size` (MB), default 16.
    pub broadcast_max_block_size_mb: f64,
    /// `bndl.execute.attempts`, default 1.
    pub execute_attempts: u32,
    /// `bndl.execute.concurrency`, default 1.
    pub execute_concurrency: u32,
    /// `bndl.net.listen_addresses`, default `["127.0.0.1:0"]`.
    pub net_listen_addresses: Vec<String>,
    /// `bndl.net.seeds`, default empty.
    pub net_seeds: Vec<String>,
    /// `bndl.compute.worker_count`, `None` means auto (num_cpus).
    pub worker_count: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broadcast_min_block_size_mb: 4.0,
            broadcast_max_block_size_mb: 16.0,
            execute_attempts: 1,
            execute_concurrency: 1,
            net_listen_addresses: vec!["127.0.0.1:0".to_string()],
            net_seeds: Vec::new(),
            worker_count: None,
        }
    }
}

impl Config {
    /// Load defaults, merge a TOML file (if present), then apply `BNDL_*`
    /// environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, BndlError> {
        let mut cfg = Self::default();
        if let Some(path) = path {
            let text = std::fs::read_to_string(path)
                .map_err(|e| BndlError::ConfigError(format!("reading {}: {e}", path.display())))?;
            cfg.merge_toml(&text)?;
        }
        cfg.merge_env();
        cfg.validate()?;
        Ok(cfg)
    }

    fn merge_toml(&mut self, text: &str) -> Result<(), BndlError> {
        let doc: toml::Value =
            toml::from_str(text).map_err(|e| BndlError::ConfigError(format!("invalid toml: {e}")))?;
        let bndl = match doc.get("bndl") {
            Some(v) => v,
            None => return Ok(()),
        };

        if let Some(v) = bndl.pointer("/compute/broadcast/min_block_size").and_then(toml::Value::as_float) {
            self.broadcast_min_block_size_mb = v;
        }
        if let Some(v) = bndl.pointer("/compute/broadcast/max_block_size").and_then(toml::Value::as_float) {
            self.broadcast_max_block_size_mb = v;
        }
        if let Some(v) = bndl.pointer("/execute/attempts").and_then(toml::Value::as_integer) {
            self.execute_attempts = v as u32;
        }
        if let Some(v) = bndl.pointer("/execute/concurrency").and_then(toml::Value::as_integer) {
            self.execute_concurrency = v as u32;
        }
        if let Some(v) = bndl.pointer("/net/listen_addresses").and_then(toml::Value::as_array) {
            self.net_listen_addresses = v.iter().filter_map(|e| e.as_str().map(str::to_string)).collect();
        }
        if let Some(v) = bndl.pointer("/net/seeds").and_then(toml::Value::as_array) {
            self.net_seeds = v.iter().filter_map(|e| e.as_str().map(str::to_string)).collect();
        }
        if let Some(v) = bndl.pointer("/compute/worker_count").and_then(toml::Value::as_integer) {
            self.worker_count = Some(v as u32);
        }
        Ok(())
    }

    fn merge_env(&mut self) {
        if let Ok(v) = std::env::var("BNDL_BROADCAST_MIN_BLOCK_SIZE") {
            if let Ok(v) = v.parse() {
                self.broadcast_min_block_size_mb = v;
            }
        }
        if let Ok(v) = std::env::var("BNDL_BROADCAST_MAX_BLOCK_SIZE") {
            if let Ok(v) = v.parse() {
                self.broadcast_max_block_size_mb = v;
            }
        }
        if let Ok(v) = std::env::var("BNDL_EXECUTE_ATTEMPTS") {
            if let Ok(v) = v.parse() {
                self.execute_attempts = v;
            }
        }
        if let Ok(v) = std::env::var("BNDL_EXECUTE_CONCURRENCY") {
            if let Ok(v) = v.parse() {
                self.execute_concurrency = v;
            }
        }
        if let Ok(v) = std::env::var("BNDL_NET_SEEDS") {
            self.net_seeds = v.split(',').map(str::to_string).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = std::env::var("BNDL_WORKER_COUNT") {
            if let Ok(v) = v.parse() {
                self.worker_count = Some(v);
            }
        }
    }

    fn validate(&self) -> Result<(), BndlError> {
        if self.broadcast_min_block_size_mb <= 0.0 || self.broadcast_max_block_size_mb <= 0.0 {
            return Err(BndlError::ConfigError("block sizes must be positive".into()));
        }
        if self.broadcast_min_block_size_mb > self.broadcast_max_block_size_mb {
            return Err(BndlError::ConfigError("min_block_size exceeds max_block_size".into()));
        }
        if self.execute_attempts == 0 {
            return Err(BndlError::ConfigError("execute.attempts must be at least 1".into()));
        }
        if self.execute_concurrency == 0 {
            return Err(BndlError::ConfigError("execute.concurrency must be at least 1".into()));
        }
        Ok(())
    }

    /// `clamp(worker_count * 2, min_block_size, max_block_size)` in bytes.
    pub fn broadcast_chunk_size_bytes(&self, worker_count: usize) -> usize {
        let min = (self.broadcast_min_block_size_mb * 1024.0 * 1024.0) as usize;
        let max = (self.broadcast_max_block_size_mb * 1024.0 * 1024.0) as usize;
        (worker_count * 2).clamp(min, max)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT

//! `bndl-worker`: the long-running process that serves a cluster's block
//! store, shuffle buckets, accumulators, broadcast chunks, and task
//! execution over RMI (spec section 4, component summary for
//! `bndl-worker`). Grounded on `oj-daemon`'s `main.rs`: load config, wire a
//! `tracing-subscriber` filter, construct the long-lived services, bind a
//! listener, then run until signalled to stop.
//!
//! Application-specific `ElementFn`/`PartitionTransform`/`Combiner`/
//! accumulator-op bodies have to exist, under the same names, in whatever
//! process runs them — this binary only installs the fixed `core.*`
//! builtins `bndl-dataset` ships. A real deployment would replace this
//! `main` with one that also registers its own job's named functions
//! before accepting connections, the same way the original expects every
//! worker to import the driver's module first.

use bndl_accumulator::{AccumulatorService, NamedOpRegistry, ACCUMULATOR_SERVICE_NAME};
use bndl_broadcast::{BroadcastService, BROADCAST_SERVICE_NAME};
use bndl_core::{Config, WorkerName};
use bndl_dataset::Registries;
use bndl_scheduler::{Materializer, TaskExecutorService, TASK_SERVICE_NAME};
use bndl_shuffle::{BucketRegistry, ShuffleService, SHUFFLE_SERVICE_NAME};
use bndl_store::{BlockStore, BlockStoreService, CacheProvider, StorageKind, BLOCKSTORE_SERVICE_NAME};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bndl-worker", about = "Runs a BNDL cluster worker process")]
struct Args {
    /// Path to a `bndl.toml` config file; defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `bndl.net.listen_addresses[0]` from the config file.
    #[arg(long)]
    listen: Option<String>,

    /// This worker's advertised name. Defaults to the bound socket address.
    #[arg(long)]
    name: Option<String>,

    /// Directory for spilled shuffle/cache data. Defaults to the system
    /// temp directory.
    #[arg(long)]
    spill_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let spill_dir = args.spill_dir.unwrap_or_else(std::env::temp_dir);
    let listen_addr = args.listen.unwrap_or_else(|| {
        config.net_listen_addresses.first().cloned().unwrap_or_else(|| "127.0.0.1:0".to_string())
    });

    let listener = TcpListener::bind(&listen_addr).await?;
    let bound_addr = listener.local_addr()?;
    let worker_name = WorkerName::new(args.name.unwrap_or_else(|| bound_addr.to_string()));

    tracing::info!(worker = %worker_name, addr = %bound_addr, "starting bndl-worker");

    let node = bndl_net::Node::new(worker_name.clone(), config.execute_concurrency as usize);

    let block_store = BlockStore::new(worker_name.clone(), spill_dir.clone());
    let buckets = Arc::new(BucketRegistry::new());
    let cache = Arc::new(CacheProvider::new(spill_dir, StorageKind::Disk));
    let accumulator_ops = NamedOpRegistry::new();
    let registries = Registries::new();

    let materializer = Arc::new(Materializer::new(
        registries,
        buckets.clone(),
        node.peers().clone(),
        cache,
        Duration::from_secs(60),
    ));

    node.services().register(BLOCKSTORE_SERVICE_NAME, Arc::new(BlockStoreService::new(block_store.clone())));
    node.services().register(SHUFFLE_SERVICE_NAME, Arc::new(ShuffleService::new(buckets)));
    node.services().register(ACCUMULATOR_SERVICE_NAME, Arc::new(AccumulatorService::new(accumulator_ops)));
    node.services().register(BROADCAST_SERVICE_NAME, Arc::new(BroadcastService::new(block_store)));
    node.services().register(TASK_SERVICE_NAME, Arc::new(TaskExecutorService::new(materializer)));

    for seed in &config.net_seeds {
        match node.connect(seed, WorkerName::new(seed.as_str())).await {
            Ok(_) => tracing::info!(seed = %seed, "connected to seed"),
            Err(e) => tracing::warn!(seed = %seed, error = %e, "failed to connect to seed"),
        }
    }

    let accept_handle = tokio::spawn(node.clone().accept_loop(listener));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    accept_handle.abort();
    Ok(())
}

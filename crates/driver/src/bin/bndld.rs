// SPDX-License-Identifier: MIT

//! `bndld`: an example driver binary. Loads a cluster config, connects to
//! its configured seeds, and runs a small demonstration job — summing a
//! range of integers distributed across the connected workers — to prove
//! the wiring works end to end. Grounded on `oj`'s `main.rs` (load config,
//! wire logging, invoke a command).

use bndl_core::Config;
use bndl_driver::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bndld", about = "Example BNDL driver: sums a range across the cluster")]
struct Args {
    /// Path to a `bndl.toml` config file; defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Upper bound (exclusive) of the range to sum.
    #[arg(long, default_value_t = 100)]
    upto: i64,

    /// Number of partitions to split the range into.
    #[arg(long, default_value_t = 4)]
    partitions: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    if config.net_seeds.is_empty() {
        tracing::warn!("bndl.net.seeds is empty; no workers to run the job on");
    }

    let ctx = Context::connect(&config).await?;
    let elements = (0..args.upto).map(serde_json::Value::from).collect();
    let ds = ctx.from_iterable(elements, args.partitions);

    let total = ctx.sum(&ds).await?;
    println!("sum(0..{}) = {total}", args.upto);
    Ok(())
}

#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use std::io::{self, BufWriter, Write};

use anyhow::{Context, bail};
use clap::Parser;
use config::{CliArgs, CliConfig};
use seqlease::{IdWidth, Registry, UidAllocator};
use telemetry::init_logging;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    init_logging(config.log_json)?;

    let registry = Registry::with_defaults();
    if !registry.contains(&config.strategy) {
        bail!(
            "unknown strategy {:?}; available: {}",
            config.strategy,
            registry.names().collect::<Vec<_>>().join(", ")
        );
    }

    tracing::info!(
        strategy = %config.strategy,
        server = %config.uid.server,
        count = config.count,
        width = %config.width,
        "starting"
    );

    let allocator = registry
        .create(&config.strategy, &config.uid)
        .with_context(|| format!("initializing {} allocator", config.strategy))?;

    let result = allocate(allocator.as_ref(), &config);
    if let Err(e) = allocator.close() {
        tracing::error!("error closing allocator: {e}");
    }
    result
}

fn allocate(allocator: &dyn UidAllocator, config: &CliConfig) -> anyhow::Result<()> {
    if config.width == IdWidth::Int32 && !allocator.has_int32() {
        bail!("strategy {:?} does not produce 32-bit IDs", config.strategy);
    }

    let mut out = BufWriter::new(io::stdout().lock());
    for _ in 0..config.count {
        let id = match config.width {
            IdWidth::Int32 => allocator.try_next_uid32().map(i64::from),
            IdWidth::Int64 => allocator.try_next_uid64(),
        }
        .context("allocating ID")?;
        writeln!(out, "{id}")?;
    }
    out.flush()?;

    tracing::info!(count = config.count, "allocated");
    Ok(())
}

//! Watch command implementation.
//!
//! Follows a price file as another process appends to it and prints every
//! value change as it happens.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use navgraph_config::Validate;
use navgraph_core::{ErrorPolicy, StrategyKind};
use navgraph_engine::StreamingLoop;
use navgraph_ext_file::{PriceTail, TailOptions};

use crate::cli::OutputFormat;
use crate::commands::{build_graph, engine_settings, load_config, parse_strategy};
use crate::output::ConsoleSink;

/// Arguments for the watch command.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Structure file (`NAME,SHARES` blocks)
    #[arg(short, long)]
    pub structure: PathBuf,

    /// Price file to follow (`NAME,PRICE` rows)
    #[arg(short, long)]
    pub prices: PathBuf,

    /// Propagation strategy: sensitivity or full_recompute
    #[arg(long, value_parser = parse_strategy)]
    pub strategy: Option<StrategyKind>,

    /// Poll interval in milliseconds
    #[arg(long)]
    pub poll_ms: Option<u64>,

    /// Stop after this many milliseconds without new rows
    #[arg(long)]
    pub idle_timeout_ms: Option<u64>,

    /// Stop after this many price rows
    #[arg(short = 'n', long)]
    pub max_updates: Option<usize>,

    /// Stop at the first row that cannot be applied
    #[arg(long)]
    pub abort_on_error: bool,
}

/// Execute the watch command.
pub fn execute(args: WatchArgs, config_path: &Path, format: OutputFormat) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(ms) = args.poll_ms {
        config.stream.poll_interval_ms = ms;
    }
    if args.idle_timeout_ms.is_some() {
        config.stream.idle_timeout_ms = args.idle_timeout_ms;
    }
    if let Some(max) = args.max_updates {
        config.stream.max_updates = Some(max);
    }
    if args.abort_on_error {
        config.stream.on_error = ErrorPolicy::Abort;
    }
    config
        .validate_or_error()
        .context("checking settings after command-line overrides")?;

    let mut graph = build_graph(&args.structure, &engine_settings(&config, args.strategy))?;

    let options = TailOptions::default()
        .with_poll_interval(Duration::from_millis(config.stream.poll_interval_ms.max(1)))
        .with_idle_timeout(config.stream.idle_timeout_ms.map(Duration::from_millis));
    let tail = PriceTail::spawn(&args.prices, options)
        .with_context(|| format!("following price file {}", args.prices.display()))?;

    info!(
        prices = %args.prices.display(),
        components = graph.len(),
        "Watching price file"
    );

    let sink = ConsoleSink::new(format, &config.output);
    StreamingLoop::new(&mut graph, sink)
        .with_settings(&config.stream)
        .run(tail)?;

    Ok(())
}

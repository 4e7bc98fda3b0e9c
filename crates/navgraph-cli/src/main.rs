//! Navgraph CLI - value portfolio hierarchies from a stream of stock prices.
//!
//! # Usage
//!
//! ```bash
//! # Print every value change as NAME,PRICE rows
//! navgraph value --structure book.csv --prices ticks.csv --format csv
//!
//! # Final state of every component, with the delta strategy disabled
//! navgraph value -s book.csv -p ticks.csv --strategy full_recompute --snapshot
//!
//! # Follow a price file while another process appends to it
//! navgraph watch -s book.csv -p live.csv --idle-timeout-ms 5000
//!
//! # Ranks, pending inputs and sensitivities
//! navgraph inspect -s book.csv --sensitivities
//!
//! # Effective configuration
//! navgraph --config navgraph.toml config show
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the default filter.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep stdout for results
    let default_filter = match (cli.verbose, cli.quiet) {
        (true, _) => "navgraph=debug",
        (false, true) => "navgraph=warn",
        (false, false) => "navgraph=info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let format = cli.format;
    let config = cli.config.as_path();

    match cli.command {
        Commands::Value(args) => commands::value::execute(args, config, format, cli.quiet)?,
        Commands::Watch(args) => commands::watch::execute(args, config, format)?,
        Commands::Inspect(args) => commands::inspect::execute(args, config, format)?,
        Commands::Config(args) => commands::config::execute(args, config, format)?,
    }

    Ok(())
}

//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::{ConfigArgs, InspectArgs, ValueArgs, WatchArgs};

/// Navgraph - Hierarchical portfolio valuation from a stream of stock prices
#[derive(Parser)]
#[command(name = "navgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults apply when it does not exist)
    #[arg(
        short,
        long,
        env = "NAVGRAPH_CONFIG",
        default_value = "navgraph.toml",
        global = true
    )]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Value a structure against a price file
    Value(ValueArgs),

    /// Follow a growing price file and print every change
    Watch(WatchArgs),

    /// Show the structure, pending inputs and sensitivities
    Inspect(InspectArgs),

    /// Show or validate the configuration
    Config(ConfigArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format (`NAME,PRICE` rows for price output)
    Csv,
    /// Minimal output (`name,price` lines)
    Minimal,
}

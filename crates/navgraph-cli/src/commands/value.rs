//! Value command implementation.
//!
//! Builds the graph from a structure file, applies every row of a price
//! file in order, and prints either each change or the final state.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use navgraph_config::Validate;
use navgraph_core::{CollectingSink, ErrorPolicy, NullSink, StrategyKind};
use navgraph_engine::{StreamSummary, StreamingLoop};
use navgraph_ext_file::{CsvPriceWriter, PriceReader};

use crate::cli::OutputFormat;
use crate::commands::{build_graph, engine_settings, load_config, parse_strategy};
use crate::output::{print_events, print_header, print_output, print_snapshot, KeyValue};

/// Arguments for the value command.
#[derive(Args, Debug)]
pub struct ValueArgs {
    /// Structure file (`NAME,SHARES` blocks)
    #[arg(short, long)]
    pub structure: PathBuf,

    /// Price file (`NAME,PRICE` rows)
    #[arg(short, long)]
    pub prices: PathBuf,

    /// Propagation strategy: sensitivity or full_recompute
    #[arg(long, value_parser = parse_strategy)]
    pub strategy: Option<StrategyKind>,

    /// Stop after this many price rows
    #[arg(short = 'n', long)]
    pub max_updates: Option<usize>,

    /// Stop at the first row that cannot be applied
    #[arg(long)]
    pub abort_on_error: bool,

    /// Print the final state of every component instead of each change
    #[arg(long)]
    pub snapshot: bool,

    /// Decimal places for printed prices
    #[arg(long)]
    pub precision: Option<usize>,
}

/// Execute the value command.
pub fn execute(
    args: ValueArgs,
    config_path: &Path,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(max) = args.max_updates {
        config.stream.max_updates = Some(max);
    }
    if args.abort_on_error {
        config.stream.on_error = ErrorPolicy::Abort;
    }
    if let Some(precision) = args.precision {
        config.output.precision = precision;
    }
    config
        .validate_or_error()
        .context("checking settings after command-line overrides")?;

    let mut graph = build_graph(&args.structure, &engine_settings(&config, args.strategy))?;
    let reader = PriceReader::from_path(&args.prices)
        .with_context(|| format!("opening price file {}", args.prices.display()))?;

    let summary = if args.snapshot {
        let summary = StreamingLoop::new(&mut graph, NullSink)
            .with_settings(&config.stream)
            .run(reader)?;
        print_snapshot(&graph.snapshot(), format, &config.output)?;
        summary
    } else if format == OutputFormat::Csv {
        let writer = CsvPriceWriter::new(io::stdout())?
            .with_precision(config.output.precision)
            .with_stocks(config.output.include_stocks);
        StreamingLoop::new(&mut graph, writer)
            .with_settings(&config.stream)
            .run(reader)?
    } else {
        let mut sink = CollectingSink::new();
        let summary = StreamingLoop::new(&mut graph, &mut sink)
            .with_settings(&config.stream)
            .run(reader)?;
        print_events(sink.events(), format, &config.output)?;
        summary
    };

    if format == OutputFormat::Table && !quiet {
        print_summary(&summary, graph.strategy())?;
    }

    Ok(())
}

fn print_summary(summary: &StreamSummary, strategy: StrategyKind) -> Result<()> {
    print_header("Summary");
    let rows = vec![
        KeyValue::new("Strategy", strategy),
        KeyValue::new("Records", summary.records()),
        KeyValue::new("Applied", summary.applied),
        KeyValue::new("Unchanged", summary.unchanged),
        KeyValue::new("Rejected", summary.rejected),
        KeyValue::new("Events", summary.events),
    ];
    print_output(&rows, OutputFormat::Table)
}

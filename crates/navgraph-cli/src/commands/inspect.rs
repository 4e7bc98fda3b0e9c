//! Inspect command implementation.
//!
//! Shows how the structure was resolved: each component's kind, rank,
//! holdings, owners and pending inputs, plus optionally the summed path
//! weight from every stock to every portfolio above it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use navgraph_core::{ComponentKind, NullSink, StrategyKind};
use navgraph_engine::{StreamingLoop, ValuationGraph};
use navgraph_ext_file::PriceReader;

use crate::cli::OutputFormat;
use crate::commands::{build_graph, engine_settings, load_config, parse_strategy};
use crate::output::{format_price, print_header, print_json, print_output, print_warning};

/// Arguments for the inspect command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Structure file (`NAME,SHARES` blocks)
    #[arg(short, long)]
    pub structure: PathBuf,

    /// Price file applied before inspecting
    #[arg(short, long)]
    pub prices: Option<PathBuf>,

    /// Propagation strategy: sensitivity or full_recompute
    #[arg(long, value_parser = parse_strategy)]
    pub strategy: Option<StrategyKind>,

    /// Also list stock-to-portfolio sensitivities
    #[arg(long)]
    pub sensitivities: bool,
}

/// One component as resolved by the engine.
#[derive(Debug, Serialize, Tabled)]
pub struct ComponentRow {
    #[tabled(rename = "Component")]
    pub name: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Holdings")]
    pub holdings: usize,
    #[tabled(rename = "Owners")]
    pub owners: usize,
    #[tabled(rename = "Pending")]
    pub pending: String,
    #[tabled(rename = "Price")]
    pub price: String,
}

/// Summed path weight from a stock to a portfolio.
#[derive(Debug, Serialize, Tabled)]
pub struct SensitivityRow {
    #[tabled(rename = "Portfolio")]
    pub portfolio: String,
    #[tabled(rename = "Stock")]
    pub stock: String,
    #[tabled(rename = "Sensitivity")]
    pub sensitivity: f64,
}

#[derive(Serialize)]
struct Report<'a> {
    strategy: StrategyKind,
    components: &'a [ComponentRow],
    #[serde(skip_serializing_if = "Option::is_none")]
    sensitivities: Option<&'a [SensitivityRow]>,
}

/// Execute the inspect command.
pub fn execute(args: InspectArgs, config_path: &Path, format: OutputFormat) -> Result<()> {
    let config = load_config(config_path)?;
    let mut graph = build_graph(&args.structure, &engine_settings(&config, args.strategy))?;

    if let Some(path) = &args.prices {
        let reader = PriceReader::from_path(path)
            .with_context(|| format!("opening price file {}", path.display()))?;
        StreamingLoop::new(&mut graph, NullSink)
            .with_settings(&config.stream)
            .run(reader)?;
    }

    let components = component_rows(&graph, config.output.precision)?;
    let sensitivities = if args.sensitivities {
        if graph.strategy() != StrategyKind::Sensitivity {
            print_warning("Sensitivities are only precomputed by the sensitivity strategy");
        }
        Some(sensitivity_rows(&graph)?)
    } else {
        None
    };

    if format == OutputFormat::Json {
        return print_json(&Report {
            strategy: graph.strategy(),
            components: &components,
            sensitivities: sensitivities.as_deref(),
        });
    }

    print_output(&components, format)?;
    if let Some(rows) = &sensitivities {
        if format == OutputFormat::Table {
            print_header("Sensitivities");
        }
        print_output(rows, format)?;
    }
    Ok(())
}

fn component_rows(graph: &ValuationGraph, precision: usize) -> Result<Vec<ComponentRow>> {
    graph
        .components()
        .map(|node| -> Result<ComponentRow> {
            let pending = match node.kind() {
                ComponentKind::Portfolio => graph.pending_inputs(node.name().as_str())?,
                ComponentKind::Stock => None,
            };
            Ok(ComponentRow {
                name: node.name().to_string(),
                kind: node.kind().to_string(),
                rank: node.rank(),
                holdings: node.as_portfolio().map_or(0, |p| p.holdings().len()),
                owners: node.owners().len(),
                pending: pending.map_or_else(|| "-".to_string(), |n| n.to_string()),
                price: graph
                    .price(node.name().as_str())?
                    .map_or_else(|| "-".to_string(), |p| format_price(p, precision)),
            })
        })
        .collect()
}

/// Non-zero sensitivities, portfolios in slot order, stocks in slot order.
fn sensitivity_rows(graph: &ValuationGraph) -> Result<Vec<SensitivityRow>> {
    let (portfolios, stocks): (Vec<_>, Vec<_>) = graph
        .components()
        .partition(|node| node.kind() == ComponentKind::Portfolio);

    let mut rows = Vec::new();
    for portfolio in &portfolios {
        for stock in &stocks {
            let value = graph.sensitivity(portfolio.name().as_str(), stock.name().as_str())?;
            if let Some(sensitivity) = value.filter(|s| *s != 0.0) {
                rows.push(SensitivityRow {
                    portfolio: portfolio.name().to_string(),
                    stock: stock.name().to_string(),
                    sensitivity,
                });
            }
        }
    }
    Ok(rows)
}

//! CLI command implementations.

pub mod config;
pub mod inspect;
pub mod value;
pub mod watch;

// Re-export submodules for convenience
pub use config::ConfigArgs;
pub use inspect::InspectArgs;
pub use value::ValueArgs;
pub use watch::WatchArgs;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use navgraph_config::{EngineSettings, NavGraphConfig};
use navgraph_core::StrategyKind;
use navgraph_engine::{ValuationGraph, ValuationGraphBuilder};
use navgraph_ext_file::StructureReader;

/// Loads the configuration, falling back to defaults when the file is missing.
pub fn load_config(path: &Path) -> Result<NavGraphConfig> {
    let config = NavGraphConfig::from_file_or_default(path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    debug!(path = %path.display(), exists = path.exists(), "Configuration loaded");
    Ok(config)
}

/// Reads a structure file and builds the graph.
///
/// The first malformed row or invalid declaration stops the build.
pub fn build_graph(structure: &Path, engine: &EngineSettings) -> Result<ValuationGraph> {
    let reader = StructureReader::from_path(structure)
        .with_context(|| format!("opening structure file {}", structure.display()))?;

    let mut builder = ValuationGraphBuilder::new().with_settings(engine);
    for record in reader {
        let record = record.with_context(|| format!("reading {}", structure.display()))?;
        builder
            .declare(record)
            .with_context(|| format!("declaring structure from {}", structure.display()))?;
    }
    builder
        .build()
        .with_context(|| format!("building graph from {}", structure.display()))
}

/// Engine settings with an optional strategy override.
pub fn engine_settings(config: &NavGraphConfig, strategy: Option<StrategyKind>) -> EngineSettings {
    match strategy {
        Some(strategy) => config.engine.clone().with_strategy(strategy),
        None => config.engine.clone(),
    }
}

/// Parses a strategy name for clap.
pub fn parse_strategy(s: &str) -> Result<StrategyKind, String> {
    s.parse()
}

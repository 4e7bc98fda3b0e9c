//! Config command implementation.
//!
//! Shows the effective configuration or validates a configuration file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use navgraph_config::{NavGraphConfig, Validate};

use crate::cli::OutputFormat;
use crate::commands::load_config;
use crate::output::{print_error, print_json, print_output, print_success, print_warning, KeyValue};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Check a configuration file and list every problem
    Validate,
}

/// Execute the config command.
pub fn execute(args: ConfigArgs, config_path: &Path, format: OutputFormat) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show(config_path, format),
        ConfigCommand::Validate => validate(config_path),
    }
}

fn show(path: &Path, format: OutputFormat) -> Result<()> {
    if !path.exists() {
        print_warning(&format!("{} not found, using defaults", path.display()));
    }
    let config = load_config(path)?;

    match format {
        OutputFormat::Json => print_json(&config),
        OutputFormat::Minimal => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        OutputFormat::Table | OutputFormat::Csv => print_output(&settings_rows(&config), format),
    }
}

fn settings_rows(config: &NavGraphConfig) -> Vec<KeyValue> {
    let optional = |value: Option<String>| value.unwrap_or_else(|| "none".to_string());
    vec![
        KeyValue::new("engine.strategy", config.engine.strategy),
        KeyValue::new("engine.parallel_threshold", config.engine.parallel_threshold),
        KeyValue::new("stream.poll_interval_ms", config.stream.poll_interval_ms),
        KeyValue::new(
            "stream.idle_timeout_ms",
            optional(config.stream.idle_timeout_ms.map(|v| v.to_string())),
        ),
        KeyValue::new(
            "stream.max_updates",
            optional(config.stream.max_updates.map(|v| v.to_string())),
        ),
        KeyValue::new("stream.on_error", config.stream.on_error),
        KeyValue::new("output.precision", config.output.precision),
        KeyValue::new("output.include_stocks", config.output.include_stocks),
    ]
}

fn validate(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading configuration file {}", path.display()))?;
    let config: NavGraphConfig = toml::from_str(&content)
        .with_context(|| format!("parsing configuration file {}", path.display()))?;

    let errors = config.validate();
    if errors.is_empty() {
        print_success(&format!("{} is valid", path.display()));
        return Ok(());
    }

    for error in &errors {
        print_error(&error.to_string());
    }
    bail!("{} validation error(s) in {}", errors.len(), path.display())
}

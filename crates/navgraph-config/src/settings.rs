//! Configuration sections for the engine, streaming loop and output.

use std::path::Path;

use serde::{Deserialize, Serialize};

use navgraph_core::{ErrorPolicy, StrategyKind};

use crate::error::{ConfigError, ConfigResult, Validate, ValidationError};

// =============================================================================
// ENGINE SETTINGS
// =============================================================================

/// Settings for graph construction and propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Propagation strategy.
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Stock count above which sensitivity columns are built in parallel
    /// (only honoured when the engine is compiled with `parallel`).
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_parallel_threshold() -> usize {
    256
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl EngineSettings {
    /// Sets the propagation strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the parallel precomputation threshold.
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

impl Validate for EngineSettings {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.parallel_threshold == 0 {
            errors.push(ValidationError::with_rule(
                "engine.parallel_threshold",
                "Parallel threshold must be at least 1",
                "min_threshold",
            ));
        }

        errors
    }
}

// =============================================================================
// STREAM SETTINGS
// =============================================================================

/// Settings for the streaming loop and file tailing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    /// How often a tailed file is polled for new rows.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Stop tailing after this long without new rows (never when absent).
    #[serde(default)]
    pub idle_timeout_ms: Option<u64>,

    /// Stop after this many price records (unbounded when absent).
    #[serde(default)]
    pub max_updates: Option<usize>,

    /// What to do with a record that cannot be applied.
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            idle_timeout_ms: None,
            max_updates: None,
            on_error: ErrorPolicy::default(),
        }
    }
}

impl Validate for StreamSettings {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.poll_interval_ms == 0 || self.poll_interval_ms > 60_000 {
            errors.push(ValidationError::with_rule(
                "stream.poll_interval_ms",
                format!(
                    "Poll interval {}ms must be between 1 and 60000",
                    self.poll_interval_ms
                ),
                "valid_interval",
            ));
        }

        if let Some(timeout) = self.idle_timeout_ms {
            if timeout < self.poll_interval_ms {
                errors.push(ValidationError::with_rule(
                    "stream.idle_timeout_ms",
                    "Idle timeout must not be shorter than the poll interval",
                    "timeout_vs_interval",
                ));
            }
        }

        if self.max_updates == Some(0) {
            errors.push(ValidationError::new(
                "stream.max_updates",
                "Max updates must be positive when set",
            ));
        }

        errors
    }
}

// =============================================================================
// OUTPUT SETTINGS
// =============================================================================

/// Settings for printing results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Decimal places for printed prices.
    #[serde(default = "default_precision")]
    pub precision: usize,

    /// Whether stock events are printed alongside portfolio events.
    #[serde(default = "default_true")]
    pub include_stocks: bool,
}

fn default_precision() -> usize {
    6
}

fn default_true() -> bool {
    true
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            include_stocks: true,
        }
    }
}

impl Validate for OutputSettings {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.precision > 15 {
            errors.push(ValidationError::with_rule(
                "output.precision",
                format!("Precision {} exceeds maximum of 15", self.precision),
                "max_precision",
            ));
        }

        errors
    }
}

// =============================================================================
// ROOT CONFIGURATION
// =============================================================================

/// Complete Navgraph configuration.
///
/// ```rust
/// use navgraph_config::NavGraphConfig;
/// use navgraph_core::StrategyKind;
///
/// let config = NavGraphConfig::from_toml_str(
///     r#"
///     [engine]
///     strategy = "full_recompute"
///
///     [stream]
///     poll_interval_ms = 100
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.engine.strategy, StrategyKind::FullRecompute);
/// assert_eq!(config.output.precision, 6);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavGraphConfig {
    /// Engine settings.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Streaming settings.
    #[serde(default)]
    pub stream: StreamSettings,

    /// Output settings.
    #[serde(default)]
    pub output: OutputSettings,
}

impl NavGraphConfig {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate_or_error()?;
        Ok(config)
    }

    /// Loads and validates a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads `path` when it exists, otherwise returns the defaults.
    pub fn from_file_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Validate for NavGraphConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = self.engine.validate();
        errors.extend(self.stream.validate());
        errors.extend(self.output.validate());
        errors
    }
}

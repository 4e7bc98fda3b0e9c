//! Navgraph Configuration Layer
//!
//! This crate provides configuration management for the Navgraph valuation
//! graph. Settings are grouped by the component they drive:
//!
//! - **Engine**: propagation strategy and parallel precomputation threshold
//! - **Stream**: poll interval, idle timeout, update bound and error policy
//! - **Output**: printed precision and whether stock events are shown
//!
//! Every section has defaults, so an empty file (or no file) is a valid
//! configuration.
//!
//! # Example
//!
//! ```toml
//! [engine]
//! strategy = "sensitivity"       # or "full_recompute"
//!
//! [stream]
//! poll_interval_ms = 250
//! idle_timeout_ms = 5000
//! on_error = "skip"              # or "abort"
//!
//! [output]
//! precision = 4
//! include_stocks = false
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod settings;

pub use error::{ConfigError, ConfigResult, Validate, ValidationError};
pub use settings::{EngineSettings, NavGraphConfig, OutputSettings, StreamSettings};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ConfigError, ConfigResult, Validate};
    pub use crate::settings::{EngineSettings, NavGraphConfig, OutputSettings, StreamSettings};
}

//! # Navgraph Core
//!
//! Shared vocabulary for the Navgraph valuation graph.
//!
//! This crate contains ONLY identifiers, records, selectors, errors and the
//! output trait. The graph itself lives in `navgraph-engine`; readers and
//! writers live in extension crates.
//!
//! ## Module Structure
//!
//! - [`ids`]: Component names and dense price-store slots
//! - [`records`]: Structural declarations, price updates and price events
//! - [`policy`]: Propagation strategy and stream error policy selectors
//! - [`error`]: Graph and feed error taxonomy
//! - [`output`]: The [`PriceSink`] trait and simple sinks

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod ids;
pub mod output;
pub mod policy;
pub mod records;

// Re-export commonly used types
pub use error::{FeedError, FeedResult, GraphError, GraphResult};
pub use ids::{ComponentName, Slot};
pub use output::{CollectingSink, NullSink, PriceSink};
pub use policy::{ErrorPolicy, StrategyKind};
pub use records::{ComponentKind, Declaration, PriceEvent, PriceUpdate, Valuation};

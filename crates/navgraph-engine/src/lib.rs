//! # Navgraph Engine
//!
//! Hierarchical valuation graph with incremental price propagation.
//!
//! This crate provides:
//! - [`AdjacencyBuilder`]: Ownership declarations to a frozen structure
//! - [`NodeRegistry`]: Dense slots, typed nodes and links
//! - [`SensitivityMatrix`]: Summed path weights from every stock upward
//! - [`Propagator`]: Full-recompute and sensitivity (delta) strategies
//! - [`ValuationGraph`]: The graph, its price store and its active strategy
//! - [`StreamingLoop`]: Feeds price records through the graph into a sink
//!
//! ## Architecture
//!
//! ```text
//! Declarations ─> AdjacencyBuilder ─> Adjacency ─> NodeRegistry ─┬─> PriceStore
//!                                                                │
//!                                                                └─> SensitivityMatrix
//!
//! PriceUpdate ─> ValuationGraph::apply ─> Propagator ─> PriceEvents ─> PriceSink
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use navgraph_engine::ValuationGraphBuilder;
//!
//! let mut graph = ValuationGraphBuilder::new()
//!     .container("R")?
//!     .container("P")?
//!     .container("Q")?
//!     .holding("A", 2.0, "P")?
//!     .holding("A", 3.0, "Q")?
//!     .holding("P", 1.0, "R")?
//!     .holding("Q", 1.0, "R")?
//!     .build()?;
//!
//! graph.apply("A", 10.0)?;
//! assert_eq!(graph.price("R")?, Some(50.0));
//! # Ok::<(), navgraph_core::GraphError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adjacency;
pub mod builder;
pub mod error;
pub mod graph;
pub mod nodes;
pub mod prices;
pub mod propagation;
pub mod registry;
pub mod sensitivity;
pub mod streaming;

// Re-exports
pub use adjacency::{Adjacency, AdjacencyBuilder, Ownership};
pub use builder::ValuationGraphBuilder;
pub use error::{StreamError, StreamResult};
pub use graph::{ComponentState, ValuationGraph};
pub use nodes::{Component, Edge, PortfolioNode, StockNode};
pub use prices::PriceStore;
pub use propagation::{FullRecompute, Propagator, SensitivityPropagator};
pub use registry::NodeRegistry;
pub use sensitivity::{Affected, SensitivityMatrix};
pub use streaming::{StreamSummary, StreamingLoop};

//! Builder pattern for the valuation graph.

use navgraph_config::EngineSettings;
use navgraph_core::{Declaration, GraphResult, StrategyKind};

use crate::adjacency::AdjacencyBuilder;
use crate::graph::ValuationGraph;

/// Builder for constructing a [`ValuationGraph`].
///
/// Declarations are validated as they arrive; the structure is frozen and
/// checked for dangling references and cycles in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct ValuationGraphBuilder {
    adjacency: AdjacencyBuilder,
    settings: EngineSettings,
}

impl ValuationGraphBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine settings.
    #[must_use]
    pub fn with_settings(mut self, settings: &EngineSettings) -> Self {
        self.settings = settings.clone();
        self
    }

    /// Set the propagation strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.settings.strategy = strategy;
        self
    }

    /// Declare a portfolio.
    pub fn container(mut self, name: &str) -> GraphResult<Self> {
        self.adjacency.declare_container(name)?;
        Ok(self)
    }

    /// Declare that `parent` holds `weight` units of `child`.
    pub fn holding(mut self, child: &str, weight: f64, parent: &str) -> GraphResult<Self> {
        self.adjacency.declare_ownership(child, weight, parent)?;
        Ok(self)
    }

    /// Apply one declaration record.
    pub fn declare(&mut self, record: Declaration) -> GraphResult<()> {
        self.adjacency.declare(record)
    }

    /// Apply declaration records in order, stopping at the first invalid one.
    pub fn extend<I>(&mut self, records: I) -> GraphResult<usize>
    where
        I: IntoIterator<Item = Declaration>,
    {
        self.adjacency.extend(records)
    }

    /// Build the valuation graph.
    pub fn build(self) -> GraphResult<ValuationGraph> {
        let adjacency = self.adjacency.finalize()?;
        ValuationGraph::new(&adjacency, &self.settings)
    }
}

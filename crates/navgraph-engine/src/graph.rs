//! The valuation graph.
//!
//! [`ValuationGraph`] owns the node registry, the shared price store and the
//! active propagator. After construction the structure is frozen; the only
//! mutation is [`ValuationGraph::apply`], which prices one stock and
//! propagates the change to every dependent portfolio.

use serde::Serialize;
use tracing::{debug, info};

use navgraph_config::EngineSettings;
use navgraph_core::{
    ComponentKind, ComponentName, Declaration, GraphError, GraphResult, PriceEvent, PriceUpdate,
    Slot, StrategyKind, Valuation,
};

use crate::adjacency::{Adjacency, AdjacencyBuilder};
use crate::nodes::Component;
use crate::prices::PriceStore;
use crate::propagation::{self, Propagator};
use crate::registry::NodeRegistry;

/// Name, kind and valuation of one component at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentState {
    /// Component name.
    pub name: ComponentName,
    /// Stock or portfolio.
    pub kind: ComponentKind,
    /// Current valuation.
    pub valuation: Valuation,
}

/// Hierarchical valuation graph.
///
/// # Example
///
/// ```rust
/// use navgraph_config::EngineSettings;
/// use navgraph_core::Declaration;
/// use navgraph_engine::ValuationGraph;
///
/// let mut graph = ValuationGraph::from_declarations(
///     vec![
///         Declaration::container("P"),
///         Declaration::holding("A", 2.0, "P"),
///     ],
///     &EngineSettings::default(),
/// )
/// .unwrap();
///
/// let events = graph.apply("A", 10.0).unwrap();
/// assert_eq!(events.len(), 2);
/// assert_eq!(graph.price("P").unwrap(), Some(20.0));
/// ```
#[derive(Debug)]
pub struct ValuationGraph {
    registry: NodeRegistry,
    prices: PriceStore,
    propagator: Box<dyn Propagator>,
    revision: u64,
}

impl ValuationGraph {
    /// Builds the graph for a frozen structure.
    ///
    /// # Errors
    ///
    /// [`GraphError::DanglingReference`] if an edge names an undeclared
    /// parent.
    pub fn new(adjacency: &Adjacency, settings: &EngineSettings) -> GraphResult<Self> {
        let (registry, prices) = NodeRegistry::build(adjacency)?;
        let propagator =
            propagation::for_strategy(settings.strategy, &registry, settings.parallel_threshold);

        info!(
            stocks = registry.stocks().len(),
            portfolios = registry.portfolios().len(),
            strategy = %settings.strategy,
            "Valuation graph built"
        );

        Ok(Self {
            registry,
            prices,
            propagator,
            revision: 0,
        })
    }

    /// Declares, finalizes and builds in one step.
    pub fn from_declarations<I>(records: I, settings: &EngineSettings) -> GraphResult<Self>
    where
        I: IntoIterator<Item = Declaration>,
    {
        let mut builder = AdjacencyBuilder::new();
        builder.extend(records)?;
        Self::new(&builder.finalize()?, settings)
    }

    // =========================================================================
    // UPDATES
    // =========================================================================

    /// Prices stock `name` and propagates the change.
    ///
    /// Returns one event per component whose stored price changed: the stock
    /// first, then portfolios with holdings before owners. Setting the
    /// current price again returns no events.
    ///
    /// # Errors
    ///
    /// Nothing is mutated when an error is returned.
    /// - [`GraphError::UnknownComponent`] if `name` was never declared
    /// - [`GraphError::NotAStock`] if `name` is a portfolio
    /// - [`GraphError::InvalidPrice`] if `price` is NaN or infinite
    pub fn apply(&mut self, name: &str, price: f64) -> GraphResult<Vec<PriceEvent>> {
        let slot = self.registry.resolve(name)?;
        if self.registry.get(slot).kind() != ComponentKind::Stock {
            return Err(GraphError::NotAStock { name: name.into() });
        }
        if !price.is_finite() {
            return Err(GraphError::InvalidPrice {
                name: name.into(),
                price,
            });
        }

        let previous = self.prices.get(slot);
        if !self.prices.set(slot, price) {
            debug!(stock = name, price, "Price unchanged");
            return Ok(Vec::new());
        }

        let changed = self
            .propagator
            .propagate(&self.registry, &mut self.prices, slot, previous);
        self.revision += 1;

        let mut events = Vec::with_capacity(changed.len() + 1);
        events.push(self.event(slot));
        events.extend(changed.into_iter().map(|s| self.event(s)));

        debug!(
            stock = name,
            price,
            first = previous.is_none(),
            events = events.len(),
            "Price applied"
        );

        Ok(events)
    }

    /// Applies a [`PriceUpdate`] record.
    pub fn apply_update(&mut self, update: &PriceUpdate) -> GraphResult<Vec<PriceEvent>> {
        self.apply(&update.name, update.price)
    }

    fn event(&self, slot: Slot) -> PriceEvent {
        let node = self.registry.get(slot);
        PriceEvent::new(node.name().clone(), node.kind(), self.prices.raw(slot))
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Current price of `name`, `None` while unpriced.
    pub fn price(&self, name: &str) -> GraphResult<Option<f64>> {
        Ok(self.prices.get(self.registry.resolve(name)?))
    }

    /// Current valuation of `name`.
    pub fn valuation(&self, name: &str) -> GraphResult<Valuation> {
        let slot = self.registry.resolve(name)?;
        Ok(self.registry.get(slot).valuation(&self.prices))
    }

    /// Kind of `name`.
    pub fn kind(&self, name: &str) -> GraphResult<ComponentKind> {
        Ok(self.registry.get(self.registry.resolve(name)?).kind())
    }

    /// Summed path weight from `stock` up to `portfolio`.
    ///
    /// `None` under the full-recompute strategy, which precomputes nothing.
    pub fn sensitivity(&self, portfolio: &str, stock: &str) -> GraphResult<Option<f64>> {
        let p = self.portfolio_node(portfolio)?;
        let s = self.registry.get(self.registry.resolve(stock)?);
        if s.kind() != ComponentKind::Stock {
            return Err(GraphError::NotAStock { name: stock.into() });
        }
        Ok(self.propagator.sensitivity(p.ordinal(), s.ordinal()))
    }

    /// Number of stocks below `portfolio` still unpriced.
    ///
    /// `None` under the full-recompute strategy, which keeps no counters.
    pub fn pending_inputs(&self, portfolio: &str) -> GraphResult<Option<usize>> {
        let p = self.portfolio_node(portfolio)?;
        Ok(self.propagator.pending_inputs(p.ordinal()))
    }

    fn portfolio_node(&self, name: &str) -> GraphResult<&Component> {
        let node = self.registry.get(self.registry.resolve(name)?);
        if node.kind() != ComponentKind::Portfolio {
            return Err(GraphError::NotAPortfolio { name: name.into() });
        }
        Ok(node)
    }

    /// State of every component, portfolios first, in declaration order.
    pub fn snapshot(&self) -> Vec<ComponentState> {
        self.registry
            .iter()
            .map(|node| ComponentState {
                name: node.name().clone(),
                kind: node.kind(),
                valuation: node.valuation(&self.prices),
            })
            .collect()
    }

    /// Every node in slot order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.registry.iter()
    }

    /// Active strategy.
    pub fn strategy(&self) -> StrategyKind {
        self.propagator.kind()
    }

    /// Number of updates that changed a price.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of components holding a price.
    pub fn priced_count(&self) -> usize {
        self.prices.known_count()
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns true if the graph has no components.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

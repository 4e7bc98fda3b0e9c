//! Propagation strategies.
//!
//! A [`Propagator`] runs after a stock's new price has been written to the
//! store and brings every dependent portfolio up to date. Two strategies are
//! provided:
//!
//! - [`FullRecompute`]: walks the ancestors of the stock and re-evaluates
//!   each one whose holdings changed, by full dot product.
//! - [`SensitivityPropagator`]: uses precomputed path weights to shift every
//!   priced ancestor by `delta * sensitivity`, with no traversal.
//!
//! Both leave a portfolio unpriced while any holding below it is unknown.

use std::collections::HashSet;
use std::fmt;

use tracing::{trace, warn};

use navgraph_core::{Slot, StrategyKind};

use crate::prices::PriceStore;
use crate::registry::NodeRegistry;
use crate::sensitivity::SensitivityMatrix;

/// Update algorithm invoked on every stock price change.
pub trait Propagator: fmt::Debug + Send {
    /// Strategy implemented.
    fn kind(&self) -> StrategyKind;

    /// Updates portfolios after `stock` changed from `previous` (`None` on
    /// its first price) to the value now in `prices`.
    ///
    /// Returns the slots of portfolios whose stored price changed, in the
    /// order they changed.
    fn propagate(
        &mut self,
        registry: &NodeRegistry,
        prices: &mut PriceStore,
        stock: Slot,
        previous: Option<f64>,
    ) -> Vec<Slot>;

    /// Stocks below the portfolio with ordinal `portfolio` still unpriced,
    /// if this strategy tracks them.
    fn pending_inputs(&self, _portfolio: usize) -> Option<usize> {
        None
    }

    /// Summed path weight from a stock to a portfolio (both by ordinal), if
    /// this strategy precomputes it.
    fn sensitivity(&self, _portfolio: usize, _stock: usize) -> Option<f64> {
        None
    }
}

/// Creates the propagator for `kind`.
pub fn for_strategy(
    kind: StrategyKind,
    registry: &NodeRegistry,
    parallel_threshold: usize,
) -> Box<dyn Propagator> {
    match kind {
        StrategyKind::FullRecompute => Box::new(FullRecompute),
        StrategyKind::Sensitivity => Box::new(SensitivityPropagator::new(
            SensitivityMatrix::build(registry, parallel_threshold),
        )),
    }
}

// =============================================================================
// FULL RECOMPUTE
// =============================================================================

/// Bottom-up re-evaluation of every ancestor reached from the stock.
///
/// Ancestors are visited once each, holdings before owners. A portfolio is
/// evaluated only if one of its direct holdings changed during this update,
/// so a portfolio that cannot be valued stops propagation to its owners.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullRecompute;

impl Propagator for FullRecompute {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FullRecompute
    }

    fn propagate(
        &mut self,
        registry: &NodeRegistry,
        prices: &mut PriceStore,
        stock: Slot,
        _previous: Option<f64>,
    ) -> Vec<Slot> {
        let mut ancestors = registry.ancestors(stock);
        registry.sort_by_rank(&mut ancestors);

        let mut changed = HashSet::from([stock]);
        let mut emitted = Vec::new();

        for slot in ancestors {
            let Some(portfolio) = registry.portfolio(slot) else {
                continue;
            };
            if !portfolio.holdings().iter().any(|h| changed.contains(&h.slot)) {
                continue;
            }

            match portfolio.evaluate(prices) {
                Some(value) if !value.is_finite() => {
                    warn!(
                        portfolio = %registry.get(slot).name(),
                        value,
                        "Valuation overflowed, keeping previous price"
                    );
                }
                Some(value) => {
                    if prices.set(slot, value) {
                        trace!(portfolio = %registry.get(slot).name(), value, "Revalued");
                        changed.insert(slot);
                        emitted.push(slot);
                    }
                }
                None => {
                    trace!(portfolio = %registry.get(slot).name(), "Holdings incomplete");
                }
            }
        }

        emitted
    }
}

// =============================================================================
// SENSITIVITY (DELTA)
// =============================================================================

/// Incremental strategy driven by a precomputed [`SensitivityMatrix`].
///
/// Each portfolio keeps a counter of reachable stocks still unpriced. A
/// stock's first price counts down its ancestors, valuing each one whose
/// counter reaches zero. Later prices add `delta * sensitivity` to every
/// priced ancestor.
#[derive(Debug, Clone)]
pub struct SensitivityPropagator {
    matrix: SensitivityMatrix,
    pending: Vec<usize>,
}

impl SensitivityPropagator {
    /// Creates the propagator with every counter at its reach count.
    pub fn new(matrix: SensitivityMatrix) -> Self {
        let pending = matrix.reach_counts().to_vec();
        Self { matrix, pending }
    }

    /// The precomputed table.
    pub fn matrix(&self) -> &SensitivityMatrix {
        &self.matrix
    }

    fn first_price(
        &mut self,
        registry: &NodeRegistry,
        prices: &mut PriceStore,
        stock: usize,
    ) -> Vec<Slot> {
        let mut emitted = Vec::new();

        for entry in self.matrix.affected(stock) {
            let portfolio = registry.get(entry.slot);
            let counter = &mut self.pending[portfolio.ordinal()];
            *counter = counter.saturating_sub(1);
            if *counter > 0 {
                continue;
            }

            let value = portfolio.as_portfolio().and_then(|p| p.evaluate(prices));
            match value {
                Some(value) if !value.is_finite() => {
                    warn!(
                        portfolio = %portfolio.name(),
                        value,
                        "Valuation overflowed, left unpriced"
                    );
                }
                Some(value) => {
                    if prices.set(entry.slot, value) {
                        trace!(portfolio = %portfolio.name(), value, "First valuation");
                        emitted.push(entry.slot);
                    }
                }
                None => {
                    trace!(portfolio = %portfolio.name(), "Holding can never be priced");
                }
            }
        }

        emitted
    }

    fn revise(
        &self,
        registry: &NodeRegistry,
        prices: &mut PriceStore,
        stock: usize,
        delta: f64,
    ) -> Vec<Slot> {
        let mut emitted = Vec::new();

        for entry in self.matrix.affected(stock) {
            let shift = delta * entry.sensitivity;
            let name = registry.get(entry.slot).name();
            if let Some(current) = prices.get(entry.slot) {
                if !(current + shift).is_finite() {
                    warn!(
                        portfolio = %name,
                        current,
                        shift,
                        "Shift overflowed, keeping previous price"
                    );
                    continue;
                }
            }
            if prices.add(entry.slot, shift) {
                trace!(portfolio = %name, shift, "Shifted");
                emitted.push(entry.slot);
            }
        }

        emitted
    }
}

impl Propagator for SensitivityPropagator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sensitivity
    }

    fn propagate(
        &mut self,
        registry: &NodeRegistry,
        prices: &mut PriceStore,
        stock: Slot,
        previous: Option<f64>,
    ) -> Vec<Slot> {
        let ordinal = registry.get(stock).ordinal();
        match (previous, prices.get(stock)) {
            (None, _) => self.first_price(registry, prices, ordinal),
            (Some(old), Some(new)) => self.revise(registry, prices, ordinal, new - old),
            (Some(_), None) => Vec::new(),
        }
    }

    fn pending_inputs(&self, portfolio: usize) -> Option<usize> {
        self.pending.get(portfolio).copied()
    }

    fn sensitivity(&self, portfolio: usize, stock: usize) -> Option<f64> {
        Some(self.matrix.get(portfolio, stock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::AdjacencyBuilder;

    fn setup(kind: StrategyKind) -> (NodeRegistry, PriceStore, Box<dyn Propagator>) {
        let mut b = AdjacencyBuilder::new();
        for p in ["R", "P", "Q", "EMPTY", "TOP"] {
            b.declare_container(p).unwrap();
        }
        b.declare_ownership("A", 2.0, "P").unwrap();
        b.declare_ownership("B", 1.0, "P").unwrap();
        b.declare_ownership("A", 3.0, "Q").unwrap();
        b.declare_ownership("P", 1.0, "R").unwrap();
        b.declare_ownership("Q", 1.0, "R").unwrap();
        b.declare_ownership("R", 1.0, "TOP").unwrap();
        b.declare_ownership("EMPTY", 1.0, "TOP").unwrap();

        let (registry, prices) = NodeRegistry::build(&b.finalize().unwrap()).unwrap();
        let propagator = for_strategy(kind, &registry, usize::MAX);
        (registry, prices, propagator)
    }

    fn set(
        registry: &NodeRegistry,
        prices: &mut PriceStore,
        propagator: &mut dyn Propagator,
        name: &str,
        value: f64,
    ) -> Vec<String> {
        let slot = registry.lookup(name).unwrap();
        let previous = prices.get(slot);
        prices.set(slot, value);
        propagator
            .propagate(registry, prices, slot, previous)
            .into_iter()
            .map(|s| registry.get(s).name().to_string())
            .collect()
    }

    fn check_waits_for_every_holding(kind: StrategyKind) {
        let (registry, mut prices, mut prop) = setup(kind);

        let changed = set(&registry, &mut prices, prop.as_mut(), "A", 10.0);
        assert_eq!(changed, vec!["Q"]);
        assert_eq!(prices.get(registry.lookup("Q").unwrap()), Some(30.0));
        assert_eq!(prices.get(registry.lookup("P").unwrap()), None);

        let changed = set(&registry, &mut prices, prop.as_mut(), "B", 5.0);
        assert_eq!(changed, vec!["P", "R"]);
        assert_eq!(prices.get(registry.lookup("R").unwrap()), Some(55.0));
        assert_eq!(prices.get(registry.lookup("TOP").unwrap()), None);

        let changed = set(&registry, &mut prices, prop.as_mut(), "A", 12.0);
        assert_eq!(changed.len(), 3);
        assert_eq!(prices.get(registry.lookup("R").unwrap()), Some(65.0));
        assert_eq!(prices.get(registry.lookup("EMPTY").unwrap()), None);
    }

    fn check_overflow_keeps_last_finite_price(kind: StrategyKind) {
        let mut b = AdjacencyBuilder::new();
        b.declare_container("BIG").unwrap();
        b.declare_container("FRESH").unwrap();
        b.declare_ownership("A", 1e308, "BIG").unwrap();
        b.declare_ownership("C", 1e308, "FRESH").unwrap();
        let (registry, mut prices) = NodeRegistry::build(&b.finalize().unwrap()).unwrap();
        let mut prop = for_strategy(kind, &registry, usize::MAX);

        let changed = set(&registry, &mut prices, prop.as_mut(), "A", 1.0);
        assert_eq!(changed, vec!["BIG"]);

        let changed = set(&registry, &mut prices, prop.as_mut(), "A", 10.0);
        assert!(changed.is_empty());
        assert_eq!(prices.get(registry.lookup("BIG").unwrap()), Some(1e308));

        let changed = set(&registry, &mut prices, prop.as_mut(), "C", 10.0);
        assert!(changed.is_empty());
        assert_eq!(prices.get(registry.lookup("FRESH").unwrap()), None);
    }

    #[test]
    fn test_overflow_keeps_last_finite_price() {
        check_overflow_keeps_last_finite_price(StrategyKind::FullRecompute);
        check_overflow_keeps_last_finite_price(StrategyKind::Sensitivity);
    }

    #[test]
    fn test_full_recompute_waits_for_every_holding() {
        check_waits_for_every_holding(StrategyKind::FullRecompute);
    }

    #[test]
    fn test_sensitivity_waits_for_every_holding() {
        check_waits_for_every_holding(StrategyKind::Sensitivity);
    }

    #[test]
    fn test_pending_counts_down() {
        let (registry, mut prices, mut prop) = setup(StrategyKind::Sensitivity);
        let r = registry.get(registry.lookup("R").unwrap()).ordinal();
        assert_eq!(prop.pending_inputs(r), Some(2));

        set(&registry, &mut prices, prop.as_mut(), "A", 1.0);
        assert_eq!(prop.pending_inputs(r), Some(1));
        set(&registry, &mut prices, prop.as_mut(), "A", 2.0);
        assert_eq!(prop.pending_inputs(r), Some(1));
        set(&registry, &mut prices, prop.as_mut(), "B", 1.0);
        assert_eq!(prop.pending_inputs(r), Some(0));
    }

    #[test]
    fn test_full_recompute_tracks_nothing() {
        let (_, _, prop) = setup(StrategyKind::FullRecompute);
        assert_eq!(prop.kind(), StrategyKind::FullRecompute);
        assert_eq!(prop.pending_inputs(0), None);
        assert_eq!(prop.sensitivity(0, 0), None);
    }
}

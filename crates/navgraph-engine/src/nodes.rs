//! Graph nodes: stocks (leaves) and portfolios (containers).
//!
//! Nodes never hold a price or a pointer back to the graph. They carry the
//! slot of their price in the shared [`PriceStore`] and read it through the
//! store handed to them by the graph that owns them.

use navgraph_core::{ComponentKind, ComponentName, Slot, Valuation};

use crate::prices::PriceStore;

/// Weighted link to another node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// The other end of the link.
    pub slot: Slot,
    /// Units held.
    pub weight: f64,
}

/// Fields shared by every node.
#[derive(Debug, Clone)]
pub struct NodeHeader {
    pub(crate) name: ComponentName,
    pub(crate) slot: Slot,
    /// Portfolios holding this node.
    pub(crate) owners: Vec<Edge>,
    /// Position in a children-before-parents ordering of the whole graph.
    pub(crate) rank: usize,
}

impl NodeHeader {
    pub(crate) fn new(name: ComponentName, slot: Slot) -> Self {
        Self {
            name,
            slot,
            owners: Vec::new(),
            rank: 0,
        }
    }
}

/// Leaf priced from the feed.
#[derive(Debug, Clone)]
pub struct StockNode {
    pub(crate) header: NodeHeader,
    /// Column of this stock in the sensitivity matrix.
    pub(crate) ordinal: usize,
}

/// Container valued from its holdings.
#[derive(Debug, Clone)]
pub struct PortfolioNode {
    pub(crate) header: NodeHeader,
    /// Row of this portfolio in the sensitivity matrix.
    pub(crate) ordinal: usize,
    pub(crate) holdings: Vec<Edge>,
}

impl PortfolioNode {
    /// Direct holdings in link order.
    pub fn holdings(&self) -> &[Edge] {
        &self.holdings
    }

    /// Dot product of holding prices and weights, `None` while any holding
    /// is unpriced. An empty portfolio never has a value.
    pub fn evaluate(&self, prices: &PriceStore) -> Option<f64> {
        if self.holdings.is_empty() {
            return None;
        }
        prices.dot(self.holdings.iter().map(|h| (h.slot, h.weight)))
    }
}

/// A node of the valuation graph.
#[derive(Debug, Clone)]
pub enum Component {
    /// Leaf.
    Stock(StockNode),
    /// Container.
    Portfolio(PortfolioNode),
}

impl Component {
    fn header(&self) -> &NodeHeader {
        match self {
            Self::Stock(s) => &s.header,
            Self::Portfolio(p) => &p.header,
        }
    }

    pub(crate) fn header_mut(&mut self) -> &mut NodeHeader {
        match self {
            Self::Stock(s) => &mut s.header,
            Self::Portfolio(p) => &mut p.header,
        }
    }

    /// Component name.
    pub fn name(&self) -> &ComponentName {
        &self.header().name
    }

    /// Price-store slot.
    pub fn slot(&self) -> Slot {
        self.header().slot
    }

    /// Portfolios directly holding this node.
    pub fn owners(&self) -> &[Edge] {
        &self.header().owners
    }

    /// Topological rank (holdings rank below their owners).
    pub fn rank(&self) -> usize {
        self.header().rank
    }

    /// Stock or portfolio.
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Stock(_) => ComponentKind::Stock,
            Self::Portfolio(_) => ComponentKind::Portfolio,
        }
    }

    /// Row (portfolio) or column (stock) index in the sensitivity matrix.
    pub fn ordinal(&self) -> usize {
        match self {
            Self::Stock(s) => s.ordinal,
            Self::Portfolio(p) => p.ordinal,
        }
    }

    /// Portfolio view, if this is a portfolio.
    pub fn as_portfolio(&self) -> Option<&PortfolioNode> {
        match self {
            Self::Portfolio(p) => Some(p),
            Self::Stock(_) => None,
        }
    }

    /// Current valuation read from the shared store.
    pub fn valuation(&self, prices: &PriceStore) -> Valuation {
        Valuation::from_raw(prices.raw(self.slot()))
    }
}

//! Node registry: slot allocation, node creation and linking.
//!
//! Building is two-phase. Every node is created first (portfolios, then
//! stocks, each in declaration order), then every ownership edge is linked,
//! because an edge may name a parent created before or after its child.
//! Finally each node receives a topological rank so propagation can visit
//! holdings before their owners.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use navgraph_core::{ComponentKind, ComponentName, GraphError, GraphResult, Slot};

use crate::adjacency::Adjacency;
use crate::nodes::{Component, Edge, NodeHeader, PortfolioNode, StockNode};
use crate::prices::PriceStore;

/// Arena of every node, indexed by slot.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    nodes: Vec<Component>,
    index: HashMap<ComponentName, Slot>,
    stocks: Vec<Slot>,
    portfolios: Vec<Slot>,
}

impl NodeRegistry {
    /// Creates and links one node per component of `adjacency`, and a price
    /// store with one unknown slot per node.
    ///
    /// # Errors
    ///
    /// [`GraphError::DanglingReference`] if an edge names a parent that was
    /// never declared as a container.
    pub fn build(adjacency: &Adjacency) -> GraphResult<(Self, PriceStore)> {
        let mut registry = Self {
            nodes: Vec::with_capacity(adjacency.len()),
            index: HashMap::with_capacity(adjacency.len()),
            stocks: Vec::with_capacity(adjacency.leaf_count()),
            portfolios: Vec::with_capacity(adjacency.container_count()),
        };

        for (ordinal, (name, _)) in adjacency.containers().enumerate() {
            let slot = registry.allocate(name);
            registry.nodes.push(Component::Portfolio(PortfolioNode {
                header: NodeHeader::new(ComponentName::new(name), slot),
                ordinal,
                holdings: Vec::new(),
            }));
            registry.portfolios.push(slot);
        }
        for (ordinal, (name, _)) in adjacency.leaves().enumerate() {
            let slot = registry.allocate(name);
            registry.nodes.push(Component::Stock(StockNode {
                header: NodeHeader::new(ComponentName::new(name), slot),
                ordinal,
            }));
            registry.stocks.push(slot);
        }

        registry.link(adjacency)?;
        registry.assign_ranks()?;

        debug!(
            components = registry.len(),
            stocks = registry.stocks.len(),
            portfolios = registry.portfolios.len(),
            "Node registry built"
        );

        let prices = PriceStore::unknown(registry.len());
        Ok((registry, prices))
    }

    fn allocate(&mut self, name: &str) -> Slot {
        let slot = Slot::new(self.nodes.len());
        self.index.insert(ComponentName::new(name), slot);
        slot
    }

    /// Appends every edge to its parent's holdings and its child's owners.
    fn link(&mut self, adjacency: &Adjacency) -> GraphResult<()> {
        for (child, owners) in adjacency.leaves().chain(adjacency.containers()) {
            let child_slot = self.index[child];
            for ownership in owners {
                let parent_slot = match self.index.get(ownership.parent.as_str()) {
                    Some(&slot) if self.nodes[slot.index()].kind() == ComponentKind::Portfolio => {
                        slot
                    }
                    _ => return Err(GraphError::dangling(child, &ownership.parent)),
                };

                if let Component::Portfolio(parent) = &mut self.nodes[parent_slot.index()] {
                    parent.holdings.push(Edge {
                        slot: child_slot,
                        weight: ownership.weight,
                    });
                }
                self.nodes[child_slot.index()]
                    .header_mut()
                    .owners
                    .push(Edge {
                        slot: parent_slot,
                        weight: ownership.weight,
                    });
            }
        }
        Ok(())
    }

    fn assign_ranks(&mut self) -> GraphResult<()> {
        let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(self.nodes.len(), 0);
        for _ in &self.nodes {
            graph.add_node(());
        }
        for node in &self.nodes {
            for owner in node.owners() {
                graph.add_edge(
                    NodeIndex::new(node.slot().index()),
                    NodeIndex::new(owner.slot.index()),
                    (),
                );
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            GraphError::cycle(self.nodes[cycle.node_id().index()].name().as_str())
        })?;
        for (rank, idx) in order.into_iter().enumerate() {
            self.nodes[idx.index()].header_mut().rank = rank;
        }
        Ok(())
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Number of components.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node in `slot`.
    pub fn get(&self, slot: Slot) -> &Component {
        &self.nodes[slot.index()]
    }

    /// Portfolio in `slot`, if that slot holds a portfolio.
    pub fn portfolio(&self, slot: Slot) -> Option<&PortfolioNode> {
        self.get(slot).as_portfolio()
    }

    /// Slot of `name`, if declared.
    pub fn lookup(&self, name: &str) -> Option<Slot> {
        self.index.get(name).copied()
    }

    /// Slot of `name`, or [`GraphError::UnknownComponent`].
    pub fn resolve(&self, name: &str) -> GraphResult<Slot> {
        self.lookup(name).ok_or_else(|| GraphError::unknown(name))
    }

    /// Every node in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.nodes.iter()
    }

    /// Stock slots by ordinal.
    pub fn stocks(&self) -> &[Slot] {
        &self.stocks
    }

    /// Portfolio slots by ordinal.
    pub fn portfolios(&self) -> &[Slot] {
        &self.portfolios
    }

    /// Every portfolio reachable upward from `start`, each once, in
    /// breadth-first discovery order. `start` itself is excluded.
    pub fn ancestors(&self, start: Slot) -> Vec<Slot> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        let mut found = Vec::new();

        while let Some(slot) = queue.pop_front() {
            for owner in self.get(slot).owners() {
                if visited.insert(owner.slot) {
                    found.push(owner.slot);
                    queue.push_back(owner.slot);
                }
            }
        }
        found
    }

    /// Sorts `slots` so holdings come before their owners.
    pub fn sort_by_rank(&self, slots: &mut [Slot]) {
        slots.sort_unstable_by_key(|s| self.get(*s).rank());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::AdjacencyBuilder;

    fn diamond() -> Adjacency {
        let mut b = AdjacencyBuilder::new();
        for p in ["R", "P", "Q"] {
            b.declare_container(p).unwrap();
        }
        b.declare_ownership("A", 2.0, "P").unwrap();
        b.declare_ownership("A", 3.0, "Q").unwrap();
        b.declare_ownership("P", 1.0, "R").unwrap();
        b.declare_ownership("Q", 1.0, "R").unwrap();
        b.finalize().unwrap()
    }

    #[test]
    fn test_slots_are_dense_portfolios_first() {
        let (registry, prices) = NodeRegistry::build(&diamond()).unwrap();

        assert_eq!(registry.len(), 4);
        assert_eq!(prices.len(), 4);
        assert_eq!(registry.lookup("R"), Some(Slot(0)));
        assert_eq!(registry.lookup("A"), Some(Slot(3)));
        assert_eq!(registry.portfolios(), &[Slot(0), Slot(1), Slot(2)]);
        assert_eq!(registry.stocks(), &[Slot(3)]);
        for node in registry.iter() {
            assert_eq!(registry.lookup(node.name().as_str()), Some(node.slot()));
        }
    }

    #[test]
    fn test_links_holdings_and_owners() {
        let (registry, _) = NodeRegistry::build(&diamond()).unwrap();
        let p = registry.portfolio(registry.lookup("P").unwrap()).unwrap();
        assert_eq!(
            p.holdings(),
            &[Edge {
                slot: Slot(3),
                weight: 2.0
            }]
        );

        let a = registry.get(registry.lookup("A").unwrap());
        assert_eq!(a.kind(), ComponentKind::Stock);
        let owners: Vec<_> = a.owners().iter().map(|e| e.slot).collect();
        assert_eq!(owners, vec![Slot(1), Slot(2)]);
    }

    #[test]
    fn test_ranks_place_holdings_before_owners() {
        let (registry, _) = NodeRegistry::build(&diamond()).unwrap();
        for node in registry.iter() {
            for owner in node.owners() {
                assert!(node.rank() < registry.get(owner.slot).rank());
            }
        }
    }

    #[test]
    fn test_ancestors_are_deduplicated() {
        let (registry, _) = NodeRegistry::build(&diamond()).unwrap();
        let mut found = registry.ancestors(registry.lookup("A").unwrap());
        assert_eq!(found.len(), 3);

        registry.sort_by_rank(&mut found);
        assert_eq!(*found.last().unwrap(), registry.lookup("R").unwrap());
    }

    #[test]
    fn test_undeclared_parent_is_dangling() {
        let mut b = AdjacencyBuilder::new();
        b.declare_container("P").unwrap();
        b.declare_ownership("A", 1.0, "P").unwrap();
        b.declare_ownership("B", 1.0, "GHOST").unwrap();

        let err = NodeRegistry::build(&b.finalize().unwrap()).unwrap_err();
        assert_eq!(err, GraphError::dangling("B", "GHOST"));
    }

    #[test]
    fn test_parent_known_only_as_stock_is_dangling() {
        let mut b = AdjacencyBuilder::new();
        b.declare_container("P").unwrap();
        b.declare_ownership("A", 1.0, "P").unwrap();
        b.declare_ownership("B", 1.0, "A").unwrap();

        assert!(matches!(
            NodeRegistry::build(&b.finalize().unwrap()),
            Err(GraphError::DanglingReference { .. })
        ));
    }

    #[test]
    fn test_resolve_unknown_name() {
        let (registry, _) = NodeRegistry::build(&diamond()).unwrap();
        assert_eq!(registry.resolve("ZZZ"), Err(GraphError::unknown("ZZZ")));
    }
}

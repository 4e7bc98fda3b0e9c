//! Adjacency builder: raw ownership declarations to a frozen structure.
//!
//! Declarations arrive in any order. A name first seen as a weighted child is
//! provisionally a stock; [`AdjacencyBuilder::finalize`] moves it into the
//! container bucket if it was ever declared as a container, then freezes the
//! result into an [`Adjacency`] and rejects ownership cycles.
//!
//! ```rust
//! use navgraph_engine::adjacency::AdjacencyBuilder;
//! use navgraph_core::ComponentKind;
//!
//! let mut builder = AdjacencyBuilder::new();
//! builder.declare_ownership("TECH", 2.0, "INDUSTRIALS").unwrap();
//! builder.declare_container("INDUSTRIALS").unwrap();
//! builder.declare_container("TECH").unwrap();
//! builder.declare_ownership("AAPL", 100.0, "TECH").unwrap();
//!
//! let adjacency = builder.finalize().unwrap();
//! assert_eq!(adjacency.kind_of("TECH"), Some(ComponentKind::Portfolio));
//! assert_eq!(adjacency.kind_of("AAPL"), Some(ComponentKind::Stock));
//! ```

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use navgraph_core::{ComponentKind, Declaration, GraphError, GraphResult};

/// One (parent, weight) entry in a child's owner list.
#[derive(Debug, Clone, PartialEq)]
pub struct Ownership {
    /// Owning portfolio.
    pub parent: String,
    /// Units of the child held by `parent`.
    pub weight: f64,
}

/// Insertion-ordered map from component name to its owners.
#[derive(Debug, Clone, Default)]
struct Bucket {
    names: Vec<String>,
    owners: Vec<Vec<Ownership>>,
    index: HashMap<String, usize>,
}

impl Bucket {
    fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&[Ownership]> {
        self.index.get(name).map(|&i| self.owners[i].as_slice())
    }

    fn entry(&mut self, name: &str) -> &mut Vec<Ownership> {
        let i = match self.index.get(name) {
            Some(&i) => i,
            None => {
                let i = self.names.len();
                self.names.push(name.to_string());
                self.owners.push(Vec::new());
                self.index.insert(name.to_string(), i);
                i
            }
        };
        &mut self.owners[i]
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &[Ownership])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.owners.iter().map(Vec::as_slice))
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    /// Removes every entry whose name satisfies `pred`, keeping the order of
    /// the remaining entries.
    fn take_where(&mut self, pred: impl Fn(&str) -> bool) -> Vec<(String, Vec<Ownership>)> {
        let names = std::mem::take(&mut self.names);
        let owners = std::mem::take(&mut self.owners);
        self.index.clear();

        let mut taken = Vec::new();
        for (name, list) in names.into_iter().zip(owners) {
            if pred(&name) {
                taken.push((name, list));
            } else {
                self.index.insert(name.clone(), self.names.len());
                self.names.push(name);
                self.owners.push(list);
            }
        }
        taken
    }
}

/// Adds `weight` to an existing edge to `parent`, or appends a new edge.
fn accumulate(owners: &mut Vec<Ownership>, parent: &str, weight: f64) {
    match owners.iter_mut().find(|o| o.parent == parent) {
        Some(existing) => existing.weight += weight,
        None => owners.push(Ownership {
            parent: parent.to_string(),
            weight,
        }),
    }
}

fn check_name(name: &str) -> GraphResult<()> {
    if name.trim().is_empty() {
        return Err(GraphError::invalid_declaration(name, "name cannot be empty"));
    }
    Ok(())
}

// =============================================================================
// BUILDER
// =============================================================================

/// Accumulates declarations until the structure is frozen.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyBuilder {
    containers: Bucket,
    leaves: Bucket,
}

impl AdjacencyBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` as a container. Idempotent.
    pub fn declare_container(&mut self, name: &str) -> GraphResult<()> {
        check_name(name)?;
        if !self.containers.contains(name) {
            self.containers.entry(name);
        }
        Ok(())
    }

    /// Records that `parent` holds `weight` units of `child`.
    ///
    /// Repeat declarations of the same pair add their weights.
    pub fn declare_ownership(&mut self, child: &str, weight: f64, parent: &str) -> GraphResult<()> {
        check_name(child)?;
        if parent.trim().is_empty() {
            return Err(GraphError::invalid_declaration(child, "parent cannot be empty"));
        }
        if !weight.is_finite() {
            return Err(GraphError::invalid_declaration(
                child,
                format!("weight must be finite, got {weight}"),
            ));
        }

        accumulate(self.leaves.entry(child), parent, weight);
        Ok(())
    }

    /// Applies a single declaration record.
    pub fn declare(&mut self, record: Declaration) -> GraphResult<()> {
        match (record.weight, record.parent.as_deref()) {
            (None, None) => self.declare_container(&record.name),
            (Some(weight), Some(parent)) => self.declare_ownership(&record.name, weight, parent),
            (None, Some(parent)) => Err(GraphError::invalid_declaration(
                record.name,
                format!("held by '{parent}' without a weight"),
            )),
            (Some(weight), None) => Err(GraphError::invalid_declaration(
                record.name,
                format!("weight {weight} given without a parent"),
            )),
        }
    }

    /// Applies declarations in order, stopping at the first invalid one.
    ///
    /// Returns the number of records applied.
    pub fn extend<I>(&mut self, records: I) -> GraphResult<usize>
    where
        I: IntoIterator<Item = Declaration>,
    {
        let mut applied = 0;
        for record in records {
            self.declare(record)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Number of distinct names seen so far.
    pub fn len(&self) -> usize {
        self.containers.len()
            + self
                .leaves
                .iter()
                .filter(|(name, _)| !self.containers.contains(name))
                .count()
    }

    /// Returns true if nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.containers.len() == 0 && self.leaves.len() == 0
    }

    /// Reclassifies provisional leaves that are containers and freezes the
    /// structure.
    ///
    /// # Errors
    ///
    /// [`GraphError::CycleDetected`] if any portfolio (transitively) holds
    /// itself.
    pub fn finalize(mut self) -> GraphResult<Adjacency> {
        let containers = &self.containers;
        let moved = self.leaves.take_where(|name| containers.contains(name));

        let reclassified = moved.len();
        for (name, owners) in moved {
            let entry = self.containers.entry(&name);
            for o in owners {
                accumulate(entry, &o.parent, o.weight);
            }
        }

        let adjacency = Adjacency {
            containers: self.containers,
            leaves: self.leaves,
        };
        adjacency.check_acyclic()?;

        debug!(
            portfolios = adjacency.container_count(),
            stocks = adjacency.leaf_count(),
            reclassified,
            "Structure finalized"
        );

        Ok(adjacency)
    }
}

// =============================================================================
// FROZEN ADJACENCY
// =============================================================================

/// Frozen, reclassified ownership structure.
#[derive(Debug, Clone)]
pub struct Adjacency {
    containers: Bucket,
    leaves: Bucket,
}

impl Adjacency {
    /// Portfolios and their owners, in declaration order.
    pub fn containers(&self) -> impl Iterator<Item = (&str, &[Ownership])> {
        self.containers.iter()
    }

    /// Stocks and their owners, in first-seen order.
    pub fn leaves(&self) -> impl Iterator<Item = (&str, &[Ownership])> {
        self.leaves.iter()
    }

    /// Owners of `name`, whichever kind it is.
    pub fn parents_of(&self, name: &str) -> Option<&[Ownership]> {
        self.containers.get(name).or_else(|| self.leaves.get(name))
    }

    /// Classification of `name`.
    pub fn kind_of(&self, name: &str) -> Option<ComponentKind> {
        if self.containers.contains(name) {
            Some(ComponentKind::Portfolio)
        } else if self.leaves.contains(name) {
            Some(ComponentKind::Stock)
        } else {
            None
        }
    }

    /// Number of portfolios.
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Number of stocks.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Total number of components.
    pub fn len(&self) -> usize {
        self.container_count() + self.leaf_count()
    }

    /// Returns true if the structure has no components.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Only portfolio-to-portfolio edges can close a cycle: stocks are never
    /// owners.
    fn check_acyclic(&self) -> GraphResult<()> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for (child, owners) in self.containers.iter() {
            graph.add_node(child);
            for o in owners {
                if self.containers.contains(&o.parent) {
                    graph.add_edge(child, o.parent.as_str(), ());
                }
            }
        }

        toposort(&graph, None)
            .map(|_| ())
            .map_err(|cycle| GraphError::cycle(cycle.node_id()))
    }
}

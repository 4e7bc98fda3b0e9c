//! Sensitivity precomputation.
//!
//! The sensitivity of portfolio `P` to stock `S` is the sum, over every
//! ownership path from `S` up to `P`, of the product of edge weights along
//! the path. A price move of `delta` on `S` moves `P` by exactly
//! `delta * sensitivity(P, S)`.
//!
//! Each stock gets one column: an upward breadth-first walk collects the
//! reachable portfolios, which are then visited in topological rank order
//! pushing `weight * sensitivity(child)` into every owner. Each edge out of
//! the reachable set is touched once, so a portfolio reached over several
//! paths accumulates each path exactly once.

use std::collections::HashMap;

use nalgebra::DMatrix;
use tracing::debug;

use navgraph_core::Slot;

use crate::registry::NodeRegistry;

/// A portfolio reachable from a stock, with its summed path weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affected {
    /// Portfolio slot.
    pub slot: Slot,
    /// Summed path weight (may be zero when paths cancel).
    pub sensitivity: f64,
}

/// Dense `[portfolio, stock]` sensitivity table plus per-stock affected
/// lists.
#[derive(Debug, Clone)]
pub struct SensitivityMatrix {
    matrix: DMatrix<f64>,
    /// Indexed by stock ordinal, each list in topological rank order.
    affected: Vec<Vec<Affected>>,
    /// Indexed by portfolio ordinal: number of stocks reaching it.
    reach: Vec<usize>,
}

impl SensitivityMatrix {
    /// Computes every stock column.
    ///
    /// With the `parallel` feature, columns are computed on the rayon pool
    /// once the stock count exceeds `parallel_threshold`.
    pub fn build(registry: &NodeRegistry, parallel_threshold: usize) -> Self {
        let portfolios = registry.portfolios().len();
        let stocks = registry.stocks().len();

        let affected = columns(registry, parallel_threshold);

        let mut matrix = DMatrix::zeros(portfolios, stocks);
        let mut reach = vec![0usize; portfolios];
        for (stock, column) in affected.iter().enumerate() {
            for entry in column {
                let row = registry.get(entry.slot).ordinal();
                matrix[(row, stock)] = entry.sensitivity;
                reach[row] += 1;
            }
        }

        debug!(
            portfolios,
            stocks,
            entries = affected.iter().map(Vec::len).sum::<usize>(),
            "Sensitivity matrix built"
        );

        Self {
            matrix,
            affected,
            reach,
        }
    }

    /// Sensitivity of the portfolio with ordinal `portfolio` to the stock with
    /// ordinal `stock`.
    pub fn get(&self, portfolio: usize, stock: usize) -> f64 {
        self.matrix[(portfolio, stock)]
    }

    /// Every portfolio reachable from the stock with ordinal `stock`, in
    /// topological rank order.
    pub fn affected(&self, stock: usize) -> &[Affected] {
        &self.affected[stock]
    }

    /// Number of distinct stocks reachable below each portfolio, by ordinal.
    pub fn reach_counts(&self) -> &[usize] {
        &self.reach
    }

    /// The dense table.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

#[allow(unused_variables)]
fn columns(registry: &NodeRegistry, parallel_threshold: usize) -> Vec<Vec<Affected>> {
    let stocks = registry.stocks();

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if stocks.len() > parallel_threshold {
            return stocks.par_iter().map(|&s| column(registry, s)).collect();
        }
    }

    stocks.iter().map(|&s| column(registry, s)).collect()
}

/// Affected list of one stock.
fn column(registry: &NodeRegistry, stock: Slot) -> Vec<Affected> {
    let mut reachable = registry.ancestors(stock);
    registry.sort_by_rank(&mut reachable);

    let mut weight: HashMap<Slot, f64> = HashMap::with_capacity(reachable.len() + 1);
    weight.insert(stock, 1.0);
    for owner in registry.get(stock).owners() {
        *weight.entry(owner.slot).or_insert(0.0) += owner.weight;
    }

    let mut out = Vec::with_capacity(reachable.len());
    for slot in reachable {
        let sensitivity = weight.get(&slot).copied().unwrap_or(0.0);
        for owner in registry.get(slot).owners() {
            *weight.entry(owner.slot).or_insert(0.0) += owner.weight * sensitivity;
        }
        out.push(Affected { slot, sensitivity });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::AdjacencyBuilder;
    use approx::assert_relative_eq;

    fn registry(edges: &[(&str, f64, &str)], containers: &[&str]) -> NodeRegistry {
        let mut b = AdjacencyBuilder::new();
        for c in containers {
            b.declare_container(c).unwrap();
        }
        for (child, w, parent) in edges {
            b.declare_ownership(child, *w, parent).unwrap();
        }
        NodeRegistry::build(&b.finalize().unwrap()).unwrap().0
    }

    fn sens(m: &SensitivityMatrix, r: &NodeRegistry, p: &str, s: &str) -> f64 {
        let p = r.get(r.lookup(p).unwrap()).ordinal();
        let s = r.get(r.lookup(s).unwrap()).ordinal();
        m.get(p, s)
    }

    #[test]
    fn test_diamond_sums_both_paths() {
        let r = registry(
            &[("A", 2.0, "P"), ("A", 3.0, "Q"), ("P", 1.0, "R"), ("Q", 1.0, "R")],
            &["R", "P", "Q"],
        );
        let m = SensitivityMatrix::build(&r, usize::MAX);

        assert_relative_eq!(sens(&m, &r, "P", "A"), 2.0);
        assert_relative_eq!(sens(&m, &r, "Q", "A"), 3.0);
        assert_relative_eq!(sens(&m, &r, "R", "A"), 5.0);
        assert_eq!(m.reach_counts(), &[1, 1, 1]);
    }

    #[test]
    fn test_deep_chain_multiplies_weights() {
        let r = registry(
            &[("X", 4.0, "C"), ("C", 0.5, "B"), ("B", 3.0, "A")],
            &["A", "B", "C"],
        );
        let m = SensitivityMatrix::build(&r, usize::MAX);
        assert_relative_eq!(sens(&m, &r, "A", "X"), 6.0);
        assert_relative_eq!(sens(&m, &r, "B", "X"), 2.0);
    }

    #[test]
    fn test_affected_list_is_rank_ordered() {
        let r = registry(
            &[("A", 2.0, "P"), ("A", 3.0, "Q"), ("P", 1.0, "R"), ("Q", 1.0, "R")],
            &["R", "P", "Q"],
        );
        let m = SensitivityMatrix::build(&r, usize::MAX);
        let list = m.affected(0);

        assert_eq!(list.len(), 3);
        assert_eq!(list.last().unwrap().slot, r.lookup("R").unwrap());
        assert!(list
            .windows(2)
            .all(|w| r.get(w[0].slot).rank() < r.get(w[1].slot).rank()));
    }

    #[test]
    fn test_cancelling_paths_stay_reachable() {
        let r = registry(
            &[("A", 1.0, "P"), ("A", -1.0, "Q"), ("P", 1.0, "R"), ("Q", 1.0, "R")],
            &["R", "P", "Q"],
        );
        let m = SensitivityMatrix::build(&r, usize::MAX);

        assert_relative_eq!(sens(&m, &r, "R", "A"), 0.0);
        let ordinal = r.get(r.lookup("R").unwrap()).ordinal();
        assert_eq!(m.reach_counts()[ordinal], 1);
    }

    #[test]
    fn test_unrelated_entries_are_zero() {
        let r = registry(&[("A", 1.0, "P"), ("B", 1.0, "Q")], &["P", "Q"]);
        let m = SensitivityMatrix::build(&r, usize::MAX);

        assert_eq!(sens(&m, &r, "Q", "A"), 0.0);
        assert_eq!(m.affected(0).len(), 1);
        assert_eq!(m.matrix().shape(), (2, 2));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_threshold_does_not_change_result() {
        let edges = [("A", 2.0, "P"), ("B", 3.0, "P"), ("P", 1.5, "R")];
        let r = registry(&edges, &["R", "P"]);
        let sequential = SensitivityMatrix::build(&r, usize::MAX);
        let eager = SensitivityMatrix::build(&r, 0);
        assert_eq!(sequential.matrix(), eager.matrix());
    }
}

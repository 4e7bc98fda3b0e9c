//! Property tests for propagation invariants.
//!
//! Structures are random acyclic books: portfolio `Pi` may only hold
//! portfolios `Pj` with `j > i`, plus any stock. Weights and prices are small
//! integers so both strategies compute exactly and can be compared with `==`.

use std::collections::{HashMap, HashSet};

use navgraph_config::EngineSettings;
use navgraph_core::{ComponentKind, Declaration, StrategyKind};
use navgraph_engine::ValuationGraph;
use proptest::prelude::*;

const PORTFOLIOS: usize = 5;
const STOCKS: usize = 5;

// =============================================================================
// GENERATORS
// =============================================================================

/// (child, weight, parent) with child in `0..PORTFOLIOS + STOCKS`.
fn arb_edges() -> impl Strategy<Value = Vec<(usize, i32, usize)>> {
    prop::collection::vec(
        (0..PORTFOLIOS + STOCKS, -5i32..=5, 0..PORTFOLIOS),
        0..24,
    )
}

fn arb_updates() -> impl Strategy<Value = Vec<(usize, i32)>> {
    prop::collection::vec((0..STOCKS, 1i32..100), 1..30)
}

fn declarations(edges: &[(usize, i32, usize)]) -> Vec<Declaration> {
    let mut out: Vec<_> = (0..PORTFOLIOS)
        .map(|p| Declaration::container(format!("P{p}")))
        .collect();

    for &(child, weight, parent) in edges {
        let name = if child < PORTFOLIOS {
            if child <= parent {
                continue;
            }
            format!("P{child}")
        } else {
            format!("S{}", child - PORTFOLIOS)
        };
        out.push(Declaration::holding(name, f64::from(weight), format!("P{parent}")));
    }
    out
}

fn build(edges: &[(usize, i32, usize)], strategy: StrategyKind) -> ValuationGraph {
    ValuationGraph::from_declarations(
        declarations(edges),
        &EngineSettings::default().with_strategy(strategy),
    )
    .expect("generated structures are acyclic and fully declared")
}

fn priced_names(g: &ValuationGraph) -> HashSet<String> {
    g.snapshot()
        .into_iter()
        .filter(|s| s.valuation.is_priced())
        .map(|s| s.name.to_string())
        .collect()
}

/// Every portfolio is either unpriced, or priced at the weighted sum of its
/// (all priced) holdings.
fn check_dot_products(g: &ValuationGraph) -> Result<(), TestCaseError> {
    let names: Vec<_> = g.components().map(|c| c.name().to_string()).collect();
    let prices: HashMap<_, _> = names
        .iter()
        .map(|n| (n.as_str(), g.price(n).unwrap()))
        .collect();

    for node in g.components() {
        let Some(portfolio) = node.as_portfolio() else {
            continue;
        };
        let holdings: Vec<_> = portfolio
            .holdings()
            .iter()
            .map(|h| (prices[names[h.slot.index()].as_str()], h.weight))
            .collect();
        let complete = !holdings.is_empty() && holdings.iter().all(|(p, _)| p.is_some());

        match prices[node.name().as_str()] {
            Some(value) => {
                prop_assert!(complete, "{} priced with missing holdings", node.name());
                let expected: f64 = holdings.iter().map(|(p, w)| p.unwrap_or(0.0) * w).sum();
                prop_assert_eq!(value, expected);
            }
            None => prop_assert!(!complete, "{} ready but unpriced", node.name()),
        }
    }
    Ok(())
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn strategies_agree_on_every_state(edges in arb_edges(), updates in arb_updates()) {
        let mut full = build(&edges, StrategyKind::FullRecompute);
        let mut delta = build(&edges, StrategyKind::Sensitivity);

        for (stock, price) in updates {
            let name = format!("S{stock}");
            let a = full.apply(&name, f64::from(price));
            let b = delta.apply(&name, f64::from(price));
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(full.snapshot(), delta.snapshot());
        }
    }

    #[test]
    fn priced_portfolios_match_their_holdings(edges in arb_edges(), updates in arb_updates()) {
        for strategy in [StrategyKind::FullRecompute, StrategyKind::Sensitivity] {
            let mut g = build(&edges, strategy);
            for &(stock, price) in &updates {
                let _ = g.apply(&format!("S{stock}"), f64::from(price));
                check_dot_products(&g)?;
            }
        }
    }

    #[test]
    fn priced_never_returns_to_unpriced(edges in arb_edges(), updates in arb_updates()) {
        for strategy in [StrategyKind::FullRecompute, StrategyKind::Sensitivity] {
            let mut g = build(&edges, strategy);
            let mut priced = priced_names(&g);

            for &(stock, price) in &updates {
                let _ = g.apply(&format!("S{stock}"), f64::from(price));
                let now = priced_names(&g);
                prop_assert!(now.is_superset(&priced), "{strategy:?} lost a price");
                priced = now;
            }
        }
    }

    #[test]
    fn replaying_the_last_price_is_silent(edges in arb_edges(), stock in 0..STOCKS, price in 1i32..100) {
        let mut g = build(&edges, StrategyKind::Sensitivity);
        let name = format!("S{stock}");
        if g.apply(&name, f64::from(price)).is_ok() {
            let before = g.snapshot();
            prop_assert!(g.apply(&name, f64::from(price)).unwrap().is_empty());
            prop_assert_eq!(before, g.snapshot());
        }
    }

    #[test]
    fn revaluation_moves_by_sensitivity(edges in arb_edges(), first in 1i32..100, second in 1i32..100) {
        let mut g = build(&edges, StrategyKind::Sensitivity);
        for s in 0..STOCKS {
            let _ = g.apply(&format!("S{s}"), f64::from(first));
        }
        let before = g.snapshot();

        if g.apply("S0", f64::from(second)).is_ok() {
            for (old, new) in before.iter().zip(g.snapshot()) {
                if new.kind != ComponentKind::Portfolio {
                    continue;
                }
                if let (Some(a), Some(b)) = (old.valuation.price(), new.valuation.price()) {
                    let sens = g.sensitivity(new.name.as_str(), "S0").unwrap().unwrap();
                    prop_assert_eq!(b - a, f64::from(second - first) * sens);
                }
            }
        }
    }
}

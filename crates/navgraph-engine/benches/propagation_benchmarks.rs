//! Benchmarks for graph construction and price propagation.
//!
//! Run with: cargo bench -p navgraph-engine

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use navgraph_config::EngineSettings;
use navgraph_core::{Declaration, StrategyKind};
use navgraph_engine::ValuationGraph;

const STRATEGIES: [StrategyKind; 2] = [StrategyKind::FullRecompute, StrategyKind::Sensitivity];

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

/// Three-level book: `stocks` names spread over funds of 20, funds grouped
/// into sectors of 5, sectors held by one top-level book. Every stock is
/// also held by a second fund so paths overlap.
fn create_book(stocks: usize) -> Vec<Declaration> {
    let funds = stocks.div_ceil(20).max(1);
    let sectors = funds.div_ceil(5).max(1);
    let mut out = vec![Declaration::container("BOOK")];

    for s in 0..sectors {
        out.push(Declaration::container(format!("SECTOR_{s:04}")));
        out.push(Declaration::holding(format!("SECTOR_{s:04}"), 1.0, "BOOK"));
    }
    for f in 0..funds {
        out.push(Declaration::container(format!("FUND_{f:05}")));
        out.push(Declaration::holding(
            format!("FUND_{f:05}"),
            1.0 + (f % 3) as f64,
            format!("SECTOR_{:04}", f / 5),
        ));
    }
    for i in 0..stocks {
        let name = format!("STK_{i:06}");
        out.push(Declaration::holding(&name, 100.0, format!("FUND_{:05}", i / 20)));
        out.push(Declaration::holding(
            &name,
            50.0,
            format!("FUND_{:05}", (i / 20 + 1) % funds),
        ));
    }
    out
}

fn create_priced_graph(stocks: usize, strategy: StrategyKind) -> ValuationGraph {
    let mut graph = ValuationGraph::from_declarations(
        create_book(stocks),
        &EngineSettings::default().with_strategy(strategy),
    )
    .unwrap();
    for i in 0..stocks {
        graph.apply(&format!("STK_{i:06}"), 100.0).unwrap();
    }
    graph
}

// =============================================================================
// CONSTRUCTION BENCHMARKS
// =============================================================================

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(20);

    for strategy in STRATEGIES {
        for size in [100, 1_000, 5_000] {
            let book = create_book(size);
            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(
                BenchmarkId::new(strategy.as_str(), size),
                &book,
                |b, book| {
                    b.iter(|| {
                        ValuationGraph::from_declarations(
                            black_box(book.clone()),
                            &EngineSettings::default().with_strategy(strategy),
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

// =============================================================================
// PROPAGATION BENCHMARKS
// =============================================================================

fn bench_single_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_update");

    for strategy in STRATEGIES {
        for size in [100, 1_000, 5_000] {
            let mut graph = create_priced_graph(size, strategy);
            let mut tick = 0u64;

            group.bench_function(BenchmarkId::new(strategy.as_str(), size), |b| {
                b.iter(|| {
                    tick += 1;
                    let price = 100.0 + (tick % 7) as f64;
                    graph.apply(black_box("STK_000000"), black_box(price))
                })
            });
        }
    }
    group.finish();
}

fn bench_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_1000_updates");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1_000));

    let names: Vec<String> = (0..1_000).map(|i| format!("STK_{:06}", (i * 7) % 1_000)).collect();

    for strategy in STRATEGIES {
        let mut graph = create_priced_graph(1_000, strategy);
        let mut round = 0u64;

        group.bench_function(strategy.as_str(), |b| {
            b.iter(|| {
                round += 1;
                for (i, name) in names.iter().enumerate() {
                    let price = 90.0 + ((i as u64 + round) % 20) as f64;
                    let _ = graph.apply(black_box(name), price);
                }
            })
        });
    }
    group.finish();
}

// =============================================================================
// CRITERION GROUPS
// =============================================================================

criterion_group!(construction, bench_build,);

criterion_group!(propagation, bench_single_update, bench_stream,);

criterion_main!(construction, propagation);

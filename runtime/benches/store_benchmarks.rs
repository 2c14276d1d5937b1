//! Store benchmarks
//!
//! - Reducer execution in isolation
//! - Dispatch throughput with and without listeners
//! - Memoized selector reads versus recomputation
//! - Effect round trips
//!
//! Run with: `cargo bench -p shoptrack-runtime`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup
#![allow(dead_code)] // Fixture fields exist for their copy cost

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use shoptrack_core::selector::{Select, Selector};
use shoptrack_core::{Effect, Reducer, SmallVec, smallvec};
use shoptrack_runtime::Store;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
struct Ledger {
    prices: Arc<Vec<u64>>,
    // Untouched slice, copied by pointer on every dispatch
    notes: Arc<Vec<String>>,
}

#[derive(Clone, Debug)]
enum LedgerAction {
    Record(u64),
    Noop,
    RecordLater(u64),
}

struct LedgerReducer;

impl Reducer for LedgerReducer {
    type State = Ledger;
    type Action = LedgerAction;
    type Environment = ();

    fn reduce(&self, state: &mut Ledger, action: LedgerAction, _env: &()) -> SmallVec<[Effect<LedgerAction>; 4]> {
        match action {
            LedgerAction::Record(price) => {
                Arc::make_mut(&mut state.prices).push(price);
                SmallVec::new()
            },
            LedgerAction::Noop => SmallVec::new(),
            LedgerAction::RecordLater(price) => {
                smallvec![Effect::future(async move { Some(LedgerAction::Record(price)) })]
            },
        }
    }
}

fn seeded() -> Ledger {
    Ledger {
        prices: Arc::new((0..1_000).collect()),
        notes: Arc::new(vec!["note".to_string(); 100]),
    }
}

fn total_selector() -> Selector<Ledger, Arc<Vec<u64>>, u64> {
    Selector::new(
        "total",
        |s: &Ledger| Arc::clone(&s.prices),
        |prices: &Arc<Vec<u64>>| prices.iter().sum(),
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}

/// Reducer execution without the store
fn benchmark_reducer(c: &mut Criterion) {
    let mut group = c.benchmark_group("reducer");
    group.throughput(Throughput::Elements(1));

    group.bench_function("noop", |b| {
        let mut state = seeded();
        b.iter(|| LedgerReducer.reduce(&mut state, black_box(LedgerAction::Noop), &()));
    });

    group.bench_function("record_unshared", |b| {
        let mut state = Ledger::default();
        b.iter(|| LedgerReducer.reduce(&mut state, black_box(LedgerAction::Record(1)), &()));
    });

    group.finish();
}

/// Dispatch throughput (one snapshot published per action)
fn benchmark_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));
    let runtime = runtime();

    group.bench_function("noop", |b| {
        let store = Store::new(seeded(), LedgerReducer, ());
        b.to_async(&runtime).iter(|| async {
            let _ = store.dispatch(black_box(LedgerAction::Noop)).await;
        });
    });

    group.bench_function("noop_with_listeners", |b| {
        let store = Store::new(seeded(), LedgerReducer, ());
        let _listeners: Vec<_> = (0..10)
            .map(|_| {
                store.subscribe(|s| {
                    black_box(s.prices.len());
                })
            })
            .collect();
        b.to_async(&runtime).iter(|| async {
            let _ = store.dispatch(black_box(LedgerAction::Noop)).await;
        });
    });

    group.bench_function("effect_round_trip", |b| {
        let store = Store::new(Ledger::default(), LedgerReducer, ());
        b.to_async(&runtime).iter(|| async {
            if let Ok(mut handle) = store.dispatch(black_box(LedgerAction::RecordLater(1))).await {
                handle.wait().await;
            }
        });
    });

    group.finish();
}

/// Memoized read versus a cache miss
fn benchmark_selectors(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector");
    group.throughput(Throughput::Elements(1));
    let state = seeded();

    group.bench_function("memoized", |b| {
        let total = total_selector();
        let _ = total.select(&state);
        b.iter(|| total.select(black_box(&state)));
    });

    group.bench_function("recompute", |b| {
        let total = total_selector();
        b.iter(|| {
            total.reset();
            total.select(black_box(&state))
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_reducer, benchmark_dispatch, benchmark_selectors);
criterion_main!(benches);

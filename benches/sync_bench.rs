//! Benchmarks for depot-core range-hash and reconciliation operations
//!
//! Run with: cargo bench
//!
//! These benchmarks establish performance baselines for:
//! - Range digest computation over varying key counts
//! - Full-store reconciliation between converged and diverged stores

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use depot_core::{reconcile, Edge, Store};
use tempfile::TempDir;

fn seeded_store(keys: impl Iterator<Item = String>) -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path().join("depot.redb")).unwrap();
    store.create_bucket("mail").unwrap();
    for key in keys {
        store.put("mail", key.as_bytes(), b"").unwrap();
    }
    (dir, store)
}

fn bench_range_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_digest");

    for size in [10, 100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("keys", size), size, |b, &size| {
            let (_dir, store) = seeded_store((0..size).map(|i| format!("key{:08}", i)));

            b.iter(|| black_box(store.range_digest("mail", &Edge::First, &Edge::Last).unwrap()))
        });
    }

    group.finish();
}

fn bench_reconcile_converged(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_converged");

    for size in [10, 100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::new("keys", size), size, |b, &size| {
            let (_d1, a) = seeded_store((0..size).map(|i| format!("key{:08}", i)));
            let (_d2, bstore) = seeded_store((0..size).map(|i| format!("key{:08}", i)));

            b.iter(|| {
                black_box(reconcile("mail", &Edge::First, &Edge::Last, &a, &bstore).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_reconcile_single_divergence(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_single_divergence");

    for size in [10, 100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::new("keys", size), size, |b, &size| {
            let (_d1, a) = seeded_store((0..size).map(|i| format!("key{:08}", i)));
            let (_d2, bstore) = seeded_store((0..size).filter(|i| *i != size / 2).map(|i| format!("key{:08}", i)));

            b.iter(|| {
                black_box(reconcile("mail", &Edge::First, &Edge::Last, &a, &bstore).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(
    digest_benches,
    bench_range_digest,
    bench_reconcile_converged,
    bench_reconcile_single_divergence,
);

criterion_main!(digest_benches);

//! Benchmarks for HNSW index and VectorDB operations.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hnswdb::{Config, HnswConfig, HnswIndex, VectorDB};
use serde_json::json;
use tempfile::tempdir;

const DIM: usize = 64;

fn make_vector(seed: usize) -> Vec<f32> {
    (0..DIM)
        .map(|i| ((seed * 31 + i * 7) as f32 * 0.013).sin())
        .collect()
}

fn seeded() -> HnswConfig {
    HnswConfig {
        seed: Some(1),
        ..HnswConfig::default()
    }
}

/// Benchmark building an index from scratch.
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_build");
    group.sample_size(10);

    for n in [1_000usize, 5_000] {
        let vectors: Vec<Vec<f32>> = (0..n).map(make_vector).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &vectors, |b, vectors| {
            b.iter(|| HnswIndex::from_vectors(DIM, &seeded(), vectors).unwrap());
        });
    }

    group.finish();
}

/// Benchmark k-NN queries against a prebuilt index.
fn bench_search(c: &mut Criterion) {
    let vectors: Vec<Vec<f32>> = (0..5_000).map(make_vector).collect();
    let index = HnswIndex::from_vectors(DIM, &seeded(), &vectors).unwrap();
    let query = make_vector(123_456);

    let mut group = c.benchmark_group("hnsw_search");
    for k in [1usize, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| index.search(black_box(&query), k).unwrap());
        });
    }
    group.finish();
}

/// Benchmark a full store rebuild.
fn bench_rebuild(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let config = Config {
        auto_rebuild: false,
        hnsw: seeded(),
        ..Config::default()
    };
    let db = VectorDB::create(dir.path().join("bench.db"), DIM, config).unwrap();
    for i in 0..2_000 {
        db.add_vector(&make_vector(i), json!({ "i": i })).unwrap();
    }

    let mut group = c.benchmark_group("store");
    group.sample_size(10);
    group.bench_function("rebuild_2000", |b| {
        b.iter(|| db.rebuild_index().unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_search, bench_rebuild);
criterion_main!(benches);

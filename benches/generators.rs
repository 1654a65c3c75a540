//! Benchmarks for feature generators on synthetic PPI-like graphs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ppi_features::prelude::*;
use std::sync::Arc;

/// Deterministic random graph with `n` nodes and about `4n` weighted edges.
fn random_graph(n: usize, seed: u64) -> Graph {
    let mut b = Graph::builder(n, false);
    let mut state = seed;
    let mut next = || {
        // Simple LCG for deterministic "random" values
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        state >> 33
    };
    for _ in 0..4 * n {
        let u = next() as usize % n;
        let v = next() as usize % n;
        let w = 150.0 + (next() % 850) as f64;
        b.add_edge(u, v, w).expect("ids are in range");
    }
    b.build()
}

fn bench_generators(c: &mut Criterion) {
    let mut group = c.benchmark_group("generators");

    for &n in &[100, 500, 2000] {
        let graph = random_graph(n, 42);
        group.throughput(Throughput::Elements(n as u64));

        let generators: Vec<Box<dyn FeatureGenerator>> = vec![
            ExpectedDegree::new(false).boxed(),
            PageRank::new().boxed(),
            BetweennessCentrality::new().boxed(),
            ClosenessCentrality::new().boxed(),
            ClusteringCoefficient::new().boxed(),
            Hits::new().boxed(),
            NeighbouringConductance::new(2).expect("valid range").boxed(),
        ];
        for generator in &generators {
            group.bench_with_input(BenchmarkId::new(generator.name(), n), &graph, |b, g| {
                b.iter(|| generator.apply(black_box(g)));
            });
        }
    }

    group.finish();
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");
    let graph = random_graph(2000, 7);
    let dir = tempfile::TempDir::new().expect("tempdir");
    let cache: Arc<dyn FeatureCache> = Arc::new(DiskCache::new(dir.path()));

    let warm = Hits::new().cached(Arc::clone(&cache), CachePolicy::new("bench").with_dump(true));
    warm.apply(&graph).expect("non-empty graph");
    let reuse = Hits::new().cached(cache, CachePolicy::reuse("bench"));

    group.bench_function("disk_hit_hits", |b| {
        b.iter(|| reuse.apply(black_box(&graph)));
    });
    group.bench_function("compute_hits", |b| {
        b.iter(|| Hits::new().apply(black_box(&graph)));
    });

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let graph = random_graph(1000, 3);
    let make = || {
        vec![
            Degree::new(false).boxed(),
            ExpectedDegree::new(false).log10().boxed(),
            PageRank::new().boxed(),
            ClosenessCentrality::new().boxed(),
            Hits::new().select(1).expect("valid column").boxed(),
        ]
    };
    let serial = Pipeline::new(make());
    let parallel = Pipeline::new(make()).with_parallel(true);

    let mut group = c.benchmark_group("pipeline");
    group.bench_function("serial", |b| b.iter(|| serial.apply(black_box(&graph), false)));
    group.bench_function("parallel", |b| b.iter(|| parallel.apply(black_box(&graph), false)));
    group.finish();
}

criterion_group!(benches, bench_generators, bench_cache, bench_pipeline);
criterion_main!(benches);

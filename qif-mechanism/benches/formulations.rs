use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qif_core::{GridEuclidean, Prior};
use qif_mechanism::{bucketed_optimal, pairwise_optimal, strict_optimal, MinilpSolver};

const EPSILON: f64 = 0.5;

fn synthesis_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesis");
    group.sample_size(10);
    for width in [3usize, 4, 5] {
        let cells = width * width;
        let grid = GridEuclidean::new(width, 1.0f64);
        let prior = Prior::<f64>::uniform(cells).unwrap();

        group.bench_with_input(BenchmarkId::new("pairwise", cells), &cells, |b, &n| {
            b.iter(|| pairwise_optimal(&prior, n, &grid, &grid, black_box(EPSILON), &MinilpSolver))
        });
        group.bench_with_input(BenchmarkId::new("bucketed", cells), &cells, |b, &n| {
            b.iter(|| bucketed_optimal(&prior, n, &grid, &grid, black_box(EPSILON), &MinilpSolver))
        });
        group.bench_with_input(BenchmarkId::new("strict", cells), &cells, |b, &n| {
            b.iter(|| strict_optimal(&prior, n, &grid, &grid, black_box(EPSILON), &MinilpSolver))
        });
    }
    group.finish();
}

criterion_group!(benches, synthesis_benchmark);
criterion_main!(benches);

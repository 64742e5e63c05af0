use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use frontier_core::{map_batch, Coordinate, SectorCache, UniverseMapper, WorldParameters};

fn bench_params() -> Arc<WorldParameters> {
    let mut params = WorldParameters::builtin().as_ref().clone();
    params.world_radius = 512;
    Arc::new(params)
}

fn bench_try_map(c: &mut Criterion) {
    let mut mapper = UniverseMapper::new(bench_params()).expect("valid parameters");
    let mut x = 0;
    c.bench_function("mapper/try_map", |b| {
        b.iter(|| {
            x += 1;
            mapper.try_map(Coordinate::new(x % 400, x / 400))
        })
    });
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("mapper/batch");
    for side in [8i32, 16, 32] {
        let positions: Vec<_> = (0..side)
            .flat_map(|y| (0..side).map(move |x| Coordinate::new(x, y)))
            .collect();
        group.bench_with_input(BenchmarkId::new("side", side), &positions, |b, positions| {
            b.iter(|| map_batch(bench_params(), positions).expect("valid parameters"))
        });
    }
    group.finish();
}

fn bench_explore(c: &mut Criterion) {
    c.bench_function("cache/explore_block", |b| {
        b.iter_batched(
            || SectorCache::new(bench_params()).expect("valid parameters"),
            |mut cache| {
                for y in -8..8 {
                    for x in -8..8 {
                        cache.explore(Coordinate::new(x, y));
                    }
                }
                cache
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(mapping_benches, bench_try_map, bench_batch, bench_explore);
criterion_main!(mapping_benches);

//! Flat container lookup benchmarks.
//!
//! Compares the linear scan used below the search threshold with binary
//! search, at sizes around the default threshold.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use meme_bench::data::{distinct_keys, lookups};
use meme_engine::ds::{FlatMap, FlatSet, Less};

const LOOKUPS: usize = 1_000;

// =============================================================================
// Lookup Benchmarks
// =============================================================================

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    group.throughput(Throughput::Elements(LOOKUPS as u64));

    for size in [8, 16, 32, 42, 64, 128, 512] {
        let keys = distinct_keys(size);
        let lookups = lookups(&keys, LOOKUPS);

        let linear: FlatSet<u64, Less, { usize::MAX }> = keys.iter().copied().collect();
        group.bench_with_input(BenchmarkId::new("linear", size), &lookups, |b, lookups| {
            b.iter(|| lookups.iter().filter(|key| linear.contains(black_box(*key))).count());
        });

        let binary: FlatSet<u64, Less, 0> = keys.iter().copied().collect();
        group.bench_with_input(BenchmarkId::new("binary", size), &lookups, |b, lookups| {
            b.iter(|| lookups.iter().filter(|key| binary.contains(black_box(*key))).count());
        });

        let default: FlatSet<u64> = keys.iter().copied().collect();
        group.bench_with_input(BenchmarkId::new("default_threshold", size), &lookups, |b, lookups| {
            b.iter(|| lookups.iter().filter(|key| default.contains(black_box(*key))).count());
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for size in [64, 1_024] {
        let keys = distinct_keys(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("insert_one_by_one", size), &keys, |b, keys| {
            b.iter(|| {
                let mut set = FlatSet::<u64>::new();
                for key in keys {
                    set.insert(*key);
                }
                black_box(set.len())
            });
        });

        group.bench_with_input(BenchmarkId::new("from_iter", size), &keys, |b, keys| {
            b.iter(|| black_box(keys.iter().copied().collect::<FlatSet<u64>>().len()));
        });

        group.bench_with_input(BenchmarkId::new("map_insert", size), &keys, |b, keys| {
            b.iter(|| {
                let mut map = FlatMap::<u64, u64>::new();
                for key in keys {
                    map.insert(*key, key * 2);
                }
                black_box(map.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_build);
criterion_main!(benches);

use std::ops::ControlFlow;
use std::sync::atomic::AtomicBool;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use halcyon_types::{SizeSchedule, H256, U256};
use halcyon_work::{Dataset, EpochCache, FullDataset, LightDataset, Miner, WorkPackage};

/// Small enough that a full dataset builds in well under a second.
const BENCH_SCHEDULE: SizeSchedule = SizeSchedule {
    cache_init: 1 << 16,
    cache_growth: 1 << 12,
    dataset_init: 1 << 22,
    dataset_growth: 1 << 16,
};

fn bench_dataset_build(c: &mut Criterion) {
    let spec = EpochCache::new(100, BENCH_SCHEDULE).spec(0).unwrap();

    c.bench_function("light_build", |b| {
        b.iter(|| black_box(LightDataset::build(black_box(&spec), None).unwrap()))
    });

    let light = LightDataset::build(&spec, None).unwrap();
    let mut group = c.benchmark_group("full_build");
    group.sample_size(10);
    group.bench_function("full_build", |b| {
        b.iter(|| {
            black_box(FullDataset::build(&light, None, |_| ControlFlow::Continue(())).unwrap())
        })
    });
    group.finish();
}

fn bench_compute(c: &mut Criterion) {
    let spec = EpochCache::new(100, BENCH_SCHEDULE).spec(0).unwrap();
    let light = LightDataset::build(&spec, None).unwrap();
    let full = FullDataset::build(&light, None, |_| ControlFlow::Continue(())).unwrap();
    let header = H256::new([0x42; 32]);

    let mut group = c.benchmark_group("compute");
    group.bench_with_input(BenchmarkId::new("light", 0), &light, |b, light| {
        b.iter(|| black_box(light.compute(black_box(&header), black_box(7))))
    });
    group.bench_with_input(BenchmarkId::new("full", 0), &full, |b, full| {
        b.iter(|| black_box(full.compute(black_box(&header), black_box(7))))
    });
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let spec = EpochCache::new(100, BENCH_SCHEDULE).spec(0).unwrap();
    let light = LightDataset::build(&spec, None).unwrap();
    let full = FullDataset::build(&light, None, |_| ControlFlow::Continue(())).unwrap();
    let cancel = AtomicBool::new(false);

    let mut group = c.benchmark_group("search");
    for shift in [4usize, 8, 12] {
        let package = WorkPackage {
            boundary: H256::from_u256(U256::MAX >> shift),
            header_hash: H256::new([0x42; 32]),
            seed_hash: *full.seed_hash(),
        };
        group.bench_with_input(BenchmarkId::new("full", shift), &package, |b, package| {
            b.iter(|| black_box(Miner.search(&full, package, 0, u64::MAX, &cancel).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dataset_build, bench_compute, bench_search);
criterion_main!(benches);

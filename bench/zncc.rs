use criterion::{black_box, criterion_group, criterion_main, Criterion};

use zncc_disparity::{prelude::*, zncc::{Params, Zncc}};

#[path = "../tests/common/mod.rs"]
mod common;

fn zncc_bench(c: &mut Criterion) {

    // Build frame
    let frame = common::shifted_pair(160, 120, 12);

    let params = Params {
        window_size: 9,
        max_disparity: 32,
        ..Params::default()
    };

    // Benchmark compute function under both schedules
    let mut sequential = Zncc::new(Params { schedule: Schedule::Sequential, ..params.clone() });
    c.bench_function("zncc noise 160x120 sequential", |b| {
        b.iter(|| sequential.compute(black_box(&frame)))
    });

    let mut parallel = Zncc::new(Params { schedule: Schedule::Parallel, ..params });
    c.bench_function("zncc noise 160x120 parallel", |b| {
        b.iter(|| parallel.compute(black_box(&frame)))
    });
}

criterion_group!(benches, zncc_bench);
criterion_main!(benches);

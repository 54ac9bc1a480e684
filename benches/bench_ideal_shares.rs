use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use signal_timing::{ideal_shares, DemandVector};

fn generate_demand(n: usize) -> DemandVector {
    (0..n)
        .map(|i| (format!("Phase_{}", i), 10.0 + (i % 10) as f64 * 7.0))
        .collect()
}

fn bench_ideal_shares(c: &mut Criterion) {
    let mut group = c.benchmark_group("ideal_shares");
    for &size in [4, 50, 200].iter() {
        let demand = generate_demand(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &_size| {
            b.iter(|| black_box(ideal_shares(black_box(&demand), 120.0)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ideal_shares);
criterion_main!(benches);

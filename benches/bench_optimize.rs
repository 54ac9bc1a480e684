// benches/bench_optimize.rs
use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use signal_timing::{optimize, CycleConfig, DemandVector};

/// Random whole-vehicle demand for `n` phases named "Phase_{i}".
fn generate_demand(n: usize, rng: &mut StdRng) -> DemandVector {
    (0..n)
        .map(|i| (format!("Phase_{}", i), rng.random_range(1.0..120.0_f64).round()))
        .collect()
}

fn bench_optimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));

    let mut rng = StdRng::seed_from_u64(42);
    // Cycle grows with the phase count so the 5s minimum always fits.
    for &size in [4, 8, 16, 32].iter() {
        let demand = generate_demand(size, &mut rng);
        let config = CycleConfig::new(size as f64 * 30.0, 5.0);
        group.bench_with_input(BenchmarkId::new("directions", size), &size, |b, &_size| {
            b.iter(|| {
                let allocation = optimize(black_box(&demand), black_box(&config));
                black_box(allocation)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_optimize);
criterion_main!(benches);

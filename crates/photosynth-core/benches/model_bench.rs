//! Criterion benchmarks for the rate model and tick pipeline.
//!
//! - `compute_stats`: one model evaluation across a sweep of environments
//! - `step`: one full tick including history append and accumulation
//! - `step_1000`: a long run that keeps the history window saturated

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use photosynth_core::engine::Simulation;
use photosynth_core::environment::EnvironmentField;
use photosynth_core::model::compute_stats;
use photosynth_core::test_utils::*;

fn bench_compute_stats(c: &mut Criterion) {
    let environments: Vec<_> = (0..=20)
        .map(|i| {
            let x = i as f64 * 5.0;
            env(x, 100.0 - x, x * 0.5, x * 0.5)
        })
        .collect();

    c.bench_function("compute_stats", |b| {
        b.iter(|| {
            for environment in &environments {
                black_box(compute_stats(black_box(environment)));
            }
        })
    });
}

fn bench_step(c: &mut Criterion) {
    let mut sim = simulation_in(full_sun());
    c.bench_function("step", |b| b.iter(|| black_box(sim.step())));
}

fn bench_long_run(c: &mut Criterion) {
    c.bench_function("step_1000", |b| {
        b.iter(|| {
            let mut sim = simulation_in(drought());
            for i in 0..1000u64 {
                if i % 100 == 0 {
                    let _ = sim.set_environment(EnvironmentField::Light, (i / 10) as f64);
                }
                sim.step();
            }
            black_box(sim.total_glucose())
        })
    });
}

criterion_group!(benches, bench_compute_stats, bench_step, bench_long_run);
criterion_main!(benches);

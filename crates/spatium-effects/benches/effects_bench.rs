//! Criterion benchmarks for the graph stages
//!
//! Run with: cargo bench -p spatium-effects
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use spatium_core::Effect;
use spatium_effects::{
    Compressor, Convolver, Exciter, FiveBandEq, HaasWidener, ImpulseResponse, Limiter, Panner3d,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 512];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_effect<E: Effect>(c: &mut Criterion, name: &str, mut effect: E) {
    let mut group = c.benchmark_group(name);

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let mut left = input.clone();
                let mut right = input.clone();
                b.iter(|| {
                    left.copy_from_slice(&input);
                    right.copy_from_slice(&input);
                    effect.process_block_stereo(black_box(&mut left), black_box(&mut right));
                    black_box(left[0])
                })
            },
        );
    }

    group.finish();
}

fn bench_eq(c: &mut Criterion) {
    let mut eq = FiveBandEq::new(SAMPLE_RATE);
    for (band, gain) in [4.0, 2.0, 0.0, 2.0, 1.0].into_iter().enumerate() {
        eq.set_band_gain_db_immediate(band, gain);
    }
    bench_effect(c, "FiveBandEq", eq);
}

fn bench_eq_ramping(c: &mut Criterion) {
    // Never settles: the target flips every iteration, so coefficients are
    // recomputed per sample
    let mut group = c.benchmark_group("FiveBandEq/ramping");
    let input = generate_test_signal(128);
    let mut eq = FiveBandEq::new(SAMPLE_RATE);
    let mut flip = false;
    group.bench_function("128", |b| {
        let mut left = input.clone();
        let mut right = input.clone();
        b.iter(|| {
            flip = !flip;
            eq.set_band_gain_db(2, if flip { 6.0 } else { -6.0 });
            eq.process_block_stereo(&mut left, &mut right);
            black_box(left[0])
        })
    });
    group.finish();
}

fn bench_haas(c: &mut Criterion) {
    let mut haas = HaasWidener::new(SAMPLE_RATE, 15.0);
    haas.set_send_gain(0.15, 0.0);
    bench_effect(c, "HaasWidener", haas);
}

fn bench_convolver(c: &mut Criterion) {
    let Ok(ir) = ImpulseResponse::generate(SAMPLE_RATE, Some(1)) else {
        return;
    };
    let Ok(mut reverb) = Convolver::new(&ir) else {
        return;
    };
    reverb.set_send_gain(0.2, 0.0);
    bench_effect(c, "Convolver", reverb);
}

fn bench_exciter(c: &mut Criterion) {
    let mut exciter = Exciter::new(SAMPLE_RATE);
    exciter.set_send_gain(0.05, 0.0);
    bench_effect(c, "Exciter", exciter);
}

fn bench_panner(c: &mut Criterion) {
    let mut panner = Panner3d::new(SAMPLE_RATE, (1.0, 0.3, -2.0));
    bench_effect(c, "Panner3d/static", panner.clone());
    // Animated position keeps the direction maths on the hot path
    panner.set_position((-1.5, -0.2, -3.0), 25.0);
    bench_effect(c, "Panner3d/moving", panner);
}

fn bench_dynamics(c: &mut Criterion) {
    bench_effect(c, "Compressor", Compressor::new(SAMPLE_RATE));
    bench_effect(c, "Limiter", Limiter::new(SAMPLE_RATE, -1.0));
}

criterion_group!(
    benches,
    bench_eq,
    bench_eq_ramping,
    bench_haas,
    bench_convolver,
    bench_exciter,
    bench_panner,
    bench_dynamics,
);
criterion_main!(benches);

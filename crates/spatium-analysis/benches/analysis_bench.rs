//! Criterion benchmarks for the analysis tap
//!
//! Run with: cargo bench -p spatium-analysis
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use spatium_analysis::analysis_tap;
use std::f32::consts::PI;

const SAMPLE_RATE: f32 = 48000.0;

fn generate_sine(size: usize, frequency: f32) -> Vec<f32> {
    (0..size)
        .map(|i| (2.0 * PI * frequency * i as f32 / SAMPLE_RATE).sin())
        .collect()
}

fn bench_push(c: &mut Criterion) {
    let (mut writer, _analyser) = analysis_tap();
    let block = generate_sine(128, 440.0);
    c.bench_function("TapWriter/push_128", |b| {
        b.iter(|| writer.push_stereo(black_box(&block), black_box(&block)));
    });
}

fn bench_snapshots(c: &mut Criterion) {
    let mut group = c.benchmark_group("Analyser");
    for &size in &[256usize, 2048, 8192] {
        let (mut writer, mut analyser) = analysis_tap();
        let _ = analyser.set_fft_size(size);
        let signal = generate_sine(size, 1000.0);
        writer.push_stereo(&signal, &signal);

        group.bench_with_input(BenchmarkId::new("frequency_bytes", size), &size, |b, _| {
            b.iter(|| black_box(analyser.frequency_bytes()));
        });
        group.bench_with_input(BenchmarkId::new("time_domain_bytes", size), &size, |b, _| {
            b.iter(|| black_box(analyser.time_domain_bytes()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_push, bench_snapshots);
criterion_main!(benches);

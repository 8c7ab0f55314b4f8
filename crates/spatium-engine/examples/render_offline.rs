//! Renders a short chord through the engine and writes it to a WAV file.
//!
//! The first half plays the Cinema preset statically; in the second half the
//! source orbits the listener, driven by the analyser's mean intensity.
//!
//! Run with: cargo run -p spatium-engine --example render_offline [output.wav]
//! Set RUST_LOG=debug to see impulse-response timing and preset logs.

use std::f32::consts::PI;
use std::sync::Arc;

use spatium_config::{EqBand, PresetId};
use spatium_engine::{BufferSource, EngineOptions, OfflineContext, SpatialAudioEngine};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SAMPLE_RATE: f32 = 48000.0;
const SECONDS: usize = 6;
const BLOCK: usize = 512;

fn chord(seconds: usize) -> Vec<f32> {
    let n = SAMPLE_RATE as usize * seconds;
    (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            let env = (t * 2.0).min(1.0);
            [220.0, 277.18, 329.63]
                .iter()
                .map(|f| (2.0 * PI * f * t).sin())
                .sum::<f32>()
                * 0.15
                * env
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "spatium_render.wav".to_string());

    let ctx = Arc::new(OfflineContext::new(SAMPLE_RATE));
    let options = EngineOptions {
        seed: Some(7),
        ..Default::default()
    };
    let mut engine = SpatialAudioEngine::new(ctx.clone(), options)?;

    engine.attach(BufferSource::mono(chord(SECONDS)))?;
    engine.apply_preset(PresetId::Cinema)?;
    engine.set_eq_band(EqBand::Treble, 3.0)?;
    engine.set_enabled(true)?;

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    runtime.block_on(engine.resume())?;

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&output, spec)?;

    let total = SAMPLE_RATE as usize * SECONDS;
    let animate_from = total / 2;
    let mut peak = 0.0f32;
    let mut rendered = 0;
    while rendered < total {
        let frames = BLOCK.min(total - rendered);
        let (left, right) = ctx.render(frames);
        for (l, r) in left.iter().zip(&right) {
            writer.write_sample(*l)?;
            writer.write_sample(*r)?;
            peak = peak.max(l.abs()).max(r.abs());
        }
        rendered += frames;

        if rendered >= animate_from {
            let intensity = spatium_analysis::mean_intensity(&engine.frequency_snapshot()?);
            engine.animate_spatial_position(intensity.max(0.5))?;
        }
    }
    writer.finalize()?;

    info!(
        path = %output,
        seconds = SECONDS,
        peak_db = 20.0 * peak.max(1e-10).log10(),
        latency_samples = engine.latency_samples(),
        "render complete"
    );

    engine.destroy();
    Ok(())
}

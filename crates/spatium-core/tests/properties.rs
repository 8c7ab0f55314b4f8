//! Property-based tests for spatium-core DSP primitives.
//!
//! Filter stability across the EQ's whole gain range, ramp convergence, and
//! delay line integrity under random inputs.

use proptest::prelude::*;
use spatium_core::{
    Biquad, DcBlocker, Effect, EnvelopeFollower, InterpolatedDelay, Interpolation, OnePole,
    Oversampled, SmoothedParam, high_shelf_coefficients, low_shelf_coefficients,
    peaking_eq_coefficients,
};

struct Tanh;

impl Effect for Tanh {
    fn process(&mut self, input: f32) -> f32 {
        libm::tanhf(input * 4.0)
    }
    fn set_sample_rate(&mut self, _: f32) {}
    fn reset(&mut self) {}
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Every EQ band shape stays finite and bounded for gains in [-12, 12] dB
    /// at any sample rate the engine supports.
    #[test]
    fn eq_shapes_are_stable(
        gain in -12.0f32..=12.0f32,
        band in 0usize..5,
        sample_rate in prop::sample::select(vec![22050.0f32, 44100.0, 48000.0, 96000.0]),
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let freq = [60.0f32, 200.0, 1000.0, 4000.0, 12000.0][band].min(sample_rate * 0.475);
        let coeffs = match band {
            0 => low_shelf_coefficients(freq, gain, sample_rate),
            4 => high_shelf_coefficients(freq, gain, sample_rate),
            _ => peaking_eq_coefficients(freq, 1.0, gain, sample_rate),
        };
        let mut biquad = Biquad::new();
        biquad.set(coeffs);

        for _ in 0..32 {
            for &x in &input {
                let y = biquad.process(x);
                prop_assert!(y.is_finite());
                prop_assert!(y.abs() < 16.0, "band {} gain {} output {}", band, gain, y);
            }
        }
    }

    /// A ramp never overshoots its target and always settles.
    #[test]
    fn smoothed_param_is_monotonic_and_settles(
        start in -20.0f32..20.0f32,
        target in -20.0f32..20.0f32,
        time_ms in prop::sample::select(vec![25.0f32, 50.0, 100.0]),
    ) {
        let mut p = SmoothedParam::with_config(start, 48000.0, time_ms);
        p.set_target(target);
        let mut prev = start;
        for _ in 0..(48 * time_ms as usize * 20) {
            let v = p.advance();
            if target >= start {
                prop_assert!(v >= prev && v <= target);
            } else {
                prop_assert!(v <= prev && v >= target);
            }
            prev = v;
        }
        prop_assert!(p.is_settled(), "{} -> {} stuck at {}", start, target, p.get());
    }

    /// An impulse reaches the output exactly `d` samples later for any
    /// integer delay inside the capacity.
    #[test]
    fn delay_reproduces_integer_offsets(delay in 0usize..200, cubic in any::<bool>()) {
        let mut line = InterpolatedDelay::new(256);
        if cubic {
            line.set_interpolation(Interpolation::Cubic);
        }
        let mut out = Vec::with_capacity(256);
        for n in 0..256 {
            let x = if n == 0 { 1.0 } else { 0.0 };
            out.push(line.write_read(x, delay as f32));
        }
        prop_assert!((out[delay] - 1.0).abs() < 1e-6);
    }

    /// Nonlinear processing through the oversampler stays bounded.
    #[test]
    fn oversampled_shaper_is_bounded(input in prop::collection::vec(-1.0f32..=1.0f32, 1..512)) {
        let mut os = Oversampled::new(Tanh, 44100.0);
        for x in input {
            let y = os.process(x);
            prop_assert!(y.is_finite() && y.abs() < 1.2);
        }
    }

    /// Smoothing filters and followers never produce non-finite output.
    #[test]
    fn first_order_filters_stay_finite(
        freq in 20.0f32..20000.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut lp = OnePole::new(48000.0, freq);
        let mut dc = DcBlocker::new(48000.0);
        let mut env = EnvelopeFollower::with_times(48000.0, 3.0, 250.0);
        for &x in &input {
            prop_assert!(lp.process(x).is_finite());
            prop_assert!(dc.process(x).is_finite());
            let level = env.process(x);
            prop_assert!((0.0..=1.0).contains(&level));
        }
    }
}

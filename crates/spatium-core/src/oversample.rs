//! 4x oversampling wrapper for nonlinear stages.
//!
//! The exciter's waveshaper creates harmonics well above the input band. At
//! 44.1 kHz those would fold back as inharmonic aliases, so the shaper runs at
//! four times the base rate and the result is low-passed before decimation:
//!
//! ```text
//! x -> linear interpolation (x4) -> effect at 4*fs -> 16-tap FIR -> keep every 4th -> y
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use spatium_core::{Effect, Oversampled};
//!
//! struct Cube;
//! impl Effect for Cube {
//!     fn process(&mut self, x: f32) -> f32 { x * x * x }
//!     fn set_sample_rate(&mut self, _: f32) {}
//!     fn reset(&mut self) {}
//! }
//!
//! let mut shaped = Oversampled::new(Cube, 48000.0);
//! assert_eq!(shaped.latency_samples(), 2);
//! let _y = shaped.process(0.5);
//! ```

use crate::Effect;

/// Oversampling factor applied by [`Oversampled`].
pub const OVERSAMPLE_FACTOR: usize = 4;

const FILTER_TAPS: usize = 16;

/// Runs an [`Effect`] at four times the base sample rate.
///
/// State is fixed-size, so the wrapper is `no_std` friendly and never
/// allocates. The decimation filter history is a ring indexed by `fir_pos`.
#[derive(Debug, Clone)]
pub struct Oversampled<E: Effect> {
    effect: E,
    sample_rate: f32,
    /// Last base-rate input, the start point of the next interpolation
    prev_sample: f32,
    fir_state: [f32; FILTER_TAPS],
    /// Slot of the newest sample in `fir_state`
    fir_pos: usize,
}

impl<E: Effect> Oversampled<E> {
    /// Wraps `effect`, configuring it for `sample_rate * 4`.
    pub fn new(mut effect: E, sample_rate: f32) -> Self {
        effect.set_sample_rate(sample_rate * OVERSAMPLE_FACTOR as f32);
        Self {
            effect,
            sample_rate,
            prev_sample: 0.0,
            fir_state: [0.0; FILTER_TAPS],
            fir_pos: 0,
        }
    }

    /// The wrapped effect.
    pub fn inner(&self) -> &E {
        &self.effect
    }

    /// Base (not oversampled) sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[inline]
    fn push_fir(&mut self, sample: f32) {
        self.fir_pos = (self.fir_pos + 1) % FILTER_TAPS;
        self.fir_state[self.fir_pos] = sample;
    }

    #[inline]
    fn fir_output(&self) -> f32 {
        let mut acc = 0.0;
        for (k, &c) in DECIMATION_FIR.iter().enumerate() {
            let idx = (self.fir_pos + FILTER_TAPS - k) % FILTER_TAPS;
            acc += c * self.fir_state[idx];
        }
        acc
    }
}

impl<E: Effect> Effect for Oversampled<E> {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let step = 1.0 / OVERSAMPLE_FACTOR as f32;
        let start = self.prev_sample;
        for i in 1..=OVERSAMPLE_FACTOR {
            let upsampled = start + (input - start) * (i as f32 * step);
            let shaped = self.effect.process(upsampled);
            self.push_fir(shaped);
        }
        self.prev_sample = input;
        // Only the decimation point needs the convolution sum
        self.fir_output()
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.effect
            .set_sample_rate(sample_rate * OVERSAMPLE_FACTOR as f32);
    }

    fn reset(&mut self) {
        self.prev_sample = 0.0;
        self.fir_state = [0.0; FILTER_TAPS];
        self.fir_pos = 0;
        self.effect.reset();
    }

    fn latency_samples(&self) -> usize {
        // 7.5 oversampled samples of FIR group delay, rounded up at base rate
        (FILTER_TAPS / 2).div_ceil(OVERSAMPLE_FACTOR) + self.effect.latency_samples()
    }
}

/// Windowed-sinc lowpass (Kaiser), cutoff at the base-rate Nyquist
/// (0.25 of the oversampled Nyquist band edge with transition margin).
/// Symmetric, unity DC gain.
#[allow(clippy::excessive_precision)]
#[rustfmt::skip]
static DECIMATION_FIR: [f32; FILTER_TAPS] = [
    0.0018645282, 0.0068257641, 0.0172712655, 0.0342604001,
    0.0571166576, 0.0830896230, 0.1078345458, 0.1260221675,
    0.1332946246, 0.1260221675, 0.1078345458, 0.0830896230,
    0.0571166576, 0.0342604001, 0.0172712655, 0.0068257641,
];

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    struct Identity {
        rate: f32,
    }

    impl Effect for Identity {
        fn process(&mut self, input: f32) -> f32 {
            input
        }
        fn set_sample_rate(&mut self, sample_rate: f32) {
            self.rate = sample_rate;
        }
        fn reset(&mut self) {}
    }

    fn steady_peak(os: &mut Oversampled<Identity>, freq: f32) -> f32 {
        let sr = 48000.0;
        let mut peak = 0.0f32;
        for n in 0..4000 {
            let y = os.process(libm::sinf(2.0 * PI * freq * n as f32 / sr));
            if n >= 2000 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn inner_runs_at_four_times_the_rate() {
        let os = Oversampled::new(Identity { rate: 0.0 }, 44100.0);
        assert_eq!(os.inner().rate, 176400.0);
    }

    #[test]
    fn filter_has_unity_dc_gain() {
        let sum: f32 = DECIMATION_FIR.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);

        let mut os = Oversampled::new(Identity { rate: 0.0 }, 48000.0);
        let mut y = 0.0;
        for _ in 0..64 {
            y = os.process(0.5);
        }
        assert!((y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn low_band_passes_high_band_rolls_off() {
        let low = steady_peak(&mut Oversampled::new(Identity { rate: 0.0 }, 48000.0), 1000.0);
        let high = steady_peak(&mut Oversampled::new(Identity { rate: 0.0 }, 48000.0), 15000.0);
        assert!(low > 0.98, "1 kHz peak {low}");
        assert!(high < 0.4, "15 kHz peak {high}");
    }

    #[test]
    fn reset_clears_history() {
        let mut os = Oversampled::new(Identity { rate: 0.0 }, 48000.0);
        os.process(1.0);
        os.reset();
        assert_eq!(os.process(0.0), 0.0);
        assert_eq!(os.latency_samples(), 2);
    }
}

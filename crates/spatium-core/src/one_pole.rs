//! One-pole lowpass (6 dB/oct).
//!
//! ```text
//! y[n] = x[n] + coeff * (y[n-1] - x[n])
//! coeff = exp(-2*pi*freq / sample_rate)
//! ```
//!
//! The panner uses it as a band split: the lowpass output is the "body" of the
//! signal and `x - lowpass(x)` the "air" it tilts for elevation.

use crate::flush_denormal;
use libm::expf;

/// One-pole lowpass filter.
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePole {
    /// Creates a filter with its cutoff at `freq_hz`.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self {
            state: 0.0,
            coeff: 0.0,
            sample_rate,
            freq: freq_hz,
        };
        filter.recalculate_coeff();
        filter
    }

    /// Recomputes the coefficient for a new rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal(input + self.coeff * (self.state - input));
        self.state
    }

    /// Clears the filter state.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    fn recalculate_coeff(&mut self) {
        let nyquist = self.sample_rate * 0.5;
        let freq = self.freq.clamp(1.0, nyquist * 0.99);
        self.coeff = expf(-2.0 * core::f32::consts::PI * freq / self.sample_rate);
    }
}

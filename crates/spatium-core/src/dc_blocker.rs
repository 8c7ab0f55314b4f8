//! First-order DC blocker.
//!
//! ```text
//! H(z) = (1 - z^-1) / (1 - R*z^-1)
//! R = 1 - 2*pi*fc/fs
//! ```
//!
//! The asymmetric exciter curve adds a DC offset proportional to the signal
//! envelope; this removes it before the send is summed back in.

use core::f32::consts::PI;

/// DC blocking high-pass with a cutoff near 7 Hz.
///
/// ```rust
/// use spatium_core::DcBlocker;
///
/// let mut blocker = DcBlocker::new(48000.0);
/// let mut y = 0.0;
/// for _ in 0..48000 {
///     y = blocker.process(0.25);
/// }
/// assert!(y.abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct DcBlocker {
    /// Pole radius R
    coeff: f32,
    x_prev: f32,
    y_prev: f32,
}

impl DcBlocker {
    const CUTOFF_HZ: f32 = 7.0;

    /// Creates a blocker for `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            coeff: Self::pole_radius(sample_rate),
            x_prev: 0.0,
            y_prev: 0.0,
        }
    }

    /// `y[n] = x[n] - x[n-1] + R*y[n-1]`
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x_prev + self.coeff * self.y_prev;
        self.x_prev = input;
        self.y_prev = crate::flush_denormal(output);
        output
    }

    /// Recomputes the pole for a new rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.coeff = Self::pole_radius(sample_rate);
    }

    /// Clears the filter state.
    pub fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }

    fn pole_radius(sample_rate: f32) -> f32 {
        (1.0 - 2.0 * PI * Self::CUTOFF_HZ / sample_rate).clamp(0.9, 0.9999)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_offset_decays() {
        let mut blocker = DcBlocker::new(44100.0);
        let mut out = 1.0;
        for _ in 0..44100 {
            out = blocker.process(1.0);
        }
        assert!(out.abs() < 0.01, "offset left: {out}");
    }

    #[test]
    fn audible_tone_passes() {
        let sr = 48000.0;
        let mut blocker = DcBlocker::new(sr);
        let mut peak = 0.0f32;
        for n in 0..48000 {
            let x = libm::sinf(2.0 * PI * 500.0 * n as f32 / sr);
            let y = blocker.process(x);
            if n > 47000 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak > 0.95, "500 Hz attenuated to {peak}");
    }

    #[test]
    fn reset_clears_history() {
        let mut blocker = DcBlocker::new(48000.0);
        blocker.process(1.0);
        blocker.reset();
        assert_eq!(blocker.process(0.0), 0.0);
    }
}

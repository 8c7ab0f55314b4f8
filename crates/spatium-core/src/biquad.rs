//! Biquad (bi-quadratic) filter structure.
//!
//! A second-order IIR section plus the RBJ Audio EQ Cookbook coefficient
//! formulas the equalizer is built from: low shelf, peaking and high shelf.
//!
//! Shelves use the cookbook's shelf slope `S = 1`, the steepest slope without
//! overshoot in the magnitude response.

use core::f32::consts::PI;
use libm::{cosf, powf, sinf, sqrtf};

/// Unnormalized coefficient set: `(b0, b1, b2, a0, a1, a2)`.
pub type Coefficients = (f32, f32, f32, f32, f32, f32);

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets the coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Sets the coefficients from a cookbook tuple.
    #[inline]
    pub fn set(&mut self, coefficients: Coefficients) {
        let (b0, b1, b2, a0, a1, a2) = coefficients;
        self.set_coefficients(b0, b1, b2, a0, a1, a2);
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = crate::flush_denormal(output);

        output
    }

    /// Clears the delay lines, keeping the coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Magnitude response in dB at `frequency`, evaluated on the unit circle.
    ///
    /// Used to verify what a band is actually doing rather than what it was
    /// asked to do.
    pub fn magnitude_db(&self, frequency: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (cosf(w), sinf(w));
        let (c2, s2) = (cosf(2.0 * w), sinf(2.0 * w));

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        let num = num_re * num_re + num_im * num_im;
        let den = den_re * den_re + den_im * den_im;
        // 10*log10 of a power ratio
        crate::linear_to_db(num / den.max(1e-20)) * 0.5
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Peaking EQ coefficients (RBJ cookbook).
///
/// Boosts or cuts `gain_db` around `frequency` with bandwidth set by `q`.
/// At 0 dB the section is an exact passthrough.
pub fn peaking_eq_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    (
        1.0 + alpha * a,
        -2.0 * cos_omega,
        1.0 - alpha * a,
        1.0 + alpha / a,
        -2.0 * cos_omega,
        1.0 - alpha / a,
    )
}

/// Low-shelf coefficients (RBJ cookbook, shelf slope 1).
///
/// Everything below `frequency` is raised or lowered by `gain_db`; the
/// half-gain point sits at `frequency`.
pub fn low_shelf_coefficients(frequency: f32, gain_db: f32, sample_rate: f32) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    // alpha = sin(w0)/2 * sqrt((A + 1/A)(1/S - 1) + 2), with S = 1
    let alpha = sinf(omega) / 2.0 * core::f32::consts::SQRT_2;
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    (
        a * ((a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha),
        2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega),
        a * ((a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha),
        (a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha,
        -2.0 * ((a - 1.0) + (a + 1.0) * cos_omega),
        (a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha,
    )
}

/// High-shelf coefficients (RBJ cookbook, shelf slope 1).
///
/// Everything above `frequency` is raised or lowered by `gain_db`.
pub fn high_shelf_coefficients(frequency: f32, gain_db: f32, sample_rate: f32) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / 2.0 * core::f32::consts::SQRT_2;
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    (
        a * ((a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha),
        -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_omega),
        a * ((a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha),
        (a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha,
        2.0 * ((a - 1.0) - (a + 1.0) * cos_omega),
        (a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn filter(coefficients: Coefficients) -> Biquad {
        let mut biquad = Biquad::new();
        biquad.set(coefficients);
        biquad
    }

    #[test]
    fn new_biquad_passes_through() {
        let mut biquad = Biquad::new();
        for i in 0..10 {
            let input = i as f32 * 0.1;
            assert!((biquad.process(input) - input).abs() < 1e-6);
        }
    }

    #[test]
    fn clear_resets_history() {
        let mut biquad = filter(peaking_eq_coefficients(1000.0, 1.0, 6.0, SR));
        for _ in 0..10 {
            biquad.process(1.0);
        }
        biquad.clear();
        assert_eq!(biquad.x1, 0.0);
        assert_eq!(biquad.y2, 0.0);
    }

    #[test]
    fn boosted_shelf_settles_to_its_gain_at_dc() {
        let mut biquad = filter(low_shelf_coefficients(200.0, 6.0, SR));
        let mut output = 0.0;
        for _ in 0..4000 {
            output = biquad.process(1.0);
        }
        assert!((output - crate::db_to_linear(6.0)).abs() < 0.01, "{output}");
    }

    #[test]
    fn peaking_hits_gain_at_center() {
        let biquad = filter(peaking_eq_coefficients(1000.0, 1.0, 6.0, SR));
        assert!((biquad.magnitude_db(1000.0, SR) - 6.0).abs() < 0.05);
        assert!(biquad.magnitude_db(50.0, SR).abs() < 0.5);
    }

    #[test]
    fn zero_gain_sections_are_flat() {
        for coefficients in [
            peaking_eq_coefficients(200.0, 1.0, 0.0, SR),
            low_shelf_coefficients(60.0, 0.0, SR),
            high_shelf_coefficients(12000.0, 0.0, SR),
        ] {
            let biquad = filter(coefficients);
            for f in [30.0, 200.0, 1000.0, 8000.0, 16000.0] {
                assert!(biquad.magnitude_db(f, SR).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn low_shelf_boosts_below_corner() {
        let biquad = filter(low_shelf_coefficients(60.0, 9.0, SR));
        assert!((biquad.magnitude_db(10.0, SR) - 9.0).abs() < 0.3);
        assert!((biquad.magnitude_db(60.0, SR) - 4.5).abs() < 0.3);
        assert!(biquad.magnitude_db(2000.0, SR).abs() < 0.2);
    }

    #[test]
    fn high_shelf_cuts_above_corner() {
        let biquad = filter(high_shelf_coefficients(12000.0, -6.0, SR));
        assert!((biquad.magnitude_db(20000.0, SR) + 6.0).abs() < 0.6);
        assert!(biquad.magnitude_db(500.0, SR).abs() < 0.1);
    }

    #[test]
    fn measured_response_matches_magnitude_db() {
        let mut biquad = filter(peaking_eq_coefficients(1000.0, 1.0, -9.0, SR));
        let mut peak: f32 = 0.0;
        for n in 0..48000 {
            let x = sinf(2.0 * PI * 1000.0 * n as f32 / SR);
            let y = biquad.process(x);
            if n > 24000 {
                peak = peak.max(y.abs());
            }
        }
        let measured = crate::linear_to_db(peak);
        assert!((measured - biquad.magnitude_db(1000.0, SR)).abs() < 0.1);
    }
}

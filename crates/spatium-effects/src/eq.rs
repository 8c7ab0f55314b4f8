//! Five-band tone-shaping equalizer.
//!
//! A fixed series of RBJ cookbook biquads per channel:
//!
//! | Index | Band | Filter | Frequency |
//! |-------|------|--------|-----------|
//! | 0 | sub | low shelf, S=1 | 60 Hz |
//! | 1 | bass | peaking, Q=1 | 200 Hz |
//! | 2 | mid | peaking, Q=1 | 1 kHz |
//! | 3 | high mid | peaking, Q=1 | 4 kHz |
//! | 4 | treble | high shelf, S=1 | 12 kHz |
//!
//! Only the gains move. Each gain ramps through a [`SmoothedParam`] and the
//! band's coefficients are recomputed every sample while that ramp is in
//! flight, so a gain change never clicks.

use spatium_core::{
    Biquad, Coefficients, Effect, SmoothedParam, high_shelf_coefficients, low_shelf_coefficients,
    peaking_eq_coefficients,
};

/// Number of bands.
pub const BAND_COUNT: usize = 5;

/// Centre (peaking) or corner (shelf) frequency of each band in Hz.
pub const BAND_FREQUENCIES: [f32; BAND_COUNT] = [60.0, 200.0, 1000.0, 4000.0, 12000.0];

/// Gain limit in dB, applied symmetrically.
pub const MAX_GAIN_DB: f32 = 12.0;

const PEAKING_Q: f32 = 1.0;
const DEFAULT_RAMP_MS: f32 = 100.0;

/// Stereo five-band EQ with ramped gains.
///
/// # Example
///
/// ```rust
/// use spatium_core::Effect;
/// use spatium_effects::FiveBandEq;
///
/// let mut eq = FiveBandEq::new(48000.0);
/// eq.set_band_gain_db(2, 6.0);
/// let (_l, _r) = eq.process_stereo(0.5, 0.5);
/// assert_eq!(eq.target_gain_db(2), 6.0);
/// ```
#[derive(Debug, Clone)]
pub struct FiveBandEq {
    left: [Biquad; BAND_COUNT],
    right: [Biquad; BAND_COUNT],
    gains: [SmoothedParam; BAND_COUNT],
    needs_update: [bool; BAND_COUNT],
    sample_rate: f32,
}

impl Default for FiveBandEq {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl FiveBandEq {
    /// Creates a flat EQ.
    pub fn new(sample_rate: f32) -> Self {
        let mut eq = Self {
            left: core::array::from_fn(|_| Biquad::new()),
            right: core::array::from_fn(|_| Biquad::new()),
            gains: core::array::from_fn(|_| {
                SmoothedParam::with_config(0.0, sample_rate, DEFAULT_RAMP_MS)
            }),
            needs_update: [true; BAND_COUNT],
            sample_rate,
        };
        for band in 0..BAND_COUNT {
            eq.update_band(band);
        }
        eq
    }

    /// Ramps band `band` toward `gain_db`, clamped to ±12 dB.
    ///
    /// Out-of-range band indices are ignored.
    pub fn set_band_gain_db(&mut self, band: usize, gain_db: f32) {
        if let Some(gain) = self.gains.get_mut(band) {
            gain.set_target(gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB));
            self.needs_update[band] = true;
        }
    }

    /// Jumps band `band` to `gain_db` with no ramp.
    pub fn set_band_gain_db_immediate(&mut self, band: usize, gain_db: f32) {
        if let Some(gain) = self.gains.get_mut(band) {
            gain.set_immediate(gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB));
            self.update_band(band);
        }
    }

    /// Sets the ramp time constant of every band.
    pub fn set_ramp_ms(&mut self, ramp_ms: f32) {
        for gain in &mut self.gains {
            gain.set_smoothing_time_ms(ramp_ms);
        }
    }

    /// Gain currently realized by the filters (mid-ramp values included).
    pub fn gain_db(&self, band: usize) -> f32 {
        self.gains.get(band).map_or(0.0, SmoothedParam::get)
    }

    /// Gain the band is ramping toward.
    pub fn target_gain_db(&self, band: usize) -> f32 {
        self.gains.get(band).map_or(0.0, SmoothedParam::target)
    }

    /// Magnitude response of the whole cascade at `freq` in dB, for the
    /// currently realized gains.
    pub fn magnitude_db(&self, freq: f32) -> f32 {
        self.left
            .iter()
            .map(|b| b.magnitude_db(freq, self.sample_rate))
            .sum()
    }

    fn coefficients(&self, band: usize) -> Coefficients {
        // Keep every corner below Nyquist at low sample rates
        let freq = BAND_FREQUENCIES[band].min(self.sample_rate * 0.475);
        let gain = self.gains[band].get();
        match band {
            0 => low_shelf_coefficients(freq, gain, self.sample_rate),
            4 => high_shelf_coefficients(freq, gain, self.sample_rate),
            _ => peaking_eq_coefficients(freq, PEAKING_Q, gain, self.sample_rate),
        }
    }

    fn update_band(&mut self, band: usize) {
        let coeffs = self.coefficients(band);
        self.left[band].set(coeffs);
        self.right[band].set(coeffs);
        self.needs_update[band] = false;
    }

    #[inline]
    fn advance_gains(&mut self) {
        for band in 0..BAND_COUNT {
            let settled = self.gains[band].is_settled();
            self.gains[band].advance();
            if self.needs_update[band] || !settled {
                self.update_band(band);
            }
        }
    }
}

impl Effect for FiveBandEq {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.process_stereo(input, input).0
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.advance_gains();

        let mut l = left;
        let mut r = right;
        for band in 0..BAND_COUNT {
            l = self.left[band].process(l);
            r = self.right[band].process(r);
        }
        (l, r)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for gain in &mut self.gains {
            gain.set_sample_rate(sample_rate);
        }
        for band in 0..BAND_COUNT {
            self.update_band(band);
        }
    }

    fn reset(&mut self) {
        for band in 0..BAND_COUNT {
            self.left[band].clear();
            self.right[band].clear();
            self.gains[band].snap_to_target();
            self.update_band(band);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    #[test]
    fn flat_eq_is_transparent() {
        let mut eq = FiveBandEq::new(SR);
        for n in 0..2000 {
            let x = libm::sinf(n as f32 * 0.05) * 0.5;
            let (l, r) = eq.process_stereo(x, -x);
            assert!((l - x).abs() < 1e-4);
            assert!((r + x).abs() < 1e-4);
        }
    }

    #[test]
    fn gains_are_clamped() {
        let mut eq = FiveBandEq::new(SR);
        eq.set_band_gain_db(0, 40.0);
        eq.set_band_gain_db(4, -40.0);
        assert_eq!(eq.target_gain_db(0), 12.0);
        assert_eq!(eq.target_gain_db(4), -12.0);
    }

    #[test]
    fn out_of_range_band_is_ignored() {
        let mut eq = FiveBandEq::new(SR);
        eq.set_band_gain_db(7, 3.0);
        assert_eq!(eq.gain_db(7), 0.0);
    }

    #[test]
    fn ramp_reaches_target_and_shapes_response() {
        let mut eq = FiveBandEq::new(SR);
        eq.set_band_gain_db(2, 6.0);

        // Mid-ramp the gain is partway
        for _ in 0..2400 {
            eq.process_stereo(0.0, 0.0);
        }
        let partial = eq.gain_db(2);
        assert!(partial > 0.5 && partial < 5.5, "partial gain {partial}");

        for _ in 0..96000 {
            eq.process_stereo(0.0, 0.0);
        }
        assert_eq!(eq.gain_db(2), 6.0);
        assert!((eq.magnitude_db(1000.0) - 6.0).abs() < 0.1);
    }

    #[test]
    fn immediate_set_skips_ramp() {
        let mut eq = FiveBandEq::new(SR);
        eq.set_band_gain_db_immediate(0, -4.0);
        assert_eq!(eq.gain_db(0), -4.0);
        assert!((eq.magnitude_db(20.0) + 4.0).abs() < 0.3);
    }

    #[test]
    fn low_sample_rate_keeps_treble_stable() {
        let mut eq = FiveBandEq::new(22050.0);
        eq.set_band_gain_db_immediate(4, 12.0);
        for n in 0..4000 {
            let x = if n % 2 == 0 { 0.5 } else { -0.5 };
            let (l, _) = eq.process_stereo(x, x);
            assert!(l.is_finite() && l.abs() < 4.0);
        }
    }
}

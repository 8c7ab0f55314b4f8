//! Harmonic exciter send.
//!
//! A gentle soft-clip curve evaluated off-centre so that it bends positive
//! and negative half-waves differently, which adds mostly even harmonics:
//!
//! ```text
//! curve(x) = (3 + k) * x * 20deg / (pi + k*|x|)       k = 0.5
//! shape(x) = curve(x + 0.25) - curve(0.25)            shape(0) = 0
//! ```
//!
//! The curve is tabulated (1024 points, linear interpolation, input clamped to
//! [-1, 1]) and run at 4x through [`Oversampled`]. The asymmetry leaves a
//! signal-dependent DC offset, removed by a [`DcBlocker`] before the send.

use core::f32::consts::PI;

use spatium_core::{DcBlocker, Effect, Oversampled, SmoothedParam};

/// Send gain at exciter amount 1.
pub const GAIN_PER_AMOUNT: f32 = 0.15;

const TABLE_SIZE: usize = 1024;
const DRIVE: f32 = 0.5;
const BIAS: f32 = 0.25;

fn curve(x: f32) -> f32 {
    let deg = PI / 180.0;
    (3.0 + DRIVE) * x * 20.0 * deg / (PI + DRIVE * x.abs())
}

/// Tabulated asymmetric waveshaper.
#[derive(Debug, Clone)]
pub struct ShapeTable {
    table: Box<[f32; TABLE_SIZE]>,
}

impl Default for ShapeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeTable {
    /// Builds the table.
    pub fn new() -> Self {
        let offset = curve(BIAS);
        let mut table = Box::new([0.0; TABLE_SIZE]);
        for (i, slot) in table.iter_mut().enumerate() {
            let x = i as f32 * 2.0 / (TABLE_SIZE - 1) as f32 - 1.0;
            *slot = curve(x + BIAS) - offset;
        }
        Self { table }
    }

    /// Looks up `x`, clamped to [-1, 1].
    #[inline]
    pub fn lookup(&self, x: f32) -> f32 {
        let pos = (x.clamp(-1.0, 1.0) + 1.0) * 0.5 * (TABLE_SIZE - 1) as f32;
        let idx = (pos as usize).min(TABLE_SIZE - 2);
        let frac = pos - idx as f32;
        let a = self.table[idx];
        let b = self.table[idx + 1];
        a + (b - a) * frac
    }
}

impl Effect for ShapeTable {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.lookup(input)
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn reset(&mut self) {}
}

/// Stereo exciter producing only the wet send.
#[derive(Debug, Clone)]
pub struct Exciter {
    shaper_l: Oversampled<ShapeTable>,
    shaper_r: Oversampled<ShapeTable>,
    dc_l: DcBlocker,
    dc_r: DcBlocker,
    send: SmoothedParam,
}

impl Exciter {
    /// Creates the stage with its send closed.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            shaper_l: Oversampled::new(ShapeTable::new(), sample_rate),
            shaper_r: Oversampled::new(ShapeTable::new(), sample_rate),
            dc_l: DcBlocker::new(sample_rate),
            dc_r: DcBlocker::new(sample_rate),
            send: SmoothedParam::with_config(0.0, sample_rate, 100.0),
        }
    }

    /// Ramps the send gain toward `gain`.
    pub fn set_send_gain(&mut self, gain: f32, ramp_ms: f32) {
        self.send.set_smoothing_time_ms(ramp_ms);
        self.send.set_target(gain);
    }

    /// Current send gain.
    pub fn send_gain(&self) -> f32 {
        self.send.get()
    }

    /// Jumps the send ramp to its target.
    pub fn snap(&mut self) {
        self.send.snap_to_target();
    }
}

impl Effect for Exciter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.process_stereo(input, input).0
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let gain = self.send.advance();
        let l = self.dc_l.process(self.shaper_l.process(left));
        let r = self.dc_r.process(self.shaper_r.process(right));
        (l * gain, r * gain)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.shaper_l.set_sample_rate(sample_rate);
        self.shaper_r.set_sample_rate(sample_rate);
        self.dc_l.set_sample_rate(sample_rate);
        self.dc_r.set_sample_rate(sample_rate);
        self.send.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.shaper_l.reset();
        self.shaper_r.reset();
        self.dc_l.reset();
        self.dc_r.reset();
        self.send.snap_to_target();
    }

    fn latency_samples(&self) -> usize {
        self.shaper_l.latency_samples()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_passes_through_origin() {
        let table = ShapeTable::new();
        assert!(table.lookup(0.0).abs() < 1e-4);
    }

    #[test]
    fn shape_is_asymmetric() {
        let table = ShapeTable::new();
        let pos = table.lookup(0.8);
        let neg = table.lookup(-0.8);
        assert!(pos > 0.0 && neg < 0.0);
        assert!((pos + neg).abs() > 1e-3, "curve should bend halves differently");
    }

    #[test]
    fn table_matches_analytic_curve() {
        let table = ShapeTable::new();
        for x in [-0.9f32, -0.3, 0.1, 0.55, 1.0] {
            let expected = curve(x + BIAS) - curve(BIAS);
            assert!((table.lookup(x) - expected).abs() < 1e-4);
        }
        // clamped beyond the table
        assert_eq!(table.lookup(3.0), table.lookup(1.0));
    }

    #[test]
    fn send_removes_dc_and_stays_small() {
        let sr = 48000.0;
        let mut exciter = Exciter::new(sr);
        exciter.set_send_gain(GAIN_PER_AMOUNT, 0.0);

        let mut sum = 0.0f32;
        let mut peak = 0.0f32;
        for n in 0..96000 {
            let x = 0.8 * libm::sinf(2.0 * PI * 220.0 * n as f32 / sr);
            let (l, r) = exciter.process_stereo(x, x);
            assert_eq!(l, r);
            if n >= 48000 {
                sum += l;
                peak = peak.max(l.abs());
            }
        }
        let mean = sum / 48000.0;
        assert!(mean.abs() < 1e-3, "dc left in send: {mean}");
        assert!(peak > 0.0 && peak < 0.15, "send peak {peak}");
    }

    #[test]
    fn closed_send_is_silent() {
        let mut exciter = Exciter::new(44100.0);
        for _ in 0..256 {
            assert_eq!(exciter.process_stereo(0.5, -0.5), (0.0, 0.0));
        }
    }
}

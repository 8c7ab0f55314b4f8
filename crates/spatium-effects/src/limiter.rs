//! Output peak limiter.
//!
//! A fast, hard-knee, high-ratio compressor detecting on `max(|L|, |R|)` so a
//! peak on either channel ducks both. The threshold ramps like every other
//! coefficient, which keeps preset changes from pumping.
//!
//! | Parameter | Value |
//! |-----------|-------|
//! | Threshold | -20..0 dB (configurable, default -1) |
//! | Ratio | 20:1 |
//! | Attack | 1 ms |
//! | Release | 10 ms |

use spatium_core::{Effect, EnvelopeFollower, SmoothedParam, db_to_linear, linear_to_db};

use crate::compressor::GainComputer;

/// Lowest accepted threshold in dB.
pub const MIN_THRESHOLD_DB: f32 = -20.0;
/// Highest accepted threshold in dB.
pub const MAX_THRESHOLD_DB: f32 = 0.0;

/// Stereo-linked peak limiter.
#[derive(Debug, Clone)]
pub struct Limiter {
    envelope: EnvelopeFollower,
    threshold_db: SmoothedParam,
}

impl Limiter {
    /// Ratio above the threshold
    pub const RATIO: f32 = 20.0;
    /// Detector attack
    pub const ATTACK_MS: f32 = 1.0;
    /// Detector release
    pub const RELEASE_MS: f32 = 10.0;

    /// Creates a limiter at `threshold_db`.
    pub fn new(sample_rate: f32, threshold_db: f32) -> Self {
        Self {
            envelope: EnvelopeFollower::with_times(sample_rate, Self::ATTACK_MS, Self::RELEASE_MS),
            threshold_db: SmoothedParam::with_config(
                threshold_db.clamp(MIN_THRESHOLD_DB, MAX_THRESHOLD_DB),
                sample_rate,
                100.0,
            ),
        }
    }

    /// Ramps the threshold toward `threshold_db`, clamped to [-20, 0].
    pub fn set_threshold_db(&mut self, threshold_db: f32, ramp_ms: f32) {
        self.threshold_db.set_smoothing_time_ms(ramp_ms);
        self.threshold_db
            .set_target(threshold_db.clamp(MIN_THRESHOLD_DB, MAX_THRESHOLD_DB));
    }

    /// Realized threshold.
    pub fn threshold_db(&self) -> f32 {
        self.threshold_db.get()
    }

    /// Jumps the threshold ramp to its target.
    pub fn snap(&mut self) {
        self.threshold_db.snap_to_target();
    }
}

impl Effect for Limiter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.process_stereo(input, input).0
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let curve = GainComputer {
            threshold_db: self.threshold_db.advance(),
            ratio: Self::RATIO,
            knee_db: 0.0,
        };
        let level = self.envelope.process(left.abs().max(right.abs()));
        let gain = db_to_linear(curve.gain_db(linear_to_db(level)));
        (left * gain, right * gain)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.envelope.set_sample_rate(sample_rate);
        self.threshold_db.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.envelope.reset();
        self.threshold_db.snap_to_target();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sustained_overs_are_held_near_threshold() {
        let mut lim = Limiter::new(48000.0, -6.0);
        let mut out = 0.0;
        for _ in 0..4800 {
            out = lim.process_stereo(1.0, 0.2).0;
        }
        // 6 dB over at 20:1 leaves 0.3 dB above threshold
        let out_db = linear_to_db(out);
        assert!((out_db - (-5.7)).abs() < 0.05, "settled at {out_db} dB");
    }

    #[test]
    fn right_channel_peak_ducks_left() {
        let mut lim = Limiter::new(48000.0, -12.0);
        let mut out = (0.0, 0.0);
        for _ in 0..4800 {
            out = lim.process_stereo(0.1, 1.0);
        }
        assert!(out.0 < 0.1 * 0.5, "left should be ducked, got {}", out.0);
    }

    #[test]
    fn threshold_is_clamped_and_ramped() {
        let mut lim = Limiter::new(48000.0, -40.0);
        assert_eq!(lim.threshold_db(), MIN_THRESHOLD_DB);
        lim.set_threshold_db(3.0, 100.0);
        lim.process_stereo(0.0, 0.0);
        assert!(lim.threshold_db() < -19.0);
        for _ in 0..96000 {
            lim.process_stereo(0.0, 0.0);
        }
        assert_eq!(lim.threshold_db(), MAX_THRESHOLD_DB);
    }

    #[test]
    fn below_threshold_is_transparent() {
        let mut lim = Limiter::new(44100.0, -1.0);
        for n in 0..4410 {
            let x = 0.5 * libm::sinf(n as f32 * 0.03);
            let (l, r) = lim.process_stereo(x, -x);
            assert_eq!((l, r), (x, -x));
        }
    }
}

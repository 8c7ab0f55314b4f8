//! Stereo-linked feed-forward compressor.
//!
//! # Signal Flow
//!
//! ```text
//! max(|L|,|R|) → Envelope Follower → dB → Gain Computer → gain on L and R
//!                                                       ↓
//!                                        dry/wet mix (ramped "normalize")
//! ```
//!
//! Peak detection over both channels sees antiphase content such as the
//! widener's side send, which a mid detector would cancel.
//!
//! The settings are fixed to those of a browser dynamics node left at its
//! defaults apart from threshold and ratio:
//!
//! | Parameter | Value |
//! |-----------|-------|
//! | Threshold | -24 dB |
//! | Ratio | 12:1 |
//! | Knee | 30 dB |
//! | Attack | 3 ms |
//! | Release | 250 ms |

use spatium_core::{Effect, EnvelopeFollower, SmoothedParam, db_to_linear, linear_to_db, wet_dry_mix};

/// Static compression curve with an optional quadratic soft knee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainComputer {
    /// Knee centre in dB
    pub threshold_db: f32,
    /// Slope above the knee, as N:1
    pub ratio: f32,
    /// Knee width in dB; 0 is a hard knee
    pub knee_db: f32,
}

impl GainComputer {
    /// Gain change in dB (always <= 0) for a detector level of `input_db`.
    #[inline]
    pub fn gain_db(&self, input_db: f32) -> f32 {
        let overshoot = input_db - self.threshold_db;
        let half_knee = self.knee_db * 0.5;
        let slope = 1.0 - 1.0 / self.ratio;

        if overshoot <= -half_knee {
            0.0
        } else if overshoot >= half_knee {
            -overshoot * slope
        } else {
            let k = overshoot + half_knee;
            -slope * k * k / (2.0 * self.knee_db)
        }
    }
}

/// Fixed-setting bus compressor with a ramped wet mix.
#[derive(Debug, Clone)]
pub struct Compressor {
    envelope: EnvelopeFollower,
    curve: GainComputer,
    mix: SmoothedParam,
    last_gain_reduction_db: f32,
}

impl Compressor {
    /// Fixed threshold in dB
    pub const THRESHOLD_DB: f32 = -24.0;
    /// Fixed ratio
    pub const RATIO: f32 = 12.0;
    /// Soft knee width in dB
    pub const KNEE_DB: f32 = 30.0;
    /// Detector attack
    pub const ATTACK_MS: f32 = 3.0;
    /// Detector release
    pub const RELEASE_MS: f32 = 250.0;

    /// Creates the compressor fully mixed in.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            envelope: EnvelopeFollower::with_times(sample_rate, Self::ATTACK_MS, Self::RELEASE_MS),
            curve: GainComputer {
                threshold_db: Self::THRESHOLD_DB,
                ratio: Self::RATIO,
                knee_db: Self::KNEE_DB,
            },
            mix: SmoothedParam::with_config(1.0, sample_rate, 100.0),
            last_gain_reduction_db: 0.0,
        }
    }

    /// Ramps the wet mix toward `mix` (0 = bypass, 1 = fully compressed).
    pub fn set_mix(&mut self, mix: f32, ramp_ms: f32) {
        self.mix.set_smoothing_time_ms(ramp_ms);
        self.mix.set_target(mix.clamp(0.0, 1.0));
    }

    /// Current wet mix.
    pub fn mix(&self) -> f32 {
        self.mix.get()
    }

    /// Gain reduction applied to the last sample, in dB (<= 0).
    pub fn gain_reduction_db(&self) -> f32 {
        self.last_gain_reduction_db
    }

    /// Jumps every ramp to its target.
    pub fn snap(&mut self) {
        self.mix.snap_to_target();
    }
}

impl Effect for Compressor {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.process_stereo(input, input).0
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let level = self.envelope.process(left.abs().max(right.abs()));
        let reduction_db = self.curve.gain_db(linear_to_db(level));
        self.last_gain_reduction_db = reduction_db;
        let gain = db_to_linear(reduction_db);
        let mix = self.mix.advance();

        (
            wet_dry_mix(left, left * gain, mix),
            wet_dry_mix(right, right * gain, mix),
        )
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.envelope.set_sample_rate(sample_rate);
        self.mix.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.envelope.reset();
        self.mix.snap_to_target();
        self.last_gain_reduction_db = 0.0;
    }
}

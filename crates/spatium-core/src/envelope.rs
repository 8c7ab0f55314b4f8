//! Peak envelope follower with separate attack and release.
//!
//! Drives the detectors of both dynamics stages. Each direction is a one-pole
//! smoother on the rectified input:
//!
//! ```text
//! coeff = exp(-1 / (time_ms * sample_rate / 1000))
//! env   = coeff * env + (1 - coeff) * |x|
//! ```

use libm::expf;

/// Tracks the amplitude of a signal.
///
/// # Example
///
/// ```rust
/// use spatium_core::EnvelopeFollower;
///
/// let mut env = EnvelopeFollower::with_times(48000.0, 3.0, 250.0);
/// for _ in 0..4800 {
///     env.process(0.5);
/// }
/// assert!((env.level() - 0.5).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f32,
    attack_ms: f32,
    release_ms: f32,
}

impl EnvelopeFollower {
    /// Creates a follower with explicit attack and release times.
    pub fn with_times(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        let mut follower = Self {
            envelope: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            attack_ms: attack_ms.max(0.1),
            release_ms: release_ms.max(1.0),
        };
        follower.recalculate_coefficients();
        follower
    }

    /// Recomputes both coefficients for a new rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coefficients();
    }

    /// Feeds one sample and returns the updated envelope.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let rectified = input.abs();
        let coeff = if rectified > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = crate::flush_denormal(coeff * self.envelope + (1.0 - coeff) * rectified);
        self.envelope
    }

    /// Current envelope without feeding a sample.
    #[inline]
    pub fn level(&self) -> f32 {
        self.envelope
    }

    /// Drops the envelope to zero.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = Self::time_to_coeff(self.attack_ms, self.sample_rate);
        self.release_coeff = Self::time_to_coeff(self.release_ms, self.sample_rate);
    }

    fn time_to_coeff(time_ms: f32, sample_rate: f32) -> f32 {
        let samples = time_ms * sample_rate / 1000.0;
        if samples < 1.0 {
            0.0
        } else {
            expf(-1.0 / samples)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_is_faster_than_release() {
        let mut env = EnvelopeFollower::with_times(48000.0, 1.0, 200.0);
        for _ in 0..480 {
            env.process(1.0);
        }
        let risen = env.level();
        assert!(risen > 0.99, "attack too slow: {risen}");

        for _ in 0..480 {
            env.process(0.0);
        }
        assert!(env.level() > 0.9, "release too fast: {}", env.level());
    }

    #[test]
    fn rectifies_negative_input() {
        let mut env = EnvelopeFollower::with_times(48000.0, 0.1, 100.0);
        for _ in 0..100 {
            env.process(-0.8);
        }
        assert!((env.level() - 0.8).abs() < 0.01);
    }

    #[test]
    fn times_are_floored() {
        // At 8 kHz the 0.1 ms attack floor is under a sample, the 1 ms release floor is 8
        let mut env = EnvelopeFollower::with_times(8000.0, 0.0, 0.0);
        assert_eq!(env.process(0.7), 0.7);
        let released = env.process(0.0);
        assert!(released > 0.6 && released < 0.7, "{released}");
    }

    #[test]
    fn sample_rate_change_keeps_times() {
        let mut env = EnvelopeFollower::with_times(48000.0, 5.0, 100.0);
        env.set_sample_rate(96000.0);
        // 5 ms at 96 kHz is 480 samples, one time constant
        for _ in 0..480 {
            env.process(1.0);
        }
        assert!((env.level() - (1.0 - (-1.0f32).exp())).abs() < 0.01, "{}", env.level());
    }

    #[test]
    fn reset_zeroes_level() {
        let mut env = EnvelopeFollower::with_times(44100.0, 10.0, 100.0);
        env.process(1.0);
        env.reset();
        assert_eq!(env.level(), 0.0);
    }
}

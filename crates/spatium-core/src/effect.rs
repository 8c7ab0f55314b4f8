//! The processing trait every graph stage implements.
//!
//! ## Design Decisions
//!
//! - **Mono core, stereo entry point**: [`Effect::process`] is the primitive for
//!   stateless or single-channel stages (the oversampled waveshaper). Stages
//!   that keep per-channel state or link their channels (EQ, Haas, panner,
//!   dynamics) override [`Effect::process_stereo`].
//! - **Object-safe**: `dyn Effect` works, though the engine stores its stages
//!   by value in a fixed record.
//! - **No allocations**: every method is callable from the render thread.

use crate::math::mono_sum;

/// Core trait for audio processing stages.
///
/// # Example
///
/// ```rust
/// use spatium_core::Effect;
///
/// struct Gain(f32);
///
/// impl Effect for Gain {
///     fn process(&mut self, input: f32) -> f32 {
///         input * self.0
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f32) {}
///
///     fn reset(&mut self) {}
/// }
///
/// let mut g = Gain(0.5);
/// assert_eq!(g.process_stereo(1.0, -1.0), (0.0, 0.0));
/// ```
pub trait Effect {
    /// Process a single mono sample.
    fn process(&mut self, input: f32) -> f32;

    /// Process one stereo frame.
    ///
    /// The default folds the frame to mono, processes it once, and returns the
    /// result on both channels. Stages with per-channel state must override it.
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let out = self.process(mono_sum(left, right));
        (out, out)
    }

    /// Process a block of mono samples.
    ///
    /// # Panics
    /// Debug builds assert `input.len() == output.len()`.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        for (inp, out) in input.iter().zip(output.iter_mut()) {
            *out = self.process(*inp);
        }
    }

    /// Process a stereo block in place.
    fn process_block_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (out_l, out_r) = self.process_stereo(*l, *r);
            *l = out_l;
            *r = out_r;
        }
    }

    /// Recompute sample-rate-dependent coefficients.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear internal state (filter history, delay lines) without touching parameters.
    fn reset(&mut self);

    /// Processing latency in samples. Most stages have none.
    fn latency_samples(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gain(f32);

    impl Effect for Gain {
        fn process(&mut self, input: f32) -> f32 {
            input * self.0
        }
        fn set_sample_rate(&mut self, _: f32) {}
        fn reset(&mut self) {}
    }

    struct Swap;

    impl Effect for Swap {
        fn process(&mut self, input: f32) -> f32 {
            input
        }
        fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
            (right, left)
        }
        fn set_sample_rate(&mut self, _: f32) {}
        fn reset(&mut self) {}
    }

    #[test]
    fn default_stereo_is_linked_mono() {
        let mut g = Gain(2.0);
        assert_eq!(g.process_stereo(1.0, 0.0), (1.0, 1.0));
    }

    #[test]
    fn block_mono_matches_per_sample() {
        let mut g = Gain(3.0);
        let input = [1.0, -2.0, 0.5];
        let mut output = [0.0; 3];
        g.process_block(&input, &mut output);
        assert_eq!(output, [3.0, -6.0, 1.5]);
    }

    #[test]
    fn block_stereo_uses_override() {
        let mut s = Swap;
        let mut left = [1.0, 2.0];
        let mut right = [3.0, 4.0];
        s.process_block_stereo(&mut left, &mut right);
        assert_eq!(left, [3.0, 4.0]);
        assert_eq!(right, [1.0, 2.0]);
    }

    #[test]
    fn default_latency_is_zero() {
        assert_eq!(Gain(1.0).latency_samples(), 0);
    }
}

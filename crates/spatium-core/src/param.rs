//! Exponential-approach parameter ramps.
//!
//! Every coefficient the control thread changes reaches the signal graph
//! through a [`SmoothedParam`]: the control side only ever moves the
//! *target*, and the render thread walks the live value toward it one sample
//! at a time. This is the classic "set target at time" automation curve:
//!
//! ```text
//! v[n] = v[n-1] + coeff * (target - v[n-1])
//! coeff = 1 - exp(-1 / (tau * sample_rate))
//! ```
//!
//! After one time constant the value has covered 63.2% of the distance; after
//! five it is within 0.7%.
//!
//! The remaining error is tracked relative to the target rather than by adding
//! ever smaller increments, because in `f32` a slow ramp toward a large target
//! would otherwise stall a few thousandths short of it. Once the error is
//! below [`SNAP_TOLERANCE`] (scaled by the target's magnitude) the value snaps
//! exactly onto the target.
//!
//! ## Usage
//!
//! ```rust
//! use spatium_core::SmoothedParam;
//!
//! // 100 ms time constant at 48 kHz
//! let mut gain = SmoothedParam::with_config(1.0, 48000.0, 100.0);
//! gain.set_target(0.5);
//!
//! for _ in 0..48000 {
//!     let _g = gain.advance();
//! }
//! assert!((gain.get() - 0.5).abs() < 1e-3);
//! ```

use libm::expf;

/// Relative error below which a ramp snaps onto its target.
pub const SNAP_TOLERANCE: f32 = 1e-6;

/// A scalar that ramps exponentially toward its target.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Current (realized) value
    current: f32,
    /// Value being approached
    target: f32,
    /// Per-sample step fraction (1.0 = instant)
    coeff: f32,
    sample_rate: f32,
    /// Time constant in milliseconds
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Create a parameter with no smoothing (changes apply instantly).
    ///
    /// Call [`set_sample_rate`](Self::set_sample_rate) and
    /// [`set_smoothing_time_ms`](Self::set_smoothing_time_ms) to enable ramps,
    /// or use [`with_config`](Self::with_config).
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 48000.0,
            smoothing_time_ms: 0.0,
        }
    }

    /// Create a parameter with a time constant already configured.
    ///
    /// # Arguments
    /// * `initial` - Starting (and target) value
    /// * `sample_rate` - Sample rate in Hz
    /// * `smoothing_time_ms` - Exponential time constant in milliseconds
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Move the target; the live value follows over the configured time constant.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump straight to `value` with no ramp.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Update the sample rate, keeping the time constant in milliseconds.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Change the time constant. Ramps already in flight continue at the new rate.
    ///
    /// Recomputes the coefficient only when the value actually changes, so it
    /// is cheap to call once per render block.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        if time_ms.to_bits() != self.smoothing_time_ms.to_bits() {
            self.smoothing_time_ms = time_ms;
            self.recalculate_coeff();
        }
    }

    /// Time constant in milliseconds.
    pub fn smoothing_time_ms(&self) -> f32 {
        self.smoothing_time_ms
    }

    /// Advance one sample and return the new live value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let error = (self.current - self.target) * (1.0 - self.coeff);
        self.current = if error.abs() <= SNAP_TOLERANCE * (1.0 + self.target.abs()) {
            self.target
        } else {
            self.target + error
        };
        self.current
    }

    /// Live value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True once the ramp has snapped onto its target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Finish the ramp immediately.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples_per_tau = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples_per_tau);
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

//! Haas-effect stereo widener.
//!
//! The mid signal is delayed by a few tens of milliseconds and folded into
//! the side channel: added to the left output and subtracted from the right.
//! Because the injection is antisymmetric there is no directional bias.
//!
//! A fixed delay alone leaves any tone whose period divides the delay in
//! phase with the dry path, where the side send only tilts the level. The
//! delay time therefore drifts by ±2 % on a slow sine, which keeps the side
//! signal's phase moving against the dry path at every frequency.
//!
//! ```text
//! d   = width * 30 ms * (1 + 0.02 * sin(2*pi * 0.5 Hz * t))
//! m_d = delay(0.5 * (L + R), d)
//! out = (+gain * m_d, -gain * m_d)          gain = width * 0.3
//! ```
//!
//! The stage outputs only the wet send; the graph sums it with the dry path.

use core::f32::consts::TAU;

use libm::sinf;
use spatium_core::{Effect, InterpolatedDelay, SmoothedParam, mono_sum};

/// Longest delay the line can hold, in milliseconds.
pub const MAX_DELAY_MS: f32 = 35.0;

/// Delay in ms at width 1.
pub const DELAY_PER_WIDTH_MS: f32 = 30.0;

/// Send gain at width 1.
pub const GAIN_PER_WIDTH: f32 = 0.3;

/// Delay drift as a fraction of the delay time.
pub const DRIFT_DEPTH: f32 = 0.02;

/// Delay drift rate in Hz.
pub const DRIFT_RATE_HZ: f32 = 0.5;

fn line_for(sample_rate: f32) -> InterpolatedDelay {
    InterpolatedDelay::from_time(sample_rate, MAX_DELAY_MS * (1.0 + DRIFT_DEPTH) / 1000.0)
}

/// Mid-to-side delayed send.
#[derive(Debug, Clone)]
pub struct HaasWidener {
    delay: InterpolatedDelay,
    /// Delay time in samples
    delay_samples: SmoothedParam,
    send: SmoothedParam,
    /// Drift phase in cycles
    drift_phase: f32,
    sample_rate: f32,
}

impl HaasWidener {
    /// Creates a silent widener (send 0) with its delay at `initial_delay_ms`.
    pub fn new(sample_rate: f32, initial_delay_ms: f32) -> Self {
        let delay_ms = initial_delay_ms.clamp(0.0, MAX_DELAY_MS);
        Self {
            delay: line_for(sample_rate),
            delay_samples: SmoothedParam::with_config(
                delay_ms * sample_rate / 1000.0,
                sample_rate,
                100.0,
            ),
            send: SmoothedParam::with_config(0.0, sample_rate, 100.0),
            drift_phase: 0.0,
            sample_rate,
        }
    }

    /// Ramps the delay toward `delay_ms` (clamped to the line's capacity).
    pub fn set_delay_ms(&mut self, delay_ms: f32, ramp_ms: f32) {
        let ms = delay_ms.clamp(0.0, MAX_DELAY_MS);
        self.delay_samples.set_smoothing_time_ms(ramp_ms);
        self.delay_samples.set_target(ms * self.sample_rate / 1000.0);
    }

    /// Ramps the send gain toward `gain`.
    pub fn set_send_gain(&mut self, gain: f32, ramp_ms: f32) {
        self.send.set_smoothing_time_ms(ramp_ms);
        self.send.set_target(gain);
    }

    /// Realized delay in milliseconds, before drift.
    pub fn delay_ms(&self) -> f32 {
        self.delay_samples.get() * 1000.0 / self.sample_rate
    }

    /// Realized send gain.
    pub fn send_gain(&self) -> f32 {
        self.send.get()
    }

    /// Finishes any ramp in flight.
    pub fn snap(&mut self) {
        self.delay_samples.snap_to_target();
        self.send.snap_to_target();
    }
}

impl Effect for HaasWidener {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.process_stereo(input, input).0
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let drift = 1.0 + DRIFT_DEPTH * sinf(TAU * self.drift_phase);
        self.drift_phase += DRIFT_RATE_HZ / self.sample_rate;
        if self.drift_phase >= 1.0 {
            self.drift_phase -= 1.0;
        }
        let delay = self.delay_samples.advance() * drift;
        let gain = self.send.advance();
        let delayed_mid = self.delay.write_read(mono_sum(left, right), delay);
        let side = gain * delayed_mid;
        (side, -side)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        let delay_ms = self.delay_samples.target() * 1000.0 / self.sample_rate;
        self.sample_rate = sample_rate;
        self.delay = line_for(sample_rate);
        self.delay_samples.set_sample_rate(sample_rate);
        self.delay_samples
            .set_immediate(delay_ms * sample_rate / 1000.0);
        self.send.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.delay.clear();
        self.drift_phase = 0.0;
        self.snap();
    }
}

//! Fractional delay line on a circular buffer.
//!
//! Used wherever the graph needs a delay that can move smoothly while audio
//! runs: the Haas widener's ramped delay time and the panner's interaural time
//! difference.
//!
//! | Stage | Delay range | Moves while playing |
//! |-------|-------------|---------------------|
//! | Haas widener | 0-30 ms | Yes (ramped width) |
//! | Panner ITD | 0-0.7 ms | Yes (animated azimuth) |

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Interpolation method for fractional delay reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Linear interpolation between two samples
    #[default]
    Linear,
    /// 4-point Hermite interpolation (smoother under modulation).
    /// Reads under one sample fall back to linear, since the newest sample
    /// has no successor.
    Cubic,
}

/// Interpolated delay line (heap-allocated once, never reallocated).
///
/// Reads are relative to the most recently written sample: after
/// [`write`](Self::write), `read(0.0)` returns that sample and `read(1.0)`
/// the one before it.
///
/// # Example
///
/// ```rust
/// use spatium_core::InterpolatedDelay;
///
/// // 30 ms at 48 kHz
/// let mut delay = InterpolatedDelay::from_time(48000.0, 0.030);
/// delay.write(1.0);
/// delay.write(0.0);
/// assert_eq!(delay.read(1.0), 1.0);
/// assert_eq!(delay.read(0.5), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct InterpolatedDelay {
    buffer: Vec<f32>,
    /// Index of the next write
    write_pos: usize,
    interpolation: Interpolation,
}

impl InterpolatedDelay {
    /// Creates a delay line holding up to `max_delay_samples` of history.
    ///
    /// # Panics
    ///
    /// Panics if `max_delay_samples` is 0.
    pub fn new(max_delay_samples: usize) -> Self {
        assert!(max_delay_samples > 0, "Delay size must be > 0");

        // Cubic reads need one sample beyond the requested delay
        Self {
            buffer: vec![0.0; max_delay_samples + 2],
            write_pos: 0,
            interpolation: Interpolation::Linear,
        }
    }

    /// Creates a delay line sized for `max_seconds` at `sample_rate`.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        let max_samples = (sample_rate * max_seconds) as usize + 1;
        Self::new(max_samples)
    }

    /// Sets the interpolation used by [`read`](Self::read).
    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    /// Reads `delay_samples` (fractional) behind the most recent write.
    ///
    /// Delays beyond the capacity are clamped to it.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(0.0, (len - 3) as f32);

        let delay_int = delay as usize;
        let frac = delay - delay_int as f32;

        // Most recent sample lives at write_pos - 1
        let newer = (self.write_pos + len - delay_int - 1) % len;
        let older = (newer + len - 1) % len;

        match self.interpolation {
            Interpolation::Cubic if delay_int > 0 => {
                let y0 = self.buffer[(newer + 1) % len];
                let y1 = self.buffer[newer];
                let y2 = self.buffer[older];
                let y3 = self.buffer[(older + len - 1) % len];

                let t = frac;
                let c1 = 0.5 * (y2 - y0);
                let c2 = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
                let c3 = 0.5 * (y3 - y0) + 1.5 * (y1 - y2);

                ((c3 * t + c2) * t + c1) * t + y1
            }
            _ => {
                let a = self.buffer[newer];
                let b = self.buffer[older];
                a + (b - a) * frac
            }
        }
    }

    /// Writes one sample and advances.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Writes `sample`, then reads `delay_samples` behind it.
    #[inline]
    pub fn write_read(&mut self, sample: f32, delay_samples: f32) -> f32 {
        self.write(sample);
        self.read(delay_samples)
    }

    /// Zeroes the history.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Largest delay in samples a read can reach.
    pub fn capacity(&self) -> usize {
        self.buffer.len() - 3
    }
}

//! Synthetic room impulse response.
//!
//! Two seconds of exponentially decaying noise per channel, with a short
//! low-frequency swell in the first 50 ms standing in for early reflections:
//!
//! ```text
//! decay = exp(-i / (sr * 0.5))
//! v     = noise() * decay                      noise uniform in [-1, 1)
//! v    += sin(i / 100) * decay * 0.5           only while i < sr * 0.05
//! ```
//!
//! Each channel draws its own noise, which is what makes the reverb tail
//! decorrelate the two outputs. A seed makes the buffer reproducible.

use std::collections::TryReserveError;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Length of the generated response in seconds.
pub const DURATION_SECONDS: f32 = 2.0;

/// Decay time constant in seconds.
const DECAY_SECONDS: f32 = 0.5;

/// Length of the early-reflection swell in seconds.
const EARLY_SECONDS: f32 = 0.05;

/// Errors raised while building the impulse response or its convolver.
#[derive(Debug, Error)]
pub enum ImpulseError {
    /// Sample rate was zero, negative or not finite
    #[error("invalid sample rate for impulse response: {0}")]
    InvalidSampleRate(f32),

    /// The response buffer could not be reserved
    #[error("failed to allocate impulse response: {0}")]
    Allocation(#[from] TryReserveError),

    /// Convolution block size was not a power of two
    #[error("convolution FFT size must be a power of two, got {0}")]
    InvalidFftSize(usize),
}

/// Stereo impulse response, owned by the convolver once built.
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    channels: [Vec<f32>; 2],
    sample_rate: f32,
}

impl ImpulseResponse {
    /// Generates the response for `sample_rate`.
    ///
    /// With `seed: None` the noise comes from OS entropy and every engine
    /// gets a different room.
    pub fn generate(sample_rate: f32, seed: Option<u64>) -> Result<Self, ImpulseError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ImpulseError::InvalidSampleRate(sample_rate));
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let len = (sample_rate * DURATION_SECONDS) as usize;
        let early = sample_rate * EARLY_SECONDS;
        let decay_samples = sample_rate * DECAY_SECONDS;

        let mut channels = [Vec::new(), Vec::new()];
        for channel in &mut channels {
            channel.try_reserve_exact(len)?;
            for i in 0..len {
                let t = i as f32;
                let decay = libm::expf(-t / decay_samples);
                let mut v = rng.gen_range(-1.0f32..1.0) * decay;
                if t < early {
                    v += libm::sinf(t / 100.0) * decay * 0.5;
                }
                channel.push(v);
            }
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Builds a response from explicit channel data (both channels must
    /// have the same length; the shorter one is zero-padded).
    pub fn from_channels(left: Vec<f32>, right: Vec<f32>, sample_rate: f32) -> Self {
        let len = left.len().max(right.len());
        let mut channels = [left, right];
        for channel in &mut channels {
            channel.resize(len, 0.0);
        }
        Self {
            channels,
            sample_rate,
        }
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// True when the response has no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rate the response was generated for.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Channel data; index 0 is left, anything else right.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index.min(1)]
    }

    /// Loudness normalization applied by the convolver.
    ///
    /// ```text
    /// power = max(sqrt(sum(x^2) / (channels * len)), 1.25e-4)
    /// scale = (1 / power) * 0.00125 * (44100 / sample_rate)
    /// ```
    pub fn normalization_scale(&self) -> f32 {
        const GAIN_CALIBRATION: f32 = 0.00125;
        const MIN_POWER: f32 = 0.000125;

        let len = self.len();
        if len == 0 {
            return 1.0;
        }

        let sum_squares: f64 = self
            .channels
            .iter()
            .flat_map(|c| c.iter())
            .map(|&x| f64::from(x) * f64::from(x))
            .sum();
        let power = ((sum_squares / (2 * len) as f64).sqrt() as f32).max(MIN_POWER);

        (1.0 / power) * GAIN_CALIBRATION * (44100.0 / self.sample_rate)
    }
}

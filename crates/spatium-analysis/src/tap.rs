//! Render-to-control analysis tap.
//!
//! The render thread owns a [`TapWriter`] and pushes the post-output mono mix
//! into a fixed ring of [`TAP_CAPACITY`] slots. Each slot is an `f32` bit-cast
//! into an `AtomicU32`, and the running write count is published with
//! `Release` after every block. The control thread owns the matching
//! [`Analyser`], which copies the most recent frame out of the ring and turns
//! it into browser-style byte or float snapshots.
//!
//! Neither side locks or allocates on the render path. A reader racing the
//! writer can observe a frame that straddles two blocks; snapshots are
//! visualization data and tolerate that.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use spatium_core::linear_to_db;
use thiserror::Error;

use crate::fft::{Fft, Window};

/// Samples retained by the ring; also the largest analysis frame.
pub const TAP_CAPACITY: usize = 32768;

/// Smallest accepted FFT size.
pub const MIN_FFT_SIZE: usize = 32;

/// FFT size the analyser starts with.
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Default smoothing time constant between successive spectra.
pub const DEFAULT_SMOOTHING: f32 = 0.8;

/// Level mapped to byte 0.
pub const MIN_DB: f32 = -100.0;
/// Level mapped to byte 255.
pub const MAX_DB: f32 = -30.0;

/// Errors raised when configuring an [`Analyser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Size outside [32, 32768] or not a power of two
    #[error("analysis FFT size must be a power of two in [32, 32768], got {0}")]
    InvalidFftSize(usize),
}

/// True for powers of two in `[MIN_FFT_SIZE, TAP_CAPACITY]`.
pub fn is_valid_fft_size(size: usize) -> bool {
    size.is_power_of_two() && (MIN_FFT_SIZE..=TAP_CAPACITY).contains(&size)
}

struct Ring {
    slots: Box<[AtomicU32]>,
    /// Total samples written, wrapping
    written: AtomicUsize,
}

impl Ring {
    fn new() -> Self {
        Self {
            slots: (0..TAP_CAPACITY).map(|_| AtomicU32::new(0)).collect(),
            written: AtomicUsize::new(0),
        }
    }
}

/// Creates a connected writer/analyser pair with the default FFT size.
pub fn analysis_tap() -> (TapWriter, Analyser) {
    let ring = Arc::new(Ring::new());
    (
        TapWriter {
            ring: Arc::clone(&ring),
            position: 0,
        },
        Analyser::new(ring),
    )
}

/// Render-side half of the tap.
pub struct TapWriter {
    ring: Arc<Ring>,
    position: usize,
}

impl TapWriter {
    /// Pushes the mono mix `(L+R)/2` of a stereo block and publishes it.
    pub fn push_stereo(&mut self, left: &[f32], right: &[f32]) {
        let mask = TAP_CAPACITY - 1;
        for (&l, &r) in left.iter().zip(right) {
            let sample = (l + r) * 0.5;
            self.ring.slots[self.position & mask].store(sample.to_bits(), Ordering::Relaxed);
            self.position = self.position.wrapping_add(1);
        }
        self.ring.written.store(self.position, Ordering::Release);
    }
}

impl std::fmt::Debug for TapWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapWriter")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// Control-side half of the tap.
///
/// Mirrors the semantics of a browser `AnalyserNode`: Blackman-windowed FFT,
/// `|X|/N` magnitudes smoothed against the previous spectrum, dB conversion,
/// and a linear byte mapping of `[MIN_DB, MAX_DB]` onto `0..=255`.
pub struct Analyser {
    ring: Arc<Ring>,
    fft: Fft,
    frame: Vec<f32>,
    magnitudes: Vec<f32>,
    smoothed: Vec<f32>,
    smoothing: f32,
}

impl Analyser {
    fn new(ring: Arc<Ring>) -> Self {
        let fft = Fft::new(DEFAULT_FFT_SIZE, Window::Blackman);
        let bins = fft.bin_count();
        Self {
            ring,
            fft,
            frame: vec![0.0; DEFAULT_FFT_SIZE],
            magnitudes: vec![0.0; bins],
            smoothed: vec![0.0; bins],
            smoothing: DEFAULT_SMOOTHING,
        }
    }

    /// Current FFT size.
    pub fn fft_size(&self) -> usize {
        self.fft.size()
    }

    /// Number of frequency bins, `fft_size / 2`.
    pub fn frequency_bin_count(&self) -> usize {
        self.fft.bin_count()
    }

    /// Changes the analysis frame length. Clears the smoothing history.
    pub fn set_fft_size(&mut self, size: usize) -> Result<(), AnalysisError> {
        if !is_valid_fft_size(size) {
            return Err(AnalysisError::InvalidFftSize(size));
        }
        self.fft.resize(size);
        self.frame.resize(size, 0.0);
        let bins = self.fft.bin_count();
        self.magnitudes.resize(bins, 0.0);
        self.smoothed.clear();
        self.smoothed.resize(bins, 0.0);
        Ok(())
    }

    /// Time constant in [0, 1) blending each spectrum with the previous one.
    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 0.999);
    }

    /// Smoothing time constant between snapshots.
    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// Copies the newest `fft_size` samples out of the ring, oldest first.
    fn capture(&mut self) {
        let mask = TAP_CAPACITY - 1;
        let end = self.ring.written.load(Ordering::Acquire);
        let start = end.wrapping_sub(self.frame.len());
        for (i, out) in self.frame.iter_mut().enumerate() {
            let slot = start.wrapping_add(i) & mask;
            *out = f32::from_bits(self.ring.slots[slot].load(Ordering::Relaxed));
        }
    }

    /// Captures a frame and folds its spectrum into the smoothing history.
    fn update_spectrum(&mut self) {
        self.capture();
        self.fft.magnitudes(&self.frame, &mut self.magnitudes);
        let k = self.smoothing;
        for (smoothed, &mag) in self.smoothed.iter_mut().zip(&self.magnitudes) {
            let next = k * *smoothed + (1.0 - k) * mag;
            *smoothed = if next.is_finite() { next } else { 0.0 };
        }
    }

    /// Smoothed spectrum in dB, `fft_size / 2` bins.
    pub fn frequency_db(&mut self) -> Vec<f32> {
        self.update_spectrum();
        self.smoothed.iter().map(|&m| linear_to_db(m)).collect()
    }

    /// Smoothed spectrum as bytes, `[MIN_DB, MAX_DB]` mapped onto `0..=255`.
    pub fn frequency_bytes(&mut self) -> Vec<u8> {
        self.update_spectrum();
        let scale = 255.0 / (MAX_DB - MIN_DB);
        self.smoothed
            .iter()
            .map(|&m| {
                let scaled = (linear_to_db(m) - MIN_DB) * scale;
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    /// Newest `fft_size` samples.
    pub fn time_domain_f32(&mut self) -> Vec<f32> {
        self.capture();
        self.frame.clone()
    }

    /// Newest `fft_size` samples as bytes, `128 * (1 + x)` clamped to `0..=255`.
    pub fn time_domain_bytes(&mut self) -> Vec<u8> {
        self.capture();
        self.frame
            .iter()
            .map(|&x| (128.0 * (1.0 + x)).clamp(0.0, 255.0) as u8)
            .collect()
    }
}

impl std::fmt::Debug for Analyser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyser")
            .field("fft", &self.fft)
            .field("smoothing", &self.smoothing)
            .finish_non_exhaustive()
    }
}

/// Mean of a byte spectrum, normalized to [0, 1].
///
/// Hosts use this to drive `animate_spatial_position` from a frequency snapshot.
pub fn mean_intensity(bytes: &[u8]) -> f32 {
    if bytes.is_empty() {
        return 0.0;
    }
    let sum: u64 = bytes.iter().map(|&b| u64::from(b)).sum();
    sum as f32 / (bytes.len() as f32 * 255.0)
}

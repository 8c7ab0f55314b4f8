//! Spatium Analysis - The engine's spectrum and waveform tap
//!
//! - [`fft`] - Windowed magnitude FFT with preallocated buffers
//! - [`tap`] - Lock-free render-side ring and the control-side [`Analyser`]
//!
//! The analyser reproduces the snapshot encoding hosts expect from a browser
//! analyser node, so visualizers written against that format work unchanged.
//!
//! ## Example
//!
//! ```rust
//! use spatium_analysis::{analysis_tap, mean_intensity};
//!
//! let (mut writer, mut analyser) = analysis_tap();
//!
//! // render thread
//! let block = [0.25f32; 128];
//! writer.push_stereo(&block, &block);
//!
//! // control thread
//! let spectrum = analyser.frequency_bytes();
//! assert_eq!(spectrum.len(), analyser.frequency_bin_count());
//! let intensity = mean_intensity(&spectrum);
//! assert!((0.0..=1.0).contains(&intensity));
//! ```

pub mod fft;
pub mod tap;

pub use fft::{Fft, Window};
pub use tap::{
    AnalysisError, Analyser, DEFAULT_FFT_SIZE, MIN_FFT_SIZE, TAP_CAPACITY, TapWriter,
    analysis_tap, is_valid_fft_size, mean_intensity,
};

/// Result type for analyser configuration.
pub type Result<T> = std::result::Result<T, AnalysisError>;

//! Spatium Effects - the stages of the spatial enhancement graph
//!
//! Each stage implements [`spatium_core::Effect`] with a stereo override and
//! owns the ramps for its own coefficients:
//!
//! - [`FiveBandEq`] - Shelf/peak tone shaping at 60 Hz, 200 Hz, 1 kHz, 4 kHz, 12 kHz
//! - [`HaasWidener`] - Delayed mid folded into the side channel
//! - [`Convolver`] - Partitioned FFT convolution against an [`ImpulseResponse`]
//! - [`Exciter`] - Oversampled asymmetric waveshaper send
//! - [`Panner3d`] - Distance, equal-power azimuth, ITD and elevation tilt
//! - [`Compressor`] / [`Limiter`] - Stereo-linked dynamics
//!
//! ## Example
//!
//! ```rust
//! use spatium_core::Effect;
//! use spatium_effects::{Convolver, ImpulseResponse};
//!
//! let ir = ImpulseResponse::generate(48000.0, Some(1)).unwrap();
//! let mut reverb = Convolver::new(&ir).unwrap();
//! reverb.set_send_gain(0.4, 100.0);
//! let (_l, _r) = reverb.process_stereo(0.5, 0.5);
//! ```

pub mod compressor;
pub mod convolver;
pub mod eq;
pub mod exciter;
pub mod haas;
pub mod impulse;
pub mod limiter;
pub mod panner;

pub use compressor::{Compressor, GainComputer};
pub use convolver::Convolver;
pub use eq::{BAND_COUNT, BAND_FREQUENCIES, FiveBandEq};
pub use exciter::{Exciter, ShapeTable};
pub use haas::HaasWidener;
pub use impulse::{ImpulseError, ImpulseResponse};
pub use limiter::Limiter;
pub use panner::Panner3d;

/// Result type for impulse-response and convolver construction.
pub type Result<T> = std::result::Result<T, ImpulseError>;

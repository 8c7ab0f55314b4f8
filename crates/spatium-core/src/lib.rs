//! Spatium Core - DSP primitives for the spatial audio engine
//!
//! This crate holds the allocation-free building blocks the engine's signal
//! graph is assembled from. Everything here is safe to call from a real-time
//! render thread once constructed.
//!
//! # Core Abstractions
//!
//! - [`Effect`] - Object-safe processing trait with a linked stereo entry point
//! - [`SmoothedParam`] - Exponential-approach parameter ramp (one-pole)
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//!   ([`low_shelf_coefficients`], [`peaking_eq_coefficients`], [`high_shelf_coefficients`])
//! - [`OnePole`] - 6 dB/oct lowpass used for spectral tilts
//! - [`DcBlocker`] - First-order DC removal after asymmetric shaping
//!
//! ## Delay Lines
//!
//! - [`InterpolatedDelay`] - Fractional delay on a circular buffer
//!
//! ## Dynamics
//!
//! - [`EnvelopeFollower`] - Peak envelope with attack/release ballistics
//!
//! ## Anti-Aliasing
//!
//! - [`Oversampled`] - Runs a nonlinear effect at 4× the base rate
//!
//! # no_std Support
//!
//! Disable the default `std` feature to build for embedded targets:
//!
//! ```toml
//! [dependencies]
//! spatium-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod dc_blocker;
pub mod delay;
pub mod effect;
pub mod envelope;
pub mod math;
pub mod one_pole;
pub mod oversample;
pub mod param;

pub use biquad::{
    Biquad, Coefficients, high_shelf_coefficients, low_shelf_coefficients,
    peaking_eq_coefficients,
};
pub use dc_blocker::DcBlocker;
pub use delay::{InterpolatedDelay, Interpolation};
pub use effect::Effect;
pub use envelope::EnvelopeFollower;
pub use math::{db_to_linear, flush_denormal, linear_to_db, mono_sum, sanitize, wet_dry_mix};
pub use one_pole::OnePole;
pub use oversample::{OVERSAMPLE_FACTOR, Oversampled};
pub use param::SmoothedParam;

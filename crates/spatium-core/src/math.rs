//! Scalar helpers shared by the processing stages.
//!
//! All functions are allocation-free and `no_std` friendly.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Utilities
//!
//! - [`wet_dry_mix`] / [`mono_sum`] - Crossfades and downmix
//! - [`flush_denormal`] / [`sanitize`] - Keep the render path free of subnormals and NaN

use libm::{expf, logf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use spatium_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Input is floored at 1e-10 (-200 dB) so silence maps to a finite value.
///
/// # Example
/// ```rust
/// use spatium_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Flush values below 1e-20 to zero.
///
/// Recursive filters and decaying tails drift into the subnormal range,
/// which is dramatically slower on most CPUs.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Replace non-finite samples with silence and flush subnormals.
///
/// Applied to every sample pulled from an external source. One NaN would
/// otherwise poison every recursive stage downstream.
#[inline]
pub fn sanitize(x: f32) -> f32 {
    if x.is_finite() { flush_denormal(x) } else { 0.0 }
}

/// Crossfade between dry and wet signals: `dry + (wet - dry) * mix`.
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + (wet - dry) * mix
}

/// Average two channels to mono.
#[inline]
pub fn mono_sum(left: f32, right: f32) -> f32 {
    (left + right) * 0.5
}

//! Range rules for every numeric field.
//!
//! Out-of-range values are clamped and logged at `warn`; non-finite values
//! are rejected with [`ConfigError::NonFinite`]. Setters, preset merges, and
//! TOML-loaded configs all go through these functions, so a stored
//! [`EngineConfig`] is always in range.

use tracing::warn;

use crate::config::EngineConfig;
use crate::error::{ConfigError, Result};

/// Lowest EQ band gain in dB.
pub const EQ_MIN_DB: f32 = -12.0;
/// Highest EQ band gain in dB.
pub const EQ_MAX_DB: f32 = 12.0;
/// Lowest limiter threshold in dB.
pub const LIMITER_MIN_DB: f32 = -20.0;
/// Highest limiter threshold in dB.
pub const LIMITER_MAX_DB: f32 = 0.0;

/// Clamps `value` into `[min, max]`, warning when it had to move.
pub fn clamp_field(field: &str, value: f32, min: f32, max: f32) -> Result<f32> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite {
            field: field.to_string(),
            value,
        });
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(field, requested = value, clamped, "value out of range, clamped");
    }
    Ok(clamped)
}

/// EQ band gain, [-12, 12] dB.
pub fn clamp_eq_db(field: &str, value: f32) -> Result<f32> {
    clamp_field(field, value, EQ_MIN_DB, EQ_MAX_DB)
}

/// Normalized spatial or enhancement control, [0, 1].
pub fn clamp_unit(field: &str, value: f32) -> Result<f32> {
    clamp_field(field, value, 0.0, 1.0)
}

/// Limiter threshold, [-20, 0] dB.
pub fn clamp_limiter_db(field: &str, value: f32) -> Result<f32> {
    clamp_field(field, value, LIMITER_MIN_DB, LIMITER_MAX_DB)
}

/// Brings every field of `config` into range.
///
/// Fails on the first non-finite field, leaving `config` partially clamped;
/// callers validate a copy.
pub fn sanitize(config: &mut EngineConfig) -> Result<()> {
    for (name, value) in config.eq.fields_mut() {
        *value = clamp_eq_db(&format!("eq.{name}"), *value)?;
    }
    for (name, value) in config.spatial.fields_mut() {
        *value = clamp_unit(&format!("spatial.{name}"), *value)?;
    }
    for (name, value) in config.enhancement.fields_mut() {
        *value = clamp_unit(&format!("enhancement.{name}"), *value)?;
    }
    config.dynamics.limiter_threshold_db = clamp_limiter_db(
        "dynamics.limiter_threshold_db",
        config.dynamics.limiter_threshold_db,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_values_pass_through() {
        assert_eq!(clamp_eq_db("eq.mid", 3.5).unwrap(), 3.5);
        assert_eq!(clamp_unit("spatial.width", 0.0).unwrap(), 0.0);
        assert_eq!(clamp_limiter_db("dynamics.limiter_threshold_db", -1.0).unwrap(), -1.0);
    }

    #[test]
    fn out_of_range_values_clamp() {
        assert_eq!(clamp_eq_db("eq.sub", 40.0).unwrap(), EQ_MAX_DB);
        assert_eq!(clamp_eq_db("eq.sub", -40.0).unwrap(), EQ_MIN_DB);
        assert_eq!(clamp_unit("spatial.depth", 1.5).unwrap(), 1.0);
        assert_eq!(clamp_unit("spatial.depth", -0.5).unwrap(), 0.0);
        assert_eq!(clamp_limiter_db("x", 6.0).unwrap(), 0.0);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = clamp_unit("spatial.height", bad).unwrap_err();
            assert!(matches!(err, ConfigError::NonFinite { ref field, .. } if field == "spatial.height"));
        }
    }

    #[test]
    fn sanitize_clamps_every_group() {
        let mut config = EngineConfig::default();
        config.eq.treble = 20.0;
        config.spatial.room_size = 2.0;
        config.enhancement.warmth = -1.0;
        config.dynamics.limiter_threshold_db = -60.0;
        sanitize(&mut config).unwrap();
        assert_eq!(config.eq.treble, 12.0);
        assert_eq!(config.spatial.room_size, 1.0);
        assert_eq!(config.enhancement.warmth, 0.0);
        assert_eq!(config.dynamics.limiter_threshold_db, -20.0);
    }

    #[test]
    fn sanitize_names_the_bad_field() {
        let mut config = EngineConfig::default();
        config.spatial.distance = f32::NAN;
        let err = sanitize(&mut config).unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite { ref field, .. } if field == "spatial.distance"));
    }
}

//! Configuration and preset management for the spatium engine.
//!
//! [`EngineConfig`] is the engine's only externally visible state. Every
//! numeric field has a fixed range, and every path that writes one (typed
//! setters, dotted [`ParameterKey`]s, preset merges, TOML files) clamps
//! through [`validation`] so a stored config is always in range.
//!
//! # Features
//!
//! - **Typed config**: EQ, spatial, enhancement, and dynamics groups with serde/TOML support
//! - **Named keys**: `eq.highMid` / `spatial.room_size` style keys, camelCase or snake_case
//! - **Presets**: partial overrides merged field by field, loadable from TOML
//! - **Factory Presets**: music, cinema, vocal, custom
//!
//! # Example
//!
//! ```rust
//! use spatium_config::{EngineConfig, ParameterKey, PresetId, PresetTable};
//!
//! let mut config = EngineConfig::default();
//! PresetTable::factory().merge(PresetId::Cinema, &mut config).unwrap();
//! assert_eq!(config.spatial.width, 0.9);
//!
//! let key: ParameterKey = "eq.highMid".parse().unwrap();
//! assert_eq!(config.set_parameter(key, 20.0).unwrap(), 12.0);
//!
//! let text = config.to_toml().unwrap();
//! assert_eq!(EngineConfig::from_toml(&text).unwrap(), config);
//! ```

mod config;
mod error;
mod preset;

/// Range rules and clamping.
pub mod validation;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use config::{
    DynamicsSettings, EngineConfig, EnhancementParam, EnhancementSettings, EqBand, EqSettings,
    ParameterKey, SpatialParam, SpatialSettings,
};
pub use error::{ConfigError, Result};
pub use factory_presets::factory_table;
pub use preset::{
    EnhancementOverride, EqOverride, PresetId, PresetOverride, PresetTable, SpatialOverride,
};
pub use validation::{EQ_MAX_DB, EQ_MIN_DB, LIMITER_MAX_DB, LIMITER_MIN_DB};

//! The engine's externally visible state and its named parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ConfigError, Result};
use crate::preset::{PresetId, PresetOverride};
use crate::validation::{clamp_eq_db, clamp_limiter_db, clamp_unit, sanitize};

/// Lowercases and strips underscores so `highMid`, `high_mid` and `HIGH_MID` compare equal.
fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|&c| c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// One of the five EQ bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EqBand {
    /// Low shelf at 60 Hz
    Sub,
    /// Peak at 200 Hz
    Bass,
    /// Peak at 1 kHz
    Mid,
    /// Peak at 4 kHz
    HighMid,
    /// High shelf at 12 kHz
    Treble,
}

impl EqBand {
    /// Bands in filter order.
    pub const ALL: [EqBand; 5] = [
        EqBand::Sub,
        EqBand::Bass,
        EqBand::Mid,
        EqBand::HighMid,
        EqBand::Treble,
    ];

    /// Position in the filter chain.
    pub fn index(self) -> usize {
        self as usize
    }

    /// snake_case field name.
    pub fn name(self) -> &'static str {
        match self {
            EqBand::Sub => "sub",
            EqBand::Bass => "bass",
            EqBand::Mid => "mid",
            EqBand::HighMid => "high_mid",
            EqBand::Treble => "treble",
        }
    }
}

impl FromStr for EqBand {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let folded = fold_key(s);
        EqBand::ALL
            .into_iter()
            .find(|band| fold_key(band.name()) == folded)
            .ok_or_else(|| ConfigError::unknown_key("eq band", s))
    }
}

impl fmt::Display for EqBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the normalized spatial controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialParam {
    /// Haas delay and send
    Width,
    /// Reverb send against the dry path
    Depth,
    /// Source elevation
    Height,
    /// Stored only
    RoomSize,
    /// Source distance
    Distance,
}

impl SpatialParam {
    /// All spatial controls.
    pub const ALL: [SpatialParam; 5] = [
        SpatialParam::Width,
        SpatialParam::Depth,
        SpatialParam::Height,
        SpatialParam::RoomSize,
        SpatialParam::Distance,
    ];

    /// snake_case field name.
    pub fn name(self) -> &'static str {
        match self {
            SpatialParam::Width => "width",
            SpatialParam::Depth => "depth",
            SpatialParam::Height => "height",
            SpatialParam::RoomSize => "room_size",
            SpatialParam::Distance => "distance",
        }
    }
}

impl FromStr for SpatialParam {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let folded = fold_key(s);
        SpatialParam::ALL
            .into_iter()
            .find(|p| fold_key(p.name()) == folded)
            .ok_or_else(|| ConfigError::unknown_key("spatial parameter", s))
    }
}

impl fmt::Display for SpatialParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the normalized enhancement controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnhancementParam {
    /// Harmonic exciter send
    Exciter,
    /// Stored only
    Clarity,
    /// Stored only
    Warmth,
}

impl EnhancementParam {
    /// All enhancement controls.
    pub const ALL: [EnhancementParam; 3] = [
        EnhancementParam::Exciter,
        EnhancementParam::Clarity,
        EnhancementParam::Warmth,
    ];

    /// snake_case field name.
    pub fn name(self) -> &'static str {
        match self {
            EnhancementParam::Exciter => "exciter",
            EnhancementParam::Clarity => "clarity",
            EnhancementParam::Warmth => "warmth",
        }
    }
}

impl FromStr for EnhancementParam {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let folded = fold_key(s);
        EnhancementParam::ALL
            .into_iter()
            .find(|p| fold_key(p.name()) == folded)
            .ok_or_else(|| ConfigError::unknown_key("enhancement parameter", s))
    }
}

impl fmt::Display for EnhancementParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dotted parameter key such as `eq.highMid` or `spatial.room_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKey {
    /// `eq.<band>`
    Eq(EqBand),
    /// `spatial.<param>`
    Spatial(SpatialParam),
    /// `enhancement.<param>`
    Enhancement(EnhancementParam),
}

impl FromStr for ParameterKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let Some((group, field)) = s.split_once('.') else {
            return Err(ConfigError::unknown_key("parameter", s));
        };
        match fold_key(group).as_str() {
            "eq" => field.parse().map(ParameterKey::Eq),
            "spatial" => field.parse().map(ParameterKey::Spatial),
            "enhancement" => field.parse().map(ParameterKey::Enhancement),
            _ => Err(ConfigError::unknown_key("parameter group", group)),
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKey::Eq(band) => write!(f, "eq.{band}"),
            ParameterKey::Spatial(p) => write!(f, "spatial.{p}"),
            ParameterKey::Enhancement(p) => write!(f, "enhancement.{p}"),
        }
    }
}

/// Band gains in dB.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EqSettings {
    /// Low shelf at 60 Hz
    pub sub: f32,
    /// Peak at 200 Hz
    pub bass: f32,
    /// Peak at 1 kHz
    pub mid: f32,
    /// Peak at 4 kHz
    pub high_mid: f32,
    /// High shelf at 12 kHz
    pub treble: f32,
}

impl EqSettings {
    /// Gain of `band` in dB.
    pub fn get(&self, band: EqBand) -> f32 {
        self.to_array()[band.index()]
    }

    /// Mutable access to the field behind `band`.
    pub fn get_mut(&mut self, band: EqBand) -> &mut f32 {
        match band {
            EqBand::Sub => &mut self.sub,
            EqBand::Bass => &mut self.bass,
            EqBand::Mid => &mut self.mid,
            EqBand::HighMid => &mut self.high_mid,
            EqBand::Treble => &mut self.treble,
        }
    }

    /// Gains in filter order.
    pub fn to_array(&self) -> [f32; 5] {
        [self.sub, self.bass, self.mid, self.high_mid, self.treble]
    }

    pub(crate) fn fields_mut(&mut self) -> [(&'static str, &mut f32); 5] {
        [
            ("sub", &mut self.sub),
            ("bass", &mut self.bass),
            ("mid", &mut self.mid),
            ("high_mid", &mut self.high_mid),
            ("treble", &mut self.treble),
        ]
    }
}

/// Normalized spatial controls, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpatialSettings {
    /// Haas delay and send
    pub width: f32,
    /// Reverb send, and the matching dry cut
    pub depth: f32,
    /// Vertical source position
    pub height: f32,
    /// Stored only; the impulse response is fixed at construction
    pub room_size: f32,
    /// Source distance from the listener
    pub distance: f32,
}

impl Default for SpatialSettings {
    fn default() -> Self {
        Self {
            width: 0.5,
            depth: 0.3,
            height: 0.5,
            room_size: 0.5,
            distance: 0.5,
        }
    }
}

impl SpatialSettings {
    /// Reads one parameter.
    pub fn get(&self, param: SpatialParam) -> f32 {
        match param {
            SpatialParam::Width => self.width,
            SpatialParam::Depth => self.depth,
            SpatialParam::Height => self.height,
            SpatialParam::RoomSize => self.room_size,
            SpatialParam::Distance => self.distance,
        }
    }

    /// Mutable access to one parameter.
    pub fn get_mut(&mut self, param: SpatialParam) -> &mut f32 {
        match param {
            SpatialParam::Width => &mut self.width,
            SpatialParam::Depth => &mut self.depth,
            SpatialParam::Height => &mut self.height,
            SpatialParam::RoomSize => &mut self.room_size,
            SpatialParam::Distance => &mut self.distance,
        }
    }

    pub(crate) fn fields_mut(&mut self) -> [(&'static str, &mut f32); 5] {
        [
            ("width", &mut self.width),
            ("depth", &mut self.depth),
            ("height", &mut self.height),
            ("room_size", &mut self.room_size),
            ("distance", &mut self.distance),
        ]
    }
}

/// Normalized enhancement controls, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnhancementSettings {
    /// Harmonic exciter send
    pub exciter: f32,
    /// Stored for hosts; no stage reads it
    pub clarity: f32,
    /// Stored for hosts; no stage reads it
    pub warmth: f32,
}

impl Default for EnhancementSettings {
    fn default() -> Self {
        Self {
            exciter: 0.3,
            clarity: 0.3,
            warmth: 0.3,
        }
    }
}

impl EnhancementSettings {
    /// Reads one parameter.
    pub fn get(&self, param: EnhancementParam) -> f32 {
        match param {
            EnhancementParam::Exciter => self.exciter,
            EnhancementParam::Clarity => self.clarity,
            EnhancementParam::Warmth => self.warmth,
        }
    }

    /// Mutable access to one parameter.
    pub fn get_mut(&mut self, param: EnhancementParam) -> &mut f32 {
        match param {
            EnhancementParam::Exciter => &mut self.exciter,
            EnhancementParam::Clarity => &mut self.clarity,
            EnhancementParam::Warmth => &mut self.warmth,
        }
    }

    pub(crate) fn fields_mut(&mut self) -> [(&'static str, &mut f32); 3] {
        [
            ("exciter", &mut self.exciter),
            ("clarity", &mut self.clarity),
            ("warmth", &mut self.warmth),
        ]
    }
}

/// Output dynamics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DynamicsSettings {
    /// Mix in the bus compressor
    pub normalize: bool,
    /// Limiter threshold in dB, [-20, 0]
    pub limiter_threshold_db: f32,
}

impl Default for DynamicsSettings {
    fn default() -> Self {
        Self {
            normalize: true,
            limiter_threshold_db: -1.0,
        }
    }
}

/// Complete engine configuration.
///
/// # TOML Format
///
/// ```toml
/// enabled = true
/// preset = "cinema"
///
/// [eq]
/// sub = 4.0
/// high_mid = 2.0
///
/// [spatial]
/// width = 0.9
///
/// [dynamics]
/// normalize = true
/// limiter_threshold_db = -1.0
/// ```
///
/// Omitted fields take their defaults; unknown keys are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Wet path on; off passes the EQ'd dry signal
    pub enabled: bool,
    /// Last preset applied, `Custom` after manual edits
    pub preset: PresetId,
    /// Five-band gains
    pub eq: EqSettings,
    /// Width, depth and position
    pub spatial: SpatialSettings,
    /// Exciter and tone controls
    pub enhancement: EnhancementSettings,
    /// Compressor and limiter
    pub dynamics: DynamicsSettings,
}

impl EngineConfig {
    /// Load a configuration from a TOML file, clamping every field into range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string, clamping every field into range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let mut config: EngineConfig = toml::from_str(toml_str)?;
        sanitize(&mut config)?;
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Stores a band gain, clamped to [-12, 12] dB. Returns the stored value.
    pub fn set_eq_band(&mut self, band: EqBand, value_db: f32) -> Result<f32> {
        let stored = clamp_eq_db(&format!("eq.{band}"), value_db)?;
        *self.eq.get_mut(band) = stored;
        Ok(stored)
    }

    /// Stores a spatial control, clamped to [0, 1]. Returns the stored value.
    pub fn set_spatial(&mut self, param: SpatialParam, value: f32) -> Result<f32> {
        let stored = clamp_unit(&format!("spatial.{param}"), value)?;
        *self.spatial.get_mut(param) = stored;
        Ok(stored)
    }

    /// Stores an enhancement control, clamped to [0, 1]. Returns the stored value.
    pub fn set_enhancement(&mut self, param: EnhancementParam, value: f32) -> Result<f32> {
        let stored = clamp_unit(&format!("enhancement.{param}"), value)?;
        *self.enhancement.get_mut(param) = stored;
        Ok(stored)
    }

    /// Stores the dynamics settings, clamping the threshold to [-20, 0] dB.
    pub fn set_dynamics(&mut self, normalize: bool, limiter_threshold_db: f32) -> Result<()> {
        let threshold = clamp_limiter_db("dynamics.limiter_threshold_db", limiter_threshold_db)?;
        self.dynamics = DynamicsSettings {
            normalize,
            limiter_threshold_db: threshold,
        };
        Ok(())
    }

    /// Dispatches a dotted key to the matching setter.
    pub fn set_parameter(&mut self, key: ParameterKey, value: f32) -> Result<f32> {
        match key {
            ParameterKey::Eq(band) => self.set_eq_band(band, value),
            ParameterKey::Spatial(param) => self.set_spatial(param, value),
            ParameterKey::Enhancement(param) => self.set_enhancement(param, value),
        }
    }

    /// Field-level merge of a preset override, then `preset = id`.
    ///
    /// `enabled` and `dynamics` are never touched. The merge is validated on
    /// a copy, so a bad override leaves `self` unchanged.
    pub fn apply_override(&mut self, id: PresetId, overrides: &PresetOverride) -> Result<()> {
        let mut next = *self;
        if let Some(eq) = &overrides.eq {
            for (band, value) in eq.entries() {
                if let Some(value) = value {
                    next.set_eq_band(band, value)?;
                }
            }
        }
        if let Some(spatial) = &overrides.spatial {
            for (param, value) in spatial.entries() {
                if let Some(value) = value {
                    next.set_spatial(param, value)?;
                }
            }
        }
        if let Some(enhancement) = &overrides.enhancement {
            for (param, value) in enhancement.entries() {
                if let Some(value) = value {
                    next.set_enhancement(param, value)?;
                }
            }
        }
        next.preset = id;
        *self = next;
        Ok(())
    }
}

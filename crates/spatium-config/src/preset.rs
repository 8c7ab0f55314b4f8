//! Preset ids, partial overrides, and the preset table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::config::{EngineConfig, EnhancementParam, EqBand, SpatialParam};
use crate::error::{ConfigError, Result};
use crate::factory_presets;

/// Identifies a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetId {
    #[default]
    Music,
    Cinema,
    Vocal,
    /// User-tuned; the factory override is empty
    Custom,
}

impl PresetId {
    /// Every preset id.
    pub const ALL: [PresetId; 4] = [
        PresetId::Music,
        PresetId::Cinema,
        PresetId::Vocal,
        PresetId::Custom,
    ];

    /// Lowercase name, as used in TOML.
    pub fn name(self) -> &'static str {
        match self {
            PresetId::Music => "music",
            PresetId::Cinema => "cinema",
            PresetId::Vocal => "vocal",
            PresetId::Custom => "custom",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for PresetId {
    type Err = ConfigError;

    /// Case-insensitive: `"Cinema"` and `"cinema"` both parse.
    fn from_str(s: &str) -> Result<Self> {
        PresetId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional band gains.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EqOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bass: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_mid: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treble: Option<f32>,
}

impl EqOverride {
    /// Every band paired with its optional value.
    pub fn entries(&self) -> [(EqBand, Option<f32>); 5] {
        [
            (EqBand::Sub, self.sub),
            (EqBand::Bass, self.bass),
            (EqBand::Mid, self.mid),
            (EqBand::HighMid, self.high_mid),
            (EqBand::Treble, self.treble),
        ]
    }
}

/// Optional spatial controls.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpatialOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

impl SpatialOverride {
    /// Every control paired with its optional value.
    pub fn entries(&self) -> [(SpatialParam, Option<f32>); 5] {
        [
            (SpatialParam::Width, self.width),
            (SpatialParam::Depth, self.depth),
            (SpatialParam::Height, self.height),
            (SpatialParam::RoomSize, self.room_size),
            (SpatialParam::Distance, self.distance),
        ]
    }
}

/// Optional enhancement controls.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnhancementOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exciter: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmth: Option<f32>,
}

impl EnhancementOverride {
    /// Every control paired with its optional value.
    pub fn entries(&self) -> [(EnhancementParam, Option<f32>); 3] {
        [
            (EnhancementParam::Exciter, self.exciter),
            (EnhancementParam::Clarity, self.clarity),
            (EnhancementParam::Warmth, self.warmth),
        ]
    }
}

/// Partial configuration applied by a preset.
///
/// Missing groups and missing fields leave the current values alone.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<EqOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial: Option<SpatialOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhancement: Option<EnhancementOverride>,
}

impl PresetOverride {
    /// True when applying it changes nothing but the preset id.
    pub fn is_empty(&self) -> bool {
        self.eq.is_none() && self.spatial.is_none() && self.enhancement.is_none()
    }
}

/// On-disk shape of a preset table.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PresetFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    music: Option<PresetOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cinema: Option<PresetOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vocal: Option<PresetOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom: Option<PresetOverride>,
}

/// Immutable mapping from preset id to override.
///
/// # TOML Format
///
/// ```toml
/// [cinema.eq]
/// sub = 4.0
/// bass = 2.0
///
/// [cinema.spatial]
/// width = 0.9
///
/// [custom]
/// ```
///
/// Top-level keys are preset ids; ids may be omitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PresetTable {
    entries: [Option<PresetOverride>; 4],
}

impl PresetTable {
    /// The built-in music, cinema, vocal and custom presets.
    pub fn factory() -> Self {
        factory_presets::factory_table()
    }

    /// Builds a table from explicit entries; later duplicates win.
    pub fn from_entries(entries: impl IntoIterator<Item = (PresetId, PresetOverride)>) -> Self {
        let mut table = Self::default();
        for (id, overrides) in entries {
            table.entries[id.index()] = Some(overrides);
        }
        table
    }

    /// Load a preset table from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let file: PresetFile = toml::from_str(toml_str)?;
        Ok(Self {
            entries: [file.music, file.cinema, file.vocal, file.custom],
        })
    }

    /// Load a preset table from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Convert the table to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        let [music, cinema, vocal, custom] = self.entries;
        let file = PresetFile {
            music,
            cinema,
            vocal,
            custom,
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    /// Save the table to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Override for `id`, if the table has one.
    pub fn get(&self, id: PresetId) -> Option<&PresetOverride> {
        self.entries[id.index()].as_ref()
    }

    /// Ids present in the table.
    pub fn ids(&self) -> impl Iterator<Item = PresetId> + '_ {
        PresetId::ALL
            .into_iter()
            .filter(|id| self.entries[id.index()].is_some())
    }

    /// Merges preset `id` into `config`.
    ///
    /// Returns `Ok(false)` without touching `config` when the table has no
    /// entry for `id`.
    pub fn merge(&self, id: PresetId, config: &mut EngineConfig) -> Result<bool> {
        match self.get(id) {
            Some(overrides) => {
                config.apply_override(id, overrides)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_id_parses_case_insensitively() {
        assert_eq!("cinema".parse::<PresetId>().unwrap(), PresetId::Cinema);
        assert_eq!("VOCAL".parse::<PresetId>().unwrap(), PresetId::Vocal);
        assert!(matches!(
            "jazz".parse::<PresetId>(),
            Err(ConfigError::UnknownPreset(ref name)) if name == "jazz"
        ));
    }

    #[test]
    fn merge_touches_only_given_fields() {
        let table = PresetTable::from_toml(
            r#"
            [vocal.eq]
            mid = 2.0

            [vocal.spatial]
            width = 0.4
            "#,
        )
        .unwrap();

        let mut config = EngineConfig::default();
        config.enabled = true;
        config.eq.treble = 5.0;
        config.dynamics.limiter_threshold_db = -3.0;

        assert!(table.merge(PresetId::Vocal, &mut config).unwrap());
        assert_eq!(config.preset, PresetId::Vocal);
        assert_eq!(config.eq.mid, 2.0);
        assert_eq!(config.eq.treble, 5.0);
        assert_eq!(config.spatial.width, 0.4);
        assert_eq!(config.spatial.depth, 0.3);
        assert!(config.enabled);
        assert_eq!(config.dynamics.limiter_threshold_db, -3.0);
    }

    #[test]
    fn missing_entry_is_a_no_op() {
        let table = PresetTable::from_toml("[music]\n").unwrap();
        let mut config = EngineConfig::default();
        config.eq.bass = 1.0;
        let before = config;
        assert!(!table.merge(PresetId::Cinema, &mut config).unwrap());
        assert_eq!(config, before);
        assert_eq!(table.ids().collect::<Vec<_>>(), vec![PresetId::Music]);
    }

    #[test]
    fn override_values_are_clamped() {
        let table = PresetTable::from_toml("[cinema.eq]\nsub = 40.0").unwrap();
        let mut config = EngineConfig::default();
        table.merge(PresetId::Cinema, &mut config).unwrap();
        assert_eq!(config.eq.sub, 12.0);
    }

    #[test]
    fn bad_override_leaves_config_unchanged() {
        let table = PresetTable::from_toml("[music.eq]\nsub = 3.0\nbass = inf").unwrap();
        let mut config = EngineConfig::default();
        assert!(table.merge(PresetId::Music, &mut config).is_err());
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn unknown_preset_keys_fail_to_parse() {
        assert!(PresetTable::from_toml("[jazz.eq]\nsub = 1.0").is_err());
        assert!(PresetTable::from_toml("[music.reverb]\nsize = 1.0").is_err());
    }

    #[test]
    fn from_entries_builds_a_table() {
        let table = PresetTable::from_entries([(PresetId::Custom, PresetOverride::default())]);
        assert!(table.get(PresetId::Custom).unwrap().is_empty());
        assert!(table.get(PresetId::Music).is_none());
    }
}

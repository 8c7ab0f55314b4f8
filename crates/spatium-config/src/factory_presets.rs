//! Factory presets bundled with the engine.
//!
//! The table is embedded as TOML at compile time and parsed on demand, so it
//! reads exactly like a user preset file.

use tracing::error;

use crate::preset::PresetTable;

/// TOML content of the factory preset table.
pub const FACTORY_PRESETS_TOML: &str = r#"
[music.eq]
sub = 2.0
bass = 1.0
mid = 0.0
high_mid = 1.0
treble = 2.0

[music.spatial]
width = 0.7
depth = 0.3
height = 0.5
room_size = 0.4
distance = 0.5

[music.enhancement]
exciter = 0.3
clarity = 0.4
warmth = 0.3

[cinema.eq]
sub = 4.0
bass = 2.0
mid = 0.0
high_mid = 2.0
treble = 1.0

[cinema.spatial]
width = 0.9
depth = 0.6
height = 0.7
room_size = 0.8
distance = 0.6

[cinema.enhancement]
exciter = 0.5
clarity = 0.6
warmth = 0.4

[vocal.eq]
sub = -2.0
bass = 0.0
mid = 2.0
high_mid = 3.0
treble = 1.0

[vocal.spatial]
width = 0.4
depth = 0.2
height = 0.3
room_size = 0.3
distance = 0.4

[vocal.enhancement]
exciter = 0.2
clarity = 0.7
warmth = 0.2

[custom]
"#;

/// Parses the embedded factory table.
pub fn factory_table() -> PresetTable {
    match PresetTable::from_toml(FACTORY_PRESETS_TOML) {
        Ok(table) => table,
        Err(e) => {
            error!(error = %e, "factory preset table failed to parse");
            PresetTable::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::preset::PresetId;

    #[test]
    fn factory_table_parses_with_every_id() {
        assert!(PresetTable::from_toml(FACTORY_PRESETS_TOML).is_ok());
        let table = factory_table();
        assert_eq!(table.ids().count(), 4);
        assert!(table.get(PresetId::Custom).unwrap().is_empty());
    }

    #[test]
    fn cinema_is_wider_and_deeper_than_music() {
        let table = factory_table();
        let mut music = EngineConfig::default();
        let mut cinema = EngineConfig::default();
        table.merge(PresetId::Music, &mut music).unwrap();
        table.merge(PresetId::Cinema, &mut cinema).unwrap();
        assert!(cinema.spatial.width > music.spatial.width);
        assert!(cinema.spatial.depth > music.spatial.depth);
        assert_eq!(cinema.eq.to_array(), [4.0, 2.0, 0.0, 2.0, 1.0]);
    }

    #[test]
    fn vocal_narrows_and_lifts_the_mids() {
        let table = factory_table();
        let mut vocal = EngineConfig::default();
        table.merge(PresetId::Vocal, &mut vocal).unwrap();
        assert_eq!(vocal.spatial.width, 0.4);
        assert_eq!(vocal.eq.mid, 2.0);
        assert_eq!(vocal.eq.high_mid, 3.0);
        assert_eq!(vocal.enhancement.clarity, 0.7);
    }

    #[test]
    fn custom_changes_only_the_id() {
        let table = factory_table();
        let mut config = EngineConfig::default();
        config.eq.bass = 5.0;
        table.merge(PresetId::Custom, &mut config).unwrap();
        let mut expected = EngineConfig::default();
        expected.eq.bass = 5.0;
        expected.preset = PresetId::Custom;
        assert_eq!(config, expected);
    }
}

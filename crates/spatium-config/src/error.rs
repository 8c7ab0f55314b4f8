//! Errors raised while loading, saving and validating engine configuration.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Everything that can go wrong in `spatium-config`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config or preset file could not be read
    #[error("cannot read '{}': {source}", path.display())]
    ReadFile {
        /// File that was being read.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// Config or preset file could not be written
    #[error("cannot write '{}': {source}", path.display())]
    WriteFile {
        /// File that was being written.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// File contents are not valid TOML for the target type
    #[error("invalid TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Value could not be rendered as TOML
    #[error("cannot encode TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Preset name that is not one of music, cinema, vocal, custom
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// Parameter name that does not exist in its group
    #[error("unknown {kind} key: {key}")]
    UnknownKey {
        /// Which group was searched (`"eq band"`, `"spatial parameter"`, ...).
        kind: &'static str,
        /// The key as given.
        key: String,
    },

    /// NaN or infinite value for a numeric field
    #[error("non-finite value {value} for '{field}'")]
    NonFinite {
        /// Dotted field name, e.g. `eq.bass`.
        field: String,
        /// The rejected value.
        value: f32,
    },
}

impl ConfigError {
    /// Wraps a read failure with the offending path.
    pub fn read_file(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        Self::ReadFile { path, source }
    }

    /// Wraps a write failure with the offending path.
    pub fn write_file(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        Self::WriteFile { path, source }
    }

    /// Unknown name within a parameter group.
    pub fn unknown_key(kind: &'static str, key: impl Into<String>) -> Self {
        Self::UnknownKey {
            kind,
            key: key.into(),
        }
    }
}

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

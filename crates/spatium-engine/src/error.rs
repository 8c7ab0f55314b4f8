//! Error types for the engine.

use spatium_config::ConfigError;
use spatium_effects::ImpulseError;
use thiserror::Error;

use crate::context::ContextError;
use crate::engine::LifecycleState;

/// Errors returned by [`SpatialAudioEngine`](crate::SpatialAudioEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// A control call arrived in a lifecycle state that does not allow it
    #[error("{operation} is not allowed while the engine is {state}")]
    InvalidState {
        /// The rejected operation
        operation: &'static str,
        /// State at the time of the call
        state: LifecycleState,
    },

    /// Unknown key or preset name, non-finite value, or bad FFT size
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The platform refused to resume or suspend playback
    #[error("playback refused: {0}")]
    Suspended(ContextError),

    /// Impulse response generation failed at construction
    #[error("impulse response: {0}")]
    ImpulseResponse(#[from] ImpulseError),

    /// The audio context rejected a connection
    #[error("audio context: {0}")]
    Context(#[from] ContextError),

    /// The source command queue is full
    #[error("command queue is full; retry after the render thread drains it")]
    Busy,

    /// Configuration or preset file failure
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub(crate) fn invalid_state(operation: &'static str, state: LifecycleState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Routes value-level config failures to [`EngineError::InvalidParameter`].
    pub(crate) fn from_config(err: ConfigError) -> Self {
        match err {
            ConfigError::NonFinite { .. }
            | ConfigError::UnknownKey { .. }
            | ConfigError::UnknownPreset(_) => Self::InvalidParameter(err.to_string()),
            other => Self::Config(other),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

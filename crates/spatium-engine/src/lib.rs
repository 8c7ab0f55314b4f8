//! Spatium Engine - real-time spatial enhancement of a stereo stream
//!
//! A fixed graph of EQ, Haas widening, convolution reverb, harmonic exciter,
//! 3D panning and dynamics, driven by a validated [`EngineConfig`]. The
//! engine renders into an injected [`AudioContext`] and never touches audio
//! hardware itself.
//!
//! ## Lifecycle
//!
//! ```text
//! Unattached --attach--> Attached --attach--> Attached (source swapped)
//! Unattached | Attached --destroy--> Destroyed
//! ```
//!
//! Control calls, analysis snapshots, `resume` and `suspend` are only
//! accepted while attached. Observers such as [`SpatialAudioEngine::config`]
//! and [`SpatialAudioEngine::state`] work in every state.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use spatium_engine::{BufferSource, EngineOptions, OfflineContext, SpatialAudioEngine};
//! use spatium_config::EqBand;
//!
//! let ctx = Arc::new(OfflineContext::new(48000.0));
//! let mut engine = SpatialAudioEngine::new(ctx.clone(), EngineOptions::default()).unwrap();
//! engine.attach(BufferSource::mono(vec![0.0; 48000]).looping(true)).unwrap();
//! engine.set_eq_band(EqBand::Mid, 4.0).unwrap();
//!
//! block_on(engine.resume()).unwrap();
//! let (_left, _right) = ctx.render(4800);
//! # fn block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! [`EngineConfig`]: spatium_config::EngineConfig

pub mod context;
mod engine;
mod error;
pub mod graph;
pub mod source;
pub mod targets;

pub use context::{
    AudioContext, ContextError, ContextFuture, ContextState, OfflineContext, RenderCallback,
    RenderHandle,
};
pub use engine::{ConfigHandle, EngineOptions, LifecycleState, SpatialAudioEngine};
pub use error::{EngineError, Result};
pub use source::{BufferSource, PcmSource};
pub use targets::{SharedTargets, StageTargets, Target};

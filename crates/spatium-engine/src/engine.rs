//! The engine facade: lifecycle, control surface, analysis.
//!
//! ## Threads
//!
//! The engine lives on the control thread. Its render node is handed to
//! the [`AudioContext`] on the first `attach` and runs on the context's
//! render thread from then on. The two sides share:
//!
//! - [`SharedTargets`](crate::targets::SharedTargets): one atomic cell per ramped scalar
//! - a bounded command queue carrying replacement sources
//! - a bounded return queue carrying displaced sources back for dropping
//! - the analysis ring and a few published counters
//!
//! The config itself is a copy-on-write snapshot in an [`ArcSwap`], readable
//! from any thread through a [`ConfigHandle`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use spatium_analysis::{Analyser, DEFAULT_FFT_SIZE, analysis_tap, is_valid_fft_size};
use spatium_config::{
    EngineConfig, EnhancementParam, EqBand, ParameterKey, PresetId, PresetTable, SpatialParam,
    validation,
};
use spatium_effects::ImpulseResponse;
use tracing::{debug, error, info, trace, warn};

use crate::context::{AudioContext, ContextError, ContextState, RenderHandle};
use crate::error::{EngineError, Result};
use crate::graph::{RenderCommand, RenderNode, RenderShared, SignalGraph};
use crate::source::PcmSource;
use crate::targets::{
    ANIMATION_RAMP_MS, DERIVED_RAMP_MS, ENABLE_RAMP_MS, SharedTargets, StageTargets,
    orbit_position,
};

/// Engine lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Built, nothing connected yet
    Unattached,
    /// Connected to the context with a source
    Attached,
    /// Torn down; terminal
    Destroyed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleState::Unattached => "unattached",
            LifecycleState::Attached => "attached",
            LifecycleState::Destroyed => "destroyed",
        })
    }
}

/// Construction options.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Seed for the impulse-response noise; `None` draws from entropy
    pub seed: Option<u64>,
    /// Initial analysis FFT size
    pub fft_size: usize,
    /// Starting config, clamped into range at construction
    pub initial_config: EngineConfig,
    /// Table consulted by `apply_preset`
    pub presets: PresetTable,
    /// Depth of the source command queue
    pub command_capacity: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            seed: None,
            fft_size: DEFAULT_FFT_SIZE,
            initial_config: EngineConfig::default(),
            presets: PresetTable::factory(),
            command_capacity: 4,
        }
    }
}

/// Lock-free reader of the engine's current config.
#[derive(Debug, Clone)]
pub struct ConfigHandle(Arc<ArcSwap<EngineConfig>>);

impl ConfigHandle {
    /// Copy of the latest published config.
    pub fn load(&self) -> EngineConfig {
        **self.0.load()
    }
}

/// Real-time spatial enhancement engine.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use spatium_engine::{BufferSource, EngineOptions, OfflineContext, SpatialAudioEngine};
/// use spatium_config::{PresetId, SpatialParam};
///
/// let ctx = Arc::new(OfflineContext::new(48000.0));
/// let options = EngineOptions { seed: Some(7), ..Default::default() };
/// let mut engine = SpatialAudioEngine::new(ctx.clone(), options).unwrap();
///
/// engine.attach(BufferSource::mono(vec![0.25; 4800])).unwrap();
/// engine.set_enabled(true).unwrap();
/// engine.apply_preset(PresetId::Cinema).unwrap();
/// engine.set_spatial_parameter(SpatialParam::Width, 1.5).unwrap();
/// assert_eq!(engine.config().spatial.width, 1.0);
///
/// engine.destroy();
/// assert_eq!(ctx.callback_count(), 0);
/// ```
pub struct SpatialAudioEngine {
    context: Arc<dyn AudioContext>,
    sample_rate: f32,
    state: LifecycleState,
    config: Arc<ArcSwap<EngineConfig>>,
    presets: PresetTable,
    targets: Arc<SharedTargets>,
    render: Arc<RenderShared>,
    analyser: Analyser,
    pending_node: Option<Box<RenderNode>>,
    handle: Option<RenderHandle>,
    commands: Sender<RenderCommand>,
    retired: Receiver<Box<dyn PcmSource>>,
    latency: usize,
}

impl SpatialAudioEngine {
    /// Builds the graph at the context's sample rate.
    ///
    /// Generating the impulse response is the only slow step. It fails with
    /// [`EngineError::ImpulseResponse`] and no engine is created.
    pub fn new(context: Arc<dyn AudioContext>, options: EngineOptions) -> Result<Self> {
        let sample_rate = context.sample_rate();
        if !is_valid_fft_size(options.fft_size) {
            return Err(EngineError::InvalidParameter(format!(
                "analysis FFT size must be a power of two in [32, 32768], got {}",
                options.fft_size
            )));
        }

        let mut config = options.initial_config;
        validation::sanitize(&mut config).map_err(EngineError::from_config)?;

        let started = Instant::now();
        let ir = ImpulseResponse::generate(sample_rate, options.seed)?;
        debug!(
            frames = ir.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "impulse response generated"
        );

        let initial = StageTargets::derive(&config);
        let graph = SignalGraph::new(sample_rate, &ir, &initial)?;
        let latency = graph.latency_samples();

        let capacity = options.command_capacity.max(1);
        let (commands, command_rx) = bounded(capacity);
        let (retired_tx, retired) = bounded(capacity + 1);

        let (tap, mut analyser) = analysis_tap();
        analyser
            .set_fft_size(options.fft_size)
            .map_err(|e| EngineError::InvalidParameter(e.to_string()))?;

        let targets = Arc::new(SharedTargets::new(&initial));
        let render = Arc::new(RenderShared::default());
        let node = RenderNode::new(
            graph,
            command_rx,
            retired_tx,
            Arc::clone(&targets),
            Arc::clone(&render),
            tap,
        );

        info!(sample_rate, latency, preset = %config.preset, "engine created");

        Ok(Self {
            context,
            sample_rate,
            state: LifecycleState::Unattached,
            config: Arc::new(ArcSwap::from_pointee(config)),
            presets: options.presets,
            targets,
            render,
            analyser,
            pending_node: Some(Box::new(node)),
            handle: None,
            commands,
            retired,
            latency,
        })
    }

    // --- lifecycle ---

    /// Connects `source` to the graph.
    ///
    /// The first call connects the graph to the context. Later calls swap
    /// the source; the previous one is disconnected on the render thread and
    /// dropped here on a following control call. Returns
    /// [`EngineError::Busy`] when too many swaps are queued.
    pub fn attach(&mut self, source: impl PcmSource + 'static) -> Result<()> {
        match self.state {
            LifecycleState::Destroyed => Err(self.reject("attach")),
            LifecycleState::Unattached => {
                let Some(mut node) = self.pending_node.take() else {
                    return Err(self.reject("attach"));
                };
                node.set_source(Box::new(source));
                match self.context.connect(node) {
                    Ok(handle) => {
                        self.handle = Some(handle);
                        self.state = LifecycleState::Attached;
                        info!(?handle, "engine attached");
                        Ok(())
                    }
                    Err(e) => {
                        // The node went down with the failed connect
                        self.state = LifecycleState::Destroyed;
                        error!(error = %e, "context refused the render node");
                        Err(e.into())
                    }
                }
            }
            LifecycleState::Attached => {
                self.drain_retired();
                match self
                    .commands
                    .try_send(RenderCommand::Attach(Box::new(source)))
                {
                    Ok(()) => {
                        info!("source replaced");
                        Ok(())
                    }
                    Err(TrySendError::Full(_)) => {
                        warn!("source queue full; attach rejected");
                        Err(EngineError::Busy)
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        warn!("render node is gone; attach rejected");
                        Err(EngineError::Context(ContextError::Closed))
                    }
                }
            }
        }
    }

    /// Disconnects from the context and releases the graph. Idempotent.
    pub fn destroy(&mut self) {
        if self.state == LifecycleState::Destroyed {
            debug!("destroy on a destroyed engine");
            return;
        }
        if let Some(handle) = self.handle.take() {
            self.context.disconnect(handle);
        }
        self.pending_node = None;
        self.drain_retired();
        self.state = LifecycleState::Destroyed;
        info!("engine destroyed");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    // --- control ---

    /// Switches between bypass (dry only) and the full enhancement mix.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.check_attached("set_enabled")?;
        let mut config = self.config();
        config.enabled = enabled;
        self.commit(config, ENABLE_RAMP_MS);
        info!(enabled, "processing toggled");
        Ok(())
    }

    /// Ramps one band toward `value_db`, clamped to [-12, 12] dB.
    pub fn set_eq_band(&mut self, band: EqBand, value_db: f32) -> Result<()> {
        self.check_attached("set_eq_band")?;
        let mut config = self.config();
        let stored = config
            .set_eq_band(band, value_db)
            .map_err(|e| self.invalid(e))?;
        self.commit(config, DERIVED_RAMP_MS);
        debug!(%band, stored, "eq band set");
        Ok(())
    }

    /// Stores a spatial control, clamped to [0, 1], and re-derives the graph.
    pub fn set_spatial_parameter(&mut self, param: SpatialParam, value: f32) -> Result<()> {
        self.check_attached("set_spatial_parameter")?;
        let mut config = self.config();
        let stored = config
            .set_spatial(param, value)
            .map_err(|e| self.invalid(e))?;
        self.commit_spatial(config, DERIVED_RAMP_MS);
        debug!(%param, stored, "spatial parameter set");
        Ok(())
    }

    /// Stores an enhancement control, clamped to [0, 1].
    pub fn set_enhancement_parameter(&mut self, param: EnhancementParam, value: f32) -> Result<()> {
        self.check_attached("set_enhancement_parameter")?;
        let mut config = self.config();
        let stored = config
            .set_enhancement(param, value)
            .map_err(|e| self.invalid(e))?;
        self.commit(config, DERIVED_RAMP_MS);
        debug!(%param, stored, "enhancement parameter set");
        Ok(())
    }

    /// Compressor in or out, and the limiter ceiling (clamped to [-20, 0] dB).
    pub fn set_dynamics(&mut self, normalize: bool, limiter_threshold_db: f32) -> Result<()> {
        self.check_attached("set_dynamics")?;
        let mut config = self.config();
        config
            .set_dynamics(normalize, limiter_threshold_db)
            .map_err(|e| self.invalid(e))?;
        self.commit(config, DERIVED_RAMP_MS);
        debug!(
            normalize,
            threshold_db = config.dynamics.limiter_threshold_db,
            "dynamics set"
        );
        Ok(())
    }

    /// Sets a control by dotted name: `eq.highMid`, `spatial.room_size`, ...
    pub fn set_parameter(&mut self, key: &str, value: f32) -> Result<()> {
        self.check_attached("set_parameter")?;
        let key: ParameterKey = key.parse().map_err(|e| self.invalid(e))?;
        let mut config = self.config();
        let stored = config
            .set_parameter(key, value)
            .map_err(|e| self.invalid(e))?;
        if matches!(key, ParameterKey::Spatial(_)) {
            self.commit_spatial(config, DERIVED_RAMP_MS);
        } else {
            self.commit(config, DERIVED_RAMP_MS);
        }
        debug!(%key, stored, "parameter set");
        Ok(())
    }

    /// Merges preset `id` into the config and re-derives every target.
    ///
    /// An id missing from the engine's table leaves everything unchanged.
    pub fn apply_preset(&mut self, id: PresetId) -> Result<()> {
        self.check_attached("apply_preset")?;
        let mut config = self.config();
        let merged = self
            .presets
            .merge(id, &mut config)
            .map_err(|e| self.invalid(e))?;
        if !merged {
            info!(preset = %id, "preset table has no entry; config unchanged");
            return Ok(());
        }
        self.commit_spatial(config, DERIVED_RAMP_MS);
        info!(preset = %id, "preset applied");
        Ok(())
    }

    /// [`apply_preset`](Self::apply_preset) by case-insensitive name.
    pub fn apply_preset_named(&mut self, name: &str) -> Result<()> {
        self.check_attached("apply_preset")?;
        let id: PresetId = name.parse().map_err(|e| self.invalid(e))?;
        self.apply_preset(id)
    }

    /// Moves the panner along an orbit driven by the rendered-audio clock.
    ///
    /// `intensity` is clamped to [0, 1]. The next spatial setter or preset
    /// returns the source to its static position; other setters leave the
    /// orbit alone.
    pub fn animate_spatial_position(&mut self, intensity: f32) -> Result<()> {
        self.check_attached("animate_spatial_position")?;
        if !intensity.is_finite() {
            warn!(intensity, "non-finite animation intensity");
            return Err(EngineError::InvalidParameter(format!(
                "animation intensity must be finite, got {intensity}"
            )));
        }
        let intensity = intensity.clamp(0.0, 1.0);
        let seconds = self.render.frames_rendered() as f64 / f64::from(self.sample_rate);
        let position = orbit_position(seconds as f32, intensity);
        self.targets.publish_position(position, ANIMATION_RAMP_MS);
        trace!(?position, "panner animated");
        Ok(())
    }

    /// Asks the context to start rendering, if it is suspended.
    ///
    /// A platform refusal is [`EngineError::Suspended`]; the engine stays
    /// usable and the context resumes once allowed.
    pub async fn resume(&self) -> Result<()> {
        self.require_attached("resume")?;
        if self.context.state() != ContextState::Suspended {
            return Ok(());
        }
        self.context.resume().await.map_err(|e| {
            warn!(error = %e, "resume refused");
            EngineError::Suspended(e)
        })?;
        info!("context resumed");
        Ok(())
    }

    /// Asks the context to stop rendering, if it is running.
    pub async fn suspend(&self) -> Result<()> {
        self.require_attached("suspend")?;
        if self.context.state() != ContextState::Running {
            return Ok(());
        }
        self.context.suspend().await.map_err(|e| {
            warn!(error = %e, "suspend refused");
            EngineError::Suspended(e)
        })?;
        info!("context suspended");
        Ok(())
    }

    // --- analysis ---

    /// Byte spectrum of the output, `fft_size / 2` bins.
    pub fn frequency_snapshot(&mut self) -> Result<Vec<u8>> {
        self.check_attached("frequency_snapshot")?;
        Ok(self.analyser.frequency_bytes())
    }

    /// Spectrum of the output in dB, `fft_size / 2` bins.
    pub fn frequency_snapshot_db(&mut self) -> Result<Vec<f32>> {
        self.check_attached("frequency_snapshot_db")?;
        Ok(self.analyser.frequency_db())
    }

    /// Last `fft_size` output samples as bytes, 128 is silence.
    pub fn time_domain_snapshot(&mut self) -> Result<Vec<u8>> {
        self.check_attached("time_domain_snapshot")?;
        Ok(self.analyser.time_domain_bytes())
    }

    /// Last `fft_size` output samples.
    pub fn time_domain_snapshot_f32(&mut self) -> Result<Vec<f32>> {
        self.check_attached("time_domain_snapshot_f32")?;
        Ok(self.analyser.time_domain_f32())
    }

    /// Changes the analysis frame size; powers of two in [32, 32768].
    pub fn set_analysis_fft_size(&mut self, size: usize) -> Result<()> {
        self.check_attached("set_analysis_fft_size")?;
        self.analyser.set_fft_size(size).map_err(|e| {
            warn!(size, "rejected analysis FFT size");
            EngineError::InvalidParameter(e.to_string())
        })
    }

    /// Current analysis frame size.
    pub fn analysis_fft_size(&self) -> usize {
        self.analyser.fft_size()
    }

    // --- observation ---

    /// Copy of the current config. Works in every state.
    pub fn config(&self) -> EngineConfig {
        **self.config.load()
    }

    /// Cloneable reader for other threads.
    pub fn config_handle(&self) -> ConfigHandle {
        ConfigHandle(Arc::clone(&self.config))
    }

    /// Realized gain of `band` as last published by the render thread.
    pub fn live_eq_gain_db(&self, band: EqBand) -> f32 {
        self.render.live_eq_gain_db(band.index())
    }

    /// Frames the render node has produced.
    pub fn frames_rendered(&self) -> u64 {
        self.render.frames_rendered()
    }

    /// Lag of the reverb send behind the dry path, in samples.
    pub fn latency_samples(&self) -> usize {
        self.latency
    }

    /// Sample rate the graph runs at.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    // --- internals ---

    /// Stores `config` and publishes its targets, panner excluded.
    fn commit(&mut self, config: EngineConfig, ramp_ms: f32) {
        self.config.store(Arc::new(config));
        let changed = self
            .targets
            .publish_mix(&StageTargets::derive(&config), ramp_ms);
        trace!(changed, ramp_ms, "targets published");
    }

    /// Like `commit`, and returns the panner to its static position.
    fn commit_spatial(&mut self, config: EngineConfig, ramp_ms: f32) {
        self.config.store(Arc::new(config));
        let changed = self
            .targets
            .publish(&StageTargets::derive(&config), ramp_ms);
        trace!(changed, ramp_ms, "targets and position published");
    }

    fn reject(&self, operation: &'static str) -> EngineError {
        warn!(operation, state = %self.state, "call rejected in this state");
        EngineError::invalid_state(operation, self.state)
    }

    fn invalid(&self, err: spatium_config::ConfigError) -> EngineError {
        let err = EngineError::from_config(err);
        warn!(error = %err, "parameter rejected");
        err
    }

    /// Gate for calls that also release displaced sources.
    fn check_attached(&mut self, operation: &'static str) -> Result<()> {
        self.require_attached(operation)?;
        self.drain_retired();
        Ok(())
    }

    fn require_attached(&self, operation: &'static str) -> Result<()> {
        if self.state != LifecycleState::Attached {
            return Err(self.reject(operation));
        }
        Ok(())
    }

    fn drain_retired(&mut self) {
        let mut released = 0usize;
        while let Ok(source) = self.retired.try_recv() {
            drop(source);
            released += 1;
        }
        if released > 0 {
            debug!(released, "displaced sources released");
        }
    }
}

impl Drop for SpatialAudioEngine {
    fn drop(&mut self) {
        if self.state != LifecycleState::Destroyed {
            self.destroy();
        }
    }
}

impl fmt::Debug for SpatialAudioEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialAudioEngine")
            .field("sample_rate", &self.sample_rate)
            .field("state", &self.state)
            .field("config", &self.config())
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OfflineContext;
    use crate::source::BufferSource;

    fn engine() -> (Arc<OfflineContext>, SpatialAudioEngine) {
        let ctx = Arc::new(OfflineContext::new(48000.0));
        let options = EngineOptions {
            seed: Some(1),
            ..Default::default()
        };
        let engine = SpatialAudioEngine::new(ctx.clone(), options).unwrap();
        (ctx, engine)
    }

    #[test]
    fn setters_require_attach() {
        let (_ctx, mut engine) = engine();
        assert!(matches!(
            engine.set_enabled(true),
            Err(EngineError::InvalidState {
                operation: "set_enabled",
                state: LifecycleState::Unattached
            })
        ));
        let unattached = |r: Result<()>| {
            matches!(
                r,
                Err(EngineError::InvalidState {
                    state: LifecycleState::Unattached,
                    ..
                })
            )
        };
        assert!(unattached(engine.frequency_snapshot().map(drop)));
        assert!(unattached(engine.frequency_snapshot_db().map(drop)));
        assert!(unattached(engine.time_domain_snapshot().map(drop)));
        assert!(unattached(engine.time_domain_snapshot_f32().map(drop)));
        assert!(unattached(engine.set_analysis_fft_size(512)));
        assert!(unattached(engine.animate_spatial_position(0.5)));

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        assert!(unattached(runtime.block_on(engine.resume())));
        assert!(unattached(runtime.block_on(engine.suspend())));

        // Observation still works
        assert_eq!(engine.state(), LifecycleState::Unattached);
        assert_eq!(engine.analysis_fft_size(), 2048);
    }

    #[test]
    fn bad_fft_size_fails_construction() {
        let ctx = Arc::new(OfflineContext::new(48000.0));
        let options = EngineOptions {
            fft_size: 1000,
            seed: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            SpatialAudioEngine::new(ctx, options),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn invalid_sample_rate_fails_construction() {
        let ctx = Arc::new(OfflineContext::new(0.0));
        assert!(matches!(
            SpatialAudioEngine::new(ctx, EngineOptions::default()),
            Err(EngineError::ImpulseResponse(_))
        ));
    }

    #[test]
    fn initial_config_is_clamped() {
        let ctx = Arc::new(OfflineContext::new(48000.0));
        let mut initial = EngineConfig::default();
        initial.eq.sub = 30.0;
        let options = EngineOptions {
            seed: Some(1),
            initial_config: initial,
            ..Default::default()
        };
        let engine = SpatialAudioEngine::new(ctx, options).unwrap();
        assert_eq!(engine.config().eq.sub, 12.0);
    }

    #[test]
    fn connect_failure_destroys_the_engine() {
        let (ctx, mut engine) = engine();
        ctx.close();
        assert!(matches!(
            engine.attach(BufferSource::mono(vec![0.0; 16])),
            Err(EngineError::Context(ContextError::Closed))
        ));
        assert_eq!(engine.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn unknown_names_are_invalid_parameters() {
        let (_ctx, mut engine) = engine();
        engine.attach(BufferSource::mono(vec![0.0; 16])).unwrap();
        assert!(matches!(
            engine.set_parameter("eq.ultra", 1.0),
            Err(EngineError::InvalidParameter(_))
        ));
        assert!(matches!(
            engine.apply_preset_named("jazz"),
            Err(EngineError::InvalidParameter(_))
        ));
        assert!(matches!(
            engine.set_eq_band(EqBand::Bass, f32::NAN),
            Err(EngineError::InvalidParameter(_))
        ));
        assert!(matches!(
            engine.animate_spatial_position(f32::INFINITY),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn set_parameter_accepts_both_spellings() {
        let (_ctx, mut engine) = engine();
        engine.attach(BufferSource::mono(vec![0.0; 16])).unwrap();
        engine.set_parameter("eq.highMid", 3.0).unwrap();
        engine.set_parameter("spatial.room_size", 0.9).unwrap();
        let config = engine.config();
        assert_eq!(config.eq.high_mid, 3.0);
        assert_eq!(config.spatial.room_size, 0.9);
    }

    #[test]
    fn missing_preset_entry_is_a_no_op() {
        let ctx = Arc::new(OfflineContext::new(48000.0));
        let options = EngineOptions {
            seed: Some(1),
            presets: PresetTable::default(),
            ..Default::default()
        };
        let mut engine = SpatialAudioEngine::new(ctx, options).unwrap();
        engine.attach(BufferSource::mono(vec![0.0; 16])).unwrap();
        let before = engine.config();
        engine.apply_preset(PresetId::Cinema).unwrap();
        assert_eq!(engine.config(), before);
    }

    #[test]
    fn config_handle_tracks_updates() {
        let (_ctx, mut engine) = engine();
        let handle = engine.config_handle();
        engine.attach(BufferSource::mono(vec![0.0; 16])).unwrap();
        engine.set_enabled(true).unwrap();
        assert!(handle.load().enabled);
    }

    #[test]
    fn dropping_the_engine_disconnects_it() {
        let (ctx, mut engine) = engine();
        engine.attach(BufferSource::mono(vec![0.0; 16])).unwrap();
        assert_eq!(ctx.callback_count(), 1);
        drop(engine);
        assert_eq!(ctx.callback_count(), 0);
    }
}

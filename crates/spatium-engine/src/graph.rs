//! The fixed signal graph and its render-thread node.
//!
//! ```text
//! input ─► EQ ─┬─ dry ──────┐
//!              ├─ Haas ─────┤
//!              ├─ reverb ───┼─► Σ ─► panner ─► compressor ─► limiter ─► output ─► tap
//!              └─ exciter ──┘
//! ```
//!
//! Stages are owned by value and never reallocated. Only their targets move.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender};
use spatium_analysis::TapWriter;
use spatium_core::{Effect, SmoothedParam, flush_denormal, sanitize};
use spatium_effects::{
    BAND_COUNT, Compressor, Convolver, Exciter, FiveBandEq, HaasWidener, ImpulseError,
    ImpulseResponse, Limiter, Panner3d,
};

use crate::context::RenderCallback;
use crate::source::PcmSource;
use crate::targets::{DERIVED_RAMP_MS, SharedTargets, StageTargets, Target};

/// Largest block processed between target reads.
pub const MAX_CHUNK: usize = 128;

/// Every stage of the graph.
pub struct SignalGraph {
    eq: FiveBandEq,
    haas: HaasWidener,
    reverb: Convolver,
    exciter: Exciter,
    panner: Panner3d,
    compressor: Compressor,
    limiter: Limiter,
    dry: SmoothedParam,
    output: SmoothedParam,
    applied: StageTargets<Target>,
}

fn ramped(initial: f32, sample_rate: f32) -> SmoothedParam {
    SmoothedParam::with_config(initial, sample_rate, DERIVED_RAMP_MS)
}

impl SignalGraph {
    /// Builds every stage already settled at `initial`.
    pub fn new(
        sample_rate: f32,
        ir: &ImpulseResponse,
        initial: &StageTargets,
    ) -> Result<Self, ImpulseError> {
        let mut eq = FiveBandEq::new(sample_rate);
        for (band, &db) in initial.eq_db.iter().enumerate() {
            eq.set_band_gain_db_immediate(band, db);
        }

        let mut haas = HaasWidener::new(sample_rate, initial.haas_delay_ms);
        haas.set_send_gain(initial.haas_send, DERIVED_RAMP_MS);

        let mut reverb = Convolver::new(ir)?;
        reverb.set_send_gain(initial.reverb_send, DERIVED_RAMP_MS);

        let mut exciter = Exciter::new(sample_rate);
        exciter.set_send_gain(initial.exciter_send, DERIVED_RAMP_MS);

        let [x, y, z] = initial.position;
        let panner = Panner3d::new(sample_rate, (x, y, z));

        let mut compressor = Compressor::new(sample_rate);
        compressor.set_mix(initial.compressor_mix, DERIVED_RAMP_MS);

        let limiter = Limiter::new(sample_rate, initial.limiter_threshold_db);

        let mut graph = Self {
            eq,
            haas,
            reverb,
            exciter,
            panner,
            compressor,
            limiter,
            dry: ramped(initial.dry_gain, sample_rate),
            output: ramped(initial.output_gain, sample_rate),
            applied: initial.map(|&value| Target {
                value,
                ramp_ms: DERIVED_RAMP_MS,
            }),
        };
        graph.snap();
        Ok(graph)
    }

    fn snap(&mut self) {
        self.haas.snap();
        self.reverb.snap();
        self.exciter.snap();
        self.panner.snap();
        self.compressor.snap();
        self.limiter.snap();
        self.dry.snap_to_target();
        self.output.snap_to_target();
    }

    /// Retargets every stage whose target changed since the last call.
    pub fn apply(&mut self, targets: &StageTargets<Target>) {
        let last = self.applied;

        for (band, (t, prev)) in targets.eq_db.iter().zip(&last.eq_db).enumerate() {
            if t != prev {
                self.eq.set_ramp_ms(t.ramp_ms);
                self.eq.set_band_gain_db(band, t.value);
            }
        }

        let changed = |t: Target, prev: Target| (t != prev).then_some(t);

        if let Some(t) = changed(targets.dry_gain, last.dry_gain) {
            self.dry.set_smoothing_time_ms(t.ramp_ms);
            self.dry.set_target(t.value);
        }
        if let Some(t) = changed(targets.haas_delay_ms, last.haas_delay_ms) {
            self.haas.set_delay_ms(t.value, t.ramp_ms);
        }
        if let Some(t) = changed(targets.haas_send, last.haas_send) {
            self.haas.set_send_gain(t.value, t.ramp_ms);
        }
        if let Some(t) = changed(targets.reverb_send, last.reverb_send) {
            self.reverb.set_send_gain(t.value, t.ramp_ms);
        }
        if let Some(t) = changed(targets.exciter_send, last.exciter_send) {
            self.exciter.set_send_gain(t.value, t.ramp_ms);
        }
        if targets.position != last.position {
            let [x, y, z] = targets.position;
            self.panner.set_position((x.value, y.value, z.value), x.ramp_ms);
        }
        if let Some(t) = changed(targets.compressor_mix, last.compressor_mix) {
            self.compressor.set_mix(t.value, t.ramp_ms);
        }
        if let Some(t) = changed(targets.limiter_threshold_db, last.limiter_threshold_db) {
            self.limiter.set_threshold_db(t.value, t.ramp_ms);
        }
        if let Some(t) = changed(targets.output_gain, last.output_gain) {
            self.output.set_smoothing_time_ms(t.ramp_ms);
            self.output.set_target(t.value);
        }

        self.applied = *targets;
    }

    /// Processes one chunk in place.
    pub fn process_chunk(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (el, er) = self.eq.process_stereo(sanitize(*l), sanitize(*r));

            let dry = self.dry.advance();
            let (hl, hr) = self.haas.process_stereo(el, er);
            let (vl, vr) = self.reverb.process_stereo(el, er);
            let (xl, xr) = self.exciter.process_stereo(el, er);
            let sum_l = dry * el + hl + vl + xl;
            let sum_r = dry * er + hr + vr + xr;

            let (pl, pr) = self.panner.process_stereo(sum_l, sum_r);
            let (cl, cr) = self.compressor.process_stereo(pl, pr);
            let (ll, lr) = self.limiter.process_stereo(cl, cr);

            let gain = self.output.advance();
            *l = flush_denormal(ll * gain);
            *r = flush_denormal(lr * gain);
        }
    }

    /// Realized band gains in dB.
    pub fn eq_gains_db(&self) -> [f32; BAND_COUNT] {
        core::array::from_fn(|band| self.eq.gain_db(band))
    }

    /// Lag of the slowest send behind the dry path.
    pub fn latency_samples(&self) -> usize {
        [
            self.eq.latency_samples(),
            self.haas.latency_samples(),
            self.reverb.latency_samples(),
            self.exciter.latency_samples(),
            self.panner.latency_samples(),
            self.compressor.latency_samples(),
            self.limiter.latency_samples(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Commands from the control thread to the render node.
pub(crate) enum RenderCommand {
    /// Replace the current source; the old one comes back on the retired channel
    Attach(Box<dyn PcmSource>),
}

/// Values the render node publishes for the control thread.
#[derive(Debug, Default)]
pub(crate) struct RenderShared {
    frames: AtomicU64,
    live_eq: [AtomicU32; BAND_COUNT],
}

impl RenderShared {
    pub(crate) fn frames_rendered(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub(crate) fn live_eq_gain_db(&self, band: usize) -> f32 {
        self.live_eq
            .get(band)
            .map_or(0.0, |g| f32::from_bits(g.load(Ordering::Acquire)))
    }
}

/// The engine's [`RenderCallback`].
pub(crate) struct RenderNode {
    graph: SignalGraph,
    source: Option<Box<dyn PcmSource>>,
    commands: Receiver<RenderCommand>,
    retired: Sender<Box<dyn PcmSource>>,
    targets: Arc<SharedTargets>,
    shared: Arc<RenderShared>,
    tap: TapWriter,
}

impl RenderNode {
    pub(crate) fn new(
        graph: SignalGraph,
        commands: Receiver<RenderCommand>,
        retired: Sender<Box<dyn PcmSource>>,
        targets: Arc<SharedTargets>,
        shared: Arc<RenderShared>,
        tap: TapWriter,
    ) -> Self {
        let node = Self {
            graph,
            source: None,
            commands,
            retired,
            targets,
            shared,
            tap,
        };
        node.publish(0);
        node
    }

    pub(crate) fn set_source(&mut self, source: Box<dyn PcmSource>) {
        self.source = Some(source);
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                RenderCommand::Attach(source) => {
                    if let Some(old) = self.source.replace(source) {
                        // The retired queue has room for every queued attach
                        // plus one, so this only fails once the engine is gone.
                        let _ = self.retired.try_send(old);
                    }
                }
            }
        }
    }

    fn read_source(&mut self, left: &mut [f32], right: &mut [f32]) {
        let Some(source) = self.source.as_mut() else {
            left.fill(0.0);
            right.fill(0.0);
            return;
        };
        let n = source.read(left, right).min(left.len());
        if source.channels() == 1 {
            right[..n].copy_from_slice(&left[..n]);
        }
        left[n..].fill(0.0);
        right[n..].fill(0.0);
    }

    fn publish(&self, frames: usize) {
        for (slot, gain) in self.shared.live_eq.iter().zip(self.graph.eq_gains_db()) {
            slot.store(gain.to_bits(), Ordering::Release);
        }
        self.shared.frames.fetch_add(frames as u64, Ordering::AcqRel);
    }
}

impl RenderCallback for RenderNode {
    fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let mut start = 0;
        while start < frames {
            let end = (start + MAX_CHUNK).min(frames);
            self.drain_commands();
            self.graph.apply(&self.targets.load());

            let (l, r) = (&mut left[start..end], &mut right[start..end]);
            self.read_source(l, r);
            self.graph.process_chunk(l, r);
            self.tap.push_stereo(l, r);
            self.publish(end - start);
            start = end;
        }
    }
}

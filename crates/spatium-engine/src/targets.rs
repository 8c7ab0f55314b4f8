//! Control-to-render parameter targets.
//!
//! The control thread derives a full [`StageTargets`] from the config after
//! every mutation and publishes the fields that changed into
//! [`SharedTargets`]. Each field is an `f32` bit-cast into an `AtomicU32`
//! paired with the ramp time constant to approach it with. The render thread
//! loads the whole set at every chunk boundary.
//!
//! One writer, one reader. The ramp is stored before the value and the value
//! is stored with `Release`, so a reader that sees a new value also sees its
//! ramp.

use std::sync::atomic::{AtomicU32, Ordering};

use spatium_config::EngineConfig;
use spatium_effects::BAND_COUNT;
use spatium_effects::exciter::GAIN_PER_AMOUNT;
use spatium_effects::haas::{DELAY_PER_WIDTH_MS, GAIN_PER_WIDTH};

/// Ramp for coefficients derived from setters and presets.
pub const DERIVED_RAMP_MS: f32 = 100.0;
/// Ramp for the bypass/active switch.
pub const ENABLE_RAMP_MS: f32 = 50.0;
/// Ramp for animated panner positions.
pub const ANIMATION_RAMP_MS: f32 = 25.0;

/// Reverb send per unit of depth.
pub const REVERB_PER_DEPTH: f32 = 0.4;
/// Dry-send reduction per unit of depth.
pub const DRY_CUT_PER_DEPTH: f32 = 0.3;

const FIELD_COUNT: usize = 16;
/// Indices of `position` in [`StageTargets::fields`] order.
const POSITION_FIELDS: std::ops::Range<usize> = 10..13;

/// Every scalar the graph ramps toward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StageTargets<T = f32> {
    /// Band gains in dB, sub to treble
    pub eq_db: [T; BAND_COUNT],
    /// Level of the EQ output in the send sum
    pub dry_gain: T,
    /// Delay of the Haas path
    pub haas_delay_ms: T,
    /// Level of the Haas side signal
    pub haas_send: T,
    /// Level of the convolution reverb
    pub reverb_send: T,
    /// Level of the harmonic exciter
    pub exciter_send: T,
    /// Panner source position `(x, y, z)`
    pub position: [T; 3],
    /// 0 bypasses the compressor, 1 is fully wet
    pub compressor_mix: T,
    /// Limiter ceiling in dB
    pub limiter_threshold_db: T,
    /// Master gain after the limiter
    pub output_gain: T,
}

impl StageTargets<f32> {
    /// Derives every target from `config`.
    ///
    /// Disabled configs keep the dry path at unity and close the sends. The
    /// output gain is always 1.
    pub fn derive(config: &EngineConfig) -> Self {
        let spatial = &config.spatial;
        let (dry_gain, haas_send, reverb_send, exciter_send) = if config.enabled {
            (
                1.0 - spatial.depth * DRY_CUT_PER_DEPTH,
                spatial.width * GAIN_PER_WIDTH,
                spatial.depth * REVERB_PER_DEPTH,
                config.enhancement.exciter * GAIN_PER_AMOUNT,
            )
        } else {
            (1.0, 0.0, 0.0, 0.0)
        };

        Self {
            eq_db: config.eq.to_array(),
            dry_gain,
            haas_delay_ms: spatial.width * DELAY_PER_WIDTH_MS,
            haas_send,
            reverb_send,
            exciter_send,
            position: static_position(spatial.height, spatial.distance),
            compressor_mix: if config.dynamics.normalize { 1.0 } else { 0.0 },
            limiter_threshold_db: config.dynamics.limiter_threshold_db,
            output_gain: 1.0,
        }
    }
}

/// Resting panner position for the given height and distance controls.
pub fn static_position(height: f32, distance: f32) -> [f32; 3] {
    [0.0, (height - 0.5) * 2.0, -(1.0 + distance * 4.0)]
}

/// Point on the animation orbit at `angle` radians.
pub fn orbit_position(angle: f32, intensity: f32) -> [f32; 3] {
    let r = 0.5 + intensity * 1.5;
    [
        angle.cos() * r,
        (2.0 * angle).sin() * 0.5 * intensity,
        -2.0 - angle.sin() * r,
    ]
}

impl<T> StageTargets<T> {
    fn fields(&self) -> [&T; FIELD_COUNT] {
        let [e0, e1, e2, e3, e4] = &self.eq_db;
        let [px, py, pz] = &self.position;
        [
            e0,
            e1,
            e2,
            e3,
            e4,
            &self.dry_gain,
            &self.haas_delay_ms,
            &self.haas_send,
            &self.reverb_send,
            &self.exciter_send,
            px,
            py,
            pz,
            &self.compressor_mix,
            &self.limiter_threshold_db,
            &self.output_gain,
        ]
    }

    fn from_fields(fields: [T; FIELD_COUNT]) -> Self {
        let [
            e0,
            e1,
            e2,
            e3,
            e4,
            dry_gain,
            haas_delay_ms,
            haas_send,
            reverb_send,
            exciter_send,
            px,
            py,
            pz,
            compressor_mix,
            limiter_threshold_db,
            output_gain,
        ] = fields;
        Self {
            eq_db: [e0, e1, e2, e3, e4],
            dry_gain,
            haas_delay_ms,
            haas_send,
            reverb_send,
            exciter_send,
            position: [px, py, pz],
            compressor_mix,
            limiter_threshold_db,
            output_gain,
        }
    }

    /// Applies `f` to every field.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> StageTargets<U> {
        StageTargets::from_fields(self.fields().map(f))
    }
}

/// A value and the ramp to reach it with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    /// Value to approach
    pub value: f32,
    /// Exponential time constant of the approach
    pub ramp_ms: f32,
}

/// Lock-free [`Target`] cell.
#[derive(Debug)]
pub struct AtomicTarget {
    value: AtomicU32,
    ramp_ms: AtomicU32,
}

impl AtomicTarget {
    fn new(value: f32, ramp_ms: f32) -> Self {
        Self {
            value: AtomicU32::new(value.to_bits()),
            ramp_ms: AtomicU32::new(ramp_ms.to_bits()),
        }
    }

    /// Stores `value` unless it is already current. Returns whether it changed.
    fn store_if_changed(&self, value: f32, ramp_ms: f32) -> bool {
        if self.value.load(Ordering::Relaxed) == value.to_bits() {
            return false;
        }
        self.ramp_ms.store(ramp_ms.to_bits(), Ordering::Relaxed);
        self.value.store(value.to_bits(), Ordering::Release);
        true
    }

    #[inline]
    fn load(&self) -> Target {
        let value = f32::from_bits(self.value.load(Ordering::Acquire));
        let ramp_ms = f32::from_bits(self.ramp_ms.load(Ordering::Relaxed));
        Target { value, ramp_ms }
    }
}

/// Targets shared between the control and render threads.
#[derive(Debug)]
pub struct SharedTargets(StageTargets<AtomicTarget>);

impl SharedTargets {
    /// Starts at `initial`, tagged with the derived ramp.
    pub fn new(initial: &StageTargets) -> Self {
        Self(initial.map(|&v| AtomicTarget::new(v, DERIVED_RAMP_MS)))
    }

    /// Publishes every field of `targets` that differs from the current value.
    /// Returns how many changed.
    pub fn publish(&self, targets: &StageTargets, ramp_ms: f32) -> usize {
        self.publish_where(targets, ramp_ms, |_| true)
    }

    /// Like [`publish`](Self::publish) but leaves the panner where it is,
    /// so an animated source keeps moving.
    pub fn publish_mix(&self, targets: &StageTargets, ramp_ms: f32) -> usize {
        self.publish_where(targets, ramp_ms, |i| !POSITION_FIELDS.contains(&i))
    }

    fn publish_where(
        &self,
        targets: &StageTargets,
        ramp_ms: f32,
        include: impl Fn(usize) -> bool,
    ) -> usize {
        self.0
            .fields()
            .into_iter()
            .zip(targets.fields())
            .enumerate()
            .filter(|&(i, (cell, value))| include(i) && cell.store_if_changed(*value, ramp_ms))
            .count()
    }

    /// Moves only the panner.
    pub fn publish_position(&self, position: [f32; 3], ramp_ms: f32) {
        for (cell, value) in self.0.position.iter().zip(position) {
            cell.store_if_changed(value, ramp_ms);
        }
    }

    /// Snapshot for the render thread.
    #[inline]
    pub fn load(&self) -> StageTargets<Target> {
        self.0.map(AtomicTarget::load)
    }
}

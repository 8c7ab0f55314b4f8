//! Lightweight HRTF-style 3-D panner.
//!
//! The listener sits at the origin facing -z with +x to the right and +y up.
//! Per sample, from the (ramped) source position:
//!
//! 1. **Distance**: inverse model, `ref / (ref + rolloff * (clamp(d, ref, max) - ref))`.
//! 2. **Azimuth**: `atan2(x, -z)`, folded into [-90°, 90°] so sources behind
//!    mirror the ones in front. Stereo input is panned with the equal-power
//!    law browsers use, which is the identity at azimuth 0.
//! 3. **ITD**: the far ear is delayed by the Woodworth estimate
//!    `r / c * (|sin az| + |az|)`.
//! 4. **Elevation**: the band above a 3 kHz one-pole split is tilted by up to
//!    ±20 % in proportion to `elevation / 90°`.

use core::f32::consts::{FRAC_PI_2, PI};

use libm::{atan2f, cosf, sinf, sqrtf};
use spatium_core::{Effect, InterpolatedDelay, Interpolation, OnePole, SmoothedParam};

/// Head radius in metres.
pub const HEAD_RADIUS: f32 = 0.085;
/// Speed of sound in m/s.
pub const SPEED_OF_SOUND: f32 = 343.0;

const REF_DISTANCE: f32 = 1.0;
const ROLLOFF: f32 = 1.0;
const MAX_DISTANCE: f32 = 10_000.0;

const ELEVATION_SPLIT_HZ: f32 = 3000.0;
const ELEVATION_TILT: f32 = 0.2;

/// ITD line capacity; the Woodworth maximum is about 0.64 ms.
const MAX_ITD_SECONDS: f32 = 0.001;

/// Inverse distance attenuation.
#[inline]
pub fn distance_gain(distance: f32) -> f32 {
    let d = distance.clamp(REF_DISTANCE, MAX_DISTANCE);
    REF_DISTANCE / (REF_DISTANCE + ROLLOFF * (d - REF_DISTANCE))
}

/// Woodworth interaural time difference in seconds for azimuth `az` (radians).
#[inline]
pub fn woodworth_itd(az: f32) -> f32 {
    HEAD_RADIUS / SPEED_OF_SOUND * (sinf(az).abs() + az.abs())
}

/// Folds an azimuth into [-pi/2, pi/2], mirroring rear sources to the front.
#[inline]
pub fn fold_azimuth(az: f32) -> f32 {
    if az > FRAC_PI_2 {
        PI - az
    } else if az < -FRAC_PI_2 {
        -PI - az
    } else {
        az
    }
}

/// Direction of a source relative to the listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    /// Folded azimuth in radians, positive to the right
    pub azimuth: f32,
    /// Elevation in radians, positive up
    pub elevation: f32,
    /// Distance from the listener
    pub distance: f32,
}

impl Direction {
    /// Azimuth, elevation and distance of a listener-relative position.
    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        let horizontal = sqrtf(x * x + z * z);
        let azimuth = if horizontal > 0.0 {
            fold_azimuth(atan2f(x, -z))
        } else {
            0.0
        };
        Self {
            azimuth,
            elevation: atan2f(y, horizontal),
            distance: sqrtf(x * x + y * y + z * z),
        }
    }
}

/// Positional stereo panner.
#[derive(Debug, Clone)]
pub struct Panner3d {
    x: SmoothedParam,
    y: SmoothedParam,
    z: SmoothedParam,
    itd_l: InterpolatedDelay,
    itd_r: InterpolatedDelay,
    split_l: OnePole,
    split_r: OnePole,
    sample_rate: f32,
}

impl Panner3d {
    /// Creates a panner with the source at `position`.
    pub fn new(sample_rate: f32, position: (f32, f32, f32)) -> Self {
        let ramp = |v| SmoothedParam::with_config(v, sample_rate, 100.0);
        let mut itd_l = InterpolatedDelay::from_time(sample_rate, MAX_ITD_SECONDS);
        let mut itd_r = InterpolatedDelay::from_time(sample_rate, MAX_ITD_SECONDS);
        itd_l.set_interpolation(Interpolation::Cubic);
        itd_r.set_interpolation(Interpolation::Cubic);
        Self {
            x: ramp(position.0),
            y: ramp(position.1),
            z: ramp(position.2),
            itd_l,
            itd_r,
            split_l: OnePole::new(sample_rate, ELEVATION_SPLIT_HZ),
            split_r: OnePole::new(sample_rate, ELEVATION_SPLIT_HZ),
            sample_rate,
        }
    }

    /// Ramps every axis toward `(x, y, z)` with time constant `ramp_ms`.
    pub fn set_position(&mut self, position: (f32, f32, f32), ramp_ms: f32) {
        for (axis, value) in [
            (&mut self.x, position.0),
            (&mut self.y, position.1),
            (&mut self.z, position.2),
        ] {
            axis.set_smoothing_time_ms(ramp_ms);
            axis.set_target(value);
        }
    }

    /// Realized position.
    pub fn position(&self) -> (f32, f32, f32) {
        (self.x.get(), self.y.get(), self.z.get())
    }

    /// Position being approached.
    pub fn target_position(&self) -> (f32, f32, f32) {
        (self.x.target(), self.y.target(), self.z.target())
    }

    /// Jumps every position ramp to its target.
    pub fn snap(&mut self) {
        self.x.snap_to_target();
        self.y.snap_to_target();
        self.z.snap_to_target();
    }

    /// Equal-power pan of a stereo pair (browser panner algorithm).
    #[inline]
    fn pan(left: f32, right: f32, azimuth: f32) -> (f32, f32) {
        let deg = (azimuth * 180.0 / PI).clamp(-90.0, 90.0);
        if deg == 0.0 {
            return (left, right);
        }
        let x = if deg <= 0.0 { (deg + 90.0) / 90.0 } else { deg / 90.0 };
        let gain_l = cosf(x * FRAC_PI_2);
        let gain_r = sinf(x * FRAC_PI_2);
        if deg <= 0.0 {
            (left + right * gain_l, right * gain_r)
        } else {
            (left * gain_l, right + left * gain_r)
        }
    }
}

impl Effect for Panner3d {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.process_stereo(input, input).0
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let dir = Direction::from_position(self.x.advance(), self.y.advance(), self.z.advance());

        let gain = distance_gain(dir.distance);
        let (l, r) = Self::pan(left * gain, right * gain, dir.azimuth);

        // Far ear: left when the source is to the right
        let itd = woodworth_itd(dir.azimuth) * self.sample_rate;
        let (delay_l, delay_r) = if dir.azimuth > 0.0 { (itd, 0.0) } else { (0.0, itd) };
        let l = self.itd_l.write_read(l, delay_l);
        let r = self.itd_r.write_read(r, delay_r);

        let tilt = 1.0 + ELEVATION_TILT * (dir.elevation / FRAC_PI_2);
        let low_l = self.split_l.process(l);
        let low_r = self.split_r.process(r);
        (low_l + (l - low_l) * tilt, low_r + (r - low_r) * tilt)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for axis in [&mut self.x, &mut self.y, &mut self.z] {
            axis.set_sample_rate(sample_rate);
        }
        self.itd_l = InterpolatedDelay::from_time(sample_rate, MAX_ITD_SECONDS);
        self.itd_r = InterpolatedDelay::from_time(sample_rate, MAX_ITD_SECONDS);
        self.itd_l.set_interpolation(Interpolation::Cubic);
        self.itd_r.set_interpolation(Interpolation::Cubic);
        self.split_l.set_sample_rate(sample_rate);
        self.split_r.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.itd_l.clear();
        self.itd_r.clear();
        self.split_l.reset();
        self.split_r.reset();
        self.snap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn rms_pair(panner: &mut Panner3d, n: usize) -> (f32, f32) {
        let (mut sl, mut sr) = (0.0f32, 0.0f32);
        for i in 0..n {
            let x = sinf(2.0 * PI * 500.0 * i as f32 / SR);
            let (l, r) = panner.process_stereo(x, x);
            if i >= n / 2 {
                sl += l * l;
                sr += r * r;
            }
        }
        (sqrtf(sl), sqrtf(sr))
    }

    #[test]
    fn inverse_distance_model() {
        assert_eq!(distance_gain(0.2), 1.0);
        assert_eq!(distance_gain(1.0), 1.0);
        assert!((distance_gain(3.0) - 1.0 / 3.0).abs() < 1e-6);
        assert!((distance_gain(5.0) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn rear_sources_mirror_front() {
        let front = Direction::from_position(1.0, 0.0, -1.0);
        let back = Direction::from_position(1.0, 0.0, 1.0);
        assert!((front.azimuth - back.azimuth).abs() < 1e-5);
        assert!((front.azimuth - PI / 4.0).abs() < 1e-5);
    }

    #[test]
    fn straight_ahead_at_reference_is_transparent() {
        let mut panner = Panner3d::new(SR, (0.0, 0.0, -1.0));
        for i in 0..100 {
            let x = sinf(i as f32 * 0.01);
            let (l, r) = panner.process_stereo(x, -x);
            assert!((l - x).abs() < 1e-3 && (r + x).abs() < 1e-3);
        }
    }

    #[test]
    fn right_source_favours_right_channel() {
        let mut panner = Panner3d::new(SR, (2.0, 0.0, -0.5));
        let (l, r) = rms_pair(&mut panner, 9600);
        assert!(r > l * 1.5, "left {l} right {r}");
    }

    #[test]
    fn near_centre_impulse_leaves_no_echo() {
        // ~0.6 degrees right: far-ear delay is a fraction of a sample
        let mut panner = Panner3d::new(SR, (0.01, 0.0, -1.0));
        assert!(woodworth_itd(0.01) * SR < 1.0);
        panner.process_stereo(1.0, 1.0);
        for n in 0..200 {
            let (l, r) = panner.process_stereo(0.0, 0.0);
            if n > 0 {
                assert!(l.abs() < 1e-6 && r.abs() < 1e-6, "frame {n}: ({l}, {r})");
            }
        }
    }

    #[test]
    fn woodworth_peaks_at_ninety_degrees() {
        let side = woodworth_itd(FRAC_PI_2);
        assert!((side - 0.085 / 343.0 * (1.0 + FRAC_PI_2)).abs() < 1e-7);
        assert!(side * SR < MAX_ITD_SECONDS * SR);
        assert_eq!(woodworth_itd(0.0), 0.0);
    }

    #[test]
    fn elevation_brightens_above_and_darkens_below() {
        let tone = |y: f32| {
            let mut panner = Panner3d::new(SR, (0.0, y, -1.0));
            let mut energy = 0.0;
            for i in 0..9600 {
                let x = sinf(2.0 * PI * 10000.0 * i as f32 / SR);
                let (l, _) = panner.process_stereo(x, x);
                if i > 4800 {
                    energy += l * l;
                }
            }
            energy
        };
        let up = tone(1.0);
        let down = tone(-1.0);
        assert!(up > down * 1.2, "up {up} down {down}");
    }

    #[test]
    fn position_ramps() {
        let mut panner = Panner3d::new(SR, (0.0, 0.0, -3.0));
        panner.set_position((1.0, 0.0, -2.0), 25.0);
        for _ in 0..1200 {
            panner.process_stereo(0.0, 0.0);
        }
        let (x, _, _) = panner.position();
        assert!(x > 0.5 && x < 1.0, "x after one time constant: {x}");
        assert_eq!(panner.target_position(), (1.0, 0.0, -2.0));
    }
}

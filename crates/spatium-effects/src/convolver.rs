//! Uniformly partitioned overlap-save convolution reverb.
//!
//! The impulse response is cut into partitions of `B` samples, each
//! transformed once at construction into a `2B`-point spectrum. Every `B`
//! input samples the newest `2B`-sample window is transformed, pushed into a
//! frequency-domain delay line, and multiplied against all partitions:
//!
//! ```text
//! Y = sum_p X[now - p] * H[p]          (per bin)
//! y = last B samples of IFFT(Y)
//! ```
//!
//! Both channels share one complex FFT per direction: left rides in the real
//! part and right in the imaginary part, and the two spectra are separated
//! (and recombined) through conjugate symmetry. Everything is allocated up
//! front. Latency is one partition.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use spatium_core::{Effect, SmoothedParam};

use crate::impulse::{ImpulseError, ImpulseResponse};

/// Default partition length in samples.
pub const DEFAULT_PARTITION: usize = 512;

const ZERO: Complex<f32> = Complex { re: 0.0, im: 0.0 };

/// Stereo convolution reverb send.
pub struct Convolver {
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// FFT work buffer (`2B`)
    work: Vec<Complex<f32>>,

    partition: usize,
    bins: usize,
    partitions: usize,

    /// Partition spectra, `partitions * bins`, normalization folded in
    filter_l: Vec<Complex<f32>>,
    filter_r: Vec<Complex<f32>>,
    /// Frequency-domain delay line of input spectra, same layout
    fdl_l: Vec<Complex<f32>>,
    fdl_r: Vec<Complex<f32>>,
    /// Slot of the newest input spectrum
    fdl_head: usize,
    acc_l: Vec<Complex<f32>>,
    acc_r: Vec<Complex<f32>>,

    /// Overlap-save window `[previous B | current B]`
    window_l: Vec<f32>,
    window_r: Vec<f32>,
    output_l: Vec<f32>,
    output_r: Vec<f32>,
    pos: usize,

    send: SmoothedParam,
    scale: f32,
}

impl core::fmt::Debug for Convolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Convolver")
            .field("partition", &self.partition)
            .field("partitions", &self.partitions)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

impl Convolver {
    /// Builds a convolver with 512-sample partitions.
    pub fn new(ir: &ImpulseResponse) -> Result<Self, ImpulseError> {
        Self::with_partition(ir, DEFAULT_PARTITION)
    }

    /// Builds a convolver with a custom partition length (a power of two).
    pub fn with_partition(ir: &ImpulseResponse, partition: usize) -> Result<Self, ImpulseError> {
        if partition < 2 || !partition.is_power_of_two() {
            return Err(ImpulseError::InvalidFftSize(partition));
        }

        let fft_size = partition * 2;
        let bins = partition + 1;
        let partitions = ir.len().div_ceil(partition).max(1);

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let ifft = planner.plan_fft_inverse(fft_size);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());

        let scale = ir.normalization_scale();
        let mut convolver = Self {
            fft,
            ifft,
            scratch: vec![ZERO; scratch_len],
            work: vec![ZERO; fft_size],
            partition,
            bins,
            partitions,
            filter_l: vec![ZERO; partitions * bins],
            filter_r: vec![ZERO; partitions * bins],
            fdl_l: vec![ZERO; partitions * bins],
            fdl_r: vec![ZERO; partitions * bins],
            fdl_head: 0,
            acc_l: vec![ZERO; bins],
            acc_r: vec![ZERO; bins],
            window_l: vec![0.0; fft_size],
            window_r: vec![0.0; fft_size],
            output_l: vec![0.0; partition],
            output_r: vec![0.0; partition],
            pos: 0,
            send: SmoothedParam::with_config(0.0, ir.sample_rate(), 100.0),
            scale,
        };
        convolver.load_filter(ir);
        Ok(convolver)
    }

    fn load_filter(&mut self, ir: &ImpulseResponse) {
        let b = self.partition;
        // IFFT is unnormalized; fold 1/N into the filter along with the IR scale
        let gain = self.scale / (2 * b) as f32;
        let (left, right) = (ir.channel(0), ir.channel(1));

        for p in 0..self.partitions {
            self.work.fill(ZERO);
            for i in 0..b {
                let idx = p * b + i;
                if idx < ir.len() {
                    self.work[i] = Complex::new(left[idx] * gain, right[idx] * gain);
                }
            }
            self.fft
                .process_with_scratch(&mut self.work, &mut self.scratch);

            let range = p * self.bins..(p + 1) * self.bins;
            split_spectra(
                &self.work,
                &mut self.filter_l[range.clone()],
                &mut self.filter_r[range],
            );
        }
    }

    /// Ramps the send gain toward `gain`.
    pub fn set_send_gain(&mut self, gain: f32, ramp_ms: f32) {
        self.send.set_smoothing_time_ms(ramp_ms);
        self.send.set_target(gain);
    }

    /// Realized send gain.
    pub fn send_gain(&self) -> f32 {
        self.send.get()
    }

    /// Finishes the send ramp.
    pub fn snap(&mut self) {
        self.send.snap_to_target();
    }

    /// Loudness normalization applied to the impulse response.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Partition length, equal to the latency in samples.
    pub fn partition_len(&self) -> usize {
        self.partition
    }

    fn process_partition(&mut self) {
        let b = self.partition;
        let n = 2 * b;

        for i in 0..n {
            self.work[i] = Complex::new(self.window_l[i], self.window_r[i]);
        }
        self.fft
            .process_with_scratch(&mut self.work, &mut self.scratch);

        self.fdl_head = (self.fdl_head + 1) % self.partitions;
        let head = self.fdl_head * self.bins..(self.fdl_head + 1) * self.bins;
        split_spectra(
            &self.work,
            &mut self.fdl_l[head.clone()],
            &mut self.fdl_r[head],
        );

        self.acc_l.fill(ZERO);
        self.acc_r.fill(ZERO);
        for p in 0..self.partitions {
            let slot = (self.fdl_head + self.partitions - p) % self.partitions;
            let x = slot * self.bins;
            let h = p * self.bins;
            for k in 0..self.bins {
                self.acc_l[k] += self.fdl_l[x + k] * self.filter_l[h + k];
                self.acc_r[k] += self.fdl_r[x + k] * self.filter_r[h + k];
            }
        }

        // Recombine: w = Y_l + j*Y_r over the full circle
        let j = Complex::new(0.0, 1.0);
        for k in 0..self.bins {
            self.work[k] = self.acc_l[k] + j * self.acc_r[k];
        }
        for k in self.bins..n {
            let mirror = n - k;
            self.work[k] = self.acc_l[mirror].conj() + j * self.acc_r[mirror].conj();
        }
        self.ifft
            .process_with_scratch(&mut self.work, &mut self.scratch);

        for i in 0..b {
            let y = self.work[b + i];
            self.output_l[i] = y.re;
            self.output_r[i] = y.im;
        }

        self.window_l.copy_within(b..n, 0);
        self.window_r.copy_within(b..n, 0);
    }
}

/// Separates the spectra of two real signals packed as `a + j*b`.
fn split_spectra(z: &[Complex<f32>], a: &mut [Complex<f32>], b: &mut [Complex<f32>]) {
    let n = z.len();
    let minus_half_j = Complex::new(0.0, -0.5);
    for k in 0..a.len() {
        let zk = z[k];
        let zm = z[(n - k) % n].conj();
        a[k] = (zk + zm) * 0.5;
        b[k] = (zk - zm) * minus_half_j;
    }
}

impl Effect for Convolver {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.process_stereo(input, input).0
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let b = self.partition;
        self.window_l[b + self.pos] = left;
        self.window_r[b + self.pos] = right;
        let out_l = self.output_l[self.pos];
        let out_r = self.output_r[self.pos];

        self.pos += 1;
        if self.pos == b {
            self.process_partition();
            self.pos = 0;
        }

        let gain = self.send.advance();
        (out_l * gain, out_r * gain)
    }

    /// Sample rate is fixed by the impulse response; only the send ramp
    /// follows.
    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.send.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.fdl_l.fill(ZERO);
        self.fdl_r.fill(ZERO);
        self.window_l.fill(0.0);
        self.window_r.fill(0.0);
        self.output_l.fill(0.0);
        self.output_r.fill(0.0);
        self.pos = 0;
        self.send.snap_to_target();
    }

    fn latency_samples(&self) -> usize {
        self.partition
    }
}

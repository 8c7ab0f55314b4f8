//! Windowed magnitude FFT with preallocated buffers

use rustfft::{FftPlanner, num_complex::Complex};
use std::f32::consts::PI;
use std::sync::Arc;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    /// Rectangular (no windowing)
    Rectangular,
    /// Hann window (raised cosine)
    Hann,
    /// Classic Blackman window (alpha = 0.16), as used by browser analysers
    #[default]
    Blackman,
}

impl Window {
    /// Window value at index `i` of an `n`-point frame.
    pub fn coefficient(self, i: usize, n: usize) -> f32 {
        let x = 2.0 * PI * i as f32 / n as f32;
        match self {
            Window::Rectangular => 1.0,
            Window::Hann => 0.5 * (1.0 - x.cos()),
            Window::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
        }
    }

    /// Get window coefficients
    pub fn coefficients(self, size: usize) -> Vec<f32> {
        (0..size).map(|i| self.coefficient(i, size)).collect()
    }
}

/// Forward FFT that turns a real frame into normalized bin magnitudes.
///
/// All buffers are sized at construction or [`resize`](Self::resize), so
/// repeated [`magnitudes`](Self::magnitudes) calls do not allocate.
pub struct Fft {
    planner: FftPlanner<f32>,
    fft: Arc<dyn rustfft::Fft<f32>>,
    window: Window,
    coefficients: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    size: usize,
}

impl Fft {
    /// Create a new FFT processor for the given size and window
    pub fn new(size: usize, window: Window) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch_len = fft.get_inplace_scratch_len();

        Self {
            planner,
            fft,
            window,
            coefficients: window.coefficients(size),
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            size,
        }
    }

    /// Get FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of magnitude bins produced (DC up to, excluding, Nyquist).
    pub fn bin_count(&self) -> usize {
        self.size / 2
    }

    /// Window applied before each transform.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Resize the FFT (replans and reallocates only when the size changes)
    pub fn resize(&mut self, size: usize) {
        if size == self.size {
            return;
        }
        self.fft = self.planner.plan_fft_forward(size);
        self.coefficients = self.window.coefficients(size);
        self.buffer.resize(size, Complex::new(0.0, 0.0));
        self.scratch
            .resize(self.fft.get_inplace_scratch_len(), Complex::new(0.0, 0.0));
        self.size = size;
    }

    /// Windowed `|X[k]| / N` for `k` in `0..size/2`.
    ///
    /// `input` shorter than the FFT size is zero-padded; `output` receives
    /// at most [`bin_count`](Self::bin_count) values.
    pub fn magnitudes(&mut self, input: &[f32], output: &mut [f32]) {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let x = input.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(x * self.coefficients[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let norm = 1.0 / self.size as f32;
        for (out, bin) in output.iter_mut().zip(&self.buffer[..self.bin_count()]) {
            *out = bin.norm() * norm;
        }
    }
}

impl std::fmt::Debug for Fft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft")
            .field("size", &self.size)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blackman_endpoints_and_peak() {
        let w = Window::Blackman.coefficients(64);
        assert!(w[0].abs() < 1e-6);
        assert!((w[32] - 1.0).abs() < 1e-5);
        // symmetric about the centre
        assert!((w[10] - w[54]).abs() < 1e-5);
    }

    #[test]
    fn sine_peaks_in_its_bin() {
        let mut fft = Fft::new(256, Window::Rectangular);
        let input: Vec<f32> = (0..256)
            .map(|i| (2.0 * PI * 10.0 * i as f32 / 256.0).sin())
            .collect();
        let mut mags = vec![0.0; fft.bin_count()];
        fft.magnitudes(&input, &mut mags);

        // A unit sine splits its energy between +f and -f
        assert!((mags[10] - 0.5).abs() < 1e-4, "peak {}", mags[10]);
        assert!(mags[3] < 1e-4);
    }

    #[test]
    fn dc_under_blackman_is_scaled_by_window_mean() {
        let mut fft = Fft::new(512, Window::Blackman);
        let mut mags = vec![0.0; fft.bin_count()];
        fft.magnitudes(&[1.0; 512], &mut mags);
        assert!((mags[0] - 0.42).abs() < 1e-4, "dc {}", mags[0]);
    }

    #[test]
    fn resize_replans() {
        let mut fft = Fft::new(64, Window::Hann);
        fft.resize(1024);
        assert_eq!(fft.size(), 1024);
        assert_eq!(fft.bin_count(), 512);
        let mut mags = vec![1.0; 512];
        fft.magnitudes(&[], &mut mags);
        assert!(mags.iter().all(|&m| m == 0.0));
    }
}

//! Byte-frequency spectrum analysis.
//!
//! Turns the latest sample window into a fixed-size array of normalized
//! magnitude bytes (0-255), one per frequency bin, the shape the rest of the
//! pipeline consumes. Magnitudes are smoothed across frames so the visuals
//! pulse instead of flickering, then mapped from a fixed dB range to bytes.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Default FFT size (spectrum resolution = half of this).
pub const DEFAULT_FFT_SIZE: usize = 1024;

/// Smallest allowed FFT size. Keeps every band partition non-empty.
pub const MIN_FFT_SIZE: usize = 64;

/// Largest allowed FFT size.
pub const MAX_FFT_SIZE: usize = 2048;

/// Per-bin magnitude smoothing factor (fraction of the previous frame kept).
const SMOOTHING: f32 = 0.6;

/// dB range mapped onto the 0-255 byte scale.
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// One frame of spectrum data: `fft_size / 2` bytes, refreshed in place
/// every tick. All zeros while no audio is active.
#[derive(Clone, Default)]
pub struct SpectrumFrame {
    bins: Vec<u8>,
}

impl SpectrumFrame {
    pub fn new(bin_count: usize) -> Self {
        Self {
            bins: vec![0; bin_count],
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    /// Uniform frame, for driving the pipeline without a sampler in tests.
    #[cfg(test)]
    pub fn filled(value: u8, bin_count: usize) -> Self {
        Self {
            bins: vec![value; bin_count],
        }
    }
}

/// FFT front-end producing [`SpectrumFrame`]s on demand.
pub struct SpectrumSampler {
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex<f32>>,
    fft_window: Vec<f32>,
    /// Smoothed per-bin magnitudes carried across frames.
    smoothed: Vec<f32>,
    planner: FftPlanner<f32>,
}

/// Clamp a requested FFT size to a supported power of two.
fn clamp_fft_size(requested: usize) -> usize {
    requested
        .next_power_of_two()
        .clamp(MIN_FFT_SIZE, MAX_FFT_SIZE)
}

impl SpectrumSampler {
    pub fn new(fft_size: usize) -> Self {
        let fft_size = clamp_fft_size(fft_size);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            fft_size,
            fft,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            fft_window: Self::hann_window(fft_size),
            smoothed: vec![0.0; fft_size / 2],
            planner,
        }
    }

    fn hann_window(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos()))
            .collect()
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins per frame.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Change the analysis resolution. Reallocates the FFT plan, window and
    /// smoothing state; must only be called between ticks. The next
    /// [`sample_into`](Self::sample_into) resizes the frame to match.
    pub fn set_resolution(&mut self, fft_size: usize) {
        let fft_size = clamp_fft_size(fft_size);
        if fft_size == self.fft_size {
            return;
        }
        self.fft_size = fft_size;
        self.fft = self.planner.plan_fft_forward(fft_size);
        self.fft_buffer = vec![Complex::new(0.0, 0.0); fft_size];
        self.fft_window = Self::hann_window(fft_size);
        self.smoothed = vec![0.0; fft_size / 2];
    }

    /// Analyze `samples` and overwrite `frame` in place. Oversized input is
    /// trimmed to its newest `fft_size` samples, short or empty input is
    /// zero-padded; silence decays the smoothed bins down to zero bytes.
    pub fn sample_into(&mut self, samples: &[f32], frame: &mut SpectrumFrame) {
        let bin_count = self.bin_count();
        if frame.bins.len() != bin_count {
            frame.bins.clear();
            frame.bins.resize(bin_count, 0);
        }

        // Window the newest fft_size samples (the capture buffer appends at
        // the end) into the pre-allocated FFT buffer, zero-padding short input
        let start = samples.len().saturating_sub(self.fft_size);
        let latest = &samples[start..];
        for i in 0..self.fft_size {
            if i < latest.len() {
                self.fft_buffer[i] = Complex::new(latest[i] * self.fft_window[i], 0.0);
            } else {
                self.fft_buffer[i] = Complex::new(0.0, 0.0);
            }
        }

        self.fft.process(&mut self.fft_buffer);

        for k in 0..bin_count {
            let magnitude = self.fft_buffer[k].norm() / self.fft_size as f32;
            self.smoothed[k] = SMOOTHING * self.smoothed[k] + (1.0 - SMOOTHING) * magnitude;

            let db = 20.0 * (self.smoothed[k] + 1e-10).log10();
            let normalized = ((db - MIN_DB) / (MAX_DB - MIN_DB)).clamp(0.0, 1.0);
            frame.bins[k] = (normalized * 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_yields_zero_bins() {
        let mut sampler = SpectrumSampler::new(1024);
        let mut frame = SpectrumFrame::new(sampler.bin_count());

        let silence = vec![0.0; 1024];
        for _ in 0..10 {
            sampler.sample_into(&silence, &mut frame);
        }

        assert_eq!(frame.len(), 512);
        assert!(frame.bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_input_is_treated_as_silence() {
        let mut sampler = SpectrumSampler::new(512);
        let mut frame = SpectrumFrame::new(sampler.bin_count());

        sampler.sample_into(&[], &mut frame);

        assert_eq!(frame.len(), 256);
        assert!(frame.bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_resolution_change_resizes_frame() {
        let mut sampler = SpectrumSampler::new(1024);
        let mut frame = SpectrumFrame::new(sampler.bin_count());
        sampler.sample_into(&vec![0.0; 1024], &mut frame);
        assert_eq!(frame.len(), 512);

        sampler.set_resolution(512);
        sampler.sample_into(&vec![0.0; 512], &mut frame);
        assert_eq!(frame.len(), 256);
    }

    #[test]
    fn test_fft_size_clamped_to_power_of_two() {
        let sampler = SpectrumSampler::new(1000);
        assert_eq!(sampler.fft_size(), 1024);

        let sampler = SpectrumSampler::new(8);
        assert_eq!(sampler.fft_size(), MIN_FFT_SIZE);

        let sampler = SpectrumSampler::new(1 << 20);
        assert_eq!(sampler.fft_size(), MAX_FFT_SIZE);
    }

    #[test]
    fn test_tone_produces_nonzero_spectrum() {
        let mut sampler = SpectrumSampler::new(1024);
        let mut frame = SpectrumFrame::new(sampler.bin_count());

        // 440 Hz-ish sine at a 44.1kHz notional rate, loud enough to clear the dB floor
        let tone: Vec<f32> = (0..1024)
            .map(|i| (std::f32::consts::TAU * 440.0 * i as f32 / 44100.0).sin() * 0.8)
            .collect();

        for _ in 0..10 {
            sampler.sample_into(&tone, &mut frame);
        }

        assert!(frame.bins().iter().any(|&b| b > 0));
    }

    #[test]
    fn test_analyzes_newest_samples_of_oversized_window() {
        let mut sampler = SpectrumSampler::new(1024);
        let mut frame = SpectrumFrame::new(sampler.bin_count());

        // 2048-sample capture window: stale silence first, live tone last
        let mut window = vec![0.0; 1024];
        window.extend(
            (0..1024).map(|i| (std::f32::consts::TAU * 440.0 * i as f32 / 44100.0).sin() * 0.8),
        );

        for _ in 0..10 {
            sampler.sample_into(&window, &mut frame);
        }

        assert!(frame.bins().iter().any(|&b| b > 0));
    }
}

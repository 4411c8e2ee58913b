// STFT module - time-averaged band-limited magnitude spectrum
//
// Frames the waveform with a Hann window, transforms each frame, and averages
// the magnitude of every bin across frames. Only bins whose center frequency
// falls inside the configured band are kept in the profile; energies over the
// band and over the whole spectrum are accumulated for the HF energy ratio.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::AnalysisError;

/// Hop size is a quarter of the FFT window
pub const HOP_DIVISOR: usize = 4;

/// Time-averaged magnitude profile restricted to the analysis band
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralProfile {
    /// Mean magnitude per in-band bin, ascending frequency
    pub magnitudes: Vec<f64>,
    /// Index of the first in-band bin in the full spectrum
    pub first_bin: usize,
    /// Mean per-frame energy (sum of squared magnitudes) over in-band bins
    pub band_energy: f64,
    /// Mean per-frame energy over every bin from DC to Nyquist
    pub total_energy: f64,
}

impl SpectralProfile {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}

/// Band-limited STFT front end
pub struct SpectralTransformer {
    fft: Arc<dyn Fft<f64>>,
    fft_size: usize,
    hop_size: usize,
    sample_rate: u32,
    band_bins: std::ops::RangeInclusive<usize>,
    /// Hann window for FFT (pre-computed)
    window: Vec<f64>,
}

impl SpectralTransformer {
    /// Create a transformer for a sample rate, window size and band
    ///
    /// # Errors
    /// `EmptyBand` when no bin `k * sample_rate / fft_size` lies in
    /// `[fmin, fmax]`, including bands entirely above Nyquist.
    pub fn new(
        sample_rate: u32,
        fft_size: usize,
        fmin: f64,
        fmax: f64,
    ) -> Result<Self, AnalysisError> {
        let band_bins = band_bin_range(sample_rate, fft_size, fmin, fmax).ok_or(
            AnalysisError::EmptyBand {
                fmin,
                fmax,
                sample_rate,
            },
        )?;

        let window = (0..fft_size)
            .map(|i| {
                0.5 * (1.0
                    - ((2.0 * std::f64::consts::PI * i as f64) / (fft_size as f64 - 1.0)).cos())
            })
            .collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Ok(Self {
            fft,
            fft_size,
            hop_size: (fft_size / HOP_DIVISOR).max(1),
            sample_rate,
            band_bins,
            window,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Inclusive range of full-spectrum bins kept in the profile
    pub fn band_bins(&self) -> std::ops::RangeInclusive<usize> {
        self.band_bins.clone()
    }

    /// Frequency in Hz of the first in-band bin
    pub fn band_start_hz(&self) -> f64 {
        bin_frequency(*self.band_bins.start(), self.sample_rate, self.fft_size)
    }

    /// Compute the time-averaged in-band magnitude profile
    ///
    /// Frames are not center-padded: a waveform of `len` samples yields
    /// `1 + (len - fft_size) / hop_size` frames.
    ///
    /// # Errors
    /// `InsufficientSignal` when the waveform is shorter than one window.
    pub fn transform(&self, waveform: &[f32]) -> Result<SpectralProfile, AnalysisError> {
        if waveform.len() < self.fft_size {
            return Err(AnalysisError::InsufficientSignal {
                samples: waveform.len(),
                required: self.fft_size,
            });
        }

        let frame_count = 1 + (waveform.len() - self.fft_size) / self.hop_size;
        let band_start = *self.band_bins.start();
        let band_len = self.band_bins.end() - band_start + 1;
        let nyquist_bin = self.fft_size / 2;

        let mut magnitude_sums = vec![0.0f64; band_len];
        let mut band_energy = 0.0f64;
        let mut total_energy = 0.0f64;

        let mut buffer: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); self.fft_size];
        let mut scratch = vec![Complex::new(0.0, 0.0); self.fft.get_inplace_scratch_len()];

        for frame in 0..frame_count {
            let offset = frame * self.hop_size;
            let samples = &waveform[offset..offset + self.fft_size];
            for ((slot, &sample), &w) in buffer.iter_mut().zip(samples).zip(&self.window) {
                *slot = Complex::new(sample as f64 * w, 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (k, value) in buffer[..=nyquist_bin].iter().enumerate() {
                let magnitude = value.norm();
                let energy = magnitude * magnitude;
                total_energy += energy;
                if self.band_bins.contains(&k) {
                    magnitude_sums[k - band_start] += magnitude;
                    band_energy += energy;
                }
            }
        }

        let frames = frame_count as f64;
        let magnitudes = magnitude_sums.into_iter().map(|sum| sum / frames).collect();

        Ok(SpectralProfile {
            magnitudes,
            first_bin: band_start,
            band_energy: band_energy / frames,
            total_energy: total_energy / frames,
        })
    }
}

/// Center frequency of bin `k`
fn bin_frequency(k: usize, sample_rate: u32, fft_size: usize) -> f64 {
    k as f64 * sample_rate as f64 / fft_size as f64
}

/// Inclusive range of bins whose center frequency lies in `[fmin, fmax]`
fn band_bin_range(
    sample_rate: u32,
    fft_size: usize,
    fmin: f64,
    fmax: f64,
) -> Option<std::ops::RangeInclusive<usize>> {
    if fft_size < 2 || sample_rate == 0 || fmin.is_nan() || fmax.is_nan() || fmin > fmax {
        return None;
    }

    let mut in_band = (0..=fft_size / 2).filter(|&k| {
        let freq = bin_frequency(k, sample_rate, fft_size);
        freq >= fmin && freq <= fmax
    });

    let first = in_band.next()?;
    let last = in_band.last().unwrap_or(first);
    Some(first..=last)
}

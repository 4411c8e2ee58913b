//! Deterministic synthetic waveforms.
//!
//! Every generator is a pure function of its arguments; the noise source is a
//! seeded [`StdRng`] so repeated runs produce identical samples. Two composite
//! fixtures mirror the two classes the detector separates:
//!
//! - [`artifact_comb`]: a flat broadband bed with bin-centred tones every few
//!   bins across the analysis band, the spectral comb left behind by
//!   upsampling decoders.
//! - [`natural_rolloff`]: the same bed passed through a one-pole lowpass, a
//!   smooth convex high-frequency decay with nothing above its hull.

use std::f64::consts::PI;
use std::path::Path;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::analysis::fakeprint::SpectralTransformer;
use crate::analysis::ClassifierConfig;
use crate::error::AnalysisError;

/// Seed used when a caller has no reason to pick one
pub const DEFAULT_SEED: u64 = 0x5A5A_FFF0;

/// Amplitude of the broadband impulse bed in the composite fixtures
const BED_AMPLITUDE: f32 = 0.5;
/// Per-tone amplitude of the artifact comb
const COMB_TONE_AMPLITUDE: f32 = 0.002;
/// Pole of the lowpass shaping the natural rolloff bed
const ROLLOFF_POLE: f32 = 0.5;

pub fn silence(len: usize) -> Vec<f32> {
    vec![0.0; len]
}

/// Uniform white noise in [-amplitude, amplitude)
pub fn white_noise(len: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let amplitude = amplitude.abs().max(f32::MIN_POSITIVE);
    (0..len)
        .map(|_| rng.gen_range(-amplitude..amplitude))
        .collect()
}

pub fn sine(sample_rate: u32, frequency_hz: f64, len: usize, amplitude: f32) -> Vec<f32> {
    let step = 2.0 * PI * frequency_hz / sample_rate as f64;
    (0..len)
        .map(|n| ((step * n as f64).sin() as f32) * amplitude)
        .collect()
}

/// Single-sample impulses every `period` samples, starting at sample 0
pub fn impulse_train(len: usize, period: usize, amplitude: f32) -> Vec<f32> {
    let period = period.max(1);
    (0..len)
        .map(|n| if n % period == 0 { amplitude } else { 0.0 })
        .collect()
}

/// In-place one-pole lowpass: y[n] = x[n] + pole * y[n-1]
pub fn one_pole_lowpass(signal: &mut [f32], pole: f32) {
    let mut previous = 0.0f32;
    for sample in signal.iter_mut() {
        previous = *sample + pole * previous;
        *sample = previous;
    }
}

/// Add a tone centred exactly on each FFT bin in `bins`
///
/// Phases are computed from `(bin * n) mod fft_size` so every tone repeats
/// exactly once per window.
pub fn add_bin_tones<I>(signal: &mut [f32], fft_size: usize, bins: I, amplitude: f32)
where
    I: IntoIterator<Item = usize>,
{
    if fft_size == 0 {
        return;
    }
    for bin in bins {
        for (n, sample) in signal.iter_mut().enumerate() {
            let phase = ((bin * n) % fft_size) as f64 / fft_size as f64;
            *sample += (2.0 * PI * phase).sin() as f32 * amplitude;
        }
    }
}

/// Bins every `spacing` bins inside `band`, keeping `spacing / 2` bins of
/// margin at both edges
pub fn comb_bins(band: std::ops::RangeInclusive<usize>, spacing: usize) -> Vec<usize> {
    let spacing = spacing.max(2);
    let margin = spacing / 2;
    let start = band.start() + margin;
    let end = band.end().saturating_sub(margin);
    (start..=end).step_by(spacing).collect()
}

/// Comb-artifact fixture: `windows` FFT windows of impulse bed plus tones every
/// `spacing` bins across the configured band
pub fn artifact_comb(
    config: &ClassifierConfig,
    windows: usize,
    spacing: usize,
) -> Result<Vec<f32>, AnalysisError> {
    let (fmin, fmax) = config.band;
    let transformer =
        SpectralTransformer::new(config.sample_rate, config.fft_size, fmin, fmax)?;
    let bins = comb_bins(transformer.band_bins(), spacing);

    let mut signal = impulse_train(config.fft_size * windows, config.fft_size, BED_AMPLITUDE);
    add_bin_tones(&mut signal, config.fft_size, bins, COMB_TONE_AMPLITUDE);
    Ok(signal)
}

/// Number of comb tones [`artifact_comb`] places in the configured band
pub fn artifact_comb_tones(config: &ClassifierConfig, spacing: usize) -> Result<usize, AnalysisError> {
    let (fmin, fmax) = config.band;
    let transformer =
        SpectralTransformer::new(config.sample_rate, config.fft_size, fmin, fmax)?;
    Ok(comb_bins(transformer.band_bins(), spacing).len())
}

/// Natural-rolloff fixture: `windows` FFT windows of lowpassed impulse bed
pub fn natural_rolloff(config: &ClassifierConfig, windows: usize) -> Vec<f32> {
    let mut signal = impulse_train(config.fft_size * windows, config.fft_size, BED_AMPLITUDE);
    one_pole_lowpass(&mut signal, ROLLOFF_POLE);
    signal
}

/// Write a mono 32-bit float WAV
pub fn write_wav_f32<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()
}

/// Write interleaved 16-bit PCM with `channels` channels
pub fn write_wav_i16<P: AsRef<Path>>(
    path: P,
    interleaved: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in interleaved {
        let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer.write_sample(scaled)?;
    }
    writer.finalize()
}

/// Write a PCM WAV with an arbitrary header bit depth and raw sample bytes,
/// including depths `hound::WavWriter` refuses to produce
pub fn write_raw_pcm_wav<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    data: &[u8],
) -> std::io::Result<()> {
    let block_align = channels * bits_per_sample.div_ceil(8);
    let byte_rate = sample_rate * block_align as u32;

    let mut bytes = Vec::with_capacity(44 + data.len());
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&bits_per_sample.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(data);
    std::fs::write(path, bytes)
}

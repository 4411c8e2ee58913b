// Audio module - WAV intake for the analysis pipeline
//
// Decodes integer (8/16/24/32-bit) and float WAV files with hound, averages
// interleaved channels to mono, truncates to the configured maximum duration,
// and linearly resamples to the pipeline rate. Every failure is reported as
// `DecodeUnavailable` so callers can tell intake problems from analysis ones.

use std::path::Path;

use serde::Serialize;

use crate::error::AnalysisError;

/// Default cap on analyzed audio, in seconds
pub const DEFAULT_MAX_DURATION_SECS: f64 = 180.0;

/// Decoded mono waveform at the pipeline sample rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waveform {
    #[serde(skip)]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Rate stored in the file before resampling
    pub source_rate: u32,
    pub source_channels: u16,
    /// True when the file was longer than the duration cap
    pub truncated: bool,
}

impl Waveform {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / self.sample_rate as f64
        }
    }
}

/// Load a WAV file as a mono waveform at `target_rate`
///
/// # Errors
/// `DecodeUnavailable` for unreadable files, unsupported sample formats, or
/// files with no samples.
pub fn load_wav_mono<P: AsRef<Path>>(
    path: P,
    target_rate: u32,
    max_duration_secs: f64,
) -> Result<Waveform, AnalysisError> {
    let path = path.as_ref();
    let decode_error = |reason: String| AnalysisError::DecodeUnavailable {
        reason: format!("{}: {}", path.display(), reason),
    };

    if target_rate == 0 {
        return Err(decode_error("target sample rate is zero".to_string()));
    }

    let mut reader = hound::WavReader::open(path).map_err(|err| decode_error(err.to_string()))?;
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(decode_error(format!(
            "invalid header ({} channels at {} Hz)",
            spec.channels, spec.sample_rate
        )));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|err| decode_error(err.to_string()))?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            bits @ (8 | 16) => {
                let max = int_full_scale(bits);
                reader
                    .samples::<i16>()
                    .map(|sample| sample.map(|value| value as f32 / max))
                    .collect::<Result<Vec<f32>, _>>()
                    .map_err(|err| decode_error(err.to_string()))?
            }
            bits @ (24 | 32) => {
                let max = int_full_scale(bits);
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 / max))
                    .collect::<Result<Vec<f32>, _>>()
                    .map_err(|err| decode_error(err.to_string()))?
            }
            other => {
                return Err(decode_error(format!(
                    "unsupported bits per sample {}",
                    other
                )))
            }
        },
    };

    let mut mono = downmix(&interleaved, spec.channels);
    if mono.is_empty() {
        return Err(decode_error("no audio frames".to_string()));
    }

    let max_frames = max_frame_count(max_duration_secs, spec.sample_rate);
    let truncated = mono.len() > max_frames;
    if truncated {
        mono.truncate(max_frames);
        tracing::debug!(
            "[Audio] {} truncated to {:.1}s",
            path.display(),
            max_duration_secs
        );
    }

    let samples = resample_linear(&mono, spec.sample_rate, target_rate);
    tracing::debug!(
        "[Audio] Decoded {}: {} ch @ {} Hz ({}-bit {:?}) -> {} samples @ {} Hz",
        path.display(),
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format,
        samples.len(),
        target_rate
    );

    Ok(Waveform {
        samples,
        sample_rate: target_rate,
        source_rate: spec.sample_rate,
        source_channels: spec.channels,
        truncated,
    })
}

/// Average interleaved frames to mono; a trailing partial frame is dropped
pub fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear-interpolation resampler
///
/// Output length is `floor(len * sr_out / sr_in)`, at least one sample for a
/// non-empty input. Equal rates return the input unchanged.
pub fn resample_linear(input: &[f32], sr_in: u32, sr_out: u32) -> Vec<f32> {
    if input.is_empty() || sr_in == 0 || sr_out == 0 || sr_in == sr_out {
        return input.to_vec();
    }
    let out_len = ((input.len() as u128 * sr_out as u128) / sr_in as u128).max(1) as usize;
    let step = sr_in as f64 / sr_out as f64;
    let last = input[input.len() - 1];

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let i0 = pos.floor() as usize;
            if i0 + 1 >= input.len() {
                last
            } else {
                let t = (pos - i0 as f64) as f32;
                let a = input[i0];
                a + (input[i0 + 1] - a) * t
            }
        })
        .collect()
}

/// Largest positive value of a signed integer sample of `bits` width
fn int_full_scale(bits: u16) -> f32 {
    ((1i64 << (bits - 1)) - 1) as f32
}

fn max_frame_count(max_duration_secs: f64, sample_rate: u32) -> usize {
    if max_duration_secs.is_finite() && max_duration_secs > 0.0 {
        (max_duration_secs * sample_rate as f64).round() as usize
    } else {
        usize::MAX
    }
}

// Analysis module - fakeprint pipeline from waveform to verdict
//
// Pipeline: SpectralTransformer → hull normalization → FeatureExtractor →
// Scorer (heuristic or trained) → DecisionMapper
//
// Every call is a pure function of its inputs. The only shared value is the
// optional trained model, held read-only behind an Arc in ClassifierConfig.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod decision;
pub mod fakeprint;
pub mod features;
pub mod model;
pub mod scorer;

use decision::{DecisionMapper, Verdict, DEFAULT_THRESHOLD};
use fakeprint::FakeprintExtractor;
use features::{FeatureExtractor, FeatureSet};
use model::TrainedModel;
use scorer::{Backend, HeuristicScorer, ScoreBreakdown, Scorer};

use crate::error::AnalysisError;

/// Sample rate the pipeline expects from the decoder
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
/// FFT window (2^14)
pub const DEFAULT_FFT_SIZE: usize = 16_384;
/// Analysis band in Hz
pub const DEFAULT_BAND: (f64, f64) = (5_000.0, 16_000.0);

static HEURISTIC: HeuristicScorer = HeuristicScorer;

/// Immutable per-deployment classifier settings
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub sample_rate: u32,
    pub fft_size: usize,
    /// (fmin, fmax) in Hz, inclusive
    pub band: (f64, f64),
    /// Decision threshold on the 0-100 score
    pub threshold: f64,
    pub backend: Backend,
    pub model: Option<Arc<TrainedModel>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            fft_size: DEFAULT_FFT_SIZE,
            band: DEFAULT_BAND,
            threshold: DEFAULT_THRESHOLD,
            backend: Backend::Heuristic,
            model: None,
        }
    }
}

impl ClassifierConfig {
    /// Select the trained backend with a loaded model
    pub fn with_model(mut self, model: Arc<TrainedModel>) -> Self {
        self.backend = Backend::Trained;
        self.model = Some(model);
        self
    }

    /// Resolve the configured scorer
    ///
    /// # Errors
    /// `BackendUnavailable` when the trained backend is selected without a
    /// model. There is no fallback to the heuristic scorer.
    pub fn scorer(&self) -> Result<&dyn Scorer, AnalysisError> {
        match self.backend {
            Backend::Heuristic => Ok(&HEURISTIC as &dyn Scorer),
            Backend::Trained => self
                .model
                .as_deref()
                .map(|model| model as &dyn Scorer)
                .ok_or(AnalysisError::BackendUnavailable),
        }
    }
}

/// Features and score audit attached to every result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDetails {
    pub features: FeatureSet,
    pub breakdown: ScoreBreakdown,
}

/// Final classification of one waveform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub is_ai_generated: bool,
    /// Distance of the score from the threshold, 0.0-1.0
    pub confidence: f64,
    /// Equal to the final score
    pub ai_probability: f64,
    /// 100 - score
    pub human_probability: f64,
    pub verdict: Verdict,
    pub label: String,
    pub backend: Backend,
    pub details: AnalysisDetails,
}

impl ClassificationResult {
    pub fn score(&self) -> f64 {
        self.details.breakdown.final_score
    }
}

/// Classify a mono waveform
///
/// # Errors
/// - `DecodeUnavailable`: empty waveform, non-finite samples, or a sample
///   rate other than `config.sample_rate`
/// - `BackendUnavailable`: trained backend without a model
/// - `EmptyBand`: band has no bins at this sample rate and FFT size
/// - `InsufficientSignal`: waveform shorter than one FFT window
pub fn classify(
    waveform: &[f32],
    sample_rate: u32,
    config: &ClassifierConfig,
) -> Result<ClassificationResult, AnalysisError> {
    validate_waveform(waveform, sample_rate, config)?;
    let scorer = config.scorer()?;
    let features = extract_features_unchecked(waveform, config)?;
    Ok(score_features(&features, scorer, config.threshold))
}

/// Run the spectral and feature stages only
pub fn extract_features(
    waveform: &[f32],
    sample_rate: u32,
    config: &ClassifierConfig,
) -> Result<FeatureSet, AnalysisError> {
    validate_waveform(waveform, sample_rate, config)?;
    extract_features_unchecked(waveform, config)
}

/// Score an already extracted feature set with the configured backend
pub fn classify_features(
    features: &FeatureSet,
    config: &ClassifierConfig,
) -> Result<ClassificationResult, AnalysisError> {
    let scorer = config.scorer()?;
    Ok(score_features(features, scorer, config.threshold))
}

fn extract_features_unchecked(
    waveform: &[f32],
    config: &ClassifierConfig,
) -> Result<FeatureSet, AnalysisError> {
    let (fmin, fmax) = config.band;
    let extractor = FakeprintExtractor::new(config.sample_rate, config.fft_size, fmin, fmax)?;
    let transformer = extractor.transformer();
    tracing::debug!(
        "[Fakeprint] STFT n={} hop={} over bins {:?} for {} samples",
        transformer.fft_size(),
        transformer.hop_size(),
        transformer.band_bins(),
        waveform.len()
    );
    let fakeprint = extractor.extract(waveform)?;
    let features = FeatureExtractor::new().extract(&fakeprint);

    tracing::debug!(
        "[Features] peaks high/medium/low={}/{}/{}, regularity={:.3} (cv={:.3}), mean={:.4}, max={:.4}, p90={:.4}, kurtosis={:.2}, periodicity={:.3}, hf_ratio={:.3e}",
        features.peaks_high.count,
        features.peaks_medium.count,
        features.peaks_low.count,
        features.regularity_score,
        features.spacing_cv,
        features.mean,
        features.max,
        features.p90,
        features.kurtosis,
        features.periodicity_score,
        features.hf_energy_ratio
    );

    Ok(features)
}

fn score_features(features: &FeatureSet, scorer: &dyn Scorer, threshold: f64) -> ClassificationResult {
    let breakdown = scorer.score(features);
    for correction in &breakdown.corrections {
        tracing::debug!(
            "[Scorer] {} {:+.1}",
            correction.rule.name(),
            correction.delta
        );
    }

    let decision = DecisionMapper::new(threshold).decide(breakdown.final_score);
    tracing::info!(
        "[Scorer] backend={:?} base={:.1} final={:.1} verdict={}",
        breakdown.backend,
        breakdown.base,
        breakdown.final_score,
        decision.verdict.label()
    );

    ClassificationResult {
        is_ai_generated: decision.is_ai_generated,
        confidence: decision.confidence,
        ai_probability: decision.ai_probability,
        human_probability: decision.human_probability,
        verdict: decision.verdict,
        label: decision.verdict.label().to_string(),
        backend: scorer.backend(),
        details: AnalysisDetails {
            features: *features,
            breakdown,
        },
    }
}

fn validate_waveform(
    waveform: &[f32],
    sample_rate: u32,
    config: &ClassifierConfig,
) -> Result<(), AnalysisError> {
    if waveform.is_empty() {
        return Err(AnalysisError::DecodeUnavailable {
            reason: "empty waveform".to_string(),
        });
    }
    if sample_rate != config.sample_rate {
        return Err(AnalysisError::DecodeUnavailable {
            reason: format!(
                "waveform at {} Hz, pipeline expects {} Hz",
                sample_rate, config.sample_rate
            ),
        });
    }
    if let Some(index) = waveform.iter().position(|s| !s.is_finite()) {
        return Err(AnalysisError::DecodeUnavailable {
            reason: format!("non-finite sample at index {}", index),
        });
    }
    Ok(())
}

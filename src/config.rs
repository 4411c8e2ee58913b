//! Configuration management for the detector
//!
//! Runtime configuration is loaded from a JSON file so analysis parameters,
//! the decision threshold and the scoring backend can be changed without
//! recompilation. Every field has a default; a partial file only overrides
//! what it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::decision::DEFAULT_THRESHOLD;
use crate::analysis::model::TrainedModel;
use crate::analysis::scorer::Backend;
use crate::analysis::{ClassifierConfig, DEFAULT_BAND, DEFAULT_FFT_SIZE, DEFAULT_SAMPLE_RATE};
use crate::audio::DEFAULT_MAX_DURATION_SECS;
use crate::error::AnalysisError;

/// Smallest FFT window accepted by `validate`
pub const MIN_FFT_SIZE: usize = 64;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub decision: DecisionConfig,
    pub backend: BackendConfig,
}

/// Spectral analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rate every input is resampled to before analysis
    pub sample_rate: u32,
    /// FFT window size in samples (power of two)
    pub fft_size: usize,
    /// Lower edge of the analysis band in Hz
    pub fmin_hz: f64,
    /// Upper edge of the analysis band in Hz, clipped to Nyquist
    pub fmax_hz: f64,
    /// Longer inputs are truncated to this many seconds
    pub max_duration_secs: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            fft_size: DEFAULT_FFT_SIZE,
            fmin_hz: DEFAULT_BAND.0,
            fmax_hz: DEFAULT_BAND.1,
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
        }
    }
}

/// Decision mapping parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Scores strictly above this are flagged as AI-generated
    pub threshold: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Scoring backend selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: Backend,
    /// Trained model artifact, required when `kind` is `trained`
    pub model_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// A missing or malformed file is not fatal: the defaults are returned
    /// and a warning is logged.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Reject values the pipeline cannot run with
    ///
    /// # Errors
    /// `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |reason: String| -> Result<(), AnalysisError> {
            Err(AnalysisError::InvalidConfig { reason })
        };
        let analysis = &self.analysis;

        if analysis.sample_rate == 0 {
            return invalid("analysis.sample_rate must be positive".to_string());
        }
        if analysis.fft_size < MIN_FFT_SIZE || !analysis.fft_size.is_power_of_two() {
            return invalid(format!(
                "analysis.fft_size must be a power of two >= {}, got {}",
                MIN_FFT_SIZE, analysis.fft_size
            ));
        }
        if !analysis.fmin_hz.is_finite()
            || !analysis.fmax_hz.is_finite()
            || analysis.fmin_hz < 0.0
            || analysis.fmin_hz > analysis.fmax_hz
        {
            return invalid(format!(
                "analysis band [{}, {}] Hz is not a valid range",
                analysis.fmin_hz, analysis.fmax_hz
            ));
        }
        if analysis.max_duration_secs.is_nan() || analysis.max_duration_secs <= 0.0 {
            return invalid(format!(
                "analysis.max_duration_secs must be positive, got {}",
                analysis.max_duration_secs
            ));
        }
        if !(0.0..=100.0).contains(&self.decision.threshold) {
            return invalid(format!(
                "decision.threshold must be within [0, 100], got {}",
                self.decision.threshold
            ));
        }
        if self.backend.kind == Backend::Trained && self.backend.model_path.is_none() {
            return invalid("backend.kind is trained but backend.model_path is not set".to_string());
        }
        Ok(())
    }

    /// Validate and build the immutable classifier configuration
    ///
    /// The trained model, when selected, is loaded here once and shared.
    pub fn build_classifier_config(&self) -> Result<ClassifierConfig, AnalysisError> {
        self.validate()?;

        let config = ClassifierConfig {
            sample_rate: self.analysis.sample_rate,
            fft_size: self.analysis.fft_size,
            band: (self.analysis.fmin_hz, self.analysis.fmax_hz),
            threshold: self.decision.threshold,
            backend: Backend::Heuristic,
            model: None,
        };

        match (&self.backend.kind, &self.backend.model_path) {
            (Backend::Trained, Some(path)) => {
                let model = TrainedModel::load(path)?;
                Ok(config.with_model(Arc::new(model)))
            }
            _ => Ok(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.analysis.sample_rate, 16_000);
        assert_eq!(config.analysis.fft_size, 16_384);
        assert_eq!(config.analysis.fmin_hz, 5_000.0);
        assert_eq!(config.analysis.fmax_hz, 16_000.0);
        assert_eq!(config.analysis.max_duration_secs, 180.0);
        assert_eq!(config.decision.threshold, 50.0);
        assert_eq!(config.backend.kind, Backend::Heuristic);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"decision": {"threshold": 65.0}}"#).unwrap();
        assert_eq!(parsed.decision.threshold, 65.0);
        assert_eq!(parsed.analysis, AnalysisConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/fakeprint/config.json");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!(
            "fakeprint_config_malformed_{}.json",
            std::process::id()
        ));
        fs::write(&path, "{ not json").unwrap();
        let config = AppConfig::load_from_file(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_fft_size() {
        let mut config = AppConfig::default();
        config.analysis.fft_size = 1000;
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidConfig { .. })
        ));
        config.analysis.fft_size = 32;
        assert!(config.validate().is_err());
        config.analysis.fft_size = 64;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let mut config = AppConfig::default();
        config.decision.threshold = 100.5;
        assert!(config.validate().is_err());
        config.decision.threshold = f64::NAN;
        assert!(config.validate().is_err());
        config.decision.threshold = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_sample_rate() {
        let mut config = AppConfig::default();
        config.analysis.sample_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trained_backend_requires_model_path() {
        let mut config = AppConfig::default();
        config.backend.kind = Backend::Trained;
        assert!(matches!(
            config.build_classifier_config(),
            Err(AnalysisError::InvalidConfig { .. })
        ));

        config.backend.model_path = Some(PathBuf::from("/nonexistent/fakeprint/model.json"));
        assert!(matches!(
            config.build_classifier_config(),
            Err(AnalysisError::Io { .. })
        ));
    }

    #[test]
    fn test_build_classifier_config_maps_fields() {
        let mut config = AppConfig::default();
        config.analysis.fft_size = 4096;
        config.analysis.fmax_hz = 8_000.0;
        config.decision.threshold = 60.0;

        let classifier = config.build_classifier_config().unwrap();
        assert_eq!(classifier.fft_size, 4096);
        assert_eq!(classifier.band, (5_000.0, 8_000.0));
        assert_eq!(classifier.threshold, 60.0);
        assert_eq!(classifier.backend, Backend::Heuristic);
        assert!(classifier.model.is_none());
    }
}

// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Analysis error code constants
///
/// Single source of truth for the codes reported in CLI failure payloads.
///
/// Error code range: 2001-2008
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Waveform shorter than one FFT window
    pub const INSUFFICIENT_SIGNAL: i32 = 2001;

    /// Configured frequency band has no bins at the given sample rate
    pub const EMPTY_BAND: i32 = 2002;

    /// No usable mono waveform could be produced
    pub const DECODE_UNAVAILABLE: i32 = 2003;

    /// Trained backend selected but no model loaded
    pub const BACKEND_UNAVAILABLE: i32 = 2004;

    /// Trained model artifact is malformed or incompatible
    pub const MODEL_INVALID: i32 = 2005;

    /// Training set cannot produce a model
    pub const TRAINING_DATA: i32 = 2006;

    /// Configuration value out of range
    pub const INVALID_CONFIG: i32 = 2007;

    /// Filesystem error
    pub const IO: i32 = 2008;
}

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Decode,
    Spectral,
    Scoring,
    Model,
    Config,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decode => "decode",
            Stage::Spectral => "spectral",
            Stage::Scoring => "scoring",
            Stage::Model => "model",
            Stage::Config => "config",
        };
        f.write_str(name)
    }
}

/// Log an analysis error with structured context
///
/// Logs the error code, the failing stage and the message. `context` is
/// typically the file name supplied by the caller.
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, stage={}, message={}",
        context,
        err.code(),
        err.stage(),
        err.message()
    );
}

/// Analysis-related errors
///
/// A flat or silent spectral profile is deliberately absent: it produces a
/// valid low-magnitude feature set instead of an error.
///
/// Error code range: 2001-2008
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Waveform shorter than one analysis window
    InsufficientSignal { samples: usize, required: usize },

    /// No FFT bin falls inside the configured band
    EmptyBand {
        fmin: f64,
        fmax: f64,
        sample_rate: u32,
    },

    /// Waveform missing, malformed, or at the wrong sample rate
    DecodeUnavailable { reason: String },

    /// Trained backend selected without a loaded model
    BackendUnavailable,

    /// Model artifact could not be used
    ModelInvalid { reason: String },

    /// Training set is unusable
    TrainingData { reason: String },

    /// Configuration value rejected by validation
    InvalidConfig { reason: String },

    /// Filesystem error
    Io { details: String },
}

impl AnalysisError {
    /// Stage of the pipeline this error belongs to
    pub fn stage(&self) -> Stage {
        match self {
            AnalysisError::InsufficientSignal { .. } | AnalysisError::EmptyBand { .. } => {
                Stage::Spectral
            }
            AnalysisError::DecodeUnavailable { .. } | AnalysisError::Io { .. } => Stage::Decode,
            AnalysisError::BackendUnavailable => Stage::Scoring,
            AnalysisError::ModelInvalid { .. } | AnalysisError::TrainingData { .. } => {
                Stage::Model
            }
            AnalysisError::InvalidConfig { .. } => Stage::Config,
        }
    }
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InsufficientSignal { .. } => AnalysisErrorCodes::INSUFFICIENT_SIGNAL,
            AnalysisError::EmptyBand { .. } => AnalysisErrorCodes::EMPTY_BAND,
            AnalysisError::DecodeUnavailable { .. } => AnalysisErrorCodes::DECODE_UNAVAILABLE,
            AnalysisError::BackendUnavailable => AnalysisErrorCodes::BACKEND_UNAVAILABLE,
            AnalysisError::ModelInvalid { .. } => AnalysisErrorCodes::MODEL_INVALID,
            AnalysisError::TrainingData { .. } => AnalysisErrorCodes::TRAINING_DATA,
            AnalysisError::InvalidConfig { .. } => AnalysisErrorCodes::INVALID_CONFIG,
            AnalysisError::Io { .. } => AnalysisErrorCodes::IO,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::InsufficientSignal { samples, required } => format!(
                "Waveform too short: {} samples, at least {} required for one analysis window",
                samples, required
            ),
            AnalysisError::EmptyBand {
                fmin,
                fmax,
                sample_rate,
            } => format!(
                "No frequency bins between {} Hz and {} Hz at {} Hz sample rate",
                fmin, fmax, sample_rate
            ),
            AnalysisError::DecodeUnavailable { reason } => {
                format!("No usable waveform: {}", reason)
            }
            AnalysisError::BackendUnavailable => {
                "Trained backend selected but no model is loaded".to_string()
            }
            AnalysisError::ModelInvalid { reason } => format!("Invalid model: {}", reason),
            AnalysisError::TrainingData { reason } => {
                format!("Cannot train model: {}", reason)
            }
            AnalysisError::InvalidConfig { reason } => {
                format!("Invalid configuration: {}", reason)
            }
            AnalysisError::Io { details } => format!("I/O error: {}", details),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError (code {}, stage {}): {}",
            self.code(),
            self.stage(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}

/// Convert from std::io::Error to AnalysisError
impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::Io {
            details: err.to_string(),
        }
    }
}

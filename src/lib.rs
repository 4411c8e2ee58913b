// Fakeprint Detector Core - AI-generated audio detection
// Spectral fingerprint of decoder artifacts scored by a heuristic or trained backend

// Module declarations
pub mod analysis;
pub mod audio;
pub mod batch;
pub mod config;
pub mod error;
pub mod testing;

// Re-exports for convenience
pub use analysis::decision::Verdict;
pub use analysis::scorer::{Backend, Scorer};
pub use analysis::{classify, ClassificationResult, ClassifierConfig};
pub use audio::{load_wav_mono, Waveform};
pub use batch::{analyze_batch, BatchOptions, FileReport};
pub use config::AppConfig;
pub use error::{AnalysisError, ErrorCode};

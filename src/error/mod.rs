// Error types for the fakeprint detector
//
// This module defines the error type shared by the analysis pipeline, the
// audio intake and the trained-model lifecycle, with stable numeric codes so
// reports emitted by the CLI can be matched programmatically.

mod analysis;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes, Stage};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent JSON failure reports.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

// Batch driver - analyze many files on a bounded pool of worker threads
//
// Workers pull the next file index from a shared atomic counter, so a slow
// file never stalls the rest of the queue. Reports come back in input order
// and a failing file only produces a failure report for itself, even when
// its analysis panics.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use serde::Serialize;

use crate::analysis::{classify, ClassificationResult, ClassifierConfig};
use crate::audio::{load_wav_mono, Waveform, DEFAULT_MAX_DURATION_SECS};
use crate::error::{log_analysis_error, AnalysisError, AnalysisErrorCodes, ErrorCode, Stage};

/// Worker pool settings
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Upper bound on worker threads; clamped to [1, number of files]
    pub workers: usize,
    pub max_duration_secs: f64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
        }
    }
}

/// Machine-readable description of a failed file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    pub stage: Stage,
    pub code: i32,
    pub message: String,
}

impl From<&AnalysisError> for FailureReport {
    fn from(err: &AnalysisError) -> Self {
        Self {
            stage: err.stage(),
            code: err.code(),
            message: err.message(),
        }
    }
}

/// Outcome of one file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Analyzed {
        audio: Waveform,
        result: ClassificationResult,
    },
    Failed {
        error: FailureReport,
    },
}

/// Report for one input file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FileOutcome::Analyzed { .. })
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        match &self.outcome {
            FileOutcome::Analyzed { result, .. } => Some(result),
            FileOutcome::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReport> {
        match &self.outcome {
            FileOutcome::Failed { error } => Some(error),
            FileOutcome::Analyzed { .. } => None,
        }
    }
}

/// Decode and classify a single file
pub fn analyze_file(path: &Path, config: &ClassifierConfig, max_duration_secs: f64) -> FileReport {
    let file = path.display().to_string();
    let outcome = load_wav_mono(path, config.sample_rate, max_duration_secs).and_then(|audio| {
        classify(&audio.samples, audio.sample_rate, config).map(|result| (audio, result))
    });

    match outcome {
        Ok((audio, result)) => FileReport {
            file,
            outcome: FileOutcome::Analyzed { audio, result },
        },
        Err(err) => {
            log_analysis_error(&err, &file);
            FileReport {
                file,
                outcome: FileOutcome::Failed {
                    error: FailureReport::from(&err),
                },
            }
        }
    }
}

/// Analyze every path; the returned reports keep the input order
pub fn analyze_batch(
    paths: &[PathBuf],
    config: &ClassifierConfig,
    options: &BatchOptions,
) -> Vec<FileReport> {
    if paths.is_empty() {
        return Vec::new();
    }

    let workers = options.workers.clamp(1, paths.len());
    let next = AtomicUsize::new(0);
    tracing::info!(
        "[Batch] Analyzing {} files on {} workers",
        paths.len(),
        workers
    );

    let mut slots: Vec<Option<FileReport>> = vec![None; paths.len()];
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(path) = paths.get(index) else {
                            break;
                        };
                        done.push((
                            index,
                            isolated(path, || {
                                analyze_file(path, config, options.max_duration_secs)
                            }),
                        ));
                    }
                    done
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(done) => {
                    for (index, report) in done {
                        slots[index] = Some(report);
                    }
                }
                Err(_) => tracing::error!("[Batch] Worker thread panicked"),
            }
        }
    });

    slots
        .into_iter()
        .zip(paths)
        .map(|(slot, path)| slot.unwrap_or_else(|| worker_lost(path)))
        .collect()
}

/// Run one file's analysis, turning a panic into a failure report for that file
fn isolated<F>(path: &Path, analyze: F) -> FileReport
where
    F: FnOnce() -> FileReport,
{
    panic::catch_unwind(AssertUnwindSafe(analyze)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!("[Batch] Analysis of {} panicked: {}", path.display(), reason);
        decode_failure(path, format!("analysis panicked: {}", reason))
    })
}

/// Report for a file whose worker died before returning it
fn worker_lost(path: &Path) -> FileReport {
    decode_failure(path, "worker thread terminated before reporting".to_string())
}

fn decode_failure(path: &Path, message: String) -> FileReport {
    FileReport {
        file: path.display().to_string(),
        outcome: FileOutcome::Failed {
            error: FailureReport {
                stage: Stage::Decode,
                code: AnalysisErrorCodes::DECODE_UNAVAILABLE,
                message,
            },
        },
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fakeprint_detector::analysis::extract_features;
use fakeprint_detector::analysis::features::FeatureSet;
use fakeprint_detector::analysis::model::{
    evaluate, split_train_test, train, Evaluation, SampleLabel, TrainingOptions,
};
use fakeprint_detector::batch::{analyze_batch, analyze_file, BatchOptions, FileOutcome, FileReport};
use fakeprint_detector::config::AppConfig;
use fakeprint_detector::error::log_analysis_error;
use fakeprint_detector::{load_wav_mono, ClassifierConfig};
use serde::Serialize;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "fakeprint_cli",
    about = "Detect AI-generated audio from its high-frequency spectral fingerprint"
)]
struct Cli {
    /// JSON configuration file (defaults are used when omitted or unreadable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log every pipeline stage to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify one WAV file and print a JSON report
    Classify {
        file: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Classify many WAV files in parallel
    Batch {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Train a logistic-regression model from labelled directories of WAV files
    Train {
        #[arg(long)]
        human: PathBuf,
        #[arg(long)]
        ai: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 0.2)]
        test_fraction: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Minimum training files per class
        #[arg(long, default_value_t = TrainingOptions::default().min_per_class)]
        min_per_class: usize,
    },
    /// Print the effective configuration
    Info,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let app_config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Classify { file, output } => run_classify(&app_config, &file, output),
        Commands::Batch { files, workers } => run_batch(&app_config, &files, workers),
        Commands::Train {
            human,
            ai,
            output,
            test_fraction,
            seed,
            min_per_class,
        } => {
            let options = TrainingOptions {
                min_per_class,
                ..TrainingOptions::default()
            };
            let split = SplitOptions {
                test_fraction,
                seed,
            };
            run_train(&app_config, &human, &ai, &output, split, &options)
        }
        Commands::Info => run_info(&app_config),
    }
}

fn classifier_config(app_config: &AppConfig) -> Result<ClassifierConfig> {
    app_config
        .build_classifier_config()
        .context("building classifier configuration")
}

fn run_classify(app_config: &AppConfig, file: &Path, output: Option<PathBuf>) -> Result<ExitCode> {
    let config = classifier_config(app_config)?;
    let report = analyze_file(file, &config, app_config.analysis.max_duration_secs);

    match &report.outcome {
        FileOutcome::Analyzed { .. } => {
            emit_json(&report, output)?;
            Ok(ExitCode::from(0))
        }
        FileOutcome::Failed { error } => {
            bail!(
                "analyzing {}: {} (code {}, stage {})",
                file.display(),
                error.message,
                error.code,
                error.stage
            )
        }
    }
}

fn run_batch(app_config: &AppConfig, files: &[PathBuf], workers: Option<usize>) -> Result<ExitCode> {
    let config = classifier_config(app_config)?;
    let defaults = BatchOptions::default();
    let options = BatchOptions {
        workers: workers.unwrap_or(defaults.workers),
        max_duration_secs: app_config.analysis.max_duration_secs,
    };

    let reports = analyze_batch(files, &config, &options);
    let failed = reports.iter().filter(|r| !r.is_success()).count();
    emit_json(
        &BatchPayload {
            total: reports.len(),
            failed,
            reports: &reports,
        },
        None,
    )?;

    if failed > 0 {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_train(
    app_config: &AppConfig,
    human_dir: &Path,
    ai_dir: &Path,
    output: &Path,
    split: SplitOptions,
    options: &TrainingOptions,
) -> Result<ExitCode> {
    if !(0.0..1.0).contains(&split.test_fraction) {
        bail!("--test-fraction must be in [0, 1), got {}", split.test_fraction);
    }
    // Features are extracted with the configured analysis parameters; the
    // backend selection is irrelevant while training.
    let mut analysis_config = app_config.clone();
    analysis_config.backend = Default::default();
    let config = classifier_config(&analysis_config)?;

    let mut samples = collect_features(human_dir, SampleLabel::Human, &config, app_config)?;
    samples.extend(collect_features(ai_dir, SampleLabel::Ai, &config, app_config)?);

    let (train_set, test_set) = split_train_test(samples, split.test_fraction, split.seed);
    let model = train(&train_set, options)
        .context("training logistic-regression model")?;
    model
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;

    let evaluation = evaluate(&model, &test_set, config.threshold);
    emit_json(
        &TrainPayload {
            model: output,
            train_samples: train_set.len(),
            test_samples: test_set.len(),
            evaluation: &evaluation,
        },
        None,
    )?;
    Ok(ExitCode::from(0))
}

#[derive(Debug, Clone, Copy)]
struct SplitOptions {
    test_fraction: f64,
    seed: u64,
}

fn run_info(app_config: &AppConfig) -> Result<ExitCode> {
    app_config
        .validate()
        .context("validating configuration")?;
    emit_json(
        &InfoPayload {
            version: env!("CARGO_PKG_VERSION"),
            config: app_config,
        },
        None,
    )?;
    Ok(ExitCode::from(0))
}

/// Extract features from every `.wav` file directly inside `dir`
fn collect_features(
    dir: &Path,
    label: SampleLabel,
    config: &ClassifierConfig,
    app_config: &AppConfig,
) -> Result<Vec<(FeatureSet, SampleLabel)>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
        })
        .collect();
    paths.sort();

    let mut samples = Vec::with_capacity(paths.len());
    for path in &paths {
        let features = load_wav_mono(path, config.sample_rate, app_config.analysis.max_duration_secs)
            .and_then(|audio| extract_features(&audio.samples, audio.sample_rate, config));
        match features {
            Ok(features) => samples.push((features, label)),
            Err(err) => log_analysis_error(&err, &path.display().to_string()),
        }
    }
    tracing::info!(
        "[Train] {} of {} files usable in {}",
        samples.len(),
        paths.len(),
        dir.display()
    );
    Ok(samples)
}

fn emit_json<T: Serialize>(payload: &T, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

#[derive(Serialize)]
struct BatchPayload<'a> {
    total: usize,
    failed: usize,
    reports: &'a [FileReport],
}

#[derive(Serialize)]
struct TrainPayload<'a> {
    model: &'a Path,
    train_samples: usize,
    test_samples: usize,
    evaluation: &'a Evaluation,
}

#[derive(Serialize)]
struct InfoPayload<'a> {
    version: &'a str,
    config: &'a AppConfig,
}

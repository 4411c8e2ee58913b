// End-to-end tests: WAV file -> intake -> fakeprint -> score -> verdict

use std::path::PathBuf;
use std::sync::Arc;

use fakeprint_detector::analysis::model::{train, SampleLabel, TrainedModel, TrainingOptions};
use fakeprint_detector::analysis::{extract_features, DEFAULT_SAMPLE_RATE};
use fakeprint_detector::config::AppConfig;
use fakeprint_detector::testing::signals;
use fakeprint_detector::{
    analyze_batch, classify, load_wav_mono, AnalysisError, Backend, BatchOptions, ClassifierConfig,
    ErrorCode, Verdict,
};

fn small_config() -> ClassifierConfig {
    ClassifierConfig {
        fft_size: 4096,
        band: (5_000.0, 8_000.0),
        ..ClassifierConfig::default()
    }
}

fn temp_file(name: &str, extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "fakeprint_it_{}_{}.{}",
        name,
        std::process::id(),
        extension
    ))
}

#[test]
fn test_wav_roundtrip_classifies_comb_as_ai() {
    let config = small_config();
    let path = temp_file("comb", "wav");
    let waveform = signals::artifact_comb(&config, 8, 10).unwrap();
    signals::write_wav_f32(&path, &waveform, DEFAULT_SAMPLE_RATE).unwrap();

    let audio = load_wav_mono(&path, config.sample_rate, 180.0).unwrap();
    let _ = std::fs::remove_file(&path);
    let result = classify(&audio.samples, audio.sample_rate, &config).unwrap();

    assert_eq!(result.verdict, Verdict::LikelyAi);
    assert!(result.is_ai_generated);
    assert!(result.confidence > 0.5);
}

#[test]
fn test_wav_at_foreign_rate_is_resampled_before_analysis() {
    let config = small_config();
    let path = temp_file("rolloff_32k", "wav");
    // Twice the pipeline rate and twice the windows: the same duration after resampling
    let source = ClassifierConfig {
        sample_rate: 32_000,
        ..config.clone()
    };
    signals::write_wav_f32(&path, &signals::natural_rolloff(&source, 8), 32_000).unwrap();

    let audio = load_wav_mono(&path, config.sample_rate, 180.0).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(audio.source_rate, 32_000);
    assert_eq!(audio.sample_rate, DEFAULT_SAMPLE_RATE);
    assert_eq!(audio.samples.len(), 4096 * 4);
    let result = classify(&audio.samples, audio.sample_rate, &config).unwrap();
    assert!((0.0..=100.0).contains(&result.score()));
}

#[test]
fn test_scores_stay_bounded_across_fixtures() {
    let config = small_config();
    let fixtures = vec![
        signals::silence(4096 * 2),
        signals::white_noise(4096 * 4, 0.5, 1),
        signals::white_noise(4096 * 4, 1e-6, 2),
        signals::sine(DEFAULT_SAMPLE_RATE, 6_000.0, 4096 * 4, 0.8),
        signals::sine(DEFAULT_SAMPLE_RATE, 440.0, 4096 * 4, 0.8),
        signals::impulse_train(4096 * 4, 37, 0.9),
        signals::natural_rolloff(&config, 4),
        signals::artifact_comb(&config, 4, 3).unwrap(),
    ];

    for waveform in fixtures {
        let result = classify(&waveform, config.sample_rate, &config).unwrap();
        assert!((0.0..=100.0).contains(&result.score()));
        assert!((0.0..=1.0).contains(&result.confidence));
        assert_eq!(result.label, result.verdict.label());
        assert_eq!(result.is_ai_generated, result.score() > config.threshold);
    }
}

#[test]
fn test_config_file_drives_the_pipeline() {
    let config_path = temp_file("config", "json");
    std::fs::write(
        &config_path,
        r#"{
            "analysis": { "fft_size": 4096, "fmax_hz": 8000.0 },
            "decision": { "threshold": 90.0 }
        }"#,
    )
    .unwrap();

    let app_config = AppConfig::load_from_file(&config_path);
    let _ = std::fs::remove_file(&config_path);
    let config = app_config.build_classifier_config().unwrap();
    assert_eq!(config.fft_size, 4096);

    let waveform = signals::artifact_comb(&config, 8, 10).unwrap();
    let result = classify(&waveform, config.sample_rate, &config).unwrap();
    // Verdict bands are fixed; only the binary flag follows the threshold
    assert_eq!(result.verdict, Verdict::LikelyAi);
    assert_eq!(result.is_ai_generated, result.score() > 90.0);
}

#[test]
fn test_trained_model_from_disk() {
    let config = small_config();
    let comb = extract_features(
        &signals::artifact_comb(&config, 4, 10).unwrap(),
        config.sample_rate,
        &config,
    )
    .unwrap();
    let rolloff = extract_features(
        &signals::natural_rolloff(&config, 4),
        config.sample_rate,
        &config,
    )
    .unwrap();

    let mut samples = Vec::new();
    for i in 0..10 {
        let mut ai = comb;
        ai.max *= 1.0 + i as f64 * 0.02;
        ai.mean *= 1.0 - i as f64 * 0.01;
        let mut human = rolloff;
        human.max += i as f64 * 1e-3;
        human.hf_energy_ratio *= 1.0 + i as f64 * 0.05;
        samples.push((ai, SampleLabel::Ai));
        samples.push((human, SampleLabel::Human));
    }
    let model_path = temp_file("model", "json");
    train(&samples, &TrainingOptions::default())
        .unwrap()
        .save(&model_path)
        .unwrap();

    let mut app_config = AppConfig::default();
    app_config.analysis.fft_size = 4096;
    app_config.analysis.fmax_hz = 8_000.0;
    app_config.backend.kind = Backend::Trained;
    app_config.backend.model_path = Some(model_path.clone());
    let trained = app_config.build_classifier_config();
    let _ = std::fs::remove_file(&model_path);
    let trained = trained.unwrap();

    assert_eq!(trained.backend, Backend::Trained);
    let waveform = signals::artifact_comb(&trained, 4, 10).unwrap();
    let result = classify(&waveform, trained.sample_rate, &trained).unwrap();
    assert_eq!(result.backend, Backend::Trained);
    assert!(result.is_ai_generated);
}

#[test]
fn test_corrupt_model_is_rejected() {
    let path = temp_file("corrupt_model", "json");
    std::fs::write(&path, r#"{"feature_names": [], "means": [], "scales": [], "weights": [], "bias": 0.0}"#)
        .unwrap();
    let err = TrainedModel::load(&path).unwrap_err();
    let _ = std::fs::remove_file(&path);
    assert!(matches!(err, AnalysisError::ModelInvalid { .. }));
    assert_eq!(err.code(), 2005);
}

#[test]
fn test_shared_model_across_batch_workers() {
    let config = small_config();
    let model = TrainedModel {
        feature_names: fakeprint_detector::analysis::features::FEATURE_NAMES
            .iter()
            .map(|s| s.to_string())
            .collect(),
        means: vec![0.0; 11],
        scales: vec![1.0; 11],
        weights: vec![0.0; 11],
        bias: 0.0,
    };
    let trained = config.clone().with_model(Arc::new(model));

    let paths: Vec<PathBuf> = (0..3)
        .map(|i| {
            let path = temp_file(&format!("shared_{}", i), "wav");
            signals::write_wav_f32(
                &path,
                &signals::white_noise(4096 * 2, 0.1, i),
                DEFAULT_SAMPLE_RATE,
            )
            .unwrap();
            path
        })
        .collect();

    let reports = analyze_batch(
        &paths,
        &trained,
        &BatchOptions {
            workers: 3,
            ..BatchOptions::default()
        },
    );
    for path in &paths {
        let _ = std::fs::remove_file(path);
    }

    // Zero weights and bias: every score is exactly sigmoid(0) * 100
    for report in &reports {
        let result = report.result().unwrap();
        assert_eq!(result.backend, Backend::Trained);
        assert!((result.score() - 50.0).abs() < 1e-9);
        assert!(!result.is_ai_generated);
    }
}

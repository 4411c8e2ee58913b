use super::*;
use crate::analysis::decision::{DecisionMapper, Verdict};
use crate::analysis::features::PeakStats;

const TOLERANCE: f64 = 1e-9;

/// Helper to create a FeatureSet with the fields the rules read
fn create_features(
    density_high: f64,
    regularity: f64,
    mean: f64,
    max: f64,
    periodicity: f64,
    kurtosis: f64,
    hf_ratio: f64,
) -> FeatureSet {
    FeatureSet {
        peaks_high: PeakStats {
            count: 0,
            density: density_high,
        },
        regularity_score: regularity,
        mean,
        max,
        periodicity_score: periodicity,
        kurtosis,
        hf_energy_ratio: hf_ratio,
        bins: 3073,
        ..FeatureSet::default()
    }
}

/// Neutral features: no sub-score, no correction
fn quiet_features() -> FeatureSet {
    create_features(0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.01)
}

#[test]
fn test_strong_ai_example() {
    let features = create_features(0.2, 0.8, 0.3, 0.9, 0.6, 12.0, 0.0002);
    let breakdown = HeuristicScorer::new().score(&features);

    let sub = breakdown.sub_scores.expect("heuristic breakdown has sub-scores");
    assert_eq!(sub.density, 25.0);
    assert!((sub.regularity - 20.0).abs() < TOLERANCE);
    assert_eq!(sub.intensity, 20.0);
    assert_eq!(sub.max, 15.0);
    assert_eq!(sub.periodicity, 15.0);
    assert!((breakdown.base - 95.0).abs() < TOLERANCE);

    assert_eq!(breakdown.corrections.len(), 1);
    assert_eq!(
        breakdown.correction(CorrectionRule::ExtremeKurtosis),
        Some(-4.0)
    );
    assert!((breakdown.final_score - 91.0).abs() < TOLERANCE);

    let decision = DecisionMapper::default().decide(breakdown.final_score);
    assert_eq!(decision.verdict, Verdict::LikelyAi);
    assert!(decision.is_ai_generated);
}

#[test]
fn test_sophisticated_ai_example() {
    let mut features = create_features(0.06, 0.42, 0.12, 0.7, 0.2, 7.8, 3e-5);
    features.peaks_medium = PeakStats {
        count: 20,
        density: 0.05,
    };
    let breakdown = HeuristicScorer::new().score(&features);

    assert!(
        (breakdown.base - 50.5).abs() < TOLERANCE,
        "base {}",
        breakdown.base
    );
    assert_eq!(
        breakdown.correction(CorrectionRule::ModerateKurtosis),
        Some(3.0)
    );
    assert_eq!(breakdown.correction(CorrectionRule::LowHfEnergy), Some(-8.0));
    assert_eq!(
        breakdown.correction(CorrectionRule::MasteredRegularPattern),
        Some(15.0)
    );
    assert_eq!(breakdown.correction(CorrectionRule::ExtremeKurtosis), None);
    assert!((breakdown.correction_total() - 10.0).abs() < TOLERANCE);
    assert!((breakdown.final_score - 60.5).abs() < TOLERANCE);

    let decision = DecisionMapper::default().decide(breakdown.final_score);
    assert_eq!(decision.verdict, Verdict::ProbableAi);
}

#[test]
fn test_corrections_keep_evaluation_order() {
    let mut features = create_features(0.0, 0.9, 0.0, 0.0, 0.0, 7.0, 1e-6);
    features.peaks_medium.count = 80;
    let rules: Vec<CorrectionRule> = HeuristicScorer::new()
        .corrections(&features)
        .iter()
        .map(|c| c.rule)
        .collect();
    assert_eq!(
        rules,
        vec![
            CorrectionRule::ModerateKurtosis,
            CorrectionRule::LowHfEnergy,
            CorrectionRule::MasteredRegularPattern,
            CorrectionRule::DenseRegularPeaks,
        ]
    );
}

#[test]
fn test_kurtosis_rules_mutually_exclusive() {
    let scorer = HeuristicScorer::new();
    for step in 0..=400 {
        let kurtosis = step as f64 * 0.1 - 5.0;
        let mut features = quiet_features();
        features.kurtosis = kurtosis;
        let breakdown = scorer.score(&features);

        let extreme = breakdown.correction(CorrectionRule::ExtremeKurtosis).is_some();
        let moderate = breakdown.correction(CorrectionRule::ModerateKurtosis).is_some();
        assert!(
            !(extreme && moderate),
            "both kurtosis rules fired at {}",
            kurtosis
        );
        assert_eq!(extreme, kurtosis > 10.0);
        assert_eq!(moderate, kurtosis > 5.0 && kurtosis <= 10.0);
    }
}

#[test]
fn test_kurtosis_boundaries() {
    let scorer = HeuristicScorer::new();
    let mut features = quiet_features();

    features.kurtosis = 10.0;
    let at_ten = scorer.score(&features);
    assert_eq!(at_ten.correction(CorrectionRule::ModerateKurtosis), Some(3.0));
    assert_eq!(at_ten.correction(CorrectionRule::ExtremeKurtosis), None);

    features.kurtosis = 5.0;
    assert!(scorer.score(&features).corrections.is_empty());

    features.kurtosis = 10.5;
    assert_eq!(
        scorer
            .score(&features)
            .correction(CorrectionRule::ExtremeKurtosis),
        Some(-1.0)
    );

    // Penalty caps at 20
    features.kurtosis = 250.0;
    assert_eq!(
        scorer
            .score(&features)
            .correction(CorrectionRule::ExtremeKurtosis),
        Some(-20.0)
    );
}

#[test]
fn test_low_hf_energy_brackets() {
    let scorer = HeuristicScorer::new();
    let mut features = quiet_features();

    features.hf_energy_ratio = 5e-6;
    assert_eq!(
        scorer.score(&features).correction(CorrectionRule::LowHfEnergy),
        Some(-15.0)
    );

    features.hf_energy_ratio = 1e-5;
    assert_eq!(
        scorer.score(&features).correction(CorrectionRule::LowHfEnergy),
        Some(-8.0)
    );

    features.hf_energy_ratio = 5e-5;
    assert_eq!(
        scorer.score(&features).correction(CorrectionRule::LowHfEnergy),
        None
    );
}

#[test]
fn test_mastered_pattern_requires_all_conditions() {
    let scorer = HeuristicScorer::new();
    let base = create_features(0.0, 0.5, 0.0, 0.0, 0.0, 7.0, 2e-5);
    assert!(scorer
        .score(&base)
        .correction(CorrectionRule::MasteredRegularPattern)
        .is_some());

    // Kurtosis exactly 10 fires moderate_kurtosis but not the combined rule
    let mut at_ten = base;
    at_ten.kurtosis = 10.0;
    assert!(scorer
        .score(&at_ten)
        .correction(CorrectionRule::MasteredRegularPattern)
        .is_none());

    let mut regular_enough = base;
    regular_enough.regularity_score = 0.3;
    assert!(scorer
        .score(&regular_enough)
        .correction(CorrectionRule::MasteredRegularPattern)
        .is_none());

    let mut loud_hf = base;
    loud_hf.hf_energy_ratio = 5e-5;
    assert!(scorer
        .score(&loud_hf)
        .correction(CorrectionRule::MasteredRegularPattern)
        .is_none());
}

#[test]
fn test_dense_regular_peaks_boundary() {
    let scorer = HeuristicScorer::new();
    let mut features = create_features(0.0, 0.7, 0.0, 0.0, 0.0, 2.0, 0.01);

    features.peaks_medium.count = 50;
    assert!(scorer
        .score(&features)
        .correction(CorrectionRule::DenseRegularPeaks)
        .is_none());

    features.peaks_medium.count = 51;
    assert_eq!(
        scorer
            .score(&features)
            .correction(CorrectionRule::DenseRegularPeaks),
        Some(5.0)
    );

    features.regularity_score = 0.6;
    assert!(scorer
        .score(&features)
        .correction(CorrectionRule::DenseRegularPeaks)
        .is_none());
}

#[test]
fn test_density_brackets() {
    let mut features = quiet_features();

    features.peaks_high.density = 0.15;
    assert_eq!(density_points(&features), 20.0);
    features.peaks_high.density = 0.10;
    assert_eq!(density_points(&features), 15.0);
    features.peaks_high.density = 0.05;
    assert_eq!(density_points(&features), 0.0);

    features.peaks_medium.density = 0.25;
    assert_eq!(density_points(&features), 12.0);
    features.peaks_medium.density = 0.15;
    assert_eq!(density_points(&features), 8.0);
    features.peaks_medium.density = 0.0;
    features.peaks_low.density = 0.31;
    assert_eq!(density_points(&features), 5.0);

    // Highest bracket wins, no double counting
    features.peaks_high.density = 0.2;
    features.peaks_medium.density = 0.5;
    assert_eq!(density_points(&features), 25.0);
}

#[test]
fn test_staged_thresholds_are_exclusive() {
    assert_eq!(intensity_points(0.25), 15.0);
    assert_eq!(intensity_points(0.2501), 20.0);
    assert_eq!(intensity_points(0.05), 0.0);
    assert_eq!(max_points(0.8), 10.0);
    assert_eq!(max_points(0.4), 0.0);
    assert_eq!(periodicity_points(0.5), 10.0);
    assert_eq!(periodicity_points(0.15), 0.0);
    assert_eq!(periodicity_points(-0.4), 0.0);
}

#[test]
fn test_regularity_points_monotonic() {
    let mut previous = f64::NEG_INFINITY;
    for step in 0..=100 {
        let points = regularity_points(step as f64 / 100.0);
        assert!(points >= previous);
        previous = points;
    }
    assert_eq!(regularity_points(0.0), 0.0);
    assert_eq!(regularity_points(1.0), 25.0);
}

#[test]
fn test_final_score_clamped() {
    let scorer = HeuristicScorer::new();

    let mut saturated = create_features(1.0, 1.0, 5.0, 50.0, 1.0, 7.0, 1e-7);
    saturated.peaks_medium.count = 10_000;
    let high = scorer.score(&saturated);
    assert!(high.base + high.correction_total() > SCORE_MAX);
    assert_eq!(high.final_score, SCORE_MAX);

    let floor = scorer.score(&create_features(0.0, 0.0, 0.0, 0.0, 0.0, 1e9, 0.0));
    assert!(floor.base + floor.correction_total() < SCORE_MIN);
    assert_eq!(floor.final_score, SCORE_MIN);

    let absurd = create_features(f64::NAN, f64::INFINITY, f64::NAN, 1e300, -1e300, f64::NAN, -1.0);
    let breakdown = scorer.score(&absurd);
    assert!((SCORE_MIN..=SCORE_MAX).contains(&breakdown.final_score));
}

#[test]
fn test_score_is_deterministic() {
    let features = create_features(0.07, 0.55, 0.13, 0.65, 0.33, 6.1, 4e-5);
    let scorer = HeuristicScorer::new();
    assert_eq!(scorer.score(&features), scorer.score(&features));
}

#[test]
fn test_backend_serde_names() {
    assert_eq!(
        serde_json::to_string(&Backend::Heuristic).unwrap(),
        "\"heuristic\""
    );
    let parsed: Backend = serde_json::from_str("\"trained\"").unwrap();
    assert_eq!(parsed, Backend::Trained);
    assert_eq!(CorrectionRule::LowHfEnergy.name(), "low_hf_energy");
}

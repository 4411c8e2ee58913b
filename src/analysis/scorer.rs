// Scorer - maps a FeatureSet to a bounded suspicion score
//
// Two backends share the `Scorer` contract:
// - HeuristicScorer: deterministic rule engine (this module)
// - TrainedModel: logistic regression over the feature vector (model.rs)
//
// The heuristic score is the sum of five bounded sub-scores followed by an
// ordered list of correction rules. Each rule is a guard returning a named,
// signed delta so the whole computation can be audited from the breakdown.

use serde::{Deserialize, Serialize};

use crate::analysis::features::FeatureSet;

/// Lower and upper bound of every final score
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Scoring backend, chosen statically in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Heuristic,
    Trained,
}

/// Capability shared by both scoring backends
pub trait Scorer: Send + Sync {
    fn backend(&self) -> Backend;

    /// Score a feature set; `final_score` is always within [0, 100]
    fn score(&self, features: &FeatureSet) -> ScoreBreakdown;
}

/// Per-factor contributions to the heuristic base score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubScores {
    /// 0-25
    pub density: f64,
    /// 0-25
    pub regularity: f64,
    /// 0-20
    pub intensity: f64,
    /// 0-15
    pub max: f64,
    /// 0-15
    pub periodicity: f64,
}

impl SubScores {
    pub fn total(&self) -> f64 {
        self.density + self.regularity + self.intensity + self.max + self.periodicity
    }
}

/// Correction rules in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionRule {
    ExtremeKurtosis,
    ModerateKurtosis,
    LowHfEnergy,
    MasteredRegularPattern,
    DenseRegularPeaks,
}

impl CorrectionRule {
    pub fn name(&self) -> &'static str {
        match self {
            CorrectionRule::ExtremeKurtosis => "extreme_kurtosis",
            CorrectionRule::ModerateKurtosis => "moderate_kurtosis",
            CorrectionRule::LowHfEnergy => "low_hf_energy",
            CorrectionRule::MasteredRegularPattern => "mastered_regular_pattern",
            CorrectionRule::DenseRegularPeaks => "dense_regular_peaks",
        }
    }
}

/// A fired correction rule and its signed contribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub rule: CorrectionRule,
    pub delta: f64,
}

/// Full audit trail of one scoring pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub backend: Backend,
    /// Unclamped score before corrections
    pub base: f64,
    /// Present for the heuristic backend only
    pub sub_scores: Option<SubScores>,
    /// Fired corrections, in evaluation order
    pub corrections: Vec<Correction>,
    /// clamp(base + sum of corrections, 0, 100)
    pub final_score: f64,
}

impl ScoreBreakdown {
    pub fn correction_total(&self) -> f64 {
        self.corrections.iter().map(|c| c.delta).sum()
    }

    /// Delta of a rule if it fired
    pub fn correction(&self, rule: CorrectionRule) -> Option<f64> {
        self.corrections
            .iter()
            .find(|c| c.rule == rule)
            .map(|c| c.delta)
    }
}

/// Clamp to the score range; NaN maps to the lower bound
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        SCORE_MIN
    } else {
        score.clamp(SCORE_MIN, SCORE_MAX)
    }
}

/// Deterministic rule-based scorer
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicScorer;

type CorrectionGuard = fn(&FeatureSet) -> Option<Correction>;

/// Correction guards, evaluated top to bottom
const CORRECTIONS: [CorrectionGuard; 5] = [
    extreme_kurtosis,
    moderate_kurtosis,
    low_hf_energy,
    mastered_regular_pattern,
    dense_regular_peaks,
];

impl HeuristicScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn sub_scores(&self, features: &FeatureSet) -> SubScores {
        SubScores {
            density: density_points(features),
            regularity: regularity_points(features.regularity_score),
            intensity: intensity_points(features.mean),
            max: max_points(features.max),
            periodicity: periodicity_points(features.periodicity_score),
        }
    }

    pub fn corrections(&self, features: &FeatureSet) -> Vec<Correction> {
        CORRECTIONS
            .iter()
            .filter_map(|guard| guard(features))
            .collect()
    }
}

impl Scorer for HeuristicScorer {
    fn backend(&self) -> Backend {
        Backend::Heuristic
    }

    fn score(&self, features: &FeatureSet) -> ScoreBreakdown {
        let sub_scores = self.sub_scores(features);
        let base = sub_scores.total();
        let corrections = self.corrections(features);
        let adjusted = base + corrections.iter().map(|c| c.delta).sum::<f64>();

        ScoreBreakdown {
            backend: Backend::Heuristic,
            base,
            sub_scores: Some(sub_scores),
            corrections,
            final_score: clamp_score(adjusted),
        }
    }
}

/// Density sub-score (0-25); the first matching bracket wins
pub fn density_points(features: &FeatureSet) -> f64 {
    let high = features.peaks_high.density;
    let medium = features.peaks_medium.density;
    let low = features.peaks_low.density;

    if high > 0.15 {
        25.0
    } else if high > 0.10 {
        20.0
    } else if high > 0.05 {
        15.0
    } else if medium > 0.20 {
        12.0
    } else if medium > 0.10 {
        8.0
    } else if low > 0.30 {
        5.0
    } else {
        0.0
    }
}

/// Regularity sub-score (0-25), linear in the regularity score
pub fn regularity_points(regularity_score: f64) -> f64 {
    regularity_score * 25.0
}

/// Intensity sub-score (0-20) from the fakeprint mean
pub fn intensity_points(mean: f64) -> f64 {
    if mean > 0.25 {
        20.0
    } else if mean > 0.15 {
        15.0
    } else if mean > 0.10 {
        10.0
    } else if mean > 0.05 {
        5.0
    } else {
        0.0
    }
}

/// Max sub-score (0-15) from the fakeprint maximum
pub fn max_points(max: f64) -> f64 {
    if max > 0.8 {
        15.0
    } else if max > 0.6 {
        10.0
    } else if max > 0.4 {
        5.0
    } else {
        0.0
    }
}

/// Periodicity sub-score (0-15)
pub fn periodicity_points(periodicity_score: f64) -> f64 {
    if periodicity_score > 0.5 {
        15.0
    } else if periodicity_score > 0.3 {
        10.0
    } else if periodicity_score > 0.15 {
        5.0
    } else {
        0.0
    }
}

/// Kurtosis above 10 lowers the score by up to 20 points
fn extreme_kurtosis(features: &FeatureSet) -> Option<Correction> {
    (features.kurtosis > 10.0).then(|| Correction {
        rule: CorrectionRule::ExtremeKurtosis,
        delta: -(20.0f64).min((features.kurtosis - 10.0) * 2.0),
    })
}

/// Kurtosis in (5, 10] adds 3 points; never fires together with extreme_kurtosis
fn moderate_kurtosis(features: &FeatureSet) -> Option<Correction> {
    (features.kurtosis > 5.0 && features.kurtosis <= 10.0).then_some(Correction {
        rule: CorrectionRule::ModerateKurtosis,
        delta: 3.0,
    })
}

/// Very little in-band energy lowers the score
fn low_hf_energy(features: &FeatureSet) -> Option<Correction> {
    let delta = if features.hf_energy_ratio < 1e-5 {
        -15.0
    } else if features.hf_energy_ratio < 5e-5 {
        -8.0
    } else {
        return None;
    };
    Some(Correction {
        rule: CorrectionRule::LowHfEnergy,
        delta,
    })
}

/// Moderate kurtosis with low HF energy and some regularity: a generator
/// imitating a mastered rolloff while keeping its spectral comb
fn mastered_regular_pattern(features: &FeatureSet) -> Option<Correction> {
    (features.kurtosis > 5.0
        && features.kurtosis < 10.0
        && features.hf_energy_ratio < 5e-5
        && features.regularity_score > 0.3)
        .then_some(Correction {
            rule: CorrectionRule::MasteredRegularPattern,
            delta: 15.0,
        })
}

/// Many medium peaks that are also regularly spaced
fn dense_regular_peaks(features: &FeatureSet) -> Option<Correction> {
    (features.peaks_medium.count > 50 && features.regularity_score > 0.6).then_some(Correction {
        rule: CorrectionRule::DenseRegularPeaks,
        delta: 5.0,
    })
}

#[cfg(test)]
#[path = "scorer_tests.rs"]
mod tests;

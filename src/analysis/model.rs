// Model - trained logistic-regression backend
//
// The trained backend consumes the same FeatureSet as the heuristic scorer.
// Features are standardized with the training-set mean and scale, combined
// linearly, and squashed through a sigmoid; the score is 100 * P(ai).
//
// The artifact is a small JSON document loaded once and shared read-only
// through an Arc in the classifier configuration.

use std::fs;
use std::path::Path;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::analysis::features::{FeatureSet, FEATURE_NAMES, FEATURE_VECTOR_LEN};
use crate::analysis::scorer::{clamp_score, Backend, ScoreBreakdown, Scorer, SCORE_MAX};
use crate::error::AnalysisError;

/// Scales below this are treated as constant features
const SCALE_EPSILON: f64 = 1e-12;

/// Ground-truth class of a training sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleLabel {
    Human,
    Ai,
}

impl SampleLabel {
    fn target(self) -> f64 {
        match self {
            SampleLabel::Human => 0.0,
            SampleLabel::Ai => 1.0,
        }
    }
}

/// Logistic regression over the standardized feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub feature_names: Vec<String>,
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl TrainedModel {
    /// Check shape and finiteness of every parameter
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let lengths = [
            self.feature_names.len(),
            self.means.len(),
            self.scales.len(),
            self.weights.len(),
        ];
        if lengths.iter().any(|&len| len != FEATURE_VECTOR_LEN) {
            return Err(AnalysisError::ModelInvalid {
                reason: format!(
                    "expected {} features, found {:?}",
                    FEATURE_VECTOR_LEN, lengths
                ),
            });
        }

        if let Some((expected, found)) = FEATURE_NAMES
            .iter()
            .zip(&self.feature_names)
            .find(|(expected, found)| **expected != found.as_str())
        {
            return Err(AnalysisError::ModelInvalid {
                reason: format!("feature '{}' where '{}' was expected", found, expected),
            });
        }

        let finite = self
            .means
            .iter()
            .chain(&self.weights)
            .chain(std::iter::once(&self.bias))
            .all(|v| v.is_finite());
        let scales_ok = self.scales.iter().all(|s| s.is_finite() && *s > 0.0);
        if !finite || !scales_ok {
            return Err(AnalysisError::ModelInvalid {
                reason: "non-finite parameter or non-positive scale".to_string(),
            });
        }
        Ok(())
    }

    /// Load and validate a model artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let contents = fs::read_to_string(&path)?;
        let model: TrainedModel =
            serde_json::from_str(&contents).map_err(|err| AnalysisError::ModelInvalid {
                reason: format!("{}: {}", path.as_ref().display(), err),
            })?;
        model.validate()?;
        tracing::info!("[Model] Loaded trained model from {:?}", path.as_ref());
        Ok(model)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), AnalysisError> {
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            AnalysisError::ModelInvalid {
                reason: err.to_string(),
            }
        })?;
        fs::write(&path, json)?;
        tracing::info!("[Model] Saved trained model to {:?}", path.as_ref());
        Ok(())
    }

    /// P(ai) for a feature set
    pub fn probability(&self, features: &FeatureSet) -> f64 {
        let vector = features.to_vector();
        sigmoid(self.logit(&vector))
    }

    fn standardize(&self, vector: &[f64; FEATURE_VECTOR_LEN]) -> [f64; FEATURE_VECTOR_LEN] {
        let mut out = [0.0; FEATURE_VECTOR_LEN];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = (vector[i] - self.means[i]) / self.scales[i];
        }
        out
    }

    fn logit(&self, vector: &[f64; FEATURE_VECTOR_LEN]) -> f64 {
        let z = self.standardize(vector);
        self.bias
            + z.iter()
                .zip(&self.weights)
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }
}

impl Scorer for TrainedModel {
    fn backend(&self) -> Backend {
        Backend::Trained
    }

    fn score(&self, features: &FeatureSet) -> ScoreBreakdown {
        let score = self.probability(features) * SCORE_MAX;
        ScoreBreakdown {
            backend: Backend::Trained,
            base: score,
            sub_scores: None,
            corrections: Vec::new(),
            final_score: clamp_score(score),
        }
    }
}

/// Numerically stable logistic function
fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Gradient-descent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingOptions {
    pub iterations: usize,
    pub learning_rate: f64,
    /// L2 penalty on the weights (not the bias)
    pub l2: f64,
    /// Minimum samples required in each class
    pub min_per_class: usize,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            iterations: 2000,
            learning_rate: 0.1,
            l2: 1e-3,
            min_per_class: 10,
        }
    }
}

/// Fit a class-balanced logistic regression
///
/// Deterministic: the same samples and options always yield the same model.
///
/// # Errors
/// `TrainingData` when a class has fewer than `min_per_class` samples.
pub fn train(
    samples: &[(FeatureSet, SampleLabel)],
    options: &TrainingOptions,
) -> Result<TrainedModel, AnalysisError> {
    let ai_count = samples
        .iter()
        .filter(|(_, label)| *label == SampleLabel::Ai)
        .count();
    let human_count = samples.len() - ai_count;
    let required = options.min_per_class.max(1);
    if ai_count < required || human_count < required {
        return Err(AnalysisError::TrainingData {
            reason: format!(
                "need at least {} samples per class, got {} human and {} ai",
                required, human_count, ai_count
            ),
        });
    }

    let vectors: Vec<[f64; FEATURE_VECTOR_LEN]> =
        samples.iter().map(|(f, _)| f.to_vector()).collect();
    if vectors.iter().flatten().any(|v| !v.is_finite()) {
        return Err(AnalysisError::TrainingData {
            reason: "non-finite feature value in training set".to_string(),
        });
    }

    let n = samples.len() as f64;
    let mut means = vec![0.0; FEATURE_VECTOR_LEN];
    for vector in &vectors {
        for (m, v) in means.iter_mut().zip(vector) {
            *m += v / n;
        }
    }
    let mut scales = vec![0.0; FEATURE_VECTOR_LEN];
    for vector in &vectors {
        for i in 0..FEATURE_VECTOR_LEN {
            scales[i] += (vector[i] - means[i]).powi(2) / n;
        }
    }
    for scale in scales.iter_mut() {
        *scale = scale.sqrt();
        if *scale < SCALE_EPSILON {
            *scale = 1.0;
        }
    }

    let mut model = TrainedModel {
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        means,
        scales,
        weights: vec![0.0; FEATURE_VECTOR_LEN],
        bias: 0.0,
    };

    // Balanced class weights: n / (2 * n_class)
    let ai_weight = n / (2.0 * ai_count as f64);
    let human_weight = n / (2.0 * human_count as f64);
    let standardized: Vec<[f64; FEATURE_VECTOR_LEN]> =
        vectors.iter().map(|v| model.standardize(v)).collect();

    for _ in 0..options.iterations {
        let mut grad_w = [0.0; FEATURE_VECTOR_LEN];
        let mut grad_b = 0.0;

        for (z, (_, label)) in standardized.iter().zip(samples) {
            let logit = model.bias
                + z.iter()
                    .zip(&model.weights)
                    .map(|(x, w)| x * w)
                    .sum::<f64>();
            let sample_weight = match label {
                SampleLabel::Ai => ai_weight,
                SampleLabel::Human => human_weight,
            };
            let error = (sigmoid(logit) - label.target()) * sample_weight;
            for (g, x) in grad_w.iter_mut().zip(z) {
                *g += error * x;
            }
            grad_b += error;
        }

        for (w, g) in model.weights.iter_mut().zip(&grad_w) {
            *w -= options.learning_rate * (g / n + options.l2 * *w);
        }
        model.bias -= options.learning_rate * grad_b / n;
    }

    model.validate()?;
    tracing::info!(
        "[Model] Trained on {} samples ({} human, {} ai), bias={:.4}",
        samples.len(),
        human_count,
        ai_count,
        model.bias
    );
    Ok(model)
}

/// Shuffle with a seeded RNG and split off `test_fraction` of the items
///
/// The test share is rounded up, so any non-zero fraction of a non-empty
/// list keeps at least one item for testing.
pub fn split_train_test<T>(mut items: Vec<T>, test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
    let fraction = test_fraction.clamp(0.0, 1.0);
    let test_len = ((items.len() as f64) * fraction).ceil() as usize;
    let test = items.split_off(items.len() - test_len.min(items.len()));
    (items, test)
}

/// Counts of predictions against ground truth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_human: usize,
    pub false_ai: usize,
    pub false_human: usize,
    pub true_ai: usize,
}

/// Held-out evaluation of any scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub samples: usize,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
}

/// Evaluate a scorer; a sample is predicted AI when its score exceeds `threshold`
pub fn evaluate(
    scorer: &dyn Scorer,
    samples: &[(FeatureSet, SampleLabel)],
    threshold: f64,
) -> Evaluation {
    let mut confusion = ConfusionMatrix::default();
    for (features, label) in samples {
        let predicted_ai = scorer.score(features).final_score > threshold;
        match (label, predicted_ai) {
            (SampleLabel::Human, false) => confusion.true_human += 1,
            (SampleLabel::Human, true) => confusion.false_ai += 1,
            (SampleLabel::Ai, false) => confusion.false_human += 1,
            (SampleLabel::Ai, true) => confusion.true_ai += 1,
        }
    }

    let correct = confusion.true_human + confusion.true_ai;
    let accuracy = if samples.is_empty() {
        0.0
    } else {
        correct as f64 / samples.len() as f64
    };

    Evaluation {
        samples: samples.len(),
        accuracy,
        confusion,
    }
}

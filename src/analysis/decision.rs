// Decision - maps a final score to a verdict, probabilities and confidence

use serde::{Deserialize, Serialize};

use crate::analysis::scorer::{clamp_score, SCORE_MAX};

/// Default decision threshold on the 0-100 score
pub const DEFAULT_THRESHOLD: f64 = 50.0;

/// Human-readable band of the final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// score > 70
    LikelyAi,
    /// 50 <= score <= 70
    ProbableAi,
    /// 30 <= score < 50
    Uncertain,
    /// score < 30
    ProbableHuman,
}

impl Verdict {
    pub fn from_score(score: f64) -> Self {
        if score > 70.0 {
            Verdict::LikelyAi
        } else if score >= 50.0 {
            Verdict::ProbableAi
        } else if score >= 30.0 {
            Verdict::Uncertain
        } else {
            Verdict::ProbableHuman
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::LikelyAi => "likely AI",
            Verdict::ProbableAi => "probable AI",
            Verdict::Uncertain => "uncertain",
            Verdict::ProbableHuman => "probable human",
        }
    }
}

/// Outcome of mapping one score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub score: f64,
    pub ai_probability: f64,
    pub human_probability: f64,
    pub is_ai_generated: bool,
    /// Distance from the threshold, normalized to [0, 1]
    pub confidence: f64,
    pub verdict: Verdict,
}

/// DecisionMapper applies the configured threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionMapper {
    threshold: f64,
}

impl Default for DecisionMapper {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl DecisionMapper {
    /// `threshold` is clamped into [0, 100]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: clamp_score(threshold),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decide(&self, score: f64) -> Decision {
        let score = clamp_score(score);
        // Largest possible distance from the threshold maps to confidence 1
        let span = self.threshold.max(SCORE_MAX - self.threshold);
        let confidence = if span > 0.0 {
            ((score - self.threshold).abs() / span).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Decision {
            score,
            ai_probability: score,
            human_probability: SCORE_MAX - score,
            is_ai_generated: score > self.threshold,
            confidence,
            verdict: Verdict::from_score(score),
        }
    }
}

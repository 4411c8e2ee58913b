// Types module - Data structures for fakeprint features
//
// This module defines the fixed-shape feature record produced from a fakeprint
// and consumed by both scoring backends.

use serde::{Deserialize, Serialize};

/// Number of entries in [`FeatureSet::to_vector`]
pub const FEATURE_VECTOR_LEN: usize = 11;

/// Names of the entries in [`FeatureSet::to_vector`], same order
pub const FEATURE_NAMES: [&str; FEATURE_VECTOR_LEN] = [
    "peak_density_high",
    "peak_density_medium",
    "peak_density_low",
    "regularity_score",
    "mean",
    "max",
    "std_dev",
    "p90",
    "kurtosis",
    "periodicity_score",
    "hf_energy_ratio",
];

/// Peak count and density at one magnitude threshold
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PeakStats {
    pub count: usize,
    /// count / fakeprint length
    pub density: f64,
}

/// Features extracted from a fakeprint
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Peaks above 0.5
    pub peaks_high: PeakStats,
    /// Peaks above 0.3
    pub peaks_medium: PeakStats,
    /// Peaks above 0.1
    pub peaks_low: PeakStats,

    /// Inter-peak spacing regularity, 1 / (1 + CV), 0.0 to 1.0
    ///
    /// Near 1 for evenly spaced peaks, near 0 for irregular spacing.
    /// Zero when fewer than two medium peaks exist.
    pub regularity_score: f64,

    /// Coefficient of variation of medium-peak spacing
    pub spacing_cv: f64,

    pub mean: f64,
    pub max: f64,
    pub std_dev: f64,
    /// 90th percentile, linear interpolation between ranks
    pub p90: f64,

    /// Fourth standardized moment; 0.0 for a zero-variance fakeprint
    pub kurtosis: f64,

    /// Maximum normalized autocorrelation over lags 2..=50
    pub periodicity_score: f64,

    /// In-band energy over total energy
    pub hf_energy_ratio: f64,

    /// Fakeprint length
    pub bins: usize,
}

impl FeatureSet {
    /// Fixed-order numeric vector consumed by the trained backend
    pub fn to_vector(&self) -> [f64; FEATURE_VECTOR_LEN] {
        [
            self.peaks_high.density,
            self.peaks_medium.density,
            self.peaks_low.density,
            self.regularity_score,
            self.mean,
            self.max,
            self.std_dev,
            self.p90,
            self.kurtosis,
            self.periodicity_score,
            self.hf_energy_ratio,
        ]
    }
}

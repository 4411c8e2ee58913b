// FeatureExtractor - feature derivation from a fakeprint
//
// Module organization:
// - types: Data structures (FeatureSet, PeakStats)
// - peaks: Local maxima at three thresholds and spacing regularity
// - distribution: Mean, max, std, p90, kurtosis
// - periodicity: Autocorrelation-based periodicity score
// - mod.rs: Coordinator (FeatureExtractor)
//
// Features extracted:
// 1. Peak densities above 0.5 / 0.3 / 0.1
// 2. Regularity: 1 / (1 + CV) of the spacing between medium peaks
// 3. Distribution statistics of the fakeprint values
// 4. Periodicity: max autocorrelation over lags 2..=50
// 5. HF energy ratio, carried through from the spectral stage

mod distribution;
mod peaks;
mod periodicity;
mod types;

pub use distribution::{percentile, Distribution};
pub use peaks::{find_peaks, THRESHOLD_HIGH, THRESHOLD_LOW, THRESHOLD_MEDIUM};
pub use types::{FeatureSet, PeakStats, FEATURE_NAMES, FEATURE_VECTOR_LEN};

use crate::analysis::fakeprint::Fakeprint;

/// FeatureExtractor turns a fakeprint into a [`FeatureSet`]
///
/// Stateless; a degenerate (flat or empty) fakeprint produces a valid,
/// low-magnitude feature set rather than an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract all features from a fakeprint
    pub fn extract(&self, fakeprint: &Fakeprint) -> FeatureSet {
        self.extract_values(&fakeprint.values, fakeprint.hf_energy_ratio)
    }

    /// Extract features from raw fakeprint values
    pub fn extract_values(&self, values: &[f64], hf_energy_ratio: f64) -> FeatureSet {
        let len = values.len();

        let high = peaks::find_peaks(values, THRESHOLD_HIGH);
        let medium = peaks::find_peaks(values, THRESHOLD_MEDIUM);
        let low = peaks::find_peaks(values, THRESHOLD_LOW);

        let (regularity_score, spacing_cv) = peaks::spacing_regularity(&medium);
        let stats = Distribution::compute(values);
        let periodicity_score = periodicity::periodicity_score(values, stats.mean);

        FeatureSet {
            peaks_high: peaks::peak_stats(&high, len),
            peaks_medium: peaks::peak_stats(&medium, len),
            peaks_low: peaks::peak_stats(&low, len),
            regularity_score,
            spacing_cv,
            mean: stats.mean,
            max: stats.max,
            std_dev: stats.std_dev,
            p90: stats.p90,
            kurtosis: stats.kurtosis,
            periodicity_score,
            hf_energy_ratio,
            bins: len,
        }
    }
}

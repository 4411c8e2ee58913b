// Peaks module - local maxima and spacing regularity

use super::types::PeakStats;

/// Strong, medium and weak peak thresholds
pub const THRESHOLD_HIGH: f64 = 0.5;
pub const THRESHOLD_MEDIUM: f64 = 0.3;
pub const THRESHOLD_LOW: f64 = 0.1;

/// Indices of local maxima whose value exceeds `threshold`
///
/// A peak rises strictly from its left neighbour and is strictly higher than
/// the next differing value on its right. Flat tops report their middle index.
/// The first and last samples are never peaks.
pub fn find_peaks(values: &[f64], threshold: f64) -> Vec<usize> {
    let mut peaks = Vec::new();
    if values.len() < 3 {
        return peaks;
    }

    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                if values[i] > threshold {
                    peaks.push((i + ahead - 1) / 2);
                }
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}

/// Count and density for a set of peak indices
pub fn peak_stats(peaks: &[usize], len: usize) -> PeakStats {
    let density = if len > 0 {
        peaks.len() as f64 / len as f64
    } else {
        0.0
    };
    PeakStats {
        count: peaks.len(),
        density,
    }
}

/// Regularity of peak spacing
///
/// Returns `(score, cv)` with `score = 1 / (1 + cv)` where `cv` is the
/// population standard deviation of consecutive spacings over their mean.
/// Fewer than two peaks cannot be assessed and give `(0.0, 0.0)`.
pub fn spacing_regularity(peaks: &[usize]) -> (f64, f64) {
    if peaks.len() < 2 {
        return (0.0, 0.0);
    }

    let spacings: Vec<f64> = peaks.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    let n = spacings.len() as f64;
    let mean = spacings.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return (0.0, 0.0);
    }

    let variance = spacings.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    let cv = variance.sqrt() / mean;
    (1.0 / (1.0 + cv), cv)
}

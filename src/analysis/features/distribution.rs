// Distribution module - shape statistics of fakeprint values

/// Standard deviations at or below this are treated as zero variance
const VARIANCE_EPSILON: f64 = 1e-10;

/// Summary statistics of the fakeprint value distribution
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Distribution {
    pub mean: f64,
    pub max: f64,
    pub std_dev: f64,
    pub p90: f64,
    pub kurtosis: f64,
}

impl Distribution {
    /// Compute mean, max, population standard deviation, 90th percentile
    /// and kurtosis (fourth standardized moment)
    ///
    /// An empty input yields all zeros. A zero-variance input has kurtosis 0.
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let (m2, m4) = values.iter().fold((0.0, 0.0), |(m2, m4), &v| {
            let d2 = (v - mean) * (v - mean);
            (m2 + d2, m4 + d2 * d2)
        });
        let variance = m2 / n;
        let std_dev = variance.sqrt();

        let kurtosis = if std_dev <= VARIANCE_EPSILON {
            0.0
        } else {
            (m4 / n) / (variance * variance)
        };

        Self {
            mean,
            max,
            std_dev,
            p90: percentile(values, 90.0),
            kurtosis,
        }
    }
}

/// Percentile with linear interpolation between closest ranks
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

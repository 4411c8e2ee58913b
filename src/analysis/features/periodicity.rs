// Periodicity module - autocorrelation of the fakeprint
//
// Regularly spaced decoder artifacts show up as a secondary autocorrelation
// maximum at the artifact spacing.

/// First lag considered (lag 0 is trivially 1, lag 1 tracks peak width)
pub const MIN_LAG: usize = 2;
/// Last lag considered, inclusive
pub const MAX_LAG: usize = 50;

const ZERO_LAG_EPSILON: f64 = 1e-10;

/// Maximum normalized autocorrelation of the mean-centered values over
/// lags `MIN_LAG..=MAX_LAG`
///
/// Returns 0.0 when the input has no variance or is too short to have any
/// eligible lag.
pub fn periodicity_score(values: &[f64], mean: f64) -> f64 {
    if values.len() <= MIN_LAG {
        return 0.0;
    }

    let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let zero_lag: f64 = centered.iter().map(|v| v * v).sum();
    if zero_lag <= ZERO_LAG_EPSILON {
        return 0.0;
    }

    let last_lag = MAX_LAG.min(centered.len() - 1);
    (MIN_LAG..=last_lag)
        .map(|lag| {
            let sum: f64 = centered[..centered.len() - lag]
                .iter()
                .zip(&centered[lag..])
                .map(|(a, b)| a * b)
                .sum();
            sum / zero_lag
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

// Hull module - lower convex hull baseline removal
//
// The natural high-frequency rolloff of a recording is smooth and convex-ish;
// generative decoders leave narrow peaks on top of it. Subtracting the lower
// convex envelope and dividing by it leaves only the residual peaks as
// dimensionless ratios.

/// Floor applied to the hull before division
pub const HULL_EPSILON: f64 = 1e-10;

/// Lower convex hull of `(i, values[i])`, evaluated at every index
///
/// Uses a monotone chain over the points in index order and linearly
/// interpolates between consecutive hull vertices. Every input value lies on
/// or above the returned envelope.
pub fn lower_hull(values: &[f64]) -> Vec<f64> {
    if values.len() < 3 {
        return values.to_vec();
    }

    let mut vertices: Vec<usize> = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        while vertices.len() >= 2 {
            let a = vertices[vertices.len() - 2];
            let b = vertices[vertices.len() - 1];
            // Pop b unless a -> b -> i turns strictly counter-clockwise
            let cross = (b - a) as f64 * (values[i] - values[a])
                - (values[b] - values[a]) * (i - a) as f64;
            if cross <= 0.0 {
                vertices.pop();
            } else {
                break;
            }
        }
        vertices.push(i);
    }

    let mut hull = vec![0.0; values.len()];
    for pair in vertices.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let span = (end - start) as f64;
        for (offset, slot) in hull[start..=end].iter_mut().enumerate() {
            let t = offset as f64 / span;
            *slot = values[start] + (values[end] - values[start]) * t;
        }
    }
    hull
}

/// Normalize a spectral profile against its lower hull
///
/// `fakeprint[i] = (profile[i] - hull[i]) / max(hull[i], HULL_EPSILON)`.
/// A flat or all-zero profile yields all zeros.
pub fn normalize(profile: &[f64]) -> Vec<f64> {
    let hull = lower_hull(profile);
    profile
        .iter()
        .zip(&hull)
        .map(|(&value, &baseline)| (value - baseline).max(0.0) / baseline.max(HULL_EPSILON))
        .collect()
}

//! Descriptive statistics over slices of valid (non-NaN) observations.
//!
//! Callers filter missing values first. Every function sums in index order,
//! so the result depends only on the slice contents.

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Variance with `ddof` delta degrees of freedom. NaN when `len <= ddof`.
pub fn variance(values: &[f64], ddof: usize) -> f64 {
    let n = values.len();
    if n <= ddof {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    ss / (n - ddof) as f64
}

/// Standard deviation with `ddof` delta degrees of freedom.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    variance(values, ddof).sqrt()
}

/// Mean absolute deviation around the mean. NaN for an empty slice.
pub fn mean_abs_deviation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.is_nan() {
        return f64::NAN;
    }
    values.iter().map(|v| (v - m).abs()).sum::<f64>() / values.len() as f64
}

/// Central moments m2, m3, m4 (population) and the mean.
fn central_moments(values: &[f64]) -> (f64, f64, f64, f64) {
    let n = values.len() as f64;
    let m = mean(values);
    let (mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        let d2 = d * d;
        s2 += d2;
        s3 += d2 * d;
        s4 += d2 * d2;
    }
    (m, s2 / n, s3 / n, s4 / n)
}

// A variance this small relative to the mean is rounding noise of a constant series.
pub(crate) fn is_flat(mean: f64, m2: f64) -> bool {
    m2 <= (mean.abs() * 1e-12).powi(2)
}

/// Bias-corrected sample skewness (G1). Needs 3 observations and non-zero variance.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return f64::NAN;
    }
    let (m, m2, m3, _) = central_moments(values);
    if is_flat(m, m2) {
        return f64::NAN;
    }
    let n = n as f64;
    let g1 = m3 / m2.powf(1.5);
    g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
}

/// Bias-corrected sample excess kurtosis (G2). Needs 4 observations and non-zero variance.
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 4 {
        return f64::NAN;
    }
    let (m, m2, _, m4) = central_moments(values);
    if is_flat(m, m2) {
        return f64::NAN;
    }
    let n = n as f64;
    let g2 = m4 / (m2 * m2) - 3.0;
    ((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0))
}

/// Quantile of an ascending slice with linear interpolation between order statistics.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

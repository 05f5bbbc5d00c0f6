//! Robust statistics helpers
//!
//! Median/MAD based estimators for the heavy-tailed optical-flow
//! distribution, plus the plain mean/std used for metric aggregation.

/// Median of a sample; `None` when empty. Even-length samples average the two
/// middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median absolute deviation around a given center (unscaled).
pub fn mad(values: &[f64], center: f64) -> Option<f64> {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Modified Z-score: robust analogue of the standard Z-score. The 0.6745
/// factor rescales the MAD to be consistent with a normal standard deviation.
pub fn modified_z(value: f64, median: f64, mad: f64) -> f64 {
    0.6745 * (value - median) / mad
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Coefficient of variation (std / mean); `None` when the mean is ~0.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values);
    if m.abs() < 1e-12 {
        return None;
    }
    Some(std_dev(values) / m)
}

// ============================================================================
// TESTS
// ============================================================================

//! Descriptive statistics: mean, variance, quantiles.

use serde::{Deserialize, Serialize};

/// Arithmetic mean. Returns 0.0 for empty input so downstream formatting
/// never has to special-case NaN.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divide by n, not n-1). Returns 0.0 for n <= 1.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let avg = mean(values);
    values.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Linear-interpolated quantile over an ascending-sorted slice.
///
/// `q` is clamped to [0, 1]; q <= 0 returns the first element and q >= 1
/// the last. Returns 0.0 for empty input.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if q <= 0.0 {
        return sorted[0];
    }
    if q >= 1.0 {
        return sorted[sorted.len() - 1];
    }
    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// The p10/p50/p90 triple reported throughout the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileSummary {
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

/// Summarize an unsorted slice into its p10/p50/p90 quantiles.
pub fn summarize_quantiles(values: &[f64]) -> QuantileSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    QuantileSummary {
        p10: quantile(&sorted, 0.1),
        p50: quantile(&sorted, 0.5),
        p90: quantile(&sorted, 0.9),
    }
}

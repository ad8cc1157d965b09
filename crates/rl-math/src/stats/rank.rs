//! Tie-aware ranking and rank-based correlation.

use super::describe::mean;

/// Assign each element the average 1-indexed rank of its tied group.
///
/// Tied values must share their average rank (not be broken arbitrarily)
/// for Spearman correlation to be correct under ties.
pub fn build_ranks(values: &[f64]) -> Vec<f64> {
    let mut indexed: Vec<(f64, usize)> =
        values.iter().copied().enumerate().map(|(i, v)| (v, i)).collect();
    indexed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < indexed.len() {
        let mut j = i + 1;
        while j < indexed.len() && indexed[j].0 == indexed[i].0 {
            j += 1;
        }
        // Average of 1-indexed ranks i+1 ..= j
        let avg_rank = (i + j - 1) as f64 / 2.0 + 1.0;
        for entry in &indexed[i..j] {
            ranks[entry.1] = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Product-moment correlation.
///
/// Returns `None` for empty or length-mismatched input, or when either
/// vector has zero variance. `None` means "undefined", which downstream
/// rendering must distinguish from a true zero correlation.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }
    let x_mean = mean(x);
    let y_mean = mean(y);

    let mut numerator = 0.0;
    let mut x_var = 0.0;
    let mut y_var = 0.0;
    for i in 0..x.len() {
        let xd = x[i] - x_mean;
        let yd = y[i] - y_mean;
        numerator += xd * yd;
        x_var += xd * xd;
        y_var += yd * yd;
    }

    if x_var == 0.0 || y_var == 0.0 {
        return None;
    }
    Some(numerator / (x_var * y_var).sqrt())
}

/// Spearman rank correlation: Pearson correlation of the tie-averaged rank
/// vectors. Propagates the same `None` rules as [`pearson`].
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }
    pearson(&build_ranks(x), &build_ranks(y))
}

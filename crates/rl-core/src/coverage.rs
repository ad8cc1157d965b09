//! Cost-distribution histogram and per-feature coverage.
//!
//! Unlike the main cost extraction, the histogram reads the direct
//! expenditure field first and only falls back to the log field (as
//! `exp(x) - 1`); a member with neither field, or a negative value, is
//! skipped rather than binned at zero.

use rl_common::{RawRow, Run};
use rl_math::{mean, std_dev};
use serde::{Deserialize, Serialize};

/// Upper bounds and labels for the fixed dollar histogram.
const COST_BINS: [(f64, &str); 8] = [
    (1_000.0, "$0-1k"),
    (2_000.0, "$1k-2k"),
    (5_000.0, "$2k-5k"),
    (10_000.0, "$5k-10k"),
    (20_000.0, "$10k-20k"),
    (50_000.0, "$20k-50k"),
    (100_000.0, "$50k-100k"),
    (f64::INFINITY, "$100k+"),
];

/// One histogram bar of the cost distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostDistributionBin {
    pub range: String,
    pub count: usize,
}

/// Coverage and dispersion for one aligned feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCoverageRow {
    pub code: String,
    pub non_zero_rate: f64,
    pub mean: f64,
    pub std: f64,
}

fn histogram_cost(row: &RawRow) -> Option<f64> {
    if let Some(direct) = row.get("TOTEXP23").and_then(|v| v.as_finite()) {
        return Some(direct);
    }
    row.get("LOG_TOTEXP23")
        .and_then(|v| v.as_finite())
        .map(|log_cost| log_cost.exp() - 1.0)
}

/// Bin raw-row costs into the fixed dollar ranges.
pub fn cost_distribution(raw_rows: &[RawRow]) -> Vec<CostDistributionBin> {
    let mut counts = [0usize; COST_BINS.len()];
    for row in raw_rows {
        let Some(cost) = histogram_cost(row) else {
            continue;
        };
        if cost < 0.0 {
            continue;
        }
        if let Some(pos) = COST_BINS.iter().position(|(max, _)| cost <= *max) {
            counts[pos] += 1;
        }
    }

    COST_BINS
        .iter()
        .zip(counts.iter())
        .map(|((_, label), &count)| CostDistributionBin {
            range: (*label).to_string(),
            count,
        })
        .collect()
}

/// Non-zero rate, mean, and standard deviation for every aligned column,
/// sorted by descending dispersion.
pub fn feature_coverage(run: &Run) -> Vec<FeatureCoverageRow> {
    if run.aligned.is_empty() {
        return Vec::new();
    }

    let mut coverage: Vec<FeatureCoverageRow> = run
        .aligned
        .features()
        .iter()
        .filter_map(|feature| {
            let values = run.aligned.column(feature)?;
            let non_zero = values.iter().filter(|&&v| v != 0.0).count();
            Some(FeatureCoverageRow {
                code: feature.clone(),
                non_zero_rate: non_zero as f64 / values.len() as f64,
                mean: mean(&values),
                std: std_dev(&values),
            })
        })
        .collect();

    coverage.sort_by(|a, b| b.std.total_cmp(&a.std));
    coverage
}

//! Risk-quantile segmentation.
//!
//! The cohort is sorted by ascending risk and split into exactly four
//! contiguous buckets by position, not by value boundary: cut points are
//! `floor(i * n / 4)` and the last bucket absorbs any remainder. Bucket
//! sizes therefore differ by at most one when n is not divisible by 4,
//! and the sizes always sum to n.

use rl_common::config::SEGMENT_COUNT;
use rl_math::{mean, variance};
use serde::{Deserialize, Serialize};

/// Display names for the four quantile segments.
pub const SEGMENT_NAMES: [&str; SEGMENT_COUNT] = ["Q1 (Lowest)", "Q2", "Q3", "Q4 (Highest)"];

/// Per-segment statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    /// 1-based segment id.
    pub id: usize,
    pub name: String,
    pub min_risk: f64,
    pub max_risk: f64,
    pub size: usize,
    pub share: f64,
    pub mean_risk: f64,
    pub mean_cost: f64,
    pub cost_variance: f64,
    pub catastrophic_rate: f64,
}

/// Partition a cohort into the four risk-quantile segments.
///
/// `risks` and `costs` are index-aligned; an empty cohort yields an
/// empty vector rather than four empty segments.
pub fn compute_segments(risks: &[f64], costs: &[f64], catastrophic_cost: f64) -> Vec<SegmentSummary> {
    if risks.is_empty() {
        return Vec::new();
    }

    let mut ordered: Vec<(f64, f64)> = risks
        .iter()
        .enumerate()
        .map(|(idx, &risk)| (risk, costs.get(idx).copied().unwrap_or(0.0)))
        .collect();
    ordered.sort_by(|a, b| a.0.total_cmp(&b.0));
    let n = ordered.len();

    (0..SEGMENT_COUNT)
        .map(|i| {
            let start = i * n / SEGMENT_COUNT;
            let end = if i == SEGMENT_COUNT - 1 {
                n
            } else {
                (i + 1) * n / SEGMENT_COUNT
            };
            let slice = &ordered[start..end];
            let segment_risks: Vec<f64> = slice.iter().map(|(risk, _)| *risk).collect();
            let segment_costs: Vec<f64> = slice.iter().map(|(_, cost)| *cost).collect();

            let catastrophic = segment_costs
                .iter()
                .filter(|&&cost| cost >= catastrophic_cost)
                .count();

            SegmentSummary {
                id: i + 1,
                name: SEGMENT_NAMES[i].to_string(),
                min_risk: segment_risks.first().copied().unwrap_or(0.0),
                max_risk: segment_risks.last().copied().unwrap_or(0.0),
                size: slice.len(),
                share: slice.len() as f64 / n as f64,
                mean_risk: mean(&segment_risks),
                mean_cost: mean(&segment_costs),
                cost_variance: variance(&segment_costs),
                catastrophic_rate: catastrophic as f64 / slice.len().max(1) as f64,
            }
        })
        .collect()
}

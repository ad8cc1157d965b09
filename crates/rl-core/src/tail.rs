//! Cost-tail concentration analysis.
//!
//! Two related but distinct questions: what share of total cost do the
//! top 10%/1% of members (by count) hold, and how few members (taken in
//! descending-cost order) are needed for cumulative cost to first reach
//! 10%/1% of the total. The member counts come from a cumulative-sum
//! scan, never back-derived from the share figures.

use serde::{Deserialize, Serialize};

/// Fraction of members counted as the "top decile" tail.
pub const TOP_DECILE_FRACTION: f64 = 0.10;

/// Fraction of members counted as the "top percentile" tail.
pub const TOP_PERCENTILE_FRACTION: f64 = 0.01;

/// Concentration of cohort cost in its most expensive members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TailShareSummary {
    pub top10_member_cost_share: f64,
    pub top1_member_cost_share: f64,
    pub members_for_top10_cost_share: usize,
    pub members_for_top1_cost_share: usize,
}

/// Compute tail shares for a nonnegative cost vector.
///
/// An empty cohort or zero total cost yields the all-zero summary.
pub fn compute_tail_shares(costs: &[f64]) -> TailShareSummary {
    if costs.is_empty() {
        return TailShareSummary::default();
    }

    let mut sorted_desc = costs.to_vec();
    sorted_desc.sort_by(|a, b| b.total_cmp(a));
    let total: f64 = sorted_desc.iter().sum();
    if total <= 0.0 {
        return TailShareSummary::default();
    }

    // At least one member in each tail, even when the fraction rounds to 0
    let top10_count = ((sorted_desc.len() as f64 * TOP_DECILE_FRACTION).floor() as usize).max(1);
    let top1_count = ((sorted_desc.len() as f64 * TOP_PERCENTILE_FRACTION).floor() as usize).max(1);

    let top10_share = sorted_desc[..top10_count].iter().sum::<f64>() / total;
    let top1_share = sorted_desc[..top1_count].iter().sum::<f64>() / total;

    let top10_target = total * TOP_DECILE_FRACTION;
    let top1_target = total * TOP_PERCENTILE_FRACTION;
    let mut cumulative = 0.0;
    let mut members_for_top10 = 0;
    let mut members_for_top1 = 0;
    for (i, cost) in sorted_desc.iter().enumerate() {
        cumulative += cost;
        if members_for_top1 == 0 && cumulative >= top1_target {
            members_for_top1 = i + 1;
        }
        if members_for_top10 == 0 && cumulative >= top10_target {
            members_for_top10 = i + 1;
            break;
        }
    }
    if members_for_top10 == 0 {
        members_for_top10 = sorted_desc.len();
    }
    if members_for_top1 == 0 {
        members_for_top1 = sorted_desc.len();
    }

    TailShareSummary {
        top10_member_cost_share: top10_share,
        top1_member_cost_share: top1_share,
        members_for_top10_cost_share: members_for_top10,
        members_for_top1_cost_share: members_for_top1,
    }
}

//! The run-level analytics summary: the aggregate bundle every dashboard
//! page starts from.

use crate::derive::run_points;
use crate::segments::{compute_segments, SegmentSummary};
use crate::tail::{compute_tail_shares, TailShareSummary};
use rl_common::{AnalyticsConfig, ReplacementStat, Run, RunPoint};
use rl_math::{mean, pearson, spearman, summarize_quantiles, QuantileSummary};
use serde::{Deserialize, Serialize};

/// Coerced features surfaced in the missingness report.
const TOP_COERCED_FEATURES: usize = 10;

/// Alignment data-quality rollup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingnessSummary {
    pub total_coerced: usize,
    /// Coerced cells over total row x feature cells.
    pub coerced_rate: f64,
    pub top_coerced_features: Vec<ReplacementStat>,
}

/// Risk-cost association; `None` means undefined, not zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub pearson: Option<f64>,
    pub spearman: Option<f64>,
}

/// Everything the overview, cost, and segmentation pages render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub n_members: usize,
    pub threshold: f64,
    pub low_risk_count: usize,
    pub low_risk_rate: f64,
    pub mean_risk: f64,
    pub median_risk: f64,
    pub risk_quantiles: QuantileSummary,
    pub cost_available: bool,
    pub mean_cost: f64,
    pub median_cost: f64,
    pub cost_quantiles: QuantileSummary,
    pub total_cost: f64,
    pub zero_cost_rate: f64,
    pub tail_shares: TailShareSummary,
    pub correlation: CorrelationSummary,
    pub catastrophic_rate: f64,
    pub segments: Vec<SegmentSummary>,
    pub missingness: MissingnessSummary,
    pub labels_available: bool,
    /// Observed label rate; populated only when every row is labeled.
    pub actual_low_risk_rate: Option<f64>,
}

fn missingness(run: &Run) -> MissingnessSummary {
    let total_cells = run.data_quality.row_count * run.data_quality.required_feature_count;
    let total_coerced = run.data_quality.replaced_value_count;
    MissingnessSummary {
        total_coerced,
        coerced_rate: if total_cells > 0 {
            total_coerced as f64 / total_cells as f64
        } else {
            0.0
        },
        top_coerced_features: run
            .data_quality
            .replacement_stats
            .iter()
            .take(TOP_COERCED_FEATURES)
            .cloned()
            .collect(),
    }
}

/// Summarize a run from its already-derived points.
pub fn summary_from_points(run: &Run, points: &[RunPoint], config: &AnalyticsConfig) -> RunSummary {
    let threshold = run.threshold;
    let risks: Vec<f64> = points.iter().map(|p| p.risk).collect();
    let costs: Vec<f64> = points.iter().map(|p| p.cost).collect();

    let n_members = risks.len();
    let low_risk_count = risks.iter().filter(|&&risk| risk >= threshold).count();
    let low_risk_rate = if n_members > 0 {
        low_risk_count as f64 / n_members as f64
    } else {
        0.0
    };

    let risk_quantiles = summarize_quantiles(&risks);
    let cost_quantiles = summarize_quantiles(&costs);
    let total_cost: f64 = costs.iter().sum();
    let zero_cost_rate =
        costs.iter().filter(|&&cost| cost == 0.0).count() as f64 / costs.len().max(1) as f64;
    let catastrophic_rate = costs
        .iter()
        .filter(|&&cost| cost >= config.catastrophic_cost)
        .count() as f64
        / costs.len().max(1) as f64;

    let valid_labels: Vec<f64> = points
        .iter()
        .filter_map(|p| p.label.map(f64::from))
        .collect();
    let labels_available = n_members > 0 && valid_labels.len() == n_members;

    RunSummary {
        n_members,
        threshold,
        low_risk_count,
        low_risk_rate,
        mean_risk: mean(&risks),
        median_risk: risk_quantiles.p50,
        risk_quantiles,
        cost_available: costs.iter().any(|&cost| cost > 0.0),
        mean_cost: mean(&costs),
        median_cost: cost_quantiles.p50,
        cost_quantiles,
        total_cost,
        zero_cost_rate,
        tail_shares: compute_tail_shares(&costs),
        correlation: CorrelationSummary {
            pearson: pearson(&risks, &costs),
            spearman: spearman(&risks, &costs),
        },
        catastrophic_rate,
        segments: compute_segments(&risks, &costs, config.catastrophic_cost),
        missingness: missingness(run),
        labels_available,
        actual_low_risk_rate: if labels_available {
            Some(mean(&valid_labels))
        } else {
            None
        },
    }
}

/// Summarize a run, deriving its points in the process.
pub fn compute_run_summary(run: &Run, config: &AnalyticsConfig) -> RunSummary {
    let points = run_points(run, config);
    summary_from_points(run, &points, config)
}

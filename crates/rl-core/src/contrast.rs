//! Cohort contrasts: what separates the low-risk group from the rest.
//!
//! Three views over the same split. Profile contrasts compare the
//! above-threshold and below-threshold cohorts on a curated feature
//! list; the low-risk profile renders a handful of those features with
//! display names; segment drivers ask the same question for one risk
//! quantile against the whole cohort.

use crate::derive::extract_cost;
use crate::segments::SegmentSummary;
use rl_common::{AnalyticsConfig, Run};
use rl_math::mean;
use serde::{Deserialize, Serialize};

/// Feature codes contrasted by default: utilization, employment, marital
/// status, education, and mental-health screeners.
pub const DEFAULT_CONTRAST_FEATURES: [&str; 8] = [
    "OBTOTV23", "OPTOTV23", "RXTOT23", "EMPST53", "MARRY53X", "EDUCYR", "K6SUM42", "PHQ242",
];

/// Cost feature codes handled via the cost-extraction rule rather than
/// the aligned column.
const COST_FEATURE_CODES: [&str; 2] = ["TOTEXP23", "TOTEXP"];

/// Display metrics rendered in the low-risk profile table.
const PROFILE_METRICS: [(&str, &str); 6] = [
    ("AGELAST", "Age"),
    ("CHRONIC_CT", "Chronic Condition Count"),
    ("LIMIT_CT", "Limitation Count"),
    ("K6SUM42", "K6 Distress Score"),
    ("PHQ242", "PHQ-2 Score"),
    ("PHYEXE53", "Exercise Frequency Code"),
];

/// Mean difference between the low-risk cohort and the rest on one
/// feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileContrast {
    pub feature: String,
    pub low_risk_mean: f64,
    pub rest_mean: f64,
    pub delta: f64,
}

/// One display row of the low-risk profile table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowRiskProfileRow {
    pub metric: String,
    pub code: Option<String>,
    pub low_risk: f64,
    pub standard_risk: f64,
    pub delta: f64,
}

/// Mean difference between one segment and the whole cohort on one
/// feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDriver {
    pub feature: String,
    pub segment_mean: f64,
    pub overall_mean: f64,
    pub delta: f64,
}

fn threshold_split(run: &Run) -> (Vec<usize>, Vec<usize>) {
    let mut low_risk = Vec::new();
    let mut rest = Vec::new();
    for (idx, scored) in run.scored_rows.iter().enumerate() {
        if scored.low_risk_probability >= run.threshold {
            low_risk.push(idx);
        } else {
            rest.push(idx);
        }
    }
    (low_risk, rest)
}

fn aligned_values(run: &Run, indices: &[usize], feature: &str) -> Vec<f64> {
    indices
        .iter()
        .map(|&idx| run.aligned.value(idx, feature).unwrap_or(0.0))
        .collect()
}

fn costs_for(run: &Run, indices: &[usize], config: &AnalyticsConfig) -> Vec<f64> {
    indices
        .iter()
        .map(|&idx| extract_cost(run.source_row(idx), &run.aligned, idx, config.log_cost_cap))
        .collect()
}

/// Above-threshold vs below-threshold means on the requested features,
/// sorted by descending |delta|.
///
/// The cost feature goes through the cost-extraction rule; every other
/// feature must exist in the aligned schema or it is skipped. Requires
/// both aligned and scored rows; returns empty otherwise.
pub fn profile_contrasts(
    run: &Run,
    feature_codes: &[&str],
    config: &AnalyticsConfig,
) -> Vec<ProfileContrast> {
    if run.aligned.is_empty() || run.scored_rows.is_empty() {
        return Vec::new();
    }

    let (low_risk, rest) = threshold_split(run);
    let mut contrasts = Vec::new();

    for &feature in feature_codes {
        if COST_FEATURE_CODES.contains(&feature) {
            let low_mean = mean(&costs_for(run, &low_risk, config));
            let rest_mean = mean(&costs_for(run, &rest, config));
            contrasts.push(ProfileContrast {
                feature: COST_FEATURE_CODES[0].to_string(),
                low_risk_mean: low_mean,
                rest_mean,
                delta: low_mean - rest_mean,
            });
            continue;
        }

        if run.aligned.feature_position(feature).is_none() {
            continue;
        }

        let low_mean = mean(&aligned_values(run, &low_risk, feature));
        let rest_mean = mean(&aligned_values(run, &rest, feature));
        contrasts.push(ProfileContrast {
            feature: feature.to_string(),
            low_risk_mean: low_mean,
            rest_mean,
            delta: low_mean - rest_mean,
        });
    }

    contrasts.sort_by(|a, b| b.delta.abs().total_cmp(&a.delta.abs()));
    contrasts
}

/// Display rows for the low-risk profile table.
///
/// Covers the fixed metric list plus a total-expenditure row built from
/// the raw `TOTEXP23` column only, included when both cohorts have at
/// least one member with a raw cost.
pub fn low_risk_profile(run: &Run) -> Vec<LowRiskProfileRow> {
    let (low_risk, rest) = threshold_split(run);
    let mut rows = Vec::new();

    for (code, metric) in PROFILE_METRICS {
        if run.aligned.feature_position(code).is_none() {
            continue;
        }
        let low_mean = mean(&aligned_values(run, &low_risk, code));
        let rest_mean = mean(&aligned_values(run, &rest, code));
        rows.push(LowRiskProfileRow {
            metric: metric.to_string(),
            code: Some(code.to_string()),
            low_risk: low_mean,
            standard_risk: rest_mean,
            delta: low_mean - rest_mean,
        });
    }

    let raw_costs = |indices: &[usize]| -> Vec<f64> {
        indices
            .iter()
            .filter_map(|&idx| {
                run.source_row(idx)
                    .and_then(|row| row.get("TOTEXP23"))
                    .and_then(|v| v.as_finite())
            })
            .collect()
    };
    let low_costs = raw_costs(&low_risk);
    let rest_costs = raw_costs(&rest);
    if !low_costs.is_empty() && !rest_costs.is_empty() {
        let low_mean = mean(&low_costs);
        let rest_mean = mean(&rest_costs);
        rows.push(LowRiskProfileRow {
            metric: "Total Expenditure".to_string(),
            code: Some("TOTEXP23".to_string()),
            low_risk: low_mean,
            standard_risk: rest_mean,
            delta: low_mean - rest_mean,
        });
    }

    rows
}

/// Top-K features whose mean inside the named segment departs most from
/// the cohort mean.
///
/// Membership is by the segment's inclusive risk range, and the search
/// universe is capped to the first `driver_column_cap` aligned columns.
pub fn segment_drivers(
    run: &Run,
    segments: &[SegmentSummary],
    segment_name: &str,
    config: &AnalyticsConfig,
) -> Vec<SegmentDriver> {
    let Some(segment) = segments.iter().find(|s| s.name == segment_name) else {
        return Vec::new();
    };
    if run.aligned.is_empty() || run.scored_rows.is_empty() {
        return Vec::new();
    }

    let indices: Vec<usize> = run
        .scored_rows
        .iter()
        .enumerate()
        .filter(|(_, scored)| {
            scored.low_risk_probability >= segment.min_risk
                && scored.low_risk_probability <= segment.max_risk
        })
        .map(|(idx, _)| idx)
        .collect();
    if indices.is_empty() {
        return Vec::new();
    }

    let all_indices: Vec<usize> = (0..run.aligned.n_rows()).collect();
    let mut drivers: Vec<SegmentDriver> = run
        .aligned
        .features()
        .iter()
        .take(config.driver_column_cap)
        .map(|feature| {
            let segment_mean = mean(&aligned_values(run, &indices, feature));
            let overall_mean = mean(&aligned_values(run, &all_indices, feature));
            SegmentDriver {
                feature: feature.clone(),
                segment_mean,
                overall_mean,
                delta: segment_mean - overall_mean,
            }
        })
        .collect();

    drivers.sort_by(|a, b| b.delta.abs().total_cmp(&a.delta.abs()));
    drivers.truncate(config.driver_top_k);
    drivers
}

//! Fallback scoring heuristic.
//!
//! When the scoring API is unreachable the dashboard still needs scored
//! rows, so this hand-tuned logistic of cost, chronic-condition count,
//! K6 distress, prescription count, and age stands in. The engine treats
//! API-scored and fallback-scored rows identically; only the probability
//! contract matters.

use crate::derive::{AGE_FIELDS, COST_FIELDS, LOG_COST_FIELDS};
use rl_common::config::{SCORE_CLAMP_MAX, SCORE_CLAMP_MIN};
use rl_common::{AnalyticsConfig, RawRow, RiskTier, ScoredRow};

/// Age assumed when both age fields are missing.
const DEFAULT_AGE: f64 = 45.0;

fn field(row: &RawRow, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|name| row.get(*name)?.as_finite())
}

fn sigmoid(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}

fn row_cost(row: &RawRow, log_cost_cap: f64) -> f64 {
    if let Some(direct) = field(row, &COST_FIELDS) {
        return direct.max(0.0);
    }
    if let Some(log_cost) = field(row, &LOG_COST_FIELDS) {
        return log_cost.min(log_cost_cap).exp().max(0.0);
    }
    0.0
}

/// Score one raw row with the fallback heuristic.
pub fn fallback_score_row(row: &RawRow, config: &AnalyticsConfig) -> ScoredRow {
    let age = field(row, &AGE_FIELDS).unwrap_or(DEFAULT_AGE);
    let chronic = field(row, &["CHRONIC_CT"]).unwrap_or(0.0);
    let k6 = field(row, &["K6SUM42"]).unwrap_or(0.0);
    let rx = field(row, &["RXTOT23"]).unwrap_or(0.0);
    let cost = row_cost(row, config.log_cost_cap);

    let raw_score = 1.35 - 0.000_09 * cost - 0.32 * chronic - 0.03 * k6.max(0.0)
        - 0.000_8 * rx.max(0.0)
        + 0.005 * (50.0 - age).max(0.0);
    let probability = sigmoid(raw_score).clamp(SCORE_CLAMP_MIN, SCORE_CLAMP_MAX);

    ScoredRow {
        low_risk_probability: probability,
        risk_tier: if probability >= config.threshold {
            RiskTier::Low
        } else {
            RiskTier::Standard
        },
    }
}

/// Score every raw row with the fallback heuristic.
pub fn fallback_score_rows(rows: &[RawRow], config: &AnalyticsConfig) -> Vec<ScoredRow> {
    rows.iter().map(|row| fallback_score_row(row, config)).collect()
}

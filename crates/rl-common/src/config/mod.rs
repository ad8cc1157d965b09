//! Analytics configuration and named constants.
//!
//! Every numeric constant that shapes an analytic result lives here as a
//! named value so tests can exercise boundary values explicitly instead of
//! chasing inlined literals.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Decision cutoff: a member is "low risk" when probability >= threshold.
pub const DEFAULT_LOW_RISK_THRESHOLD: f64 = 0.7;

/// Ceiling applied to log-cost fields before exponentiating, so a stray
/// log value cannot overflow into infinity.
pub const LOG_COST_CAP: f64 = 16.0;

/// Annual cost at or above which a member counts as catastrophic.
pub const CATASTROPHIC_COST: f64 = 20_000.0;

/// Minimum group size retained by the fairness aggregator.
pub const MIN_FAIRNESS_GROUP_SIZE: usize = 100;

/// Minimum group size retained by the finer subgroup-metrics table.
pub const MIN_SUBGROUP_SIZE: usize = 50;

/// Default bootstrap resampling rounds.
pub const BOOTSTRAP_ITERATIONS: usize = 200;

/// Default bootstrap RNG seed.
pub const BOOTSTRAP_SEED: u32 = 42;

/// The cohort is always partitioned into exactly this many risk-quantile
/// segments; this is an invariant of the segment builder, not a tunable.
pub const SEGMENT_COUNT: usize = 4;

/// Equal-width reliability bins for calibration curves.
pub const CALIBRATION_BINS: usize = 10;

/// Segment-driver search only scans the first N aligned feature columns.
pub const DRIVER_COLUMN_CAP: usize = 60;

/// Segment drivers returned by default.
pub const DRIVER_TOP_K: usize = 3;

/// Probability clamp applied by the fallback scoring heuristic.
pub const SCORE_CLAMP_MIN: f64 = 0.001;
pub const SCORE_CLAMP_MAX: f64 = 0.999;

/// Disparity band considered "OK" under the four-fifths rule.
pub const DISPARITY_OK_MIN: f64 = 0.8;
pub const DISPARITY_OK_MAX: f64 = 1.25;

/// Tunable analytics parameters, carried by the analytics service.
///
/// Defaults reproduce the dashboard's shipped behavior; `validate` rejects
/// configurations the engine cannot compute sensibly with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Low-risk decision cutoff, in (0, 1).
    pub threshold: f64,
    /// Cost at or above which a member counts as catastrophic.
    pub catastrophic_cost: f64,
    /// Ceiling on log-cost fields before exponentiating.
    pub log_cost_cap: f64,
    /// Minimum group size for the fairness aggregator.
    pub min_fairness_group_size: usize,
    /// Minimum group size for subgroup metrics.
    pub min_subgroup_size: usize,
    /// Bootstrap resampling rounds.
    pub bootstrap_iterations: usize,
    /// Bootstrap RNG seed.
    pub bootstrap_seed: u32,
    /// Aligned columns scanned by the segment-driver search.
    pub driver_column_cap: usize,
    /// Segment drivers returned.
    pub driver_top_k: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        AnalyticsConfig {
            threshold: DEFAULT_LOW_RISK_THRESHOLD,
            catastrophic_cost: CATASTROPHIC_COST,
            log_cost_cap: LOG_COST_CAP,
            min_fairness_group_size: MIN_FAIRNESS_GROUP_SIZE,
            min_subgroup_size: MIN_SUBGROUP_SIZE,
            bootstrap_iterations: BOOTSTRAP_ITERATIONS,
            bootstrap_seed: BOOTSTRAP_SEED,
            driver_column_cap: DRIVER_COLUMN_CAP,
            driver_top_k: DRIVER_TOP_K,
        }
    }
}

impl AnalyticsConfig {
    /// Semantic validation of the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(Error::InvalidValue {
                field: "threshold".into(),
                message: format!("must be in (0, 1), got {}", self.threshold),
            });
        }
        if !(self.catastrophic_cost > 0.0) {
            return Err(Error::InvalidValue {
                field: "catastrophic_cost".into(),
                message: format!("must be positive, got {}", self.catastrophic_cost),
            });
        }
        if !(self.log_cost_cap > 0.0) {
            return Err(Error::InvalidValue {
                field: "log_cost_cap".into(),
                message: format!("must be positive, got {}", self.log_cost_cap),
            });
        }
        if self.min_fairness_group_size == 0 || self.min_subgroup_size == 0 {
            return Err(Error::InvalidValue {
                field: "min_group_size".into(),
                message: "minimum group sizes must be at least 1".into(),
            });
        }
        if self.bootstrap_iterations == 0 {
            return Err(Error::InvalidValue {
                field: "bootstrap_iterations".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.driver_top_k == 0 {
            return Err(Error::InvalidValue {
                field: "driver_top_k".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

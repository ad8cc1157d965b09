//! RiskLens Core Library
//!
//! Pure analytics over scored member cohorts:
//! - Row derivation (risk, cost, labels, demographic groups)
//! - Schema alignment and data-quality reporting
//! - Summaries, segments, tail concentration, fairness tables
//! - Calibration, model quality, bootstrap uncertainty
//! - Profile contrasts, segment drivers, narrative lines
//!
//! Consumers interact through [`service::AnalyticsService`], which owns
//! configuration and the per-run caches.

pub mod align;
pub mod calibration;
pub mod contrast;
pub mod coverage;
pub mod derive;
pub mod fairness;
pub mod logging;
pub mod narrative;
pub mod score;
pub mod segments;
pub mod service;
pub mod summary;
pub mod tail;
pub mod uncertainty;

pub use align::{align_features, AlignmentOutcome};
pub use calibration::{calibration_curve, model_quality, CalibrationBin, ModelQuality};
pub use contrast::{
    low_risk_profile, profile_contrasts, segment_drivers, LowRiskProfileRow, ProfileContrast,
    SegmentDriver, DEFAULT_CONTRAST_FEATURES,
};
pub use coverage::{cost_distribution, feature_coverage, CostDistributionBin, FeatureCoverageRow};
pub use derive::run_points;
pub use fairness::{
    fairness_group_stats, subgroup_metrics, DisparityStatus, FairnessGroupStat,
    SubgroupMetricRow, DEFAULT_FAIRNESS_FIELDS, DEFAULT_SUBGROUP_FIELDS,
};
pub use score::{fallback_score_row, fallback_score_rows};
pub use segments::{compute_segments, SegmentSummary, SEGMENT_NAMES};
pub use service::{AnalyticsService, RunReport};
pub use summary::{compute_run_summary, CorrelationSummary, MissingnessSummary, RunSummary};
pub use tail::{compute_tail_shares, TailShareSummary};
pub use uncertainty::{
    bootstrap_low_risk_rate_ci, threshold_sensitivity, BootstrapRateCi,
    ThresholdSensitivityPoint, DEFAULT_SENSITIVITY_THRESHOLDS,
};

//! The analytics service: one owner for configuration and caches.
//!
//! Every derived product is memoized behind a mutex-guarded map keyed by
//! run id (plus serialized parameters where an operation is
//! parameterized). Recomputation is idempotent, so a double-compute race
//! is harmless; the locks make compute-once an optimization, not a
//! correctness requirement. Replacing a run's data requires
//! [`AnalyticsService::invalidate`] with the same id.

use crate::calibration::{calibration_curve, model_quality, CalibrationBin, ModelQuality};
use crate::contrast::{
    low_risk_profile, profile_contrasts, segment_drivers, LowRiskProfileRow, ProfileContrast,
    SegmentDriver, DEFAULT_CONTRAST_FEATURES,
};
use crate::coverage::{cost_distribution, feature_coverage, CostDistributionBin, FeatureCoverageRow};
use crate::derive::run_points;
use crate::fairness::{
    fairness_group_stats, subgroup_metrics, FairnessGroupStat, SubgroupMetricRow,
    DEFAULT_FAIRNESS_FIELDS,
};
use crate::summary::{summary_from_points, RunSummary};
use crate::uncertainty::{
    bootstrap_low_risk_rate_ci, threshold_sensitivity, BootstrapRateCi,
    ThresholdSensitivityPoint, DEFAULT_SENSITIVITY_THRESHOLDS,
};
use rl_common::{AnalyticsConfig, Result, Run, RunPoint};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

type Cache<T> = Mutex<HashMap<String, Arc<T>>>;

/// Everything the report page needs, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub cost_distribution: Vec<CostDistributionBin>,
    pub feature_coverage: Vec<FeatureCoverageRow>,
    pub subgroup_metrics: Vec<SubgroupMetricRow>,
    pub calibration: Vec<CalibrationBin>,
    pub model_quality: ModelQuality,
    pub low_risk_profile: Vec<LowRiskProfileRow>,
}

/// Stateful analytics engine for a dashboard session.
pub struct AnalyticsService {
    config: AnalyticsConfig,
    summaries: Cache<RunSummary>,
    points: Cache<Vec<RunPoint>>,
    fairness: Cache<Vec<FairnessGroupStat>>,
    subgroups: Cache<Vec<SubgroupMetricRow>>,
    contrasts: Cache<Vec<ProfileContrast>>,
    bootstraps: Cache<BootstrapRateCi>,
    sensitivities: Cache<Vec<ThresholdSensitivityPoint>>,
}

fn lock<T>(cache: &Cache<T>) -> std::sync::MutexGuard<'_, HashMap<String, Arc<T>>> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

fn get_or_compute<T>(cache: &Cache<T>, key: &str, compute: impl FnOnce() -> T) -> Arc<T> {
    if let Some(hit) = lock(cache).get(key) {
        debug!(key, "analytics cache hit");
        return Arc::clone(hit);
    }
    let value = Arc::new(compute());
    debug!(key, "analytics cache fill");
    lock(cache)
        .entry(key.to_string())
        .or_insert(value)
        .clone()
}

fn evict<T>(cache: &Cache<T>, run_id: &str) -> usize {
    let prefix = format!("{run_id}:");
    let mut map = lock(cache);
    let before = map.len();
    map.retain(|key, _| key != run_id && !key.starts_with(&prefix));
    before - map.len()
}

impl AnalyticsService {
    /// Build a service around a validated configuration.
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        Ok(AnalyticsService {
            config,
            summaries: Mutex::default(),
            points: Mutex::default(),
            fairness: Mutex::default(),
            subgroups: Mutex::default(),
            contrasts: Mutex::default(),
            bootstraps: Mutex::default(),
            sensitivities: Mutex::default(),
        })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Derived per-row points, memoized per run id.
    pub fn run_points(&self, run: &Run) -> Arc<Vec<RunPoint>> {
        get_or_compute(&self.points, &run.id, || run_points(run, &self.config))
    }

    /// The run-level summary, memoized per run id.
    pub fn run_summary(&self, run: &Run) -> Arc<RunSummary> {
        get_or_compute(&self.summaries, &run.id, || {
            let points = self.run_points(run);
            summary_from_points(run, &points, &self.config)
        })
    }

    /// Coarse fairness table over the default demographic fields.
    pub fn fairness_group_stats(&self, run: &Run) -> Arc<Vec<FairnessGroupStat>> {
        self.fairness_group_stats_for(run, &DEFAULT_FAIRNESS_FIELDS)
    }

    /// Coarse fairness table over caller-chosen fields.
    pub fn fairness_group_stats_for(
        &self,
        run: &Run,
        fields: &[&str],
    ) -> Arc<Vec<FairnessGroupStat>> {
        let key = format!("{}:{}", run.id, fields.join("|"));
        get_or_compute(&self.fairness, &key, || {
            fairness_group_stats(run, fields, &self.config)
        })
    }

    /// The finer subgroup-metrics table.
    pub fn subgroup_metrics(&self, run: &Run) -> Arc<Vec<SubgroupMetricRow>> {
        get_or_compute(&self.subgroups, &run.id, || {
            subgroup_metrics(run, &self.config)
        })
    }

    /// Profile contrasts over the default feature list.
    pub fn profile_contrasts(&self, run: &Run) -> Arc<Vec<ProfileContrast>> {
        self.profile_contrasts_for(run, &DEFAULT_CONTRAST_FEATURES)
    }

    /// Profile contrasts over caller-chosen feature codes.
    pub fn profile_contrasts_for(
        &self,
        run: &Run,
        feature_codes: &[&str],
    ) -> Arc<Vec<ProfileContrast>> {
        let key = format!("{}:{}", run.id, feature_codes.join("|"));
        get_or_compute(&self.contrasts, &key, || {
            profile_contrasts(run, feature_codes, &self.config)
        })
    }

    /// Deterministic bootstrap CI for the low-risk rate.
    pub fn bootstrap_ci(&self, run: &Run) -> Arc<BootstrapRateCi> {
        let key = format!(
            "{}:{}:{}",
            run.id, self.config.bootstrap_iterations, self.config.bootstrap_seed
        );
        get_or_compute(&self.bootstraps, &key, || {
            bootstrap_low_risk_rate_ci(run, &self.config)
        })
    }

    /// Low-risk rate across the default threshold sweep.
    pub fn threshold_sensitivity(&self, run: &Run) -> Arc<Vec<ThresholdSensitivityPoint>> {
        self.threshold_sensitivity_for(run, &DEFAULT_SENSITIVITY_THRESHOLDS)
    }

    /// Low-risk rate across a caller-chosen threshold sweep.
    pub fn threshold_sensitivity_for(
        &self,
        run: &Run,
        thresholds: &[f64],
    ) -> Arc<Vec<ThresholdSensitivityPoint>> {
        let key = format!(
            "{}:{}",
            run.id,
            thresholds
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(",")
        );
        get_or_compute(&self.sensitivities, &key, || {
            threshold_sensitivity(run, thresholds)
        })
    }

    /// Top drivers for one named risk segment. Uncached: the segment
    /// list is already memoized inside the summary.
    pub fn segment_drivers(&self, run: &Run, segment_name: &str) -> Vec<SegmentDriver> {
        let summary = self.run_summary(run);
        segment_drivers(run, &summary.segments, segment_name, &self.config)
    }

    /// Calibration curve over the run's derived points.
    pub fn calibration_curve(&self, run: &Run) -> Vec<CalibrationBin> {
        calibration_curve(&self.run_points(run))
    }

    /// Full report bundle for one run.
    pub fn run_report(&self, run: &Run) -> RunReport {
        let summary = self.run_summary(run);
        RunReport {
            summary: (*summary).clone(),
            cost_distribution: cost_distribution(&run.source_rows),
            feature_coverage: feature_coverage(run),
            subgroup_metrics: (*self.subgroup_metrics(run)).clone(),
            calibration: self.calibration_curve(run),
            model_quality: model_quality(run),
            low_risk_profile: low_risk_profile(run),
        }
    }

    /// Drop every cached product for a run id. Call when a run's data is
    /// replaced under the same id.
    pub fn invalidate(&self, run_id: &str) {
        let evicted = evict(&self.summaries, run_id)
            + evict(&self.points, run_id)
            + evict(&self.fairness, run_id)
            + evict(&self.subgroups, run_id)
            + evict(&self.contrasts, run_id)
            + evict(&self.bootstraps, run_id)
            + evict(&self.sensitivities, run_id);
        info!(run_id, evicted, "invalidated analytics caches");
    }
}

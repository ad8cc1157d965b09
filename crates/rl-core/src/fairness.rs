//! Demographic fairness aggregation.
//!
//! Two tables at different granularities: the coarse fairness view over
//! the headline demographic fields with a high minimum group size, and
//! the finer subgroup-metrics table that adds disparity ratios and
//! per-group discrimination. Small groups are suppressed entirely, never
//! reported with damped values.

use crate::derive::{extract_cost, extract_group_value, extract_label};
use rl_common::config::{DISPARITY_OK_MAX, DISPARITY_OK_MIN};
use rl_common::{AnalyticsConfig, RawValue, Run};
use rl_math::{compute_auc, mean};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fields scanned by the coarse fairness aggregator. `AGE` is the
/// bucketed pseudo-field, not a raw column.
pub const DEFAULT_FAIRNESS_FIELDS: [&str; 4] = ["SEX", "RACETHX", "REGION", "AGE"];

/// Raw columns scanned by the subgroup-metrics table.
pub const DEFAULT_SUBGROUP_FIELDS: [&str; 5] =
    ["SEX", "RACETHX", "HISPANX", "POVCAT23", "INSURC23"];

/// Groups retained per field and rows retained overall in the subgroup
/// table.
const SUBGROUP_GROUPS_PER_FIELD: usize = 8;
const SUBGROUP_ROW_CAP: usize = 15;

/// Aggregate statistics for one demographic group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessGroupStat {
    pub field: String,
    pub group: String,
    pub n: usize,
    pub mean_risk: f64,
    pub low_risk_rate: f64,
    pub mean_cost: f64,
    /// Observed label rate; `None` unless every group member is labeled.
    pub actual_low_risk_rate: Option<f64>,
}

/// Where a subgroup's selection-rate ratio sits against the four-fifths
/// band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisparityStatus {
    WithinBand,
    OutOfBand,
}

/// One row of the subgroup-metrics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupMetricRow {
    pub group: String,
    pub n: usize,
    pub predicted_low_risk_rate: f64,
    pub mean_probability: f64,
    pub actual_low_risk_rate: Option<f64>,
    /// Group predicted rate over overall predicted rate; 0 when the
    /// overall rate is 0.
    pub disparity: f64,
    pub disparity_status: DisparityStatus,
    pub auc: Option<f64>,
}

fn disparity_status(disparity: f64) -> DisparityStatus {
    if (DISPARITY_OK_MIN..=DISPARITY_OK_MAX).contains(&disparity) {
        DisparityStatus::WithinBand
    } else {
        DisparityStatus::OutOfBand
    }
}

struct GroupBucket {
    risks: Vec<f64>,
    costs: Vec<f64>,
    labels: Vec<f64>,
}

/// Coarse fairness statistics across the given demographic fields.
///
/// Groups smaller than `config.min_fairness_group_size` are dropped.
/// Output is sorted by field name, then by descending group size.
pub fn fairness_group_stats(
    run: &Run,
    fields: &[&str],
    config: &AnalyticsConfig,
) -> Vec<FairnessGroupStat> {
    let mut output = Vec::new();

    for &field in fields {
        let mut buckets: HashMap<String, GroupBucket> = HashMap::new();

        for (idx, scored) in run.scored_rows.iter().enumerate() {
            let Some(group) = extract_group_value(field, run.source_row(idx), &run.aligned, idx)
            else {
                continue;
            };

            let bucket = buckets.entry(group).or_insert_with(|| GroupBucket {
                risks: Vec::new(),
                costs: Vec::new(),
                labels: Vec::new(),
            });
            bucket.risks.push(scored.low_risk_probability);
            bucket.costs.push(extract_cost(
                run.source_row(idx),
                &run.aligned,
                idx,
                config.log_cost_cap,
            ));
            if let Some(label) = extract_label(run.source_row(idx)) {
                bucket.labels.push(f64::from(label));
            }
        }

        for (group, bucket) in buckets {
            if bucket.risks.len() < config.min_fairness_group_size {
                continue;
            }
            let n = bucket.risks.len();
            output.push(FairnessGroupStat {
                field: field.to_string(),
                group,
                n,
                mean_risk: mean(&bucket.risks),
                low_risk_rate: bucket.risks.iter().filter(|&&r| r >= run.threshold).count()
                    as f64
                    / n as f64,
                mean_cost: mean(&bucket.costs),
                actual_low_risk_rate: if bucket.labels.len() == n {
                    Some(mean(&bucket.labels))
                } else {
                    None
                },
            });
        }
    }

    output.sort_by(|a, b| a.field.cmp(&b.field).then(b.n.cmp(&a.n)));
    output
}

/// Human-readable label for a subgroup key.
fn subgroup_label(field: &str, value: &str) -> String {
    match (field, value) {
        ("SEX", "1") => "SEX: Male".to_string(),
        ("SEX", "2") => "SEX: Female".to_string(),
        ("HISPANX", "1") => "HISPANX: Hispanic".to_string(),
        ("HISPANX", "2") => "HISPANX: Non-Hispanic".to_string(),
        _ => format!("{field}: {value}"),
    }
}

fn subgroup_key(value: Option<&RawValue>) -> String {
    value
        .and_then(RawValue::as_group_key)
        .unwrap_or_else(|| "MISSING".to_string())
}

/// The finer subgroup-metrics table.
///
/// Per field: groups sorted by size, top 8 kept, groups below
/// `config.min_subgroup_size` dropped. The combined table is sorted by
/// descending size and capped at 15 rows. Per-group AUC requires every
/// group member to carry a valid label.
pub fn subgroup_metrics(run: &Run, config: &AnalyticsConfig) -> Vec<SubgroupMetricRow> {
    let risks = run.risks();
    let overall_rate = if risks.is_empty() {
        0.0
    } else {
        risks.iter().filter(|&&r| r >= run.threshold).count() as f64 / risks.len() as f64
    };

    let mut output = Vec::new();

    for &field in &DEFAULT_SUBGROUP_FIELDS {
        let present = run
            .source_rows
            .first()
            .is_some_and(|row| row.contains_key(field));
        if !present {
            continue;
        }

        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for idx in 0..run.n_members() {
            let key = subgroup_key(run.source_row(idx).and_then(|row| row.get(field)));
            groups.entry(key).or_default().push(idx);
        }

        let mut sorted_groups: Vec<(String, Vec<usize>)> = groups.into_iter().collect();
        sorted_groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));

        for (value, indices) in sorted_groups.into_iter().take(SUBGROUP_GROUPS_PER_FIELD) {
            if indices.len() < config.min_subgroup_size {
                continue;
            }

            let group_risks: Vec<f64> = indices.iter().map(|&idx| risks[idx]).collect();
            let group_labels: Vec<f64> = indices
                .iter()
                .filter_map(|&idx| extract_label(run.source_row(idx)).map(f64::from))
                .collect();

            let predicted_rate = group_risks.iter().filter(|&&r| r >= run.threshold).count()
                as f64
                / group_risks.len() as f64;
            let disparity = if overall_rate > 0.0 {
                predicted_rate / overall_rate
            } else {
                0.0
            };

            output.push(SubgroupMetricRow {
                group: subgroup_label(field, &value),
                n: indices.len(),
                predicted_low_risk_rate: predicted_rate,
                mean_probability: mean(&group_risks),
                actual_low_risk_rate: if group_labels.is_empty() {
                    None
                } else {
                    Some(mean(&group_labels))
                },
                disparity,
                disparity_status: disparity_status(disparity),
                auc: if group_labels.len() == group_risks.len() {
                    compute_auc(&group_risks, &group_labels)
                } else {
                    None
                },
            });
        }
    }

    output.sort_by(|a, b| b.n.cmp(&a.n).then(a.group.cmp(&b.group)));
    output.truncate(SUBGROUP_ROW_CAP);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_common::{AlignedMatrix, DataQuality, ModelCard, RawRow, RiskTier, ScoredRow};

    fn card() -> ModelCard {
        ModelCard {
            model_name: "m".into(),
            version: "v1".into(),
            target: "t".into(),
            required_features: Vec::new(),
            deployment_notes: Vec::new(),
        }
    }

    fn scored(p: f64) -> ScoredRow {
        ScoredRow {
            low_risk_probability: p,
            risk_tier: if p >= 0.7 { RiskTier::Low } else { RiskTier::Standard },
        }
    }

    fn member(sex: f64, risk: f64, label: Option<f64>) -> (RawRow, ScoredRow) {
        let mut row = RawRow::new();
        row.insert("SEX".into(), RawValue::Number(sex));
        if let Some(l) = label {
            row.insert("LOW_RISK".into(), RawValue::Number(l));
        }
        (row, scored(risk))
    }

    fn run_of(members: Vec<(RawRow, ScoredRow)>) -> Run {
        let (source_rows, scored_rows) = members.into_iter().unzip();
        Run::new(
            "r1",
            "demo",
            card(),
            source_rows,
            AlignedMatrix::default(),
            scored_rows,
            DataQuality::default(),
        )
    }

    fn shrunk_config() -> AnalyticsConfig {
        AnalyticsConfig {
            min_fairness_group_size: 2,
            min_subgroup_size: 2,
            ..AnalyticsConfig::default()
        }
    }

    #[test]
    fn small_groups_are_suppressed() {
        // One member coded SEX=3: below the minimum, so never reported
        let members = vec![
            member(1.0, 0.8, None),
            member(1.0, 0.6, None),
            member(2.0, 0.9, None),
            member(2.0, 0.4, None),
            member(3.0, 0.5, None),
        ];
        let stats = fairness_group_stats(&run_of(members), &["SEX"], &shrunk_config());
        assert_eq!(stats.len(), 2);
        assert!(stats.iter().all(|s| s.group != "3"));
    }

    #[test]
    fn default_minimum_suppresses_under_100() {
        let members: Vec<_> = (0..99).map(|_| member(1.0, 0.8, None)).collect();
        let stats =
            fairness_group_stats(&run_of(members), &["SEX"], &AnalyticsConfig::default());
        assert!(stats.is_empty());
    }

    #[test]
    fn group_rates_and_labels() {
        let members = vec![
            member(1.0, 0.8, Some(1.0)),
            member(1.0, 0.6, Some(0.0)),
            member(2.0, 0.9, Some(1.0)),
            member(2.0, 0.75, None),
        ];
        let stats = fairness_group_stats(&run_of(members), &["SEX"], &shrunk_config());
        let males = stats.iter().find(|s| s.group == "1").expect("group 1");
        assert_eq!(males.n, 2);
        assert!((males.low_risk_rate - 0.5).abs() < 1e-12);
        assert_eq!(males.actual_low_risk_rate, Some(0.5));

        // Group 2 has an unlabeled member: observed rate unavailable
        let females = stats.iter().find(|s| s.group == "2").expect("group 2");
        assert_eq!(females.actual_low_risk_rate, None);
    }

    #[test]
    fn sorted_by_field_then_descending_size() {
        let mut members = vec![
            member(1.0, 0.8, None),
            member(1.0, 0.6, None),
            member(1.0, 0.5, None),
            member(2.0, 0.9, None),
            member(2.0, 0.4, None),
        ];
        for (row, _) in &mut members {
            row.insert("REGION".into(), RawValue::Number(4.0));
        }
        let stats = fairness_group_stats(&run_of(members), &["SEX", "REGION"], &shrunk_config());
        assert_eq!(stats[0].field, "REGION");
        assert_eq!(stats[1].field, "SEX");
        assert!(stats[1].n >= stats[2].n);
    }

    #[test]
    fn subgroup_disparity_against_overall_rate() {
        let members = vec![
            member(1.0, 0.8, None),
            member(1.0, 0.9, None),
            member(2.0, 0.1, None),
            member(2.0, 0.2, None),
        ];
        let rows = subgroup_metrics(&run_of(members), &shrunk_config());
        // Overall rate 0.5; group 1 rate 1.0 so disparity 2.0
        let males = rows.iter().find(|r| r.group == "SEX: Male").expect("male row");
        assert!((males.disparity - 2.0).abs() < 1e-12);
        assert_eq!(males.disparity_status, DisparityStatus::OutOfBand);

        let females = rows.iter().find(|r| r.group == "SEX: Female").expect("female row");
        assert_eq!(females.disparity, 0.0);
        assert_eq!(females.disparity_status, DisparityStatus::OutOfBand);
    }

    #[test]
    fn uniform_groups_sit_within_band() {
        let members = vec![
            member(1.0, 0.8, None),
            member(1.0, 0.1, None),
            member(2.0, 0.9, None),
            member(2.0, 0.2, None),
        ];
        let rows = subgroup_metrics(&run_of(members), &shrunk_config());
        assert!(rows
            .iter()
            .all(|r| r.disparity_status == DisparityStatus::WithinBand));
    }

    #[test]
    fn subgroup_auc_requires_full_labels() {
        let members = vec![
            member(1.0, 0.9, Some(1.0)),
            member(1.0, 0.2, Some(0.0)),
            member(2.0, 0.8, Some(1.0)),
            member(2.0, 0.3, None),
        ];
        let rows = subgroup_metrics(&run_of(members), &shrunk_config());
        let males = rows.iter().find(|r| r.group == "SEX: Male").expect("male row");
        assert_eq!(males.auc, Some(1.0));
        let females = rows.iter().find(|r| r.group == "SEX: Female").expect("female row");
        assert_eq!(females.auc, None);
        assert_eq!(females.actual_low_risk_rate, Some(1.0));
    }

    #[test]
    fn missing_values_group_under_missing_key() {
        let mut blank = RawRow::new();
        blank.insert("SEX".into(), RawValue::Null);
        let members = vec![
            (blank.clone(), scored(0.5)),
            (blank, scored(0.6)),
            member(1.0, 0.8, None),
            member(1.0, 0.9, None),
        ];
        let rows = subgroup_metrics(&run_of(members), &shrunk_config());
        assert!(rows.iter().any(|r| r.group == "SEX: MISSING"));
    }

    #[test]
    fn absent_field_skipped_entirely() {
        let members = vec![member(1.0, 0.8, None), member(1.0, 0.9, None)];
        let rows = subgroup_metrics(&run_of(members), &shrunk_config());
        assert!(rows.iter().all(|r| r.group.starts_with("SEX:")));
    }

    #[test]
    fn empty_run_yields_empty_tables() {
        let run = run_of(Vec::new());
        assert!(fairness_group_stats(&run, &DEFAULT_FAIRNESS_FIELDS, &shrunk_config()).is_empty());
        assert!(subgroup_metrics(&run, &shrunk_config()).is_empty());
    }
}

//! Reliability curve and ground-truth model quality.
//!
//! Ground-truth metrics are gated all-or-nothing: unless every member of
//! the run carries a valid binary label, AUC, Brier, precision, and
//! recall stay unavailable. A partially labeled file says nothing
//! trustworthy about the model, so it is reported as unlabeled.

use crate::derive::extract_label;
use rl_common::config::CALIBRATION_BINS;
use rl_common::{Run, RunPoint};
use rl_math::{brier_score, compute_auc, mean, ConfusionCounts};
use serde::{Deserialize, Serialize};

/// One reliability bin of the calibration curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBin {
    /// Display range, e.g. "70-80%".
    pub bucket: String,
    pub n: usize,
    /// Mean predicted probability inside the bin; 0.0 for an empty bin.
    pub predicted: f64,
    /// Mean observed label; `None` unless every bin member is labeled.
    pub actual: Option<f64>,
}

/// Headline model-quality metrics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelQuality {
    pub has_ground_truth_label: bool,
    pub actual_low_risk_rate: Option<f64>,
    pub predicted_low_risk_rate: f64,
    pub auc: Option<f64>,
    pub brier: Option<f64>,
    pub precision_at_threshold: Option<f64>,
    pub recall_at_threshold: Option<f64>,
}

/// Ten equal-width reliability bins over [0, 1]; the last bin is closed
/// at 1.0 so a perfect probability is never dropped.
pub fn calibration_curve(points: &[RunPoint]) -> Vec<CalibrationBin> {
    if points.is_empty() {
        return Vec::new();
    }

    (0..CALIBRATION_BINS)
        .map(|i| {
            let start = i as f64 / CALIBRATION_BINS as f64;
            let end = (i + 1) as f64 / CALIBRATION_BINS as f64;
            let last = i == CALIBRATION_BINS - 1;

            let members: Vec<&RunPoint> = points
                .iter()
                .filter(|p| {
                    p.risk >= start && if last { p.risk <= end } else { p.risk < end }
                })
                .collect();

            let probs: Vec<f64> = members.iter().map(|p| p.risk).collect();
            let labels: Vec<f64> = members
                .iter()
                .filter_map(|p| p.label.map(f64::from))
                .collect();

            CalibrationBin {
                bucket: format!(
                    "{}-{}%",
                    (start * 100.0).round() as i64,
                    (end * 100.0).round() as i64
                ),
                n: members.len(),
                predicted: mean(&probs),
                actual: if !labels.is_empty() && labels.len() == probs.len() {
                    Some(mean(&labels))
                } else {
                    None
                },
            }
        })
        .collect()
}

/// Model quality at the run's operating threshold.
pub fn model_quality(run: &Run) -> ModelQuality {
    let probabilities = run.risks();
    let predicted_low_risk_rate = if probabilities.is_empty() {
        0.0
    } else {
        probabilities.iter().filter(|&&p| p >= run.threshold).count() as f64
            / probabilities.len() as f64
    };

    let labels: Vec<f64> = (0..run.n_members())
        .filter_map(|idx| extract_label(run.source_row(idx)).map(f64::from))
        .collect();
    let has_ground_truth_label =
        !probabilities.is_empty() && labels.len() == probabilities.len();

    if !has_ground_truth_label {
        return ModelQuality {
            has_ground_truth_label: false,
            actual_low_risk_rate: None,
            predicted_low_risk_rate,
            auc: None,
            brier: None,
            precision_at_threshold: None,
            recall_at_threshold: None,
        };
    }

    let counts = ConfusionCounts::at_threshold(&probabilities, &labels, run.threshold);

    ModelQuality {
        has_ground_truth_label: true,
        actual_low_risk_rate: Some(mean(&labels)),
        predicted_low_risk_rate,
        auc: compute_auc(&probabilities, &labels),
        brier: Some(brier_score(&probabilities, &labels)),
        precision_at_threshold: Some(counts.precision()),
        recall_at_threshold: Some(counts.recall()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_common::{AlignedMatrix, DataQuality, ModelCard, RawRow, RawValue, RiskTier, ScoredRow};

    fn point(risk: f64, label: Option<u8>) -> RunPoint {
        RunPoint {
            index: 0,
            risk,
            cost: 0.0,
            label,
        }
    }

    #[test]
    fn empty_cohort_has_no_curve() {
        assert!(calibration_curve(&[]).is_empty());
    }

    #[test]
    fn curve_has_ten_labeled_bins() {
        let curve = calibration_curve(&[point(0.5, None)]);
        assert_eq!(curve.len(), 10);
        assert_eq!(curve[0].bucket, "0-10%");
        assert_eq!(curve[7].bucket, "70-80%");
        assert_eq!(curve[9].bucket, "90-100%");
    }

    #[test]
    fn last_bin_is_closed_at_one() {
        let curve = calibration_curve(&[point(1.0, None), point(0.9, None)]);
        assert_eq!(curve[9].n, 2);
    }

    #[test]
    fn bin_boundaries_are_half_open() {
        // 0.1 belongs to the second bin, not the first
        let curve = calibration_curve(&[point(0.1, None), point(0.099, None)]);
        assert_eq!(curve[0].n, 1);
        assert_eq!(curve[1].n, 1);
    }

    #[test]
    fn bin_actual_requires_full_labels() {
        let curve = calibration_curve(&[
            point(0.55, Some(1)),
            point(0.56, None),
            point(0.75, Some(1)),
            point(0.76, Some(0)),
        ]);
        assert_eq!(curve[5].actual, None);
        assert_eq!(curve[7].actual, Some(0.5));
        assert!((curve[7].predicted - 0.755).abs() < 1e-12);
    }

    fn run_of(members: Vec<(f64, Option<f64>)>) -> Run {
        let source_rows: Vec<RawRow> = members
            .iter()
            .map(|(_, label)| {
                let mut row = RawRow::new();
                if let Some(l) = label {
                    row.insert("LOW_RISK".into(), RawValue::Number(*l));
                }
                row
            })
            .collect();
        let scored_rows = members
            .iter()
            .map(|(p, _)| ScoredRow {
                low_risk_probability: *p,
                risk_tier: if *p >= 0.7 { RiskTier::Low } else { RiskTier::Standard },
            })
            .collect();
        Run::new(
            "r1",
            "demo",
            ModelCard {
                model_name: "m".into(),
                version: "v1".into(),
                target: "t".into(),
                required_features: Vec::new(),
                deployment_notes: Vec::new(),
            },
            source_rows,
            AlignedMatrix::default(),
            scored_rows,
            DataQuality::default(),
        )
    }

    #[test]
    fn unlabeled_run_reports_predicted_rate_only() {
        let quality = model_quality(&run_of(vec![(0.8, None), (0.4, None)]));
        assert!(!quality.has_ground_truth_label);
        assert!((quality.predicted_low_risk_rate - 0.5).abs() < 1e-12);
        assert_eq!(quality.auc, None);
        assert_eq!(quality.brier, None);
    }

    #[test]
    fn partial_labels_gate_everything_off() {
        let quality = model_quality(&run_of(vec![(0.8, Some(1.0)), (0.4, None)]));
        assert!(!quality.has_ground_truth_label);
        assert_eq!(quality.actual_low_risk_rate, None);
    }

    #[test]
    fn fully_labeled_run_yields_all_metrics() {
        let quality = model_quality(&run_of(vec![
            (0.9, Some(1.0)),
            (0.8, Some(1.0)),
            (0.3, Some(0.0)),
            (0.6, Some(0.0)),
        ]));
        assert!(quality.has_ground_truth_label);
        assert_eq!(quality.actual_low_risk_rate, Some(0.5));
        assert_eq!(quality.auc, Some(1.0));
        // Predictions at 0.7: tp=2, fp=0, fn=0 so precision and recall are 1
        assert_eq!(quality.precision_at_threshold, Some(1.0));
        assert_eq!(quality.recall_at_threshold, Some(1.0));
        let brier = quality.brier.expect("labeled run has a brier score");
        assert!(brier > 0.0 && brier < 0.25);
    }

    #[test]
    fn empty_run_is_unlabeled() {
        let quality = model_quality(&run_of(Vec::new()));
        assert!(!quality.has_ground_truth_label);
        assert_eq!(quality.predicted_low_risk_rate, 0.0);
    }
}

//! Property-based tests for the cohort aggregators.
//!
//! Uses proptest to verify structural invariants hold across many random
//! cohorts.

use proptest::prelude::*;
use rl_common::{
    AlignedMatrix, AnalyticsConfig, DataQuality, ModelCard, RawRow, RawValue, RiskTier, Run,
    ScoredRow,
};
use rl_core::{
    bootstrap_low_risk_rate_ci, calibration_curve, compute_segments, compute_tail_shares,
    fallback_score_row, run_points, threshold_sensitivity, DEFAULT_SENSITIVITY_THRESHOLDS,
};

fn card() -> ModelCard {
    ModelCard {
        model_name: "m".into(),
        version: "v1".into(),
        target: "LOW_RISK_PROBABILITY".into(),
        required_features: Vec::new(),
        deployment_notes: Vec::new(),
    }
}

fn run_of(risks: &[f64], costs: &[f64]) -> Run {
    let source_rows: Vec<RawRow> = costs
        .iter()
        .map(|&cost| {
            let mut row = RawRow::new();
            row.insert("TOTEXP23".into(), RawValue::Number(cost));
            row
        })
        .collect();
    Run::new(
        "prop-run",
        "prop",
        card(),
        source_rows,
        AlignedMatrix::default(),
        risks
            .iter()
            .map(|&p| ScoredRow {
                low_risk_probability: p,
                risk_tier: if p >= 0.7 { RiskTier::Low } else { RiskTier::Standard },
            })
            .collect(),
        DataQuality::default(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Segment sizes partition the cohort exactly.
    #[test]
    fn segments_partition_the_cohort(risks in prop::collection::vec(0.0..1.0f64, 1..60)) {
        let costs = vec![0.0; risks.len()];
        let segments = compute_segments(&risks, &costs, 20_000.0);
        prop_assert_eq!(segments.len(), 4);
        prop_assert_eq!(segments.iter().map(|s| s.size).sum::<usize>(), risks.len());
        let share_total: f64 = segments.iter().map(|s| s.share).sum();
        prop_assert!((share_total - 1.0).abs() < 1e-9);
    }

    /// Segment risk bounds are ordered within and across segments.
    #[test]
    fn segments_are_contiguous_in_risk(risks in prop::collection::vec(0.0..1.0f64, 4..60)) {
        let costs = vec![0.0; risks.len()];
        let segments = compute_segments(&risks, &costs, 20_000.0);
        for segment in &segments {
            prop_assert!(segment.min_risk <= segment.max_risk);
        }
        for pair in segments.windows(2) {
            prop_assert!(pair[0].max_risk <= pair[1].min_risk);
        }
    }

    /// Tail shares are fractions and the 1% tail never exceeds the 10% tail.
    #[test]
    fn tail_shares_are_ordered_fractions(costs in prop::collection::vec(0.0..1e6f64, 1..100)) {
        let shares = compute_tail_shares(&costs);
        prop_assert!((0.0..=1.0).contains(&shares.top10_member_cost_share));
        prop_assert!((0.0..=1.0).contains(&shares.top1_member_cost_share));
        prop_assert!(shares.top1_member_cost_share <= shares.top10_member_cost_share + 1e-9);
        prop_assert!(shares.members_for_top1_cost_share <= shares.members_for_top10_cost_share);
        prop_assert!(shares.members_for_top10_cost_share <= costs.len());
    }

    /// The bootstrap interval is ordered, bounded, and deterministic.
    #[test]
    fn bootstrap_interval_is_sane(risks in prop::collection::vec(0.0..1.0f64, 1..40)) {
        let run = run_of(&risks, &vec![0.0; risks.len()]);
        let config = AnalyticsConfig { bootstrap_iterations: 50, ..AnalyticsConfig::default() };
        let ci = bootstrap_low_risk_rate_ci(&run, &config);
        prop_assert!(ci.lower <= ci.mean && ci.mean <= ci.upper);
        prop_assert!(ci.lower >= 0.0 && ci.upper <= 1.0);
        prop_assert_eq!(ci, bootstrap_low_risk_rate_ci(&run, &config));
    }

    /// The low-risk rate never increases as the threshold rises.
    #[test]
    fn sensitivity_is_monotone(risks in prop::collection::vec(0.0..1.0f64, 0..60)) {
        let run = run_of(&risks, &vec![0.0; risks.len()]);
        let points = threshold_sensitivity(&run, &DEFAULT_SENSITIVITY_THRESHOLDS);
        for pair in points.windows(2) {
            prop_assert!(pair[0].low_risk_rate >= pair[1].low_risk_rate);
        }
    }

    /// Every derived point has a nonnegative cost and a binary label if any.
    #[test]
    fn derived_points_respect_contracts(
        risks in prop::collection::vec(0.0..1.0f64, 0..40),
        costs in prop::collection::vec(-1e4..1e6f64, 0..40),
    ) {
        let n = risks.len().min(costs.len());
        let run = run_of(&risks[..n], &costs[..n]);
        let points = run_points(&run, &AnalyticsConfig::default());
        prop_assert_eq!(points.len(), n);
        for point in &points {
            prop_assert!(point.cost >= 0.0);
            prop_assert!(point.label.is_none() || matches!(point.label, Some(0 | 1)));
        }
    }

    /// Calibration bins cover every member exactly once.
    #[test]
    fn calibration_bins_partition_members(risks in prop::collection::vec(0.0..=1.0f64, 1..60)) {
        let run = run_of(&risks, &vec![0.0; risks.len()]);
        let points = run_points(&run, &AnalyticsConfig::default());
        let bins = calibration_curve(&points);
        prop_assert_eq!(bins.len(), 10);
        prop_assert_eq!(bins.iter().map(|b| b.n).sum::<usize>(), risks.len());
    }

    /// Fallback scores always land in the clamped probability range.
    #[test]
    fn fallback_scores_stay_clamped(
        cost in -1e9..1e9f64,
        age in 0.0..110.0f64,
        chronic in 0.0..20.0f64,
    ) {
        let mut row = RawRow::new();
        row.insert("TOTEXP23".into(), RawValue::Number(cost));
        row.insert("AGELAST".into(), RawValue::Number(age));
        row.insert("CHRONIC_CT".into(), RawValue::Number(chronic));
        let scored = fallback_score_row(&row, &AnalyticsConfig::default());
        prop_assert!((0.001..=0.999).contains(&scored.low_risk_probability));
    }
}

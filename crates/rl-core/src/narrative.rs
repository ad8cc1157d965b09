//! Narrative generation: short English insight lines per dashboard page.
//!
//! Pure formatting over already-computed analytics. Nothing here touches
//! a run; callers pass in the summary, fairness table, bootstrap CI, and
//! sensitivity sweep they already hold, and get back capped sentence
//! lists suitable for direct rendering.

use crate::contrast::ProfileContrast;
use crate::fairness::FairnessGroupStat;
use crate::segments::SegmentSummary;
use crate::summary::RunSummary;
use crate::uncertainty::{BootstrapRateCi, ThresholdSensitivityPoint};

/// Human-readable display names for MEPS variable codes. Presentation
/// only; never used to address data.
const FEATURE_LABELS: [(&str, &str); 14] = [
    ("PHYEXE53", "Exercise Frequency"),
    ("RTHLTH53", "Self-Rated Physical Health"),
    ("MNHLTH53", "Self-Rated Mental Health"),
    ("K6SUM42", "Distress Score (K6)"),
    ("PHQ242", "Depression Score (PHQ-2)"),
    ("LIMIT_CT", "Limitation Count"),
    ("CHRONIC_CT", "Chronic Condition Count"),
    ("TOTEXP23", "Total Expenditure"),
    ("RXTOT23", "Rx Fills"),
    ("AGE", "Age"),
    ("AGELAST", "Age"),
    ("SEX", "Sex"),
    ("RACETHX", "Race / Ethnicity"),
    ("INSURC23", "Insurance Coverage"),
];

/// Display label for a variable code; the code itself when unmapped.
pub fn feature_label(code: &str) -> &str {
    FEATURE_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map_or(code, |(_, label)| label)
}

/// Integer with thousands separators.
pub fn fmt_int(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Fraction as a percentage with the given decimal digits.
pub fn fmt_pct(value: f64, digits: usize) -> String {
    format!("{:.*}%", digits, value * 100.0)
}

/// Plain number with the given decimal digits.
pub fn fmt_num(value: f64, digits: usize) -> String {
    format!("{value:.digits$}")
}

/// Dollar amount, rounded to whole dollars with thousands separators.
pub fn fmt_currency(value: f64) -> String {
    let rounded = value.round();
    if rounded < 0.0 {
        format!("-${}", fmt_int(rounded.abs() as usize))
    } else {
        format!("${}", fmt_int(rounded as usize))
    }
}

/// Wording for a correlation coefficient's strength.
pub fn describe_correlation(value: Option<f64>) -> &'static str {
    let Some(value) = value else {
        return "no measurable";
    };
    let abs = value.abs();
    if abs < 0.15 {
        "very weak"
    } else if abs < 0.35 {
        "weak"
    } else if abs < 0.55 {
        "moderate"
    } else if abs < 0.75 {
        "strong"
    } else {
        "very strong"
    }
}

fn fmt_opt_corr(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| fmt_num(v, 3))
}

/// Overview-page insight lines; at most 6.
pub fn overview_insights(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Scored {} members; average low-risk score is {} and median is {}.",
            fmt_int(summary.n_members),
            fmt_num(summary.mean_risk, 3),
            fmt_num(summary.median_risk, 3)
        ),
        format!(
            "{} of members are above the low-risk threshold p >= {} ({} members).",
            fmt_pct(summary.low_risk_rate, 2),
            fmt_num(summary.threshold, 2),
            fmt_int(summary.low_risk_count)
        ),
        format!(
            "Score spread is p10 {}, p50 {}, p90 {}.",
            fmt_num(summary.risk_quantiles.p10, 3),
            fmt_num(summary.risk_quantiles.p50, 3),
            fmt_num(summary.risk_quantiles.p90, 3)
        ),
    ];

    if summary.cost_available {
        lines.push(format!(
            "Cost median is {} and p90 is {}; top 10% of members account for {} of total cost.",
            fmt_currency(summary.cost_quantiles.p50),
            fmt_currency(summary.cost_quantiles.p90),
            fmt_pct(summary.tail_shares.top10_member_cost_share, 1)
        ));
    }

    lines.push(format!(
        "Risk-cost association is {} (Spearman {}), useful for retention and pricing segmentation.",
        describe_correlation(summary.correlation.spearman),
        fmt_opt_corr(summary.correlation.spearman)
    ));

    lines.truncate(6);
    lines
}

/// Risk-distribution-page insight lines.
pub fn risk_distribution_insights(summary: &RunSummary) -> Vec<String> {
    vec![
        format!(
            "Distribution centers at median {} with upper decile at {}.",
            fmt_num(summary.risk_quantiles.p50, 3),
            fmt_num(summary.risk_quantiles.p90, 3)
        ),
        format!(
            "{} of members clear p >= {}, indicating a relatively selective low-risk cohort.",
            fmt_pct(summary.low_risk_rate, 2),
            fmt_num(summary.threshold, 2)
        ),
        format!(
            "Inter-decile spread (p90 - p10) is {}, which shows how separated the score tail is.",
            fmt_num(summary.risk_quantiles.p90 - summary.risk_quantiles.p10, 3)
        ),
    ]
}

/// Cost-distribution-page insight lines.
pub fn cost_distribution_insights(summary: &RunSummary) -> Vec<String> {
    if !summary.cost_available {
        return vec![
            "Cost fields are not available in this run, so cost-based insights cannot be computed."
                .to_string(),
        ];
    }

    vec![
        format!(
            "Median cost is {} and p90 is {}.",
            fmt_currency(summary.cost_quantiles.p50),
            fmt_currency(summary.cost_quantiles.p90)
        ),
        format!(
            "{} of members have zero cost in the available cost field.",
            fmt_pct(summary.zero_cost_rate, 2)
        ),
        format!(
            "Top 10% of members contribute {} of cost; top 1% contribute {}.",
            fmt_pct(summary.tail_shares.top10_member_cost_share, 1),
            fmt_pct(summary.tail_shares.top1_member_cost_share, 1)
        ),
        format!(
            "{} members are enough to reach 10% of total cost, indicating cost concentration.",
            fmt_int(summary.tail_shares.members_for_top10_cost_share)
        ),
    ]
}

/// Segmentation-page insight lines.
pub fn segmentation_insights(segments: &[SegmentSummary], summary: &RunSummary) -> Vec<String> {
    if segments.is_empty() {
        return vec!["No segmentation output is available for this run.".to_string()];
    }

    let (Some(highest_cost), Some(lowest_risk), Some(highest_catastrophic)) = (
        segments
            .iter()
            .max_by(|a, b| a.mean_cost.total_cmp(&b.mean_cost)),
        segments
            .iter()
            .min_by(|a, b| a.mean_risk.total_cmp(&b.mean_risk)),
        segments
            .iter()
            .max_by(|a, b| a.catastrophic_rate.total_cmp(&b.catastrophic_rate)),
    ) else {
        return Vec::new();
    };

    vec![
        format!(
            "Members are split into {} equal risk-quantile segments ({} total).",
            segments.len(),
            fmt_int(summary.n_members)
        ),
        format!(
            "{} has the highest mean cost ({}), while {} has the lowest mean risk ({}).",
            highest_cost.name,
            fmt_currency(highest_cost.mean_cost),
            lowest_risk.name,
            fmt_num(lowest_risk.mean_risk, 3)
        ),
        format!(
            "Catastrophic cost rate peaks in {} at {} vs overall {}.",
            highest_catastrophic.name,
            fmt_pct(highest_catastrophic.catastrophic_rate, 2),
            fmt_pct(summary.catastrophic_rate, 2)
        ),
    ]
}

/// Fairness-page insight lines.
pub fn fairness_insights(
    group_stats: &[FairnessGroupStat],
    overall_low_risk_rate: f64,
) -> Vec<String> {
    if group_stats.is_empty() {
        return vec![
            "Fairness analysis unavailable because required group features are missing."
                .to_string(),
        ];
    }

    let (Some(highest), Some(lowest)) = (
        group_stats
            .iter()
            .max_by(|a, b| a.low_risk_rate.total_cmp(&b.low_risk_rate)),
        group_stats
            .iter()
            .min_by(|a, b| a.low_risk_rate.total_cmp(&b.low_risk_rate)),
    ) else {
        return Vec::new();
    };
    let gap = highest.low_risk_rate - lowest.low_risk_rate;

    vec![
        format!(
            "Computed fairness metrics for {} groups across available demographic fields.",
            group_stats.len()
        ),
        format!(
            "Highest low-risk rate is {} ({}:{}); lowest is {} ({}:{}).",
            fmt_pct(highest.low_risk_rate, 2),
            highest.field,
            highest.group,
            fmt_pct(lowest.low_risk_rate, 2),
            lowest.field,
            lowest.group
        ),
        format!(
            "Absolute gap is {} against an overall low-risk rate of {}.",
            fmt_pct(gap, 2),
            fmt_pct(overall_low_risk_rate, 2)
        ),
        "Largest gaps identify where retention/policy review should focus first.".to_string(),
    ]
}

/// Low-risk-profile-page insight lines; at most 6.
pub fn low_risk_profile_insights(
    contrasts: &[ProfileContrast],
    summary: &RunSummary,
) -> Vec<String> {
    if contrasts.is_empty() {
        return vec![
            "Profile contrasts are unavailable because aligned feature rows are missing."
                .to_string(),
        ];
    }

    let mut lines = vec![format!(
        "Low-risk cohort size is {} ({}) at threshold p >= {}.",
        fmt_int(summary.low_risk_count),
        fmt_pct(summary.low_risk_rate, 2),
        fmt_num(summary.threshold, 2)
    )];

    for contrast in contrasts.iter().take(3) {
        lines.push(format!(
            "{} differs by {} (low-risk {} vs rest {}).",
            feature_label(&contrast.feature),
            fmt_num(contrast.delta, 3),
            fmt_num(contrast.low_risk_mean, 3),
            fmt_num(contrast.rest_mean, 3)
        ));
    }

    lines.truncate(6);
    lines
}

/// Risk-lab-page insight lines: bootstrap CI plus threshold sweep.
pub fn risk_lab_insights(
    summary: &RunSummary,
    ci: &BootstrapRateCi,
    sensitivity: &[ThresholdSensitivityPoint],
) -> Vec<String> {
    let (min_rate, max_rate) = sensitivity.iter().fold(
        (summary.low_risk_rate, summary.low_risk_rate),
        |(min, max), point| (min.min(point.low_risk_rate), max.max(point.low_risk_rate)),
    );
    let sweep_range = match (sensitivity.first(), sensitivity.last()) {
        (Some(first), Some(last)) => format!(
            "{}-{}",
            fmt_num(first.threshold, 2),
            fmt_num(last.threshold, 2)
        ),
        _ => "N/A".to_string(),
    };

    vec![
        format!(
            "Bootstrap CI ({} resamples) for low-risk rate is {} to {} (width {}).",
            fmt_int(ci.iterations),
            fmt_pct(ci.lower, 2),
            fmt_pct(ci.upper, 2),
            fmt_pct(ci.width, 2)
        ),
        format!(
            "Threshold sweep {} changes low-risk rate from {} to {}.",
            sweep_range,
            fmt_pct(min_rate, 2),
            fmt_pct(max_rate, 2)
        ),
        format!(
            "Current threshold {} yields {}, useful as the operational baseline.",
            fmt_num(summary.threshold, 2),
            fmt_pct(summary.low_risk_rate, 2)
        ),
    ]
}

/// Executive-summary lines for the reports page; at most 10.
pub fn executive_summary(summary: &RunSummary, segments: &[SegmentSummary]) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Scored {} members using threshold p >= {}.",
            fmt_int(summary.n_members),
            fmt_num(summary.threshold, 2)
        ),
        format!(
            "Low-risk share is {} ({} members).",
            fmt_pct(summary.low_risk_rate, 2),
            fmt_int(summary.low_risk_count)
        ),
        format!(
            "Mean/median low-risk score is {} / {}.",
            fmt_num(summary.mean_risk, 3),
            fmt_num(summary.median_risk, 3)
        ),
        format!(
            "Score p10/p90 are {} and {}.",
            fmt_num(summary.risk_quantiles.p10, 3),
            fmt_num(summary.risk_quantiles.p90, 3)
        ),
    ];

    if summary.cost_available {
        lines.push(format!(
            "Median/p90 cost are {} / {}.",
            fmt_currency(summary.cost_quantiles.p50),
            fmt_currency(summary.cost_quantiles.p90)
        ));
        lines.push(format!(
            "Top 10% of members account for {} of cost.",
            fmt_pct(summary.tail_shares.top10_member_cost_share, 1)
        ));
    }

    if let (Some(highest_cost), Some(lowest_risk)) = (
        segments
            .iter()
            .max_by(|a, b| a.mean_cost.total_cmp(&b.mean_cost)),
        segments
            .iter()
            .min_by(|a, b| a.mean_risk.total_cmp(&b.mean_risk)),
    ) {
        lines.push(format!(
            "{} has highest mean cost ({}); {} has lowest mean risk ({}).",
            highest_cost.name,
            fmt_currency(highest_cost.mean_cost),
            lowest_risk.name,
            fmt_num(lowest_risk.mean_risk, 3)
        ));
    }

    lines.push(format!(
        "Data quality coercions: {} cells ({}).",
        fmt_int(summary.missingness.total_coerced),
        fmt_pct(summary.missingness.coerced_rate, 2)
    ));

    lines.truncate(10);
    lines
}

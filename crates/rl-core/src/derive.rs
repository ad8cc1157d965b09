//! Per-row derivation: cost, label, and categorical group extraction.
//!
//! MEPS exports spell the expenditure column with and without a year
//! suffix, and either as a raw dollar amount or a log-transformed value.
//! Extraction checks the raw source row before the aligned row, and the
//! suffixed spelling before the plain one.

use rl_common::{AlignedMatrix, AnalyticsConfig, RawRow, Run, RunPoint};

/// Log-transformed expenditure fields, preferred over direct cost.
pub const LOG_COST_FIELDS: [&str; 2] = ["LOG_TOTEXP23", "LOG_TOTEXP"];

/// Direct expenditure fields.
pub const COST_FIELDS: [&str; 2] = ["TOTEXP23", "TOTEXP"];

/// Ground-truth label field; valid only when exactly 0 or 1.
pub const LABEL_FIELD: &str = "LOW_RISK";

/// Continuous age fields, bucketed before use as a group key.
pub const AGE_FIELDS: [&str; 2] = ["AGELAST", "AGE"];

/// Pseudo-field name that triggers age bucketing.
pub const AGE_GROUP_FIELD: &str = "AGE";

/// Age bands used as fairness group keys.
pub const AGE_BANDS: [&str; 4] = ["<35", "35-49", "50-64", "65+"];

fn raw_field(row: Option<&RawRow>, names: &[&str]) -> Option<f64> {
    let row = row?;
    names.iter().find_map(|name| row.get(*name)?.as_finite())
}

fn aligned_field(aligned: &AlignedMatrix, idx: usize, names: &[&str]) -> Option<f64> {
    names
        .iter()
        .find_map(|name| aligned.value(idx, name))
        .filter(|v| v.is_finite())
}

/// Cost for one member.
///
/// Prefers a log-cost field (clamped to `log_cost_cap` before
/// exponentiating so a corrupt value cannot overflow), then falls back to
/// a direct cost field, flooring both at 0. Missing everywhere means 0.
pub fn extract_cost(
    source_row: Option<&RawRow>,
    aligned: &AlignedMatrix,
    idx: usize,
    log_cost_cap: f64,
) -> f64 {
    let raw_log = raw_field(source_row, &LOG_COST_FIELDS)
        .or_else(|| aligned_field(aligned, idx, &LOG_COST_FIELDS));
    if let Some(log_cost) = raw_log {
        let expanded = log_cost.min(log_cost_cap).exp();
        if expanded.is_finite() {
            return expanded.max(0.0);
        }
    }

    let direct = raw_field(source_row, &COST_FIELDS)
        .or_else(|| aligned_field(aligned, idx, &COST_FIELDS));
    direct.map_or(0.0, |cost| cost.max(0.0))
}

/// Ground-truth label for one member; `None` unless the field is exactly
/// 0 or 1. An out-of-range value is never coerced to a guessed class.
pub fn extract_label(source_row: Option<&RawRow>) -> Option<u8> {
    let value = raw_field(source_row, &[LABEL_FIELD])?;
    if value == 0.0 {
        Some(0)
    } else if value == 1.0 {
        Some(1)
    } else {
        None
    }
}

fn format_group_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Age band for a continuous age value.
pub fn age_band(age: f64) -> &'static str {
    if age < 35.0 {
        AGE_BANDS[0]
    } else if age < 50.0 {
        AGE_BANDS[1]
    } else if age < 65.0 {
        AGE_BANDS[2]
    } else {
        AGE_BANDS[3]
    }
}

/// Categorical group value for one member.
///
/// The `AGE` pseudo-field buckets the continuous age into fixed bands;
/// every other field is the stringified raw value, falling back to the
/// aligned value. `None` means the member has no usable group key.
pub fn extract_group_value(
    field: &str,
    source_row: Option<&RawRow>,
    aligned: &AlignedMatrix,
    idx: usize,
) -> Option<String> {
    if field == AGE_GROUP_FIELD {
        let age = raw_field(source_row, &AGE_FIELDS)
            .or_else(|| aligned_field(aligned, idx, &AGE_FIELDS))?;
        return Some(age_band(age).to_string());
    }

    if let Some(key) = source_row.and_then(|row| row.get(field)).and_then(|v| v.as_group_key()) {
        return Some(key);
    }
    aligned.value(idx, field).map(format_group_number)
}

/// Compose the derived per-row vector for a run: risk copied from the
/// scored rows, cost and label from the extraction rules above.
pub fn run_points(run: &Run, config: &AnalyticsConfig) -> Vec<RunPoint> {
    run.scored_rows
        .iter()
        .enumerate()
        .map(|(idx, row)| RunPoint {
            index: idx,
            risk: if row.low_risk_probability.is_finite() {
                row.low_risk_probability
            } else {
                0.0
            },
            cost: extract_cost(run.source_row(idx), &run.aligned, idx, config.log_cost_cap),
            label: extract_label(run.source_row(idx)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_common::RawValue;

    fn row(pairs: &[(&str, RawValue)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn empty_matrix() -> AlignedMatrix {
        AlignedMatrix::default()
    }

    #[test]
    fn log_cost_preferred_and_clamped() {
        let source = row(&[
            ("LOG_TOTEXP23", RawValue::Number(100.0)),
            ("TOTEXP23", RawValue::Number(500.0)),
        ]);
        // Clamped to cap 16 before exponentiating
        let cost = extract_cost(Some(&source), &empty_matrix(), 0, 16.0);
        assert!((cost - 16.0f64.exp()).abs() < 1e-6);
    }

    #[test]
    fn direct_cost_fallback_floors_at_zero() {
        let source = row(&[("TOTEXP23", RawValue::Number(-50.0))]);
        assert_eq!(extract_cost(Some(&source), &empty_matrix(), 0, 16.0), 0.0);

        let source = row(&[("TOTEXP", RawValue::Number(1234.0))]);
        assert_eq!(extract_cost(Some(&source), &empty_matrix(), 0, 16.0), 1234.0);
    }

    #[test]
    fn missing_cost_everywhere_is_zero() {
        assert_eq!(extract_cost(None, &empty_matrix(), 0, 16.0), 0.0);
        assert_eq!(extract_cost(Some(&RawRow::new()), &empty_matrix(), 0, 16.0), 0.0);
    }

    #[test]
    fn aligned_row_is_consulted_after_raw() {
        let aligned = AlignedMatrix::new(vec!["TOTEXP23".into()], vec![vec![777.0]]);
        assert_eq!(extract_cost(None, &aligned, 0, 16.0), 777.0);

        // Raw takes priority over the aligned value
        let source = row(&[("TOTEXP23", RawValue::Number(10.0))]);
        assert_eq!(extract_cost(Some(&source), &aligned, 0, 16.0), 10.0);
    }

    #[test]
    fn label_valid_only_when_binary() {
        let zero = row(&[("LOW_RISK", RawValue::Number(0.0))]);
        let one = row(&[("LOW_RISK", RawValue::Number(1.0))]);
        let other = row(&[("LOW_RISK", RawValue::Number(2.0))]);
        let text = row(&[("LOW_RISK", RawValue::Text("1".into()))]);
        assert_eq!(extract_label(Some(&zero)), Some(0));
        assert_eq!(extract_label(Some(&one)), Some(1));
        assert_eq!(extract_label(Some(&other)), None);
        assert_eq!(extract_label(Some(&text)), Some(1));
        assert_eq!(extract_label(None), None);
        assert_eq!(extract_label(Some(&RawRow::new())), None);
    }

    #[test]
    fn age_bands_cover_boundaries() {
        assert_eq!(age_band(34.9), "<35");
        assert_eq!(age_band(35.0), "35-49");
        assert_eq!(age_band(49.9), "35-49");
        assert_eq!(age_band(50.0), "50-64");
        assert_eq!(age_band(64.9), "50-64");
        assert_eq!(age_band(65.0), "65+");
        assert_eq!(age_band(90.0), "65+");
    }

    #[test]
    fn group_value_buckets_age() {
        let source = row(&[("AGELAST", RawValue::Number(42.0))]);
        let group = extract_group_value("AGE", Some(&source), &empty_matrix(), 0);
        assert_eq!(group.as_deref(), Some("35-49"));
    }

    #[test]
    fn group_value_stringifies_codes() {
        let source = row(&[("SEX", RawValue::Number(2.0))]);
        let group = extract_group_value("SEX", Some(&source), &empty_matrix(), 0);
        assert_eq!(group.as_deref(), Some("2"));
    }

    #[test]
    fn group_value_falls_back_to_aligned() {
        let aligned = AlignedMatrix::new(vec!["SEX".into()], vec![vec![1.0]]);
        let group = extract_group_value("SEX", None, &aligned, 0);
        assert_eq!(group.as_deref(), Some("1"));
    }

    #[test]
    fn group_value_missing_is_none() {
        assert_eq!(extract_group_value("SEX", None, &empty_matrix(), 0), None);
        let blank = row(&[("SEX", RawValue::Text(String::new()))]);
        assert_eq!(extract_group_value("SEX", Some(&blank), &empty_matrix(), 0), None);
    }
}

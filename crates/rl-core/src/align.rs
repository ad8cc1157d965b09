//! Row alignment: conform raw rows to the model's required feature schema.
//!
//! Keeps only required features, coerces every cell to a number, replaces
//! invalid or missing values with 0, and reports the replacements so the
//! dashboard can surface data-quality caveats. Output row count always
//! equals input row count, and output columns are exactly the requested
//! feature list.

use rl_common::{AlignedMatrix, DataQuality, RawRow, ReplacementStat};

/// Result of aligning a raw file to a required feature list.
#[derive(Debug, Clone)]
pub struct AlignmentOutcome {
    pub matrix: AlignedMatrix,
    pub missing_required_features: Vec<String>,
    pub replacement_stats: Vec<ReplacementStat>,
    pub total_replaced_with_zero: usize,
}

impl AlignmentOutcome {
    /// Fold the alignment diagnostics into the run-level report.
    pub fn data_quality(&self, row_count: usize, required_feature_count: usize) -> DataQuality {
        DataQuality {
            row_count,
            required_feature_count,
            missing_required_columns: self.missing_required_features.clone(),
            replaced_value_count: self.total_replaced_with_zero,
            replacement_stats: self.replacement_stats.clone(),
        }
    }
}

/// Align raw rows to the exact required feature schema.
pub fn align_features(raw_rows: &[RawRow], required_features: &[String]) -> AlignmentOutcome {
    let missing_required_features: Vec<String> = match raw_rows.first() {
        Some(first) => required_features
            .iter()
            .filter(|feature| !first.contains_key(*feature))
            .cloned()
            .collect(),
        None => required_features.to_vec(),
    };

    let mut replaced_counts = vec![0usize; required_features.len()];
    let rows: Vec<Vec<f64>> = raw_rows
        .iter()
        .map(|row| {
            required_features
                .iter()
                .enumerate()
                .map(|(pos, feature)| {
                    match row.get(feature).and_then(|value| value.as_finite()) {
                        Some(numeric) => numeric,
                        None => {
                            replaced_counts[pos] += 1;
                            0.0
                        }
                    }
                })
                .collect()
        })
        .collect();

    let mut replacement_stats: Vec<ReplacementStat> = required_features
        .iter()
        .zip(replaced_counts.iter())
        .filter(|(_, &count)| count > 0)
        .map(|(feature, &count)| ReplacementStat {
            feature: feature.clone(),
            replaced_with_zero: count,
        })
        .collect();
    replacement_stats.sort_by(|a, b| b.replaced_with_zero.cmp(&a.replaced_with_zero));

    let total_replaced_with_zero = replacement_stats
        .iter()
        .map(|stat| stat.replaced_with_zero)
        .sum();

    AlignmentOutcome {
        matrix: AlignedMatrix::new(required_features.to_vec(), rows),
        missing_required_features,
        replacement_stats,
        total_replaced_with_zero,
    }
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

    fn features(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn output_row_count_matches_input() {
        let rows = vec![
            row(&[("A", RawValue::Number(1.0))]),
            row(&[("A", RawValue::Number(2.0))]),
            row(&[]),
        ];
        let outcome = align_features(&rows, &features(&["A", "B"]));
        assert_eq!(outcome.matrix.n_rows(), 3);
        assert_eq!(outcome.matrix.features(), features(&["A", "B"]).as_slice());
    }

    #[test]
    fn missing_and_invalid_values_coerce_to_zero() {
        let rows = vec![
            row(&[("A", RawValue::Number(1.5)), ("B", RawValue::Text("junk".into()))]),
            row(&[("A", RawValue::Null)]),
        ];
        let outcome = align_features(&rows, &features(&["A", "B"]));
        assert_eq!(outcome.matrix.row(0), Some([1.5, 0.0].as_slice()));
        assert_eq!(outcome.matrix.row(1), Some([0.0, 0.0].as_slice()));
        assert_eq!(outcome.total_replaced_with_zero, 3);
    }

    #[test]
    fn replacement_stats_sorted_by_count() {
        let rows = vec![
            row(&[("A", RawValue::Number(1.0))]),
            row(&[("A", RawValue::Number(2.0))]),
        ];
        let outcome = align_features(&rows, &features(&["A", "B"]));
        assert_eq!(outcome.replacement_stats.len(), 1);
        assert_eq!(outcome.replacement_stats[0].feature, "B");
        assert_eq!(outcome.replacement_stats[0].replaced_with_zero, 2);
    }

    #[test]
    fn missing_columns_detected_from_first_row() {
        let rows = vec![row(&[("A", RawValue::Number(1.0))])];
        let outcome = align_features(&rows, &features(&["A", "B", "C"]));
        assert_eq!(outcome.missing_required_features, features(&["B", "C"]));
    }

    #[test]
    fn empty_input_reports_all_columns_missing() {
        let outcome = align_features(&[], &features(&["A"]));
        assert!(outcome.matrix.is_empty());
        assert_eq!(outcome.missing_required_features, features(&["A"]));
        assert_eq!(outcome.total_replaced_with_zero, 0);
    }

    #[test]
    fn numeric_strings_parse() {
        let rows = vec![row(&[("A", RawValue::Text("4.25".into()))])];
        let outcome = align_features(&rows, &features(&["A"]));
        assert_eq!(outcome.matrix.row(0), Some([4.25].as_slice()));
        assert!(outcome.replacement_stats.is_empty());
    }

    #[test]
    fn data_quality_rollup() {
        let rows = vec![row(&[("A", RawValue::Null)])];
        let outcome = align_features(&rows, &features(&["A"]));
        let quality = outcome.data_quality(1, 1);
        assert_eq!(quality.row_count, 1);
        assert_eq!(quality.replaced_value_count, 1);
        assert_eq!(quality.replacement_stats.len(), 1);
    }
}

//! The immutable run bundle: one scored cohort plus its provenance.
//!
//! A [`Run`] is identity-keyed: `id` is the sole cache key for every
//! derived summary, so two runs must never share an id unless their
//! underlying data is identical. The three row sequences (`source_rows`,
//! `aligned`, `scored_rows`) are index-aligned; consumers treat a length
//! mismatch by degrading (cost 0, label unavailable), never by panicking.

use crate::config::DEFAULT_LOW_RISK_THRESHOLD;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw cell value as parsed from CSV/JSON: numeric, text, or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Null,
}

impl RawValue {
    /// Coerce to a finite number, treating empty strings and non-numeric
    /// text as missing. Numeric strings parse, matching CSV ingestion.
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) if n.is_finite() => Some(*n),
            RawValue::Number(_) => None,
            RawValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            RawValue::Null => None,
        }
    }

    /// Stringified form for use as a group key; `None` for null/empty.
    pub fn as_group_key(&self) -> Option<String> {
        match self {
            RawValue::Number(n) if n.is_finite() => {
                // Integral codes print without a trailing ".0"
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(format!("{n}"))
                }
            }
            RawValue::Number(_) => None,
            RawValue::Text(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

/// One raw per-member record: a sparse field-name to value map.
pub type RawRow = BTreeMap<String, RawValue>;

/// Risk tier assigned by the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Standard,
}

/// One scored member, index-aligned with the source and aligned rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRow {
    pub low_risk_probability: f64,
    pub risk_tier: RiskTier,
}

/// Descriptive model metadata. Read-only documentation; never used in
/// numeric computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCard {
    pub model_name: String,
    pub version: String,
    pub target: String,
    pub required_features: Vec<String>,
    #[serde(default)]
    pub deployment_notes: Vec<String>,
}

/// Per-feature count of raw values coerced to zero during alignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementStat {
    pub feature: String,
    pub replaced_with_zero: usize,
}

/// Data-quality report produced by the alignment service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub row_count: usize,
    pub required_feature_count: usize,
    pub missing_required_columns: Vec<String>,
    pub replaced_value_count: usize,
    pub replacement_stats: Vec<ReplacementStat>,
}

/// Schema-conformed numeric feature matrix.
///
/// Column order follows the model's required feature list, which is what
/// gives the segment-driver search its stable "first N columns" universe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedMatrix {
    features: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl AlignedMatrix {
    pub fn new(features: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        AlignedMatrix { features, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn row(&self, idx: usize) -> Option<&[f64]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    /// Column position of a feature, if present in the schema.
    pub fn feature_position(&self, feature: &str) -> Option<usize> {
        self.features.iter().position(|f| f == feature)
    }

    /// Value at (row, feature); `None` when either is absent.
    pub fn value(&self, row_idx: usize, feature: &str) -> Option<f64> {
        let pos = self.feature_position(feature)?;
        self.rows.get(row_idx)?.get(pos).copied()
    }

    /// Full column for a feature, substituting 0.0 for short rows.
    pub fn column(&self, feature: &str) -> Option<Vec<f64>> {
        let pos = self.feature_position(feature)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(pos).copied().unwrap_or(0.0))
                .collect(),
        )
    }
}

/// Derived per-row entity: risk, nonnegative cost, optional binary label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunPoint {
    pub index: usize,
    pub risk: f64,
    pub cost: f64,
    pub label: Option<u8>,
}

/// An immutable, identity-keyed scored cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: String,
    pub dataset_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub model_card: ModelCard,
    #[serde(default)]
    pub source_rows: Vec<RawRow>,
    #[serde(default)]
    pub aligned: AlignedMatrix,
    /// `results` is the legacy field name still emitted by older snapshots.
    #[serde(alias = "results")]
    pub scored_rows: Vec<ScoredRow>,
    #[serde(default)]
    pub data_quality: DataQuality,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_LOW_RISK_THRESHOLD
}

/// Generate a fresh run id.
pub fn new_run_id() -> String {
    format!("run-{}", uuid::Uuid::new_v4())
}

impl Run {
    /// Assemble a run with the default threshold and a current timestamp.
    pub fn new(
        id: impl Into<String>,
        dataset_name: impl Into<String>,
        model_card: ModelCard,
        source_rows: Vec<RawRow>,
        aligned: AlignedMatrix,
        scored_rows: Vec<ScoredRow>,
        data_quality: DataQuality,
    ) -> Self {
        Run {
            id: id.into(),
            dataset_name: dataset_name.into(),
            source_filename: None,
            timestamp: Utc::now(),
            model_card,
            source_rows,
            aligned,
            scored_rows,
            data_quality,
            threshold: DEFAULT_LOW_RISK_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn n_members(&self) -> usize {
        self.scored_rows.len()
    }

    /// Per-member risk vector; non-finite probabilities become 0.0.
    pub fn risks(&self) -> Vec<f64> {
        self.scored_rows
            .iter()
            .map(|row| {
                if row.low_risk_probability.is_finite() {
                    row.low_risk_probability
                } else {
                    0.0
                }
            })
            .collect()
    }

    pub fn source_row(&self, idx: usize) -> Option<&RawRow> {
        self.source_rows.get(idx)
    }

    /// Ingest-time diagnostic: verify the three row sequences line up.
    ///
    /// Analytics degrade gracefully without this check; callers at the
    /// ingest boundary may still want to surface the mismatch loudly.
    pub fn validate_shape(&self) -> Result<()> {
        let n = self.scored_rows.len();
        if !self.source_rows.is_empty() && self.source_rows.len() != n {
            return Err(Error::ShapeMismatch(format!(
                "{} source rows vs {} scored rows",
                self.source_rows.len(),
                n
            )));
        }
        if !self.aligned.is_empty() && self.aligned.n_rows() != n {
            return Err(Error::ShapeMismatch(format!(
                "{} aligned rows vs {} scored rows",
                self.aligned.n_rows(),
                n
            )));
        }
        Ok(())
    }

    /// Deserialize a run from dashboard JSON.
    pub fn from_json_str(json: &str) -> Result<Run> {
        Ok(serde_json::from_str(json)?)
    }
}

//! Model-quality scoring: AUC via rank-sum, Brier score, confusion counts.

use serde::{Deserialize, Serialize};

/// AUC via the Mann-Whitney U statistic with tie-averaged ranks.
///
/// Rows whose label is not exactly 0 or 1 are dropped before ranking.
/// Returns `None` when the filtered cohort has zero positives or zero
/// negatives, since AUC is undefined for a single-class cohort.
pub fn compute_auc(scores: &[f64], labels: &[f64]) -> Option<f64> {
    if scores.is_empty() || scores.len() != labels.len() {
        return None;
    }

    let mut entries: Vec<(f64, u8)> = scores
        .iter()
        .zip(labels.iter())
        .filter_map(|(&score, &label)| {
            if label == 0.0 {
                Some((score, 0))
            } else if label == 1.0 {
                Some((score, 1))
            } else {
                None
            }
        })
        .collect();
    entries.sort_by(|a, b| a.0.total_cmp(&b.0));

    let positives = entries.iter().filter(|(_, label)| *label == 1).count();
    let negatives = entries.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut rank = 1usize;
    let mut positive_rank_sum = 0.0;
    let mut i = 0;
    while i < entries.len() {
        let mut j = i + 1;
        while j < entries.len() && entries[j].0 == entries[i].0 {
            j += 1;
        }
        let average_rank = (rank + rank + (j - i) - 1) as f64 / 2.0;
        for entry in &entries[i..j] {
            if entry.1 == 1 {
                positive_rank_sum += average_rank;
            }
        }
        rank += j - i;
        i = j;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Brier score: mean squared error between predicted probability and the
/// binary label. Returns 0.0 for empty input.
pub fn brier_score(probabilities: &[f64], labels: &[f64]) -> f64 {
    if probabilities.is_empty() || probabilities.len() != labels.len() {
        return 0.0;
    }
    probabilities
        .iter()
        .zip(labels.iter())
        .map(|(&p, &y)| (p - y) * (p - y))
        .sum::<f64>()
        / probabilities.len() as f64
}

/// 2x2 confusion-matrix counts at a fixed operating threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

impl ConfusionCounts {
    /// Count predictions (`probability >= threshold` means positive)
    /// against binary labels. Non-binary labels are skipped.
    pub fn at_threshold(probabilities: &[f64], labels: &[f64], threshold: f64) -> Self {
        let mut counts = ConfusionCounts::default();
        for (&p, &y) in probabilities.iter().zip(labels.iter()) {
            let predicted_positive = p >= threshold;
            match (predicted_positive, y == 1.0, y == 0.0) {
                (true, true, _) => counts.true_positives += 1,
                (true, _, true) => counts.false_positives += 1,
                (false, true, _) => counts.false_negatives += 1,
                (false, _, true) => counts.true_negatives += 1,
                _ => {}
            }
        }
        counts
    }

    /// tp / (tp + fp); 0.0 when nothing was predicted positive.
    pub fn precision(&self) -> f64 {
        let denom = self.true_positives + self.false_positives;
        if denom == 0 {
            return 0.0;
        }
        self.true_positives as f64 / denom as f64
    }

    /// tp / (tp + fn); 0.0 when there are no actual positives.
    pub fn recall(&self) -> f64 {
        let denom = self.true_positives + self.false_negatives;
        if denom == 0 {
            return 0.0;
        }
        self.true_positives as f64 / denom as f64
    }
}

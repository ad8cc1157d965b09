//! Bootstrap uncertainty and threshold sensitivity.
//!
//! The bootstrap is deliberately deterministic: resampling runs on the
//! seeded LCG, so the same (run, iterations, seed) triple reproduces the
//! interval bit for bit across sessions and platforms.

use rl_common::{AnalyticsConfig, Run};
use rl_math::{mean, quantile, SeededRng};
use serde::{Deserialize, Serialize};

/// Candidate thresholds swept by default.
pub const DEFAULT_SENSITIVITY_THRESHOLDS: [f64; 7] = [0.65, 0.67, 0.69, 0.70, 0.71, 0.73, 0.75];

/// Percentile bootstrap interval for the low-risk rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BootstrapRateCi {
    pub iterations: usize,
    pub lower: f64,
    pub upper: f64,
    pub mean: f64,
    pub width: f64,
}

/// Low-risk rate at one candidate threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSensitivityPoint {
    pub threshold: f64,
    pub low_risk_rate: f64,
}

/// 95% percentile bootstrap CI for the low-risk rate.
///
/// Each round draws n members with replacement and records the resampled
/// rate; the interval is the 2.5th/97.5th percentile of those rates. An
/// empty cohort returns the all-zero interval without touching the RNG.
pub fn bootstrap_low_risk_rate_ci(run: &Run, config: &AnalyticsConfig) -> BootstrapRateCi {
    let iterations = config.bootstrap_iterations;
    let risks = run.risks();
    let n = risks.len();
    if n == 0 {
        return BootstrapRateCi {
            iterations,
            ..BootstrapRateCi::default()
        };
    }

    let mut rng = SeededRng::new(config.bootstrap_seed);
    let mut sample_rates = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let mut positives = 0usize;
        for _ in 0..n {
            if risks[rng.next_index(n)] >= run.threshold {
                positives += 1;
            }
        }
        sample_rates.push(positives as f64 / n as f64);
    }

    sample_rates.sort_by(f64::total_cmp);
    let lower = quantile(&sample_rates, 0.025);
    let upper = quantile(&sample_rates, 0.975);

    BootstrapRateCi {
        iterations,
        lower,
        upper,
        mean: mean(&sample_rates),
        width: upper - lower,
    }
}

/// Low-risk rate at each candidate threshold.
pub fn threshold_sensitivity(run: &Run, thresholds: &[f64]) -> Vec<ThresholdSensitivityPoint> {
    let risks = run.risks();
    thresholds
        .iter()
        .map(|&threshold| ThresholdSensitivityPoint {
            threshold,
            low_risk_rate: risks.iter().filter(|&&r| r >= threshold).count() as f64
                / risks.len().max(1) as f64,
        })
        .collect()
}

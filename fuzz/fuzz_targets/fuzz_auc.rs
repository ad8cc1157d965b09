//! Fuzz target for the rank-sum AUC computation.
//!
//! Arbitrary scores and labels must never panic, and any defined AUC
//! over finite scores must land in [0, 1].

#![no_main]

use libfuzzer_sys::fuzz_target;
use rl_math::compute_auc;

fuzz_target!(|input: (Vec<f64>, Vec<f64>)| {
    let (scores, labels) = input;
    if let Some(auc) = compute_auc(&scores, &labels) {
        if scores.iter().all(|s| s.is_finite()) {
            assert!((0.0..=1.0).contains(&auc), "auc out of range: {auc}");
        }
    }
});

//! Fuzz target for the quantile primitive.
//!
//! Arbitrary (possibly non-finite) values and an arbitrary q must never
//! panic, and finite sorted inputs must produce in-range results.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rl_math::{quantile, summarize_quantiles};

fuzz_target!(|input: (Vec<f64>, f64)| {
    let (values, q) = input;

    let _ = summarize_quantiles(&values);

    let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    let result = quantile(&sorted, q);
    if let (Some(first), Some(last)) = (sorted.first(), sorted.last()) {
        assert!(result >= *first && result <= *last);
    }
});

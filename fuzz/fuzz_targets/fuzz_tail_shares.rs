//! Fuzz target for the cost-tail concentration analysis.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rl_core::compute_tail_shares;

fuzz_target!(|costs: Vec<f64>| {
    let finite: Vec<f64> = costs
        .into_iter()
        .filter(|c| c.is_finite() && *c >= 0.0)
        .collect();
    let shares = compute_tail_shares(&finite);
    assert!(shares.members_for_top1_cost_share <= finite.len());
    assert!(shares.members_for_top10_cost_share <= finite.len());
});

//! Fuzz target for run-snapshot JSON ingestion plus summary computation.
//!
//! Any byte sequence must either fail to parse cleanly or produce a
//! summary without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rl_common::{AnalyticsConfig, Run};
use rl_core::compute_run_summary;

fuzz_target!(|data: &str| {
    if let Ok(run) = Run::from_json_str(data) {
        let _ = compute_run_summary(&run, &AnalyticsConfig::default());
    }
});

//! Statistical primitives shared by the cohort analytics engine.
//!
//! Every function in this module follows the engine-wide degradation
//! contract: structurally absent input (empty slices, mismatched lengths)
//! produces a zero default, and statistically undefined results (zero
//! variance, degenerate labels) produce `None`. Nothing here panics on
//! malformed input.

pub mod describe;
pub mod rank;
pub mod rng;
pub mod score;

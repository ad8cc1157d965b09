//! RiskLens math utilities.

pub mod stats;

pub use stats::describe::*;
pub use stats::rank::*;
pub use stats::score::*;
pub use stats::rng::SeededRng;

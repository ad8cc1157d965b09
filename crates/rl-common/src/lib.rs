//! RiskLens shared types.
//!
//! This crate provides:
//! - The immutable [`run::Run`] bundle that every analytics function consumes
//! - The unified [`error::Error`] type with stable codes and categories
//! - The [`config::AnalyticsConfig`] carrying every tunable analytic constant

pub mod config;
pub mod error;
pub mod run;

pub use config::AnalyticsConfig;
pub use error::{Error, Result};
pub use run::{
    AlignedMatrix, DataQuality, ModelCard, RawRow, RawValue, ReplacementStat, RiskTier, Run,
    RunPoint, ScoredRow,
};

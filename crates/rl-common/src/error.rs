//! Error types for RiskLens.
//!
//! The analytic functions themselves never fail: missing or malformed
//! cohort data degrades to zero/empty/`None` outputs so a partially loaded
//! run can never blank a dashboard page. Errors exist only at the edges:
//! configuration validation, run-shape diagnostics at ingest, and JSON
//! serialization boundaries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for RiskLens operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Analytics configuration errors.
    Config,
    /// Run ingest and shape errors.
    Ingest,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Ingest => write!(f, "ingest"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for RiskLens.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    // Ingest errors (20-29)
    #[error("run shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("unknown segment: {0}")]
    UnknownSegment(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code for this error type.
    ///
    /// Codes are grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Ingest errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidValue { .. } => 11,
            Error::ShapeMismatch(_) => 20,
            Error::UnknownSegment(_) => 21,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidValue { .. } => ErrorCategory::Config,
            Error::ShapeMismatch(_) | Error::UnknownSegment(_) => ErrorCategory::Ingest,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }
}

//! Error types for runner-energy

use thiserror::Error;

/// Errors that can occur while loading or normalizing energy logs.
///
/// Metrics that cannot be derived are never reported through this type; they
/// surface as `None` on [`crate::metrics::EnergyMetrics`].
#[derive(Debug, Error)]
pub enum EnergyError {
    #[error("No data file found: {0}")]
    NotFound(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Unknown source type: {0}")]
    UnknownSource(String),

    #[error("Invalid experiment configuration: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl EnergyError {
    /// True for failures caused by a missing data file rather than bad content.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EnergyError::NotFound(_))
    }

    /// Short machine-readable code, used in skipped-entry diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            EnergyError::NotFound(_) => "not_found",
            EnergyError::Schema(_) => "schema",
            EnergyError::UnknownSource(_) => "unknown_source",
            EnergyError::Config(_) => "config",
            EnergyError::Csv(_) => "csv",
            EnergyError::Io(_) => "io",
            EnergyError::Json(_) => "json",
        }
    }
}

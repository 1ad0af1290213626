use thiserror::Error;

use crate::model::GenerationReport;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    #[error("schema error: {0}")]
    Schema(#[from] qedash_core::Error),
    #[error("missing parent table '{0}'")]
    MissingParent(String),
    #[error("no generator registered for table '{0}'")]
    UnknownTable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("generation failed: {} integrity issue(s)", .0.violations.len())]
    Failed(Box<GenerationReport>),
}

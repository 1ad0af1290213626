use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted while rendering the dashboard.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("kpi input error: {0}")]
    Kpi(#[from] qedash_metrics::MetricsError),
    #[error("invalid output path: {0}")]
    InvalidOutput(PathBuf),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

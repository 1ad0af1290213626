use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted by the metric exporter.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("store error: {0}")]
    Store(#[from] qedash_store::StoreError),
    #[error("invalid option: {0}")]
    InvalidOption(String),
    #[error("kpi file not found: {0}")]
    MissingFile(PathBuf),
    #[error("{file}: {message}")]
    InvalidKpi { file: String, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

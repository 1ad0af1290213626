use std::path::PathBuf;

use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("schema error: {0}")]
    Schema(#[from] qedash_core::Error),
    #[error("database not found at {0}")]
    Missing(PathBuf),
    #[error("table '{0}' missing from dataset")]
    MissingTable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

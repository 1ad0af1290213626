use thiserror::Error;

/// Core error type shared across qedash crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The dataset catalogue violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// The foreign-key graph cannot be ordered.
    #[error("cyclic foreign keys: {0}")]
    Cycle(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by qedash crates.
pub type Result<T> = std::result::Result<T, Error>;

use serde::{Deserialize, Serialize};

/// Options that control how the store is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Rows per multi-row INSERT statement.
    pub batch_size: usize,
    /// Declare foreign keys in the DDL and enforce them while loading.
    pub enforce_foreign_keys: bool,
    pub create_indexes: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            batch_size: 500,
            enforce_foreign_keys: true,
            create_indexes: true,
        }
    }
}

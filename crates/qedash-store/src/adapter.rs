use async_trait::async_trait;

use qedash_core::DatasetSchema;
use qedash_generate::Dataset;

use crate::errors::Result;
use crate::sqlite::LoadSummary;
use crate::sqlite::queries::TableCount;

/// Trait implemented by relational backends that can hold the dataset.
#[async_trait]
pub trait Store {
    /// Returns the engine identifier (e.g. `sqlite`).
    fn engine(&self) -> &'static str;

    /// Create one table per catalogue entry.
    async fn create_tables(&self, schema: &DatasetSchema) -> Result<()>;

    /// Insert every generated row, parents first.
    async fn load_dataset(&self, schema: &DatasetSchema, dataset: &Dataset)
    -> Result<LoadSummary>;

    /// Create the catalogue's secondary indexes.
    async fn create_indexes(&self, schema: &DatasetSchema) -> Result<()>;

    /// Row count per catalogue table.
    async fn table_counts(&self, schema: &DatasetSchema) -> Result<Vec<TableCount>>;
}

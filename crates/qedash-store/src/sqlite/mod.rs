use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use qedash_core::{DatasetSchema, load_order, validate_schema};
use qedash_generate::{Dataset, GeneratedValue};

use crate::adapter::Store;
use crate::errors::{Result, StoreError};
use crate::options::StoreOptions;

pub mod ddl;
pub mod queries;

use queries::TableCount;

/// Rows inserted by a load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    pub tables: Vec<TableCount>,
    pub rows_total: u64,
    pub duration_ms: u64,
}

/// SQLite database file holding one generated dataset.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    path: PathBuf,
    options: StoreOptions,
}

impl SqliteStore {
    /// Delete any existing database at `path` and open a fresh one.
    pub async fn rebuild(path: &Path, options: StoreOptions) -> Result<Self> {
        for stale in [path.to_path_buf(), sidecar(path, "-wal"), sidecar(path, "-shm")] {
            if stale.exists() {
                std::fs::remove_file(&stale)?;
            }
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let pool = connect(path, "rwc").await?;
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
        if options.enforce_foreign_keys {
            sqlx::query("PRAGMA foreign_keys = ON")
                .execute(&pool)
                .await?;
        }

        info!(path = %path.display(), "initialized new database");
        Ok(Self {
            pool,
            path: path.to_path_buf(),
            options,
        })
    }

    /// Open an existing database without creating it.
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StoreError::Missing(path.to_path_buf()));
        }
        let pool = connect(path, "rw").await?;
        debug!(path = %path.display(), "opened existing database");
        Ok(Self {
            pool,
            path: path.to_path_buf(),
            options: StoreOptions::default(),
        })
    }

    /// Rebuild the database and load a dataset into it.
    pub async fn build(
        path: &Path,
        schema: &DatasetSchema,
        dataset: &Dataset,
        options: StoreOptions,
    ) -> Result<(Self, LoadSummary)> {
        validate_schema(schema)?;
        let store = Self::rebuild(path, options).await?;
        store.create_tables(schema).await?;
        let summary = store.load_dataset(schema, dataset).await?;
        if store.options.create_indexes {
            store.create_indexes(schema).await?;
        }
        Ok((store, summary))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn engine(&self) -> &'static str {
        "sqlite"
    }

    async fn create_tables(&self, schema: &DatasetSchema) -> Result<()> {
        for table_name in load_order(schema)? {
            let Some(table) = schema.table(&table_name) else {
                continue;
            };
            let sql = ddl::create_table_sql(table, self.options.enforce_foreign_keys);
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        info!(tables = schema.tables.len(), "created tables");
        Ok(())
    }

    async fn load_dataset(
        &self,
        schema: &DatasetSchema,
        dataset: &Dataset,
    ) -> Result<LoadSummary> {
        let start = Instant::now();
        let batch_size = self.options.batch_size.max(1);
        let mut summary = LoadSummary::default();
        let mut tx = self.pool.begin().await?;

        for table_name in load_order(schema)? {
            let data = dataset
                .table(&table_name)
                .ok_or_else(|| StoreError::MissingTable(table_name.clone()))?;
            let prefix = ddl::insert_prefix(&data.name, &data.columns);

            for chunk in data.rows.chunks(batch_size) {
                let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(prefix.as_str());
                builder.push_values(chunk, |mut values, row| {
                    for value in row {
                        match value {
                            GeneratedValue::Null => values.push_bind(None::<i64>),
                            GeneratedValue::Int(value) => values.push_bind(*value),
                            GeneratedValue::Float(value) => values.push_bind(*value),
                            GeneratedValue::Text(value) => values.push_bind(value.clone()),
                            GeneratedValue::Date(_) => values.push_bind(value.to_csv()),
                        };
                    }
                });
                builder.build().execute(&mut *tx).await?;
            }

            debug!(table = %data.name, rows = data.len(), "table loaded");
            summary.rows_total += data.len() as u64;
            summary.tables.push(TableCount {
                table: data.name.clone(),
                rows: data.len() as i64,
            });
        }

        tx.commit().await?;
        summary.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            rows_total = summary.rows_total,
            duration_ms = summary.duration_ms,
            "dataset loaded"
        );
        Ok(summary)
    }

    async fn create_indexes(&self, schema: &DatasetSchema) -> Result<()> {
        let mut created = 0_usize;
        for table in &schema.tables {
            for index in &table.indexes {
                let sql = ddl::create_index_sql(table, index);
                sqlx::query(&sql).execute(&self.pool).await?;
                created += 1;
            }
        }
        info!(indexes = created, "created indexes");
        Ok(())
    }

    async fn table_counts(&self, schema: &DatasetSchema) -> Result<Vec<TableCount>> {
        queries::table_counts(&self.pool, schema).await
    }
}

async fn connect(path: &Path, mode: &str) -> Result<SqlitePool> {
    let db_url = format!("sqlite://{}?mode={mode}", path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;
    Ok(pool)
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

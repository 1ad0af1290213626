use std::collections::{BTreeMap, HashMap};

use rand::{Rng, RngCore};

use qedash_core::TableDef;

use crate::dataset::{Dataset, GeneratedValue, TableData};
use crate::errors::GenerationError;

/// Materialized parent tables that child generators draw keys from.
///
/// Child foreign keys are only ever sampled from the primary-key column of a
/// table that has already been ingested.
#[derive(Debug, Default)]
pub struct ParentKeys {
    tables: Vec<TableData>,
    keys: BTreeMap<String, Vec<i64>>,
    rows_by_pk: BTreeMap<String, HashMap<i64, usize>>,
}

impl ParentKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generated table; its primary-key column becomes sampleable.
    pub fn ingest_table(
        &mut self,
        table: &TableDef,
        data: TableData,
    ) -> Result<(), GenerationError> {
        if let Some(pk) = table.primary_key.as_deref() {
            let idx = data.column_index(pk).ok_or_else(|| {
                GenerationError::InvalidPlan(format!(
                    "primary key '{}.{}' missing from generated rows",
                    table.name, pk
                ))
            })?;

            let mut keys = Vec::with_capacity(data.len());
            let mut positions = HashMap::with_capacity(data.len());
            for (position, row) in data.rows.iter().enumerate() {
                let key = row.get(idx).and_then(GeneratedValue::as_i64).ok_or_else(|| {
                    GenerationError::InvalidPlan(format!(
                        "primary key '{}.{}' must be an integer",
                        table.name, pk
                    ))
                })?;
                keys.push(key);
                positions.insert(key, position);
            }

            self.keys.insert(table.name.clone(), keys);
            self.rows_by_pk.insert(table.name.clone(), positions);
        }

        self.tables.retain(|existing| existing.name != data.name);
        self.tables.push(data);
        Ok(())
    }

    /// Rows of a materialized table.
    pub fn table(&self, name: &str) -> Result<&TableData, GenerationError> {
        self.tables
            .iter()
            .find(|table| table.name == name)
            .ok_or_else(|| GenerationError::MissingParent(name.to_string()))
    }

    /// Primary-key values of a materialized table, in generation order.
    pub fn keys(&self, table: &str) -> Result<&[i64], GenerationError> {
        self.keys
            .get(table)
            .map(Vec::as_slice)
            .ok_or_else(|| GenerationError::MissingParent(table.to_string()))
    }

    /// Uniformly sample one parent key.
    pub fn sample(&self, table: &str, rng: &mut dyn RngCore) -> Result<i64, GenerationError> {
        let keys = self.keys(table)?;
        if keys.is_empty() {
            return Err(GenerationError::InvalidPlan(format!(
                "cannot sample from empty parent table '{table}'"
            )));
        }
        Ok(keys[rng.random_range(0..keys.len())])
    }

    /// Look up a column of the parent row with the given key.
    pub fn lookup_parent(&self, table: &str, pk: i64, column: &str) -> Option<&GeneratedValue> {
        let position = *self.rows_by_pk.get(table)?.get(&pk)?;
        let data = self.table(table).ok()?;
        let idx = data.column_index(column)?;
        data.rows.get(position)?.get(idx)
    }

    /// Primary keys of `table` grouped by the text of `columns`.
    pub fn group_keys(
        &self,
        table: &str,
        columns: &[&str],
    ) -> Result<BTreeMap<Vec<String>, Vec<i64>>, GenerationError> {
        let data = self.table(table)?;
        let keys = self.keys(table)?;
        let indexes = columns
            .iter()
            .map(|column| {
                data.column_index(column).ok_or_else(|| {
                    GenerationError::InvalidPlan(format!("unknown column '{table}.{column}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut groups: BTreeMap<Vec<String>, Vec<i64>> = BTreeMap::new();
        for (row, key) in data.rows.iter().zip(keys) {
            let group = indexes
                .iter()
                .map(|idx| row.get(*idx).map(GeneratedValue::to_csv).unwrap_or_default())
                .collect();
            groups.entry(group).or_default().push(*key);
        }
        Ok(groups)
    }

    /// Consume the context, returning tables in ingestion order.
    pub fn into_dataset(self, seed: u64) -> Dataset {
        Dataset {
            seed,
            tables: self.tables,
        }
    }
}

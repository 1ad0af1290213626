use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::schema::DatasetSchema;

/// Validate internal consistency of the dataset catalogue.
///
/// This checks:
/// - duplicate tables/columns
/// - primary key columns exist
/// - foreign keys point at an existing table's primary key column
/// - index columns exist
pub fn validate_schema(schema: &DatasetSchema) -> Result<()> {
    let mut catalog: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for table in &schema.tables {
        if catalog.contains_key(table.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}",
                table.name
            )));
        }

        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {}.{}",
                    table.name, column.name
                )));
            }
        }

        catalog.insert(table.name.as_str(), columns);
    }

    for table in &schema.tables {
        let columns = catalog.get(table.name.as_str()).ok_or_else(|| {
            Error::InvalidSchema(format!("missing table in catalog: {}", table.name))
        })?;

        if let Some(pk) = &table.primary_key {
            if !columns.contains(pk.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "primary key column not found: {}.{}",
                    table.name, pk
                )));
            }
        }

        for fk in &table.foreign_keys {
            if !columns.contains(fk.column.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "foreign key column not found: {}.{}",
                    table.name, fk.column
                )));
            }

            let parent = schema.table(&fk.referenced_table).ok_or_else(|| {
                Error::InvalidSchema(format!(
                    "referenced table not found: {}",
                    fk.referenced_table
                ))
            })?;

            if parent.primary_key.as_deref() != Some(fk.referenced_column.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "foreign key {}.{} must reference the primary key of {}",
                    table.name, fk.column, fk.referenced_table
                )));
            }
        }

        for index in &table.indexes {
            for column in &index.columns {
                if !columns.contains(column.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "index column not found: {}.{} ({})",
                        table.name, column, index.name
                    )));
                }
            }
        }
    }

    Ok(())
}

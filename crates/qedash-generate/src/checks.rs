use std::collections::{BTreeMap, HashSet};

use qedash_core::{DatasetSchema, tables};

use crate::dataset::{Dataset, GeneratedValue, TableData};
use crate::model::GenerationIssue;

/// Date columns that must not precede their paired start column.
const DATE_ORDER: &[(&str, &str, &str)] = &[
    (tables::ASSESSMENTS, "due_date", "returned_date"),
    (tables::COMPLAINTS, "submitted_date", "resolved_date"),
    (tables::PLACEMENTS, "start_date", "end_date"),
];

/// Issues reported per check before the rest are summarised.
const MAX_ISSUES_PER_CHECK: usize = 20;

/// Post-generation integrity pass over a dataset.
///
/// Checks primary-key uniqueness, non-null columns, referential integrity of
/// every foreign key and the ordering of paired date columns.
pub fn verify_dataset(schema: &DatasetSchema, dataset: &Dataset) -> Vec<GenerationIssue> {
    let mut issues = Vec::new();
    let mut pk_sets: BTreeMap<&str, HashSet<String>> = BTreeMap::new();

    for table in &schema.tables {
        let Some(data) = dataset.table(&table.name) else {
            issues.push(GenerationIssue::violation(
                "missing_table",
                &table.name,
                "",
                "table was not generated",
            ));
            continue;
        };

        for column in table.columns.iter().filter(|column| !column.nullable) {
            let nulls = count_where(data, &column.name, GeneratedValue::is_null);
            if nulls > 0 {
                issues.push(GenerationIssue::violation(
                    "null_in_required_column",
                    &table.name,
                    &column.name,
                    format!("{nulls} null values"),
                ));
            }
        }

        if let Some(pk) = table.primary_key.as_deref() {
            let mut seen = HashSet::with_capacity(data.len());
            let mut duplicates = 0_usize;
            if let Some(values) = data.column_values(pk) {
                for value in values {
                    if !seen.insert(value.to_csv()) {
                        duplicates += 1;
                    }
                }
            }
            if duplicates > 0 {
                issues.push(GenerationIssue::violation(
                    "duplicate_primary_key",
                    &table.name,
                    pk,
                    format!("{duplicates} duplicate keys"),
                ));
            }
            pk_sets.insert(table.name.as_str(), seen);
        }
    }

    for table in &schema.tables {
        let Some(data) = dataset.table(&table.name) else {
            continue;
        };
        for fk in &table.foreign_keys {
            let Some(parent_keys) = pk_sets.get(fk.referenced_table.as_str()) else {
                continue;
            };
            let Some(values) = data.column_values(&fk.column) else {
                continue;
            };
            let mut orphans = values
                .filter(|value| !value.is_null() && !parent_keys.contains(&value.to_csv()))
                .map(GeneratedValue::to_csv);
            let examples: Vec<String> = orphans.by_ref().take(MAX_ISSUES_PER_CHECK).collect();
            let total = examples.len() + orphans.count();
            if total > 0 {
                issues.push(GenerationIssue::violation(
                    "orphan_foreign_key",
                    &table.name,
                    &fk.column,
                    format!(
                        "{total} values missing from {}.{} (e.g. {})",
                        fk.referenced_table,
                        fk.referenced_column,
                        examples.join(", ")
                    ),
                ));
            }
        }
    }

    for (table, start, end) in DATE_ORDER {
        let Some(data) = dataset.table(table) else {
            continue;
        };
        let (Some(start_idx), Some(end_idx)) = (data.column_index(start), data.column_index(end))
        else {
            continue;
        };
        let reversed = data
            .rows
            .iter()
            .filter(|row| {
                match (
                    row.get(start_idx).and_then(GeneratedValue::as_date),
                    row.get(end_idx).and_then(GeneratedValue::as_date),
                ) {
                    (Some(start), Some(end)) => end < start,
                    _ => false,
                }
            })
            .count();
        if reversed > 0 {
            issues.push(GenerationIssue::violation(
                "date_order",
                table,
                end,
                format!("{reversed} rows where {end} precedes {start}"),
            ));
        }
    }

    issues
}

fn count_where(data: &TableData, column: &str, predicate: fn(&GeneratedValue) -> bool) -> usize {
    data.column_values(column)
        .map(|values| values.filter(|value| predicate(value)).count())
        .unwrap_or(0)
}

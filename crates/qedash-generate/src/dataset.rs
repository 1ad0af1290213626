use chrono::NaiveDate;
use serde::Serialize;

use qedash_core::TableDef;

/// Generated value for a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeneratedValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl GeneratedValue {
    pub fn text(value: &str) -> Self {
        GeneratedValue::Text(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, GeneratedValue::Null)
    }

    pub fn to_csv(&self) -> String {
        match self {
            GeneratedValue::Null => String::new(),
            GeneratedValue::Int(value) => value.to_string(),
            GeneratedValue::Float(value) => value.to_string(),
            GeneratedValue::Text(value) => value.clone(),
            GeneratedValue::Date(value) => value.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GeneratedValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GeneratedValue::Int(value) => Some(*value as f64),
            GeneratedValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GeneratedValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            GeneratedValue::Date(value) => Some(*value),
            _ => None,
        }
    }
}

/// One generated row, values in column ordinal order.
pub type Row = Vec<GeneratedValue>;

/// Rows of one materialized table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl TableData {
    pub fn new(table: &TableDef, rows: Vec<Row>) -> Self {
        Self {
            name: table.name.clone(),
            columns: table.column_names(),
            rows,
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order.
    pub fn column_values<'a>(
        &'a self,
        column: &str,
    ) -> Option<impl Iterator<Item = &'a GeneratedValue> + 'a> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().filter_map(move |row| row.get(idx)))
    }
}

/// Every generated table, in parent-first load order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    pub seed: u64,
    pub tables: Vec<TableData>,
}

impl Dataset {
    pub fn table(&self, name: &str) -> Option<&TableData> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn row_count(&self, name: &str) -> usize {
        self.table(name).map(TableData::len).unwrap_or(0)
    }
}

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Directory where run artifacts are written.
    pub out_dir: PathBuf,
    /// Write into `out_dir` directly instead of a timestamped run directory.
    pub flat: bool,
    /// Fail the run when the integrity pass finds violations.
    pub strict: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("data/generated"),
            flat: false,
            strict: true,
        }
    }
}

/// Summary of a generated table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    /// Requested rows, for tables with a fixed volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_requested: Option<u64>,
    pub rows_generated: u64,
    #[serde(default)]
    pub bytes_written: u64,
    pub duration_ms: u64,
}

/// Structured generation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl GenerationIssue {
    pub fn warning(code: &str, table: &str, message: impl Into<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.to_string(),
            message: message.into(),
            table: Some(table.to_string()),
            column: None,
        }
    }

    pub fn violation(code: &str, table: &str, column: &str, message: impl Into<String>) -> Self {
        Self {
            level: "error".to_string(),
            code: code.to_string(),
            message: message.into(),
            table: Some(table.to_string()),
            column: Some(column.to_string()),
        }
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub tables: Vec<TableReport>,
    pub rows_total: u64,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<GenerationIssue>,
    pub violations: Vec<GenerationIssue>,
    /// SHA-256 over every table's CSV bytes, in load order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub bytes_written: u64,
    #[serde(default)]
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64) -> Self {
        Self {
            run_id,
            seed,
            tables: Vec::new(),
            rows_total: 0,
            warnings_by_code: BTreeMap::new(),
            warnings: Vec::new(),
            violations: Vec::new(),
            fingerprint: None,
            bytes_written: 0,
            duration_ms: 0,
        }
    }

    pub fn record_table(&mut self, table: TableReport) {
        self.rows_total += table.rows_generated;
        self.bytes_written += table.bytes_written;
        self.tables.push(table);
    }

    pub fn record_warning(&mut self, issue: GenerationIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }

    pub fn record_violation(&mut self, issue: GenerationIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.violations.push(issue);
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|table| table.table == name)
    }
}

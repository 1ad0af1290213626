use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;
use crate::constraints::{ForeignKeyDef, IndexDef};

/// Table names of the Quality Enhancement dataset.
pub mod tables {
    pub const STUDENTS: &str = "students";
    pub const ADMISSIONS: &str = "admissions";
    pub const MODULES: &str = "modules";
    pub const ENROLMENTS: &str = "enrolments";
    pub const ASSESSMENTS: &str = "assessments";
    pub const GRADES: &str = "grades";
    pub const SURVEYS: &str = "surveys";
    pub const SUPPORT_USAGE: &str = "support_usage";
    pub const COMPLAINTS: &str = "complaints";
    pub const PLACEMENTS: &str = "placements";
}

/// Snapshot of every table in the dataset.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DatasetSchema {
    /// Contract version for this catalogue.
    pub schema_version: String,
    /// Tables in declaration order.
    pub tables: Vec<TableDef>,
}

impl DatasetSchema {
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|table| table.name == name)
    }
}

/// A generated table with its keys and indexes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Single-column primary key, when the table has one.
    pub primary_key: Option<String>,
    pub foreign_keys: Vec<ForeignKeyDef>,
    pub indexes: Vec<IndexDef>,
}

impl TableDef {
    fn new(name: &str, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            primary_key: None,
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    fn with_primary_key(mut self, column: &str) -> Self {
        self.primary_key = Some(column.to_string());
        self
    }

    fn with_foreign_key(mut self, column: &str, table: &str, referenced: &str) -> Self {
        self.foreign_keys
            .push(ForeignKeyDef::new(column, table, referenced));
        self
    }

    fn with_index(mut self, name: &str, columns: &[&str]) -> Self {
        self.indexes.push(IndexDef::new(name, columns));
        self
    }

    /// Columns sorted by ordinal position.
    pub fn ordered_columns(&self) -> Vec<&ColumnDef> {
        let mut columns: Vec<&ColumnDef> = self.columns.iter().collect();
        columns.sort_by_key(|column| column.ordinal_position);
        columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.ordered_columns()
            .into_iter()
            .map(|column| column.name.clone())
            .collect()
    }
}

/// Storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
    /// ISO `YYYY-MM-DD` calendar date stored as text.
    Date,
}

impl ColumnKind {
    /// SQLite type affinity used in DDL.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
            ColumnKind::Text | ColumnKind::Date => "TEXT",
        }
    }
}

/// Column metadata for a table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDef {
    pub ordinal_position: i16,
    pub name: String,
    pub kind: ColumnKind,
    pub nullable: bool,
}

fn columns(defs: &[(&str, ColumnKind)]) -> Vec<ColumnDef> {
    defs.iter()
        .enumerate()
        .map(|(idx, (name, kind))| ColumnDef {
            ordinal_position: idx as i16 + 1,
            name: name.to_string(),
            kind: *kind,
            nullable: false,
        })
        .collect()
}

/// The canonical ten-table Quality Enhancement catalogue.
pub fn qe_schema() -> DatasetSchema {
    use ColumnKind::{Date, Integer, Real, Text};

    let students = TableDef::new(
        tables::STUDENTS,
        columns(&[
            ("student_id", Integer),
            ("programme", Text),
            ("intake", Text),
            ("wp_flag", Integer),
            ("age_band", Text),
            ("gender", Text),
        ]),
    )
    .with_primary_key("student_id");

    let admissions = TableDef::new(
        tables::ADMISSIONS,
        columns(&[
            ("app_id", Integer),
            ("student_id", Integer),
            ("route", Text),
            ("offer_status", Text),
            ("decision_date", Date),
        ]),
    )
    .with_primary_key("app_id")
    .with_foreign_key("student_id", tables::STUDENTS, "student_id")
    .with_index("idx_admissions_offer", &["offer_status"]);

    let modules = TableDef::new(
        tables::MODULES,
        columns(&[
            ("module_id", Integer),
            ("programme", Text),
            ("term", Text),
            ("credits", Integer),
        ]),
    )
    .with_primary_key("module_id")
    .with_index("idx_modules_prog_term", &["programme", "term"]);

    let enrolments = TableDef::new(
        tables::ENROLMENTS,
        columns(&[
            ("student_id", Integer),
            ("module_id", Integer),
            ("term", Text),
        ]),
    )
    .with_foreign_key("student_id", tables::STUDENTS, "student_id")
    .with_foreign_key("module_id", tables::MODULES, "module_id")
    .with_index("idx_enrolments_mod", &["module_id"]);

    let assessments = TableDef::new(
        tables::ASSESSMENTS,
        columns(&[
            ("assessment_id", Integer),
            ("module_id", Integer),
            ("type", Text),
            ("due_date", Date),
            ("weight", Real),
            ("returned_date", Date),
        ]),
    )
    .with_primary_key("assessment_id")
    .with_foreign_key("module_id", tables::MODULES, "module_id")
    .with_index("idx_assessments_due", &["due_date"]);

    let grades = TableDef::new(
        tables::GRADES,
        columns(&[
            ("student_id", Integer),
            ("assessment_id", Integer),
            ("score_pct", Real),
        ]),
    )
    .with_foreign_key("student_id", tables::STUDENTS, "student_id")
    .with_foreign_key("assessment_id", tables::ASSESSMENTS, "assessment_id");

    let surveys = TableDef::new(
        tables::SURVEYS,
        columns(&[
            ("survey_id", Integer),
            ("module_id", Integer),
            ("term", Text),
            ("theme", Text),
            ("qaa_theme", Text),
            ("mean_score_1_5", Real),
            ("responses", Integer),
        ]),
    )
    .with_primary_key("survey_id")
    .with_foreign_key("module_id", tables::MODULES, "module_id")
    .with_index("idx_surveys_theme", &["qaa_theme"]);

    let support_usage = TableDef::new(
        tables::SUPPORT_USAGE,
        columns(&[
            ("student_id", Integer),
            ("term", Text),
            ("service", Text),
            ("visits", Integer),
        ]),
    )
    .with_foreign_key("student_id", tables::STUDENTS, "student_id");

    let complaints = TableDef::new(
        tables::COMPLAINTS,
        columns(&[
            ("complaint_id", Integer),
            ("student_id", Integer),
            ("category", Text),
            ("submitted_date", Date),
            ("resolved_date", Date),
            ("upheld_flag", Integer),
        ]),
    )
    .with_primary_key("complaint_id")
    .with_foreign_key("student_id", tables::STUDENTS, "student_id");

    let placements = TableDef::new(
        tables::PLACEMENTS,
        columns(&[
            ("student_id", Integer),
            ("partner", Text),
            ("start_date", Date),
            ("end_date", Date),
            ("outcome", Text),
        ]),
    )
    .with_foreign_key("student_id", tables::STUDENTS, "student_id");

    DatasetSchema {
        schema_version: SCHEMA_VERSION.to_string(),
        tables: vec![
            students,
            admissions,
            modules,
            enrolments,
            assessments,
            grades,
            surveys,
            support_usage,
            complaints,
            placements,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_ten_tables() {
        let schema = qe_schema();
        assert_eq!(schema.tables.len(), 10);
        let grades = schema.table(tables::GRADES).expect("grades table");
        assert!(grades.primary_key.is_none());
        assert_eq!(grades.foreign_keys.len(), 2);
    }

    #[test]
    fn ordinal_positions_follow_declaration() {
        let schema = qe_schema();
        let surveys = schema.table(tables::SURVEYS).expect("surveys table");
        assert_eq!(
            surveys.column_names(),
            vec![
                "survey_id",
                "module_id",
                "term",
                "theme",
                "qaa_theme",
                "mean_score_1_5",
                "responses"
            ]
        );
    }
}

use qedash_core::{DatasetSchema, load_order};
use qedash_plan::Plan;

use crate::errors::GenerationError;
use crate::generators::GeneratorRegistry;

/// Planned generation task for a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    pub table: String,
    /// Fixed volume from the plan; derived tables size themselves.
    pub rows: Option<u64>,
}

/// Parent-first generation order for every catalogue table.
pub fn plan_tables(
    schema: &DatasetSchema,
    registry: &GeneratorRegistry,
    plan: &Plan,
) -> Result<Vec<GenerationTask>, GenerationError> {
    let mut tasks = Vec::with_capacity(schema.tables.len());

    for table in load_order(schema)? {
        let generator = registry
            .get(&table)
            .ok_or_else(|| GenerationError::UnknownTable(table.clone()))?;
        for input in generator.reads() {
            if !tasks.iter().any(|task: &GenerationTask| task.table == *input) {
                return Err(GenerationError::InvalidPlan(format!(
                    "table '{table}' reads '{input}' before it is generated"
                )));
            }
        }
        let rows = generator.requested_rows(plan);
        tasks.push(GenerationTask { table, rows });
    }

    if tasks.is_empty() {
        return Err(GenerationError::InvalidPlan(
            "no generation targets resolved".to_string(),
        ));
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qedash_core::{qe_schema, tables};

    #[test]
    fn tasks_follow_load_order() {
        let schema = qe_schema();
        let registry = GeneratorRegistry::new();
        let tasks = plan_tables(&schema, &registry, &Plan::default()).expect("plan tables");
        let names: Vec<&str> = tasks.iter().map(|task| task.table.as_str()).collect();

        let position = |name: &str| names.iter().position(|table| *table == name).unwrap_or(99);
        assert!(position(tables::STUDENTS) < position(tables::ENROLMENTS));
        assert!(position(tables::MODULES) < position(tables::ENROLMENTS));
        assert!(position(tables::ENROLMENTS) < position(tables::GRADES));
        assert!(position(tables::ASSESSMENTS) < position(tables::GRADES));

        let students = tasks.iter().find(|task| task.table == tables::STUDENTS);
        assert_eq!(students.and_then(|task| task.rows), Some(1200));
        let grades = tasks.iter().find(|task| task.table == tables::GRADES);
        assert_eq!(grades.and_then(|task| task.rows), None);
    }
}

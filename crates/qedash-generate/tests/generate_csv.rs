use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::PathBuf;

use qedash_core::catalog;
use qedash_core::tables;
use qedash_generate::{
    Dataset, GenerateOptions, GeneratedValue, GenerationEngine, dataset_fingerprint,
    verify_dataset,
};
use qedash_plan::Plan;

fn small_plan(seed: u64) -> Plan {
    let mut plan = Plan::default().with_seed(seed);
    plan.volumes.students = 80;
    plan.volumes.support_usage_rows = 300;
    plan.volumes.complaints = 20;
    plan.volumes.placements = 40;
    plan
}

fn engine_in(label: &str) -> GenerationEngine {
    let mut options = GenerateOptions::default();
    options.out_dir = temp_out_dir(label);
    GenerationEngine::new(options)
}

fn ints(dataset: &Dataset, table: &str, column: &str) -> Vec<i64> {
    dataset
        .table(table)
        .and_then(|data| data.column_values(column))
        .expect("column present")
        .filter_map(GeneratedValue::as_i64)
        .collect()
}

#[test]
fn generate_is_deterministic() {
    let plan = small_plan(42);

    let result_a = engine_in("run_a").run(&plan).expect("run generation A");
    let result_b = engine_in("run_b").run(&plan).expect("run generation B");

    for table in [tables::STUDENTS, tables::ENROLMENTS, tables::GRADES] {
        let file = format!("{table}.csv");
        let a = fs::read_to_string(result_a.run_dir.join(&file)).expect("read csv A");
        let b = fs::read_to_string(result_b.run_dir.join(&file)).expect("read csv B");
        assert_eq!(a, b, "{file} should be deterministic");
    }
    assert_eq!(result_a.report.fingerprint, result_b.report.fingerprint);
    assert_eq!(
        result_a.report.fingerprint,
        Some(dataset_fingerprint(&result_a.dataset).expect("fingerprint"))
    );
}

#[test]
fn different_seeds_diverge() {
    let engine = engine_in("seeds");
    let a = engine.generate(&small_plan(1)).expect("generate seed 1");
    let b = engine.generate(&small_plan(2)).expect("generate seed 2");
    assert_ne!(
        dataset_fingerprint(&a).expect("fingerprint a"),
        dataset_fingerprint(&b).expect("fingerprint b")
    );
}

#[test]
fn generate_respects_row_counts() {
    let plan = small_plan(7);
    let result = engine_in("run_rows").run(&plan).expect("run generation");

    let report_path = result.run_dir.join("generation_report.json");
    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(&report_path).expect("read generation_report.json"),
    )
    .expect("parse report");

    let tables_json = report
        .get("tables")
        .and_then(|value| value.as_array())
        .expect("tables array");
    assert_eq!(tables_json.len(), 10);

    let rows_of = |name: &str| {
        tables_json
            .iter()
            .find(|table| table.get("table").and_then(|value| value.as_str()) == Some(name))
            .and_then(|table| table.get("rows_generated"))
            .and_then(|value| value.as_u64())
            .expect("rows_generated")
    };

    assert_eq!(rows_of(tables::STUDENTS), 80);
    assert_eq!(rows_of(tables::ADMISSIONS), 80);
    assert_eq!(rows_of(tables::SUPPORT_USAGE), 300);
    assert_eq!(rows_of(tables::COMPLAINTS), 20);
    assert_eq!(rows_of(tables::PLACEMENTS), 40);

    let modules = catalog::PROGRAMMES.len() * catalog::TERMS.len() * 6;
    assert_eq!(rows_of(tables::MODULES), modules as u64);
    assert_eq!(rows_of(tables::ASSESSMENTS), (modules * 3) as u64);
    assert_eq!(rows_of(tables::SURVEYS), (modules * 6) as u64);
    assert_eq!(
        rows_of(tables::GRADES),
        rows_of(tables::ENROLMENTS) * 3,
        "one grade per enrolment and assessment"
    );
    assert!(report.get("violations").and_then(|v| v.as_array()).is_some_and(Vec::is_empty));
}

#[test]
fn foreign_keys_resolve_to_parents() {
    let engine = engine_in("integrity");
    let dataset = engine.generate(&small_plan(11)).expect("generate");
    assert!(verify_dataset(engine.schema(), &dataset).is_empty());

    let students: HashSet<i64> = ints(&dataset, tables::STUDENTS, "student_id")
        .into_iter()
        .collect();
    for table in [
        tables::ADMISSIONS,
        tables::ENROLMENTS,
        tables::GRADES,
        tables::SUPPORT_USAGE,
        tables::COMPLAINTS,
        tables::PLACEMENTS,
    ] {
        for id in ints(&dataset, table, "student_id") {
            assert!(students.contains(&id), "{table} references unknown student {id}");
        }
    }
}

#[test]
fn enrolments_follow_programme_and_intake() {
    let dataset = engine_in("enrolments")
        .generate(&small_plan(5))
        .expect("generate");

    let students = dataset.table(tables::STUDENTS).expect("students");
    let modules = dataset.table(tables::MODULES).expect("modules");
    let enrolments = dataset.table(tables::ENROLMENTS).expect("enrolments");

    let student_info: BTreeMap<i64, (String, String)> = students
        .rows
        .iter()
        .map(|row| {
            (
                row[0].as_i64().expect("id"),
                (row[1].to_csv(), row[2].to_csv()),
            )
        })
        .collect();
    let module_info: BTreeMap<i64, (String, String)> = modules
        .rows
        .iter()
        .map(|row| {
            (
                row[0].as_i64().expect("id"),
                (row[1].to_csv(), row[2].to_csv()),
            )
        })
        .collect();

    let mut per_student_term: BTreeMap<(i64, String), BTreeSet<i64>> = BTreeMap::new();
    for row in &enrolments.rows {
        let student_id = row[0].as_i64().expect("student");
        let module_id = row[1].as_i64().expect("module");
        let term = row[2].to_csv();

        let (programme, intake) = &student_info[&student_id];
        let (module_programme, module_term) = &module_info[&module_id];
        assert_eq!(programme, module_programme);
        assert_eq!(&term, module_term);
        if intake == "2024-Jan" {
            assert_ne!(term, "2023-Fall", "january intake enrolled before arrival");
        }

        let fresh = per_student_term
            .entry((student_id, term))
            .or_default()
            .insert(module_id);
        assert!(fresh, "student {student_id} enrolled twice in module {module_id}");
    }

    for modules in per_student_term.values() {
        assert!((4..=6).contains(&modules.len()));
    }
}

#[test]
fn paired_dates_are_ordered() {
    let dataset = engine_in("dates").generate(&small_plan(3)).expect("generate");
    for (table, start, end) in [
        (tables::ASSESSMENTS, 3, 5),
        (tables::COMPLAINTS, 3, 4),
        (tables::PLACEMENTS, 2, 3),
    ] {
        for row in &dataset.table(table).expect("table").rows {
            let start = row[start].as_date().expect("start date");
            let end = row[end].as_date().expect("end date");
            assert!(end >= start, "{table}: {end} precedes {start}");
        }
    }
}

fn temp_out_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("qedash_generate_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp out dir");
    dir
}

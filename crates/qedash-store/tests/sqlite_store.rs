use std::path::PathBuf;

use qedash_core::{qe_schema, tables};
use qedash_generate::{Dataset, GenerateOptions, GenerationEngine};
use qedash_plan::Plan;
use qedash_store::sqlite::queries;
use qedash_store::{SqliteStore, Store, StoreError, StoreOptions};

fn small_dataset(seed: u64) -> Dataset {
    let mut plan = Plan::default().with_seed(seed);
    plan.volumes.students = 60;
    plan.volumes.support_usage_rows = 200;
    plan.volumes.complaints = 10;
    plan.volumes.placements = 30;
    GenerationEngine::new(GenerateOptions::default())
        .generate(&plan)
        .expect("generate dataset")
}

fn temp_db(label: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("qedash_store_{label}_{}", uuid::Uuid::new_v4()))
        .join("qe.db")
}

#[tokio::test]
async fn build_loads_every_row() {
    let schema = qe_schema();
    let dataset = small_dataset(42);
    let path = temp_db("build");

    let (store, summary) = SqliteStore::build(&path, &schema, &dataset, StoreOptions::default())
        .await
        .expect("build store");

    assert_eq!(store.engine(), "sqlite");
    let counts = store.table_counts(&schema).await.expect("table counts");
    assert_eq!(counts.len(), 10);
    for count in &counts {
        assert_eq!(
            count.rows as usize,
            dataset.row_count(&count.table),
            "row count for {}",
            count.table
        );
    }
    assert_eq!(
        summary.rows_total,
        dataset.tables.iter().map(|table| table.len() as u64).sum::<u64>()
    );

    let indexes = queries::list_indexes(store.pool()).await.expect("indexes");
    for expected in [
        "idx_admissions_offer",
        "idx_assessments_due",
        "idx_enrolments_mod",
        "idx_modules_prog_term",
        "idx_surveys_theme",
    ] {
        assert!(indexes.iter().any(|name| name == expected), "missing {expected}");
    }
    assert_eq!(
        queries::foreign_key_violations(store.pool())
            .await
            .expect("fk check"),
        0
    );
    store.close().await;
}

#[tokio::test]
async fn rebuild_starts_from_scratch() {
    let schema = qe_schema();
    let path = temp_db("rebuild");

    let (first, _) = SqliteStore::build(&path, &schema, &small_dataset(1), StoreOptions::default())
        .await
        .expect("first build");
    first.close().await;

    let second_dataset = small_dataset(2);
    let (second, _) =
        SqliteStore::build(&path, &schema, &second_dataset, StoreOptions::default())
            .await
            .expect("second build");
    let counts = second.table_counts(&schema).await.expect("counts");
    let enrolments = counts
        .iter()
        .find(|count| count.table == tables::ENROLMENTS)
        .expect("enrolments count");
    assert_eq!(
        enrolments.rows as usize,
        second_dataset.row_count(tables::ENROLMENTS)
    );
    second.close().await;
}

#[tokio::test]
async fn kpi_queries_cover_every_offering() {
    let schema = qe_schema();
    let dataset = small_dataset(9);
    let path = temp_db("queries");
    let (store, _) = SqliteStore::build(&path, &schema, &dataset, StoreOptions::default())
        .await
        .expect("build store");

    let pass_rates = queries::pass_rate_by_programme_term(store.pool(), 40.0)
        .await
        .expect("pass rates");
    assert_eq!(pass_rates.len(), 20);
    for row in &pass_rates {
        assert!(row.passed <= row.assessed);
    }

    let turnaround = queries::assessment_turnaround(store.pool())
        .await
        .expect("turnaround");
    assert_eq!(turnaround.len(), dataset.row_count(tables::ASSESSMENTS));
    for row in &turnaround {
        let days = row.turnaround_days.expect("returned date present");
        assert!((10..=24).contains(&days), "turnaround {days}");
        assert!(row.programme.is_some());
    }

    let engagement = queries::engagement_inputs(store.pool())
        .await
        .expect("engagement inputs");
    assert_eq!(engagement.len(), 20);
    for row in &engagement {
        assert_eq!(row.modules, Some(6));
        assert_eq!(row.surveys, Some(36));
        if let (Some(students), Some(supported)) = (row.students, row.supported) {
            assert!(supported <= students);
        }
    }

    let modules = queries::module_stats(store.pool(), 40.0)
        .await
        .expect("module stats");
    assert_eq!(modules.len(), dataset.row_count(tables::MODULES));
    store.close().await;
}

#[tokio::test]
async fn offering_without_grades_keeps_null_measures() {
    let schema = qe_schema();
    let dataset = small_dataset(4);
    let path = temp_db("left_join");
    let (store, _) = SqliteStore::build(&path, &schema, &dataset, StoreOptions::default())
        .await
        .expect("build store");

    sqlx::query("DELETE FROM grades WHERE assessment_id IN (SELECT a.assessment_id FROM assessments a JOIN modules m ON m.module_id = a.module_id WHERE m.programme = 'Nursing' AND m.term = '2023-Fall')")
        .execute(store.pool())
        .await
        .expect("delete grades");

    let pass_rates = queries::pass_rate_by_programme_term(store.pool(), 40.0)
        .await
        .expect("pass rates");
    let nursing = pass_rates
        .iter()
        .find(|row| row.programme == "Nursing" && row.term == "2023-Fall")
        .expect("offering kept");
    assert_eq!((nursing.assessed, nursing.passed), (0, 0));

    let modules = queries::module_stats(store.pool(), 40.0)
        .await
        .expect("module stats");
    let ungraded = modules
        .iter()
        .filter(|row| row.programme == "Nursing" && row.term == "2023-Fall")
        .collect::<Vec<_>>();
    assert_eq!(ungraded.len(), 6);
    assert!(ungraded.iter().all(|row| row.assessed.is_none()));
    store.close().await;
}

#[tokio::test]
async fn pass_rate_counts_students_strictly_above_mark() {
    let schema = qe_schema();
    let dataset = small_dataset(5);
    let path = temp_db("threshold");
    let (store, _) = SqliteStore::build(&path, &schema, &dataset, StoreOptions::default())
        .await
        .expect("build store");

    sqlx::query("UPDATE grades SET score_pct = 40.0")
        .execute(store.pool())
        .await
        .expect("flatten grades");
    let (students,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(DISTINCT g.student_id)
        FROM grades g
        JOIN assessments a ON a.assessment_id = g.assessment_id
        JOIN modules m ON m.module_id = a.module_id
        WHERE m.programme = 'Medicine' AND m.term = '2023-Fall'
        "#,
    )
    .fetch_one(store.pool())
    .await
    .expect("distinct students");

    let at_mark = queries::pass_rate_by_programme_term(store.pool(), 40.0)
        .await
        .expect("pass rates at mark");
    let medicine = at_mark
        .iter()
        .find(|row| row.programme == "Medicine" && row.term == "2023-Fall")
        .expect("medicine offering");
    assert_eq!(medicine.assessed, students);
    assert_eq!(medicine.passed, 0);
    assert!(at_mark.iter().all(|row| row.passed == 0));

    let below_mark = queries::pass_rate_by_programme_term(store.pool(), 39.5)
        .await
        .expect("pass rates below mark");
    assert!(below_mark.iter().all(|row| row.passed == row.assessed));

    let modules = queries::module_stats(store.pool(), 40.0)
        .await
        .expect("module stats");
    assert!(modules.iter().all(|row| row.passed.unwrap_or(0) == 0));
    store.close().await;
}

#[tokio::test]
async fn offering_without_engagement_records_keeps_null_measures() {
    let schema = qe_schema();
    let dataset = small_dataset(6);
    let path = temp_db("engagement_gap");
    let (store, _) = SqliteStore::build(&path, &schema, &dataset, StoreOptions::default())
        .await
        .expect("build store");

    let offering =
        "SELECT module_id FROM modules WHERE programme = 'Nursing' AND term = '2023-Fall'";
    for sql in [
        format!(
            "DELETE FROM grades WHERE assessment_id IN \
             (SELECT assessment_id FROM assessments WHERE module_id IN ({offering}))"
        ),
        format!("DELETE FROM surveys WHERE module_id IN ({offering})"),
        format!("DELETE FROM enrolments WHERE module_id IN ({offering})"),
    ] {
        sqlx::query(&sql)
            .execute(store.pool())
            .await
            .expect("delete offering records");
    }

    let engagement = queries::engagement_inputs(store.pool())
        .await
        .expect("engagement inputs");
    assert_eq!(engagement.len(), 20);
    let nursing = engagement
        .iter()
        .find(|row| row.programme == "Nursing" && row.term == "2023-Fall")
        .expect("offering kept");
    assert_eq!(nursing.modules, Some(6));
    assert_eq!(nursing.mean_score, None);
    assert_eq!(nursing.responses, None);
    assert_eq!(nursing.surveys, None);
    assert_eq!(nursing.enrolments, None);
    assert_eq!(nursing.students, None);
    assert_eq!(nursing.supported, None);
    store.close().await;
}

#[tokio::test]
async fn opening_missing_database_fails() {
    let path = temp_db("missing");
    let err = SqliteStore::open(&path).await.expect_err("missing db");
    assert!(matches!(err, StoreError::Missing(_)));
}

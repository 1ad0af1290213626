use std::path::{Path, PathBuf};

use qedash_core::qe_schema;
use qedash_generate::{GenerateOptions, GenerationEngine};
use qedash_metrics::{
    KpiRecord, MetricsEngine, MetricsOptions, MetricsSummary, PassRateKpi, load_kpis,
};
use qedash_plan::Plan;
use qedash_store::{SqliteStore, StoreOptions};

fn temp_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("qedash_metrics_{label}_{}", uuid::Uuid::new_v4()))
}

async fn small_store(dir: &Path) -> SqliteStore {
    let mut plan = Plan::default().with_seed(7);
    plan.volumes.students = 60;
    plan.volumes.support_usage_rows = 200;
    plan.volumes.complaints = 10;
    plan.volumes.placements = 30;
    let dataset = GenerationEngine::new(GenerateOptions::default())
        .generate(&plan)
        .expect("generate dataset");
    let (store, _) = SqliteStore::build(
        &dir.join("qe.db"),
        &qe_schema(),
        &dataset,
        StoreOptions::default(),
    )
    .await
    .expect("build store");
    store
}

fn options(out_dir: PathBuf) -> MetricsOptions {
    MetricsOptions {
        out_dir,
        ..MetricsOptions::default()
    }
}

#[tokio::test]
async fn export_writes_four_tables_with_headers() {
    let dir = temp_dir("export");
    let store = small_store(&dir).await;
    let out_dir = dir.join("figures");

    let result = MetricsEngine::new(options(out_dir.clone()))
        .run(&store)
        .await
        .expect("export");

    for file in [
        "kpi_pass_rate.csv",
        "assessment_turnaround_bins.csv",
        "engagement_index.csv",
        "at_risk_modules.csv",
        "metrics.json",
        "metrics_report.md",
    ] {
        assert!(out_dir.join(file).exists(), "{file} missing");
        assert!(result.files.contains(&out_dir.join(file)));
    }

    let pass_csv = std::fs::read_to_string(out_dir.join(PassRateKpi::FILE)).expect("read csv");
    assert_eq!(
        pass_csv.lines().next(),
        Some("programme,term,assessed,passed,pass_rate_pct")
    );

    // 5 programmes x 4 terms, 6 modules each, 3 assessments per module.
    let counts = &result.summary.kpis;
    assert_eq!(counts.pass_rate, 20);
    assert_eq!(counts.engagement, 20);
    assert_eq!(counts.at_risk, 120);
    assert_eq!(counts.turnaround, 360);
    assert_eq!(result.summary.source_tables["modules"], 120);
    assert_eq!(result.summary.turnaround_bins.values().sum::<u64>(), 360);

    let summary: MetricsSummary = serde_json::from_slice(
        &std::fs::read(out_dir.join("metrics.json")).expect("read summary"),
    )
    .expect("parse summary");
    assert_eq!(summary.export_id, result.summary.export_id);
    assert!(result.report.contains("## At-risk modules"));

    store.close().await;
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn kpis_respect_their_definitions() {
    let dir = temp_dir("definitions");
    let store = small_store(&dir).await;
    let engine = MetricsEngine::new(options(dir.join("figures")));
    let computation = engine.compute(&store).await.expect("compute");
    let kpis = &computation.kpis;

    for row in &kpis.pass_rate {
        assert!(row.passed <= row.assessed);
        if let Some(rate) = row.pass_rate_pct {
            assert!((0.0..=100.0).contains(&rate));
        }
    }
    for row in &kpis.turnaround {
        let days = row.turnaround_days.expect("every assessment is returned");
        assert!((10..=24).contains(&days));
        assert_eq!(row.turn_bin.as_deref(), Some(qedash_metrics::turnaround_bin(days)));
    }
    for row in &kpis.engagement {
        for value in [row.response_rate, row.support_participation, row.engagement_index]
            .into_iter()
            .flatten()
        {
            assert!((0.0..=1.0).contains(&value), "{row:?}");
        }
        if row.mean_score_1_5.is_none() || row.response_rate.is_none() {
            assert_eq!(row.engagement_index, None);
        }
    }

    let cuts = computation.cuts.expect("risk cuts");
    let flagged: Vec<_> = kpis.at_risk.iter().filter(|row| row.at_risk).collect();
    assert!(!flagged.is_empty());
    for row in flagged {
        assert!(row.mean_survey.expect("survey") <= cuts.survey);
        assert!(row.pass_rate.expect("pass rate") <= cuts.pass_rate);
    }

    store.close().await;
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn exported_csvs_load_back_unchanged() {
    let dir = temp_dir("reload");
    let store = small_store(&dir).await;
    let out_dir = dir.join("figures");
    let engine = MetricsEngine::new(options(out_dir.clone()));

    let computed = engine.compute(&store).await.expect("compute");
    engine.run(&store).await.expect("export");
    let loaded = load_kpis(&out_dir).expect("load kpis");

    assert_eq!(loaded, computed.kpis);

    store.close().await;
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn stricter_pass_mark_lowers_passes() {
    let dir = temp_dir("pass_mark");
    let store = small_store(&dir).await;

    let lenient = MetricsEngine::new(options(dir.join("a")))
        .compute(&store)
        .await
        .expect("compute lenient");
    let strict = MetricsEngine::new(MetricsOptions {
        pass_mark: 70.0,
        ..options(dir.join("b"))
    })
    .compute(&store)
    .await
    .expect("compute strict");

    let passed = |rows: &[PassRateKpi]| rows.iter().map(|row| row.passed).sum::<i64>();
    assert!(passed(&strict.kpis.pass_rate) < passed(&lenient.kpis.pass_rate));

    let invalid = MetricsEngine::new(MetricsOptions {
        risk_quantile: -0.1,
        ..options(dir.join("c"))
    })
    .compute(&store)
    .await;
    assert!(invalid.is_err());

    store.close().await;
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn offering_without_surveys_or_enrolments_keeps_null_engagement() {
    let dir = temp_dir("engagement_gap");
    let store = small_store(&dir).await;

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

    let computed = MetricsEngine::new(options(dir.join("figures")))
        .compute(&store)
        .await
        .expect("compute");
    assert_eq!(computed.kpis.engagement.len(), 20);
    let nursing = computed
        .kpis
        .engagement
        .iter()
        .find(|row| row.programme == "Nursing" && row.term == "2023-Fall")
        .expect("offering kept");
    assert_eq!(nursing.mean_score_1_5, None);
    assert_eq!(nursing.survey_responses, None);
    assert_eq!(nursing.enrolments, None);
    assert_eq!(nursing.response_rate, None);
    assert_eq!(nursing.engagement_index, None);

    let pass = computed
        .kpis
        .pass_rate
        .iter()
        .find(|row| row.programme == "Nursing" && row.term == "2023-Fall")
        .expect("pass rate row kept");
    assert_eq!(pass.pass_rate_pct, None);

    store.close().await;
    let _ = std::fs::remove_dir_all(dir);
}

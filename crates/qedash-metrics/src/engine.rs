use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use qedash_core::catalog::{TURNAROUND_BINS, term_position};
use qedash_core::{qe_schema, write_bytes_atomic};
use qedash_store::sqlite::queries;
use qedash_store::{EngagementInputRow, ModuleStatsRow, PassRateRow, SqliteStore, TurnaroundRow};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calc::{
    RiskCuts, classify_at_risk, engagement_index, pass_rate_pct, response_rate, round_to,
    support_participation, turnaround_bin,
};
use crate::errors::MetricsError;
use crate::kpi::{AtRiskKpi, EngagementKpi, KpiRecord, KpiTables, PassRateKpi, TurnaroundKpi};
use crate::metrics::{
    KpiCounts, METRICS_VERSION, MetricsSummary, MetricsWarning, PerformanceMetrics, RiskCutSummary,
};
use crate::model::{EngagementWeights, MetricsOptions, MetricsResult};
use crate::report::render_report;

pub const SUMMARY_FILE: &str = "metrics.json";
pub const REPORT_FILE: &str = "metrics_report.md";

/// KPI tables computed from the store, before anything is written.
#[derive(Debug, Clone)]
pub struct KpiComputation {
    pub kpis: KpiTables,
    pub cuts: Option<RiskCuts>,
    pub warnings: Vec<MetricsWarning>,
}

/// Derive the KPI tables from a loaded store and export them as CSV.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    options: MetricsOptions,
}

impl MetricsEngine {
    pub fn new(options: MetricsOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MetricsOptions {
        &self.options
    }

    /// Run the KPI queries and assemble the four tables.
    pub async fn compute(&self, store: &SqliteStore) -> Result<KpiComputation, MetricsError> {
        self.options.validate()?;
        let options = &self.options;
        let pool = store.pool();

        let pass_rows = queries::pass_rate_by_programme_term(pool, options.pass_mark).await?;
        let turnaround_rows = queries::assessment_turnaround(pool).await?;
        let engagement_rows = queries::engagement_inputs(pool).await?;
        let module_rows = queries::module_stats(pool, options.pass_mark).await?;
        debug!(
            event = "kpi_queries_done",
            offerings = pass_rows.len(),
            assessments = turnaround_rows.len(),
            modules = module_rows.len()
        );

        let mut warnings = Vec::new();
        let pass_rate = build_pass_rate(pass_rows);
        let turnaround = build_turnaround(turnaround_rows, &mut warnings);
        let engagement = build_engagement(engagement_rows, &options.weights);
        let (at_risk, cuts) = build_at_risk(module_rows, options.risk_quantile);

        let ungraded = pass_rate
            .iter()
            .filter(|row| row.pass_rate_pct.is_none())
            .count();
        if ungraded > 0 {
            warnings.push(MetricsWarning::new(
                "offering_without_grades",
                format!("{ungraded} programme/term offerings have no assessed students"),
            ));
        }
        if cuts.is_none() && !at_risk.is_empty() {
            warnings.push(MetricsWarning::new(
                "no_risk_cuts",
                "module survey scores or pass rates are all missing; nothing flagged at risk",
            ));
        }
        for warning in &warnings {
            warn!(event = "kpi_warning", code = %warning.code, message = %warning.message);
        }

        Ok(KpiComputation {
            kpis: KpiTables {
                pass_rate,
                turnaround,
                engagement,
                at_risk,
            },
            cuts,
            warnings,
        })
    }

    /// Compute the KPIs and write CSVs, `metrics.json` and `metrics_report.md`.
    pub async fn run(&self, store: &SqliteStore) -> Result<MetricsResult, MetricsError> {
        let total_start = Instant::now();
        let export_id = Uuid::new_v4().to_string();
        info!(
            event = "export_start",
            export_id = %export_id,
            db = %store.path().display(),
            out_dir = %self.options.out_dir.display()
        );

        let source_tables = queries::table_counts(store.pool(), &qe_schema())
            .await?
            .into_iter()
            .map(|count| (count.table, count.rows))
            .collect();

        let KpiComputation {
            kpis,
            cuts,
            warnings,
        } = self.compute(store).await?;
        let query_ms = total_start.elapsed().as_millis();

        let write_start = Instant::now();
        let out_dir = self.options.out_dir.clone();
        std::fs::create_dir_all(&out_dir)?;
        let mut files = vec![
            write_kpi_csv(&out_dir, &kpis.pass_rate)?,
            write_kpi_csv(&out_dir, &kpis.turnaround)?,
            write_kpi_csv(&out_dir, &kpis.engagement)?,
            write_kpi_csv(&out_dir, &kpis.at_risk)?,
        ];

        let at_risk_modules = kpis.at_risk.iter().filter(|row| row.at_risk).count() as u64;
        let mut summary = MetricsSummary {
            metrics_version: METRICS_VERSION.to_string(),
            export_id,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            options: self.options.clone(),
            source_tables,
            kpis: KpiCounts {
                pass_rate: kpis.pass_rate.len() as u64,
                turnaround: kpis.turnaround.len() as u64,
                engagement: kpis.engagement.len() as u64,
                at_risk: kpis.at_risk.len() as u64,
            },
            turnaround_bins: bin_counts(&kpis.turnaround),
            risk_cuts: cuts.map(|cuts| RiskCutSummary {
                quantile: self.options.risk_quantile,
                mean_survey: cuts.survey,
                pass_rate: cuts.pass_rate,
            }),
            at_risk_modules,
            warnings,
            performance: PerformanceMetrics::default(),
        };

        let report = render_report(&summary, &kpis);
        let report_path = out_dir.join(REPORT_FILE);
        write_bytes_atomic(&report_path, report.as_bytes())?;

        summary.performance = PerformanceMetrics {
            query_ms,
            write_ms: write_start.elapsed().as_millis(),
            total_ms: total_start.elapsed().as_millis(),
        };
        let summary_path = out_dir.join(SUMMARY_FILE);
        write_bytes_atomic(&summary_path, &serde_json::to_vec_pretty(&summary)?)?;

        info!(
            event = "export_done",
            export_id = %summary.export_id,
            offerings = summary.kpis.pass_rate,
            assessments = summary.kpis.turnaround,
            at_risk = at_risk_modules,
            duration_ms = summary.performance.total_ms as u64
        );

        files.push(summary_path);
        files.push(report_path);

        Ok(MetricsResult {
            out_dir,
            files,
            summary,
            report,
        })
    }
}

pub fn build_pass_rate(rows: Vec<PassRateRow>) -> Vec<PassRateKpi> {
    let mut kpis: Vec<PassRateKpi> = rows
        .into_iter()
        .map(|row| PassRateKpi {
            pass_rate_pct: pass_rate_pct(row.assessed, row.passed),
            programme: row.programme,
            term: row.term,
            assessed: row.assessed,
            passed: row.passed,
        })
        .collect();
    kpis.sort_by(|a, b| {
        offering_key(&a.programme, &a.term).cmp(&offering_key(&b.programme, &b.term))
    });
    kpis
}

pub fn build_turnaround(
    rows: Vec<TurnaroundRow>,
    warnings: &mut Vec<MetricsWarning>,
) -> Vec<TurnaroundKpi> {
    let mut negative = 0usize;
    let kpis = rows
        .into_iter()
        .map(|row| {
            if row.turnaround_days.is_some_and(|days| days < 0) {
                negative += 1;
            }
            TurnaroundKpi {
                assessment_id: row.assessment_id,
                module_id: row.module_id,
                programme: row.programme,
                term: row.term,
                turnaround_days: row.turnaround_days,
                turn_bin: row.turnaround_days.map(|days| turnaround_bin(days).to_string()),
            }
        })
        .collect();
    if negative > 0 {
        warnings.push(MetricsWarning::new(
            "negative_turnaround",
            format!("{negative} assessments were returned before their due date"),
        ));
    }
    kpis
}

pub fn build_engagement(
    rows: Vec<EngagementInputRow>,
    weights: &EngagementWeights,
) -> Vec<EngagementKpi> {
    let mut kpis: Vec<EngagementKpi> = rows
        .into_iter()
        .map(|row| {
            let response = response_rate(row.responses, row.enrolments, row.surveys, row.modules);
            let support = support_participation(row.supported, row.students);
            let index = engagement_index(row.mean_score, response, support, weights);
            EngagementKpi {
                programme: row.programme,
                term: row.term,
                mean_score_1_5: row.mean_score.map(|value| round_to(value, 3)),
                survey_responses: row.responses,
                enrolments: row.enrolments,
                response_rate: response.map(|value| round_to(value, 4)),
                support_participation: support.map(|value| round_to(value, 4)),
                engagement_index: index.map(|value| round_to(value, 4)),
            }
        })
        .collect();
    kpis.sort_by(|a, b| {
        offering_key(&a.programme, &a.term).cmp(&offering_key(&b.programme, &b.term))
    });
    kpis
}

/// Per-module survey mean and pass rate with the at-risk flag.
pub fn build_at_risk(
    rows: Vec<ModuleStatsRow>,
    quantile: f64,
) -> (Vec<AtRiskKpi>, Option<RiskCuts>) {
    let metrics: Vec<(Option<f64>, Option<f64>)> = rows
        .iter()
        .map(|row| {
            let pass = match (row.assessed, row.passed) {
                (Some(assessed), Some(passed)) => pass_rate_pct(assessed, passed),
                _ => None,
            };
            (row.mean_survey.map(|value| round_to(value, 3)), pass)
        })
        .collect();

    let surveys: Vec<Option<f64>> = metrics.iter().map(|(survey, _)| *survey).collect();
    let passes: Vec<Option<f64>> = metrics.iter().map(|(_, pass)| *pass).collect();
    let cuts = RiskCuts::from_quantile(&surveys, &passes, quantile);

    let kpis = rows
        .into_iter()
        .zip(metrics)
        .map(|(row, (mean_survey, pass_rate))| AtRiskKpi {
            module_id: row.module_id,
            programme: row.programme,
            term: row.term,
            mean_survey,
            pass_rate,
            at_risk: classify_at_risk(mean_survey, pass_rate, cuts.as_ref()),
        })
        .collect();
    (kpis, cuts)
}

/// Count assessments per turnaround bin, every bin present.
pub fn bin_counts(rows: &[TurnaroundKpi]) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = TURNAROUND_BINS
        .iter()
        .map(|bin| (bin.to_string(), 0))
        .collect();
    for bin in rows.iter().filter_map(|row| row.turn_bin.as_deref()) {
        *counts.entry(bin.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Serialize a KPI table to `<dir>/<FILE>`, header included even when empty.
pub fn write_kpi_csv<T: KpiRecord>(dir: &Path, rows: &[T]) -> Result<PathBuf, MetricsError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(T::HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| MetricsError::Io(err.into_error()))?;

    let path = dir.join(T::FILE);
    write_bytes_atomic(&path, &bytes)?;
    debug!(event = "kpi_written", file = T::FILE, rows = rows.len());
    Ok(path)
}

/// Programmes alphabetically, terms in calendar order.
fn offering_key<'a>(programme: &'a str, term: &'a str) -> (&'a str, usize, &'a str) {
    (programme, term_position(term).unwrap_or(usize::MAX), term)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(
        id: i64,
        survey: Option<f64>,
        assessed: Option<i64>,
        passed: Option<i64>,
    ) -> ModuleStatsRow {
        ModuleStatsRow {
            module_id: id,
            programme: "Nursing".to_string(),
            term: "2023-Fall".to_string(),
            mean_survey: survey,
            assessed,
            passed,
        }
    }

    #[test]
    fn pass_rate_rows_follow_calendar_order() {
        let rows = vec![
            PassRateRow {
                programme: "Nursing".to_string(),
                term: "2024-Spring".to_string(),
                assessed: 4,
                passed: 3,
            },
            PassRateRow {
                programme: "Nursing".to_string(),
                term: "2023-Fall".to_string(),
                assessed: 0,
                passed: 0,
            },
        ];
        let kpis = build_pass_rate(rows);
        assert_eq!(kpis[0].term, "2023-Fall");
        assert_eq!(kpis[0].pass_rate_pct, None);
        assert_eq!(kpis[1].pass_rate_pct, Some(75.0));
    }

    #[test]
    fn modules_missing_a_metric_are_never_at_risk() {
        let rows = vec![
            module(1, Some(3.0), Some(10), Some(5)),
            module(2, Some(4.5), Some(10), Some(10)),
            module(3, None, Some(10), Some(1)),
            module(4, Some(1.0), None, None),
        ];
        let (kpis, cuts) = build_at_risk(rows, 0.5);
        let cuts = cuts.expect("cuts");
        assert_eq!(cuts.survey, 3.0);
        assert_eq!(cuts.pass_rate, 50.0);

        let flags: Vec<bool> = kpis.iter().map(|row| row.at_risk).collect();
        assert_eq!(flags, vec![true, false, false, false]);
        assert_eq!(kpis[3].pass_rate, None);
    }

    #[test]
    fn turnaround_keeps_missing_days_unbinned() {
        let mut warnings = Vec::new();
        let rows = vec![
            TurnaroundRow {
                assessment_id: 1,
                module_id: 1,
                programme: Some("Nursing".to_string()),
                term: Some("2023-Fall".to_string()),
                turnaround_days: Some(12),
            },
            TurnaroundRow {
                assessment_id: 2,
                module_id: 1,
                programme: None,
                term: None,
                turnaround_days: None,
            },
        ];
        let kpis = build_turnaround(rows, &mut warnings);
        assert_eq!(kpis[0].turn_bin.as_deref(), Some("11-15"));
        assert_eq!(kpis[1].turn_bin, None);
        assert!(warnings.is_empty());

        let counts = bin_counts(&kpis);
        assert_eq!(counts.len(), 4);
        assert_eq!(counts["11-15"], 1);
        assert_eq!(counts[">20"], 0);
    }

    #[test]
    fn engagement_is_null_without_surveys() {
        let rows = vec![EngagementInputRow {
            programme: "Pharmacy".to_string(),
            term: "2024-Fall".to_string(),
            mean_score: None,
            responses: None,
            surveys: None,
            modules: Some(6),
            enrolments: Some(50),
            students: Some(10),
            supported: Some(4),
        }];
        let kpis = build_engagement(rows, &EngagementWeights::default());
        assert_eq!(kpis[0].engagement_index, None);
        assert_eq!(kpis[0].response_rate, None);
        assert_eq!(kpis[0].support_participation, Some(0.4));
    }
}

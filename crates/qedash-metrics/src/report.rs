use crate::kpi::KpiTables;
use crate::metrics::MetricsSummary;

/// Render a deterministic markdown summary of a KPI export.
pub fn render_report(summary: &MetricsSummary, kpis: &KpiTables) -> String {
    let mut lines = Vec::new();

    lines.push("# Quality Enhancement KPI Export".to_string());
    lines.push(String::new());
    lines.push("## Export summary".to_string());
    lines.push(format!("- export_id: {}", summary.export_id));
    lines.push(format!("- metrics_version: {}", summary.metrics_version));
    lines.push(format!("- pass_mark: {}", summary.options.pass_mark));
    lines.push(format!("- risk_quantile: {}", summary.options.risk_quantile));
    lines.push(String::new());

    lines.push("## Source tables".to_string());
    lines.push("| table | rows |".to_string());
    lines.push("| --- | --- |".to_string());
    for (table, rows) in &summary.source_tables {
        lines.push(format!("| {table} | {rows} |"));
    }
    lines.push(String::new());

    lines.push("## Pass rate by programme and term".to_string());
    lines.push("| programme | term | assessed | passed | pass_rate_pct |".to_string());
    lines.push("| --- | --- | --- | --- | --- |".to_string());
    for row in &kpis.pass_rate {
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            row.programme,
            row.term,
            row.assessed,
            row.passed,
            fmt_opt(row.pass_rate_pct, 2)
        ));
    }
    lines.push(String::new());

    lines.push("## Assessment turnaround".to_string());
    lines.push("| bin | assessments |".to_string());
    lines.push("| --- | --- |".to_string());
    for bin in qedash_core::catalog::TURNAROUND_BINS {
        let count = summary.turnaround_bins.get(*bin).copied().unwrap_or(0);
        lines.push(format!("| {bin} | {count} |"));
    }
    lines.push(String::new());

    lines.push("## At-risk modules".to_string());
    match &summary.risk_cuts {
        Some(cuts) => lines.push(format!(
            "- cuts at q={}: mean_survey <= {:.3}, pass_rate <= {:.2}%",
            cuts.quantile, cuts.mean_survey, cuts.pass_rate
        )),
        None => lines.push("- no cuts: module metrics are missing".to_string()),
    }
    lines.push(format!(
        "- flagged: {} of {} modules",
        summary.at_risk_modules, summary.kpis.at_risk
    ));
    lines.push(String::new());

    if !summary.warnings.is_empty() {
        lines.push("## Warnings".to_string());
        for warning in &summary.warnings {
            lines.push(format!("- {}: {}", warning.code, warning.message));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|value| format!("{value:.decimals$}"))
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::kpi::PassRateKpi;
    use crate::metrics::{KpiCounts, MetricsWarning, PerformanceMetrics};
    use crate::model::MetricsOptions;

    #[test]
    fn renders_missing_values_as_dash() {
        let summary = MetricsSummary {
            metrics_version: "0.1".to_string(),
            export_id: "export-1".to_string(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            options: MetricsOptions::default(),
            source_tables: BTreeMap::from([("grades".to_string(), 0)]),
            kpis: KpiCounts {
                pass_rate: 1,
                ..KpiCounts::default()
            },
            turnaround_bins: BTreeMap::new(),
            risk_cuts: None,
            at_risk_modules: 0,
            warnings: vec![MetricsWarning::new("offering_without_grades", "1 offering")],
            performance: PerformanceMetrics::default(),
        };
        let kpis = KpiTables {
            pass_rate: vec![PassRateKpi {
                programme: "Nursing".to_string(),
                term: "2023-Fall".to_string(),
                assessed: 0,
                passed: 0,
                pass_rate_pct: None,
            }],
            ..KpiTables::default()
        };

        let report = render_report(&summary, &kpis);
        assert!(report.contains("| Nursing | 2023-Fall | 0 | 0 | - |"));
        assert!(report.contains("| <=10 | 0 |"));
        assert!(report.contains("- no cuts"));
        assert!(report.contains("- offering_without_grades: 1 offering"));
    }
}

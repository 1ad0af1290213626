use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::MetricsOptions;

/// Metrics contract version for the KPI export.
pub const METRICS_VERSION: &str = "0.1";

/// Machine-readable summary written next to the KPI CSVs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub metrics_version: String,
    pub export_id: String,
    pub generated_at: String,
    pub options: MetricsOptions,
    /// Row counts of the store tables the KPIs were derived from.
    pub source_tables: BTreeMap<String, i64>,
    pub kpis: KpiCounts,
    pub turnaround_bins: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_cuts: Option<RiskCutSummary>,
    pub at_risk_modules: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<MetricsWarning>,
    pub performance: PerformanceMetrics,
}

/// Rows written per KPI file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiCounts {
    pub pass_rate: u64,
    pub turnaround: u64,
    pub engagement: u64,
    pub at_risk: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskCutSummary {
    pub quantile: f64,
    pub mean_survey: f64,
    pub pass_rate: f64,
}

/// Structured warning entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsWarning {
    pub code: String,
    pub message: String,
}

impl MetricsWarning {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub query_ms: u128,
    pub write_ms: u128,
    pub total_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_without_warnings_reads_back() {
        let summary = MetricsSummary {
            metrics_version: METRICS_VERSION.to_string(),
            export_id: "export".to_string(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            options: MetricsOptions::default(),
            source_tables: BTreeMap::new(),
            kpis: KpiCounts::default(),
            turnaround_bins: BTreeMap::new(),
            risk_cuts: None,
            at_risk_modules: 0,
            warnings: Vec::new(),
            performance: PerformanceMetrics::default(),
        };
        let json = serde_json::to_string(&summary).expect("serialize summary");
        assert!(!json.contains("warnings"));

        let parsed: MetricsSummary = serde_json::from_str(&json).expect("parse summary");
        assert!(parsed.warnings.is_empty());
        assert!(parsed.risk_cuts.is_none());
    }
}

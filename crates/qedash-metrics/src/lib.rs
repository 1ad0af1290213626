//! KPI export for the Quality Enhancement store.
//!
//! Turns the loaded SQLite store into four CSV tables (pass rate, assessment
//! turnaround, engagement index and at-risk modules) plus a JSON summary and
//! a markdown report.

pub mod calc;
pub mod engine;
pub mod errors;
pub mod kpi;
pub mod load;
pub mod metrics;
pub mod model;
pub mod report;

pub use calc::{
    RiskCuts, classify_at_risk, engagement_index, median, quantile, turnaround_bin,
};
pub use engine::{KpiComputation, MetricsEngine};
pub use errors::MetricsError;
pub use kpi::{AtRiskKpi, EngagementKpi, KpiRecord, KpiTables, PassRateKpi, TurnaroundKpi};
pub use load::{load_kpi, load_kpis};
pub use metrics::{METRICS_VERSION, MetricsSummary};
pub use model::{EngagementWeights, MetricsOptions, MetricsResult};

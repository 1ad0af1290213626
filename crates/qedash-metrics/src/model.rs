use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::MetricsError;
use crate::metrics::MetricsSummary;

/// Relative weight of each engagement signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementWeights {
    pub survey: f64,
    pub response: f64,
    pub support: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            survey: 0.5,
            response: 0.3,
            support: 0.2,
        }
    }
}

/// Options for the metric exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsOptions {
    /// Directory the KPI CSVs are written to.
    pub out_dir: PathBuf,
    /// A student passes when their mean score in the offering is above this percentage.
    pub pass_mark: f64,
    /// Quantile of module survey score and pass rate used as the at-risk cut.
    pub risk_quantile: f64,
    pub weights: EngagementWeights,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("reports/figures"),
            pass_mark: 40.0,
            risk_quantile: 0.33,
            weights: EngagementWeights::default(),
        }
    }
}

impl MetricsOptions {
    pub fn validate(&self) -> Result<(), MetricsError> {
        if !(0.0..=100.0).contains(&self.pass_mark) {
            return Err(MetricsError::InvalidOption(format!(
                "pass_mark {} must lie within [0, 100]",
                self.pass_mark
            )));
        }
        if !(0.0..=1.0).contains(&self.risk_quantile) {
            return Err(MetricsError::InvalidOption(format!(
                "risk_quantile {} must lie within [0, 1]",
                self.risk_quantile
            )));
        }
        let weights = self.weights;
        let total = weights.survey + weights.response + weights.support;
        let parts = [weights.survey, weights.response, weights.support];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(MetricsError::InvalidOption(
                "engagement weights must be finite and not negative".to_string(),
            ));
        }
        if (total - 1.0).abs() > 1e-6 {
            return Err(MetricsError::InvalidOption(format!(
                "engagement weights sum to {total}, expected 1"
            )));
        }
        Ok(())
    }
}

/// Result of a metric export.
#[derive(Debug, Clone)]
pub struct MetricsResult {
    pub out_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub summary: MetricsSummary,
    pub report: String,
}

//! Pure KPI arithmetic shared by the exporter and the dashboard.

use qedash_core::catalog::TURNAROUND_BINS;

use crate::model::EngagementWeights;

/// Bucket a turnaround in days.
pub fn turnaround_bin(days: i64) -> &'static str {
    match days {
        ..=10 => TURNAROUND_BINS[0],
        11..=15 => TURNAROUND_BINS[1],
        16..=20 => TURNAROUND_BINS[2],
        _ => TURNAROUND_BINS[3],
    }
}

/// Passing over assessed students as a percentage; `None` when nobody was assessed.
pub fn pass_rate_pct(assessed: i64, passed: i64) -> Option<f64> {
    if assessed <= 0 {
        return None;
    }
    Some(round_to(100.0 * passed as f64 / assessed as f64, 2))
}

/// Survey responses over the number of possible responses, clamped to `[0, 1]`.
///
/// Every enrolment can answer each survey run on its module, so the
/// denominator is enrolments times the mean number of surveys per module.
pub fn response_rate(
    responses: Option<i64>,
    enrolments: Option<i64>,
    surveys: Option<i64>,
    modules: Option<i64>,
) -> Option<f64> {
    let responses = responses? as f64;
    let enrolments = enrolments.filter(|value| *value > 0)? as f64;
    let surveys = surveys.filter(|value| *value > 0)? as f64;
    let modules = modules.filter(|value| *value > 0)? as f64;
    let possible = enrolments * surveys / modules;
    Some(clamp_unit(responses / possible))
}

/// Share of enrolled students who used a support service, clamped to `[0, 1]`.
pub fn support_participation(supported: Option<i64>, students: Option<i64>) -> Option<f64> {
    let students = students.filter(|value| *value > 0)? as f64;
    let supported = supported.unwrap_or(0) as f64;
    Some(clamp_unit(supported / students))
}

/// Weighted blend of the rescaled Likert mean, response rate and support share.
pub fn engagement_index(
    mean_score: Option<f64>,
    response_rate: Option<f64>,
    support_participation: Option<f64>,
    weights: &EngagementWeights,
) -> Option<f64> {
    let survey = clamp_unit((mean_score? - 1.0) / 4.0);
    let response = clamp_unit(response_rate?);
    let support = clamp_unit(support_participation.unwrap_or(0.0));
    Some(clamp_unit(
        weights.survey * survey + weights.response * response + weights.support * support,
    ))
}

/// Linearly interpolated quantile of the finite values, `None` when there are none.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Cut values used to flag at-risk modules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskCuts {
    pub survey: f64,
    pub pass_rate: f64,
}

impl RiskCuts {
    /// Quantile `q` of each non-null module metric.
    pub fn from_quantile(
        surveys: &[Option<f64>],
        pass_rates: &[Option<f64>],
        q: f64,
    ) -> Option<Self> {
        let surveys: Vec<f64> = surveys.iter().flatten().copied().collect();
        let pass_rates: Vec<f64> = pass_rates.iter().flatten().copied().collect();
        Some(Self {
            survey: quantile(&surveys, q)?,
            pass_rate: quantile(&pass_rates, q)?,
        })
    }
}

/// A module is at risk when both metrics sit at or below their cuts.
pub fn classify_at_risk(
    mean_survey: Option<f64>,
    pass_rate: Option<f64>,
    cuts: Option<&RiskCuts>,
) -> bool {
    match (mean_survey, pass_rate, cuts) {
        (Some(survey), Some(pass), Some(cuts)) => survey <= cuts.survey && pass <= cuts.pass_rate,
        _ => false,
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

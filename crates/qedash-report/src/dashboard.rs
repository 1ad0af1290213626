//! The six dashboard sections built from the exported KPI tables.

use std::collections::BTreeMap;

use qedash_core::catalog::{TERMS, TURNAROUND_BINS, term_position};
use qedash_metrics::{AtRiskKpi, KpiTables, median};

use crate::figure::{Axis, Figure, Shape, Trace};

pub const AT_RISK_LABEL: &str = "Low satisfaction & pass (at-risk)";
pub const HIGHER_SATISFACTION_LABEL: &str = "Higher satisfaction";
pub const LOW_SURVEY_LABEL: &str = "Low survey (≤ median)";
pub const HIGHER_SURVEY_LABEL: &str = "Higher survey";

const PASS_AXIS: &str = "Pass rate (%)";
const SURVEY_AXIS: &str = "Survey score (1–5)";
const PROGRAMME_HOVER: &str = "%{text}<br>x=%{x}<br>y=%{y}<extra>%{fullData.name}</extra>";
const MODULE_HOVER: &str = "%{text}<br>survey=%{x}<br>pass=%{y}%<extra>%{fullData.name}</extra>";

/// One titled chart on the page.
#[derive(Debug, Clone)]
pub struct Section {
    pub title: &'static str,
    pub figure: Figure,
}

/// Pass rate joined with engagement for one programme/term.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferingPoint {
    pub programme: String,
    pub term: String,
    pub pass_rate_pct: Option<f64>,
    pub mean_score_1_5: Option<f64>,
    pub engagement_index: Option<f64>,
}

/// Left-merge engagement onto pass rate by (programme, term).
pub fn merge_offerings(kpis: &KpiTables) -> Vec<OfferingPoint> {
    let engagement: BTreeMap<(&str, &str), _> = kpis
        .engagement
        .iter()
        .map(|row| ((row.programme.as_str(), row.term.as_str()), row))
        .collect();

    let mut merged: Vec<OfferingPoint> = kpis
        .pass_rate
        .iter()
        .map(|row| {
            let matched = engagement.get(&(row.programme.as_str(), row.term.as_str()));
            OfferingPoint {
                programme: row.programme.clone(),
                term: row.term.clone(),
                pass_rate_pct: row.pass_rate_pct,
                mean_score_1_5: matched.and_then(|eng| eng.mean_score_1_5),
                engagement_index: matched.and_then(|eng| eng.engagement_index),
            }
        })
        .collect();
    merged.sort_by(|a, b| {
        let left = (a.programme.as_str(), term_rank(&a.term));
        left.cmp(&(b.programme.as_str(), term_rank(&b.term)))
    });
    merged
}

pub fn build_sections(kpis: &KpiTables) -> Vec<Section> {
    let merged = merge_offerings(kpis);
    vec![
        Section {
            title: "Programme Pass Rates by Term",
            figure: pass_rate_by_term(&merged),
        },
        Section {
            title: "Assessment Turnaround Distribution",
            figure: turnaround_distribution(kpis),
        },
        Section {
            title: "Engagement vs Pass Rate (programme/term)",
            figure: engagement_vs_pass(&merged),
        },
        Section {
            title: "Modules: Pass vs Survey Satisfaction",
            figure: modules_pass_vs_survey(&kpis.at_risk),
        },
        Section {
            title: "Segment #5: Medium-to-Low Engagement & Pass",
            figure: low_engagement_segment(&merged),
        },
        Section {
            title: "Segment #6: Modules with Medium-to-Low Pass",
            figure: low_pass_module_segment(&kpis.at_risk),
        },
    ]
}

fn pass_rate_by_term(merged: &[OfferingPoint]) -> Figure {
    let mut figure = Figure::new(
        "Programme Pass Rates by Term",
        Axis::ordered("term", TERMS),
        Axis::titled(PASS_AXIS),
    )
    .with_legend("programme");

    for (programme, points) in by_programme(merged) {
        let mut trace = Trace::line(programme);
        for point in points {
            trace.push(point.term.as_str(), point.pass_rate_pct);
        }
        figure.data.push(trace);
    }
    figure
}

fn turnaround_distribution(kpis: &KpiTables) -> Figure {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for bin in kpis.turnaround.iter().filter_map(|row| row.turn_bin.as_deref()) {
        *counts.entry(bin).or_insert(0) += 1;
    }

    let mut trace = Trace::bar();
    for bin in TURNAROUND_BINS {
        let count = counts.get(bin).copied().unwrap_or(0);
        trace.push(*bin, Some(count as f64));
    }

    let mut figure = Figure::new(
        "Assessment Turnaround Distribution",
        Axis::ordered("bin", TURNAROUND_BINS),
        Axis::titled("count"),
    );
    figure.data.push(trace);
    figure
}

fn engagement_vs_pass(merged: &[OfferingPoint]) -> Figure {
    let mut figure = Figure::new(
        "Engagement vs Pass Rate (each dot = programme/term)",
        Axis::titled("Engagement index"),
        Axis::titled(PASS_AXIS),
    )
    .with_legend("programme");
    figure.data = offering_scatter(merged.iter().filter(|point| is_plotted(point)));
    figure
}

fn modules_pass_vs_survey(modules: &[AtRiskKpi]) -> Figure {
    let mut at_risk = Trace::markers(AT_RISK_LABEL).with_hover(MODULE_HOVER);
    let mut higher = Trace::markers(HIGHER_SATISFACTION_LABEL).with_hover(MODULE_HOVER);
    for module in modules {
        let (Some(survey), Some(pass)) = (module.mean_survey, module.pass_rate) else {
            continue;
        };
        let trace = if module.at_risk {
            &mut at_risk
        } else {
            &mut higher
        };
        trace.push_labelled(survey, Some(pass), module_label(module));
    }

    let mut figure = Figure::new(
        "Modules: Pass vs Survey Satisfaction (each dot = module)",
        Axis::titled(SURVEY_AXIS),
        Axis::titled(PASS_AXIS),
    )
    .with_legend("color");
    figure.data = vec![at_risk, higher];
    figure
}

fn low_engagement_segment(merged: &[OfferingPoint]) -> Figure {
    let engagement: Vec<f64> = merged.iter().filter_map(|point| point.engagement_index).collect();
    let pass: Vec<f64> = merged.iter().filter_map(|point| point.pass_rate_pct).collect();
    let (cut_eng, cut_pass) = match (median(&engagement), median(&pass)) {
        (Some(cut_eng), Some(cut_pass)) => (cut_eng, cut_pass),
        _ => {
            return Figure::new(
                "Segment #5: Medium-to-Low Engagement & Pass (no data)",
                Axis::titled("engagement_index"),
                Axis::titled("pass_rate_pct"),
            );
        }
    };

    let segment = merged.iter().filter(|point| {
        matches!(
            (point.engagement_index, point.pass_rate_pct),
            (Some(eng), Some(pass)) if eng <= cut_eng && pass <= cut_pass
        )
    });

    let mut figure = Figure::new(
        format!(
            "Segment #5: Medium-to-Low Engagement & Pass (≤ medians: {cut_eng:.2}, {cut_pass:.1}%)"
        ),
        Axis::titled("engagement_index"),
        Axis::titled("pass_rate_pct"),
    )
    .with_legend("programme");
    figure.data = offering_scatter(segment);
    figure.layout.shapes = vec![Shape::dashed_vline(cut_eng), Shape::dashed_hline(cut_pass)];
    figure
}

fn low_pass_module_segment(modules: &[AtRiskKpi]) -> Figure {
    let pass: Vec<f64> = modules.iter().filter_map(|module| module.pass_rate).collect();
    let surveys: Vec<f64> = modules.iter().filter_map(|module| module.mean_survey).collect();
    let Some(cut_pass) = median(&pass) else {
        return Figure::new(
            "Segment #6: Modules with Medium-to-Low Pass (no data)",
            Axis::titled(SURVEY_AXIS),
            Axis::titled(PASS_AXIS),
        );
    };
    let cut_survey = median(&surveys);

    let mut low = Trace::markers(LOW_SURVEY_LABEL).with_hover(MODULE_HOVER);
    let mut higher = Trace::markers(HIGHER_SURVEY_LABEL).with_hover(MODULE_HOVER);
    for module in modules {
        let Some(pass) = module.pass_rate.filter(|pass| *pass <= cut_pass) else {
            continue;
        };
        let low_survey = matches!(
            (module.mean_survey, cut_survey),
            (Some(survey), Some(cut)) if survey <= cut
        );
        let trace = if low_survey { &mut low } else { &mut higher };
        // A module without survey results has no x position.
        let x = module.mean_survey.map(serde_json::Value::from).unwrap_or_default();
        trace.push_labelled(x, Some(pass), module_label(module));
    }

    let mut figure = Figure::new(
        format!("Segment #6: Modules with Medium-to-Low Pass (≤ median: {cut_pass:.1}%)"),
        Axis::titled(SURVEY_AXIS),
        Axis::titled(PASS_AXIS),
    )
    .with_legend("Satisfaction");
    figure.data = vec![low, higher];
    figure.layout.shapes = vec![Shape::dashed_hline(cut_pass)];
    figure
}

/// One marker trace per programme, x = engagement index, y = pass rate.
fn offering_scatter<'a>(points: impl Iterator<Item = &'a OfferingPoint>) -> Vec<Trace> {
    let mut traces: BTreeMap<&str, Trace> = BTreeMap::new();
    for point in points {
        let Some(engagement) = point.engagement_index else {
            continue;
        };
        traces
            .entry(point.programme.as_str())
            .or_insert_with(|| {
                Trace::markers(point.programme.as_str()).with_hover(PROGRAMME_HOVER)
            })
            .push_labelled(
                engagement,
                point.pass_rate_pct,
                format!("{} {}", point.programme, point.term),
            );
    }
    traces.into_values().collect()
}

fn by_programme(merged: &[OfferingPoint]) -> BTreeMap<&str, Vec<&OfferingPoint>> {
    let mut grouped: BTreeMap<&str, Vec<&OfferingPoint>> = BTreeMap::new();
    for point in merged {
        grouped.entry(point.programme.as_str()).or_default().push(point);
    }
    grouped
}

fn is_plotted(point: &OfferingPoint) -> bool {
    point.engagement_index.is_some() && point.pass_rate_pct.is_some()
}

fn module_label(module: &AtRiskKpi) -> String {
    format!("module {} ({} {})", module.module_id, module.programme, module.term)
}

fn term_rank(term: &str) -> usize {
    term_position(term).unwrap_or(usize::MAX)
}

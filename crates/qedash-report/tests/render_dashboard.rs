use std::path::{Path, PathBuf};

use qedash_metrics::engine::write_kpi_csv;
use qedash_metrics::{AtRiskKpi, EngagementKpi, MetricsError, PassRateKpi, TurnaroundKpi};
use qedash_report::{DASHBOARD_TITLE, ReportError, ReportOptions, render_dashboard};

fn temp_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("qedash_report_{label}_{}", uuid::Uuid::new_v4()))
}

fn write_fixture_kpis(dir: &Path) {
    std::fs::create_dir_all(dir).expect("create figures dir");
    let programmes = ["Nursing", "Pharmacy"];
    let terms = ["2023-Fall", "2024-Spring"];

    let mut pass_rate = Vec::new();
    let mut engagement = Vec::new();
    for (p, programme) in programmes.iter().enumerate() {
        for (t, term) in terms.iter().enumerate() {
            let offset = (p * 2 + t) as f64;
            pass_rate.push(PassRateKpi {
                programme: programme.to_string(),
                term: term.to_string(),
                assessed: 100,
                passed: 90 - offset as i64,
                pass_rate_pct: Some(90.0 - offset),
            });
            engagement.push(EngagementKpi {
                programme: programme.to_string(),
                term: term.to_string(),
                mean_score_1_5: Some(3.5 + offset / 10.0),
                survey_responses: Some(200),
                enrolments: Some(100),
                response_rate: Some(0.33),
                support_participation: Some(0.4),
                engagement_index: Some(0.5 + offset / 20.0),
            });
        }
    }

    let turnaround: Vec<TurnaroundKpi> = (1..=8)
        .map(|id| TurnaroundKpi {
            assessment_id: id,
            module_id: 1,
            programme: Some("Nursing".to_string()),
            term: Some("2023-Fall".to_string()),
            turnaround_days: Some(9 + id * 2),
            turn_bin: Some(qedash_metrics::turnaround_bin(9 + id * 2).to_string()),
        })
        .collect();

    let at_risk: Vec<AtRiskKpi> = (1..=6)
        .map(|id| AtRiskKpi {
            module_id: id,
            programme: "Nursing".to_string(),
            term: "2023-Fall".to_string(),
            mean_survey: Some(3.0 + id as f64 / 5.0),
            pass_rate: Some(70.0 + id as f64 * 3.0),
            at_risk: id == 1,
        })
        .collect();

    write_kpi_csv(dir, &pass_rate).expect("write pass rate");
    write_kpi_csv(dir, &turnaround).expect("write turnaround");
    write_kpi_csv(dir, &engagement).expect("write engagement");
    write_kpi_csv(dir, &at_risk).expect("write at risk");
}

#[test]
fn renders_six_sections_into_one_page() {
    let dir = temp_dir("render");
    let figures_dir = dir.join("reports").join("figures");
    write_fixture_kpis(&figures_dir);
    let options = ReportOptions {
        figures_dir,
        out_path: dir.join("docs").join("dashboard.html"),
    };

    let result = render_dashboard(&options).expect("render dashboard");
    assert_eq!(result.sections, 6);
    assert!(result.points > 0);

    let html = std::fs::read_to_string(&options.out_path).expect("read dashboard");
    assert_eq!(result.bytes_written, html.len() as u64);
    assert!(html.contains(&format!("<title>{DASHBOARD_TITLE}</title>")));
    assert!(html.contains("All data are synthetic and for demonstration only."));
    assert!(html.contains("cdn.plot.ly"));
    assert_eq!(html.matches("<h2>").count(), 6);
    assert_eq!(html.matches("Plotly.newPlot").count(), 6);
    assert!(html.contains("<h2>Segment #5: Medium-to-Low Engagement &amp; Pass</h2>"));
    assert!(html.contains("Low satisfaction & pass (at-risk)"));

    let leftovers: Vec<_> = std::fs::read_dir(dir.join("docs"))
        .expect("list docs")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn rerender_is_byte_identical() {
    let dir = temp_dir("stable");
    let figures_dir = dir.join("figures");
    write_fixture_kpis(&figures_dir);
    let options = ReportOptions {
        figures_dir,
        out_path: dir.join("dashboard.html"),
    };

    render_dashboard(&options).expect("first render");
    let first = std::fs::read(&options.out_path).expect("read first");
    render_dashboard(&options).expect("second render");
    let second = std::fs::read(&options.out_path).expect("read second");
    assert_eq!(first, second);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn missing_exports_are_reported() {
    let dir = temp_dir("missing");
    let options = ReportOptions {
        figures_dir: dir.join("figures"),
        out_path: dir.join("dashboard.html"),
    };
    let err = render_dashboard(&options).expect_err("no kpi files");
    assert!(matches!(
        err,
        ReportError::Kpi(MetricsError::MissingFile(_))
    ));
    assert!(!options.out_path.exists());
}

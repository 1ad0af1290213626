//! Static HTML dashboard over the exported KPI tables.

pub mod dashboard;
pub mod errors;
pub mod figure;
pub mod html;

use std::path::{Path, PathBuf};
use std::time::Instant;

use qedash_core::write_bytes_atomic;
use qedash_metrics::load_kpis;
use tracing::info;

pub use dashboard::{Section, build_sections, merge_offerings};
pub use errors::{ReportError, Result};
pub use html::{DASHBOARD_TITLE, render_html};

/// Where the KPI CSVs are read from and the page is written to.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub figures_dir: PathBuf,
    pub out_path: PathBuf,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            figures_dir: PathBuf::from("reports/figures"),
            out_path: PathBuf::from("docs/dashboard.html"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportResult {
    pub out_path: PathBuf,
    pub sections: usize,
    pub points: usize,
    pub bytes_written: u64,
}

/// Load the KPI CSVs, build the six sections and write the page atomically.
pub fn render_dashboard(options: &ReportOptions) -> Result<ReportResult> {
    let start = Instant::now();
    let out_path = checked_out_path(&options.out_path)?;

    let kpis = load_kpis(&options.figures_dir)?;
    let sections = build_sections(&kpis);
    let html = render_html(&sections)?;
    write_bytes_atomic(out_path, html.as_bytes())?;

    let points = sections.iter().map(|section| section.figure.points()).sum();
    info!(
        event = "dashboard_written",
        path = %out_path.display(),
        sections = sections.len(),
        points,
        bytes = html.len(),
        duration_ms = start.elapsed().as_millis() as u64
    );

    Ok(ReportResult {
        out_path: out_path.to_path_buf(),
        sections: sections.len(),
        points,
        bytes_written: html.len() as u64,
    })
}

fn checked_out_path(path: &Path) -> Result<&Path> {
    if path.file_name().is_none() || path.is_dir() {
        return Err(ReportError::InvalidOutput(path.to_path_buf()));
    }
    Ok(path)
}

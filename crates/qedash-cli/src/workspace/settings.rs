use std::path::PathBuf;

use qedash_metrics::{EngagementWeights, MetricsOptions};
use qedash_store::StoreOptions;
use serde::{Deserialize, Serialize};

use super::atomic::write_bytes_atomic;
use super::{WorkspacePaths, WorkspaceResult};

/// Workspace-relative locations of inputs and artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub plan_path: PathBuf,
    /// CSV snapshots of generated datasets.
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub figures_dir: PathBuf,
    pub dashboard_path: PathBuf,
    pub runs_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            plan_path: PathBuf::from("plans/default.plan.json"),
            data_dir: PathBuf::from("data/generated"),
            db_path: PathBuf::from("data/qe.db"),
            figures_dir: PathBuf::from("reports/figures"),
            dashboard_path: PathBuf::from("docs/dashboard.html"),
            runs_dir: PathBuf::from("runs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Also write per-table CSVs when building the database.
    pub write_csv: bool,
    pub strict: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            write_csv: false,
            strict: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSettings {
    pub pass_mark: f64,
    pub risk_quantile: f64,
    pub weights: EngagementWeights,
}

impl Default for MetricSettings {
    fn default() -> Self {
        let defaults = MetricsOptions::default();
        Self {
            pass_mark: defaults.pass_mark,
            risk_quantile: defaults.risk_quantile,
            weights: defaults.weights,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    pub paths: PathSettings,
    pub generation: GenerationSettings,
    pub store: StoreOptions,
    pub metrics: MetricSettings,
}

pub fn load_or_create_settings(paths: &WorkspacePaths) -> WorkspaceResult<WorkspaceSettings> {
    let path = paths.settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        let settings: WorkspaceSettings = toml::from_str(&content)?;
        return Ok(settings);
    }

    let settings = WorkspaceSettings::default();
    save_settings(paths, &settings)?;
    Ok(settings)
}

pub fn save_settings(paths: &WorkspacePaths, settings: &WorkspaceSettings) -> WorkspaceResult<()> {
    let path = paths.settings_path();
    let encoded = toml::to_string_pretty(settings)?;
    write_bytes_atomic(&path, encoded.as_bytes())
}

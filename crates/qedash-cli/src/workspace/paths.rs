use std::path::{Path, PathBuf};

use super::{PathSettings, WorkspaceError, WorkspaceResult};

/// Resolved locations inside a workspace root.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub figures_dir: PathBuf,
    pub dashboard_path: PathBuf,
    pub runs_dir: PathBuf,
    pub plan_path: PathBuf,
}

impl WorkspacePaths {
    /// Paths before settings are read; only `config_dir` is meaningful.
    pub fn new(root: PathBuf) -> Self {
        Self::with_settings(root, &PathSettings::default())
    }

    pub fn with_settings(root: PathBuf, settings: &PathSettings) -> Self {
        let config_dir = root.join("config");
        Self {
            data_dir: resolve(&root, &settings.data_dir),
            db_path: resolve(&root, &settings.db_path),
            figures_dir: resolve(&root, &settings.figures_dir),
            dashboard_path: resolve(&root, &settings.dashboard_path),
            runs_dir: resolve(&root, &settings.runs_dir),
            plan_path: resolve(&root, &settings.plan_path),
            config_dir,
            root,
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.toml")
    }

    /// Resolve a user-supplied path against the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        resolve(&self.root, path)
    }

    pub fn ensure_dirs(&self) -> WorkspaceResult<()> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(WorkspaceError::Invalid(format!(
                "workspace root is not a directory: {}",
                self.root.display()
            )));
        }
        create_if_missing(&self.config_dir)?;
        create_if_missing(&self.runs_dir)?;
        Ok(())
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn create_if_missing(path: &Path) -> WorkspaceResult<()> {
    if path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(WorkspaceError::from)
}

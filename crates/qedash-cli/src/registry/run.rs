use std::fs::{OpenOptions, create_dir_all};
use std::path::PathBuf;
use std::process::Command;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::workspace::write_json_atomic;

use super::RegistryResult;

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Subcommand that opened the run.
    pub command: String,
    pub runs_dir: PathBuf,
    /// Resolved options of the command, recorded verbatim.
    pub options: Value,
}

impl RunContext {
    pub fn new(command: &str, runs_dir: PathBuf, options: Value) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            command: command.to_string(),
            runs_dir,
            options,
        }
    }
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub command: String,
    pub cli_version: String,
    pub schema_version: String,
    pub plan_version: String,
    pub options: Value,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub logs_path: PathBuf,
}

/// Create `runs/<timestamp>__run_<id>/` with `config.json` and an empty log file.
pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx
        .runs_dir
        .join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let config_path = root.join("config.json");
    let logs_path = root.join("logs.ndjson");

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        command: ctx.command.clone(),
        cli_version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: qedash_core::SCHEMA_VERSION.to_string(),
        plan_version: qedash_plan::PLAN_VERSION.to_string(),
        options: ctx.options.clone(),
        git: collect_git_info(),
    };

    write_json_atomic(&config_path, &config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logs_path)?;

    Ok(RunPaths {
        root,
        config_path,
        logs_path,
    })
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_directory_carries_config_and_log() {
        let runs_dir =
            std::env::temp_dir().join(format!("qedash_runs_{}", uuid::Uuid::new_v4()));
        let options = serde_json::json!({"pass_mark": 40.0});
        let ctx = RunContext::new("export", runs_dir.clone(), options);

        let paths = start_run(&ctx).expect("start run");
        let dir_name = paths
            .root
            .file_name()
            .expect("dir name")
            .to_string_lossy()
            .to_string();
        assert!(dir_name.ends_with(&format!("__run_{}", ctx.run_id)));
        assert!(paths.logs_path.exists());

        let config: Value =
            serde_json::from_slice(&std::fs::read(&paths.config_path).expect("read config"))
                .expect("parse config");
        assert_eq!(config["command"], "export");
        assert_eq!(config["options"]["pass_mark"], 40.0);
        let _ = std::fs::remove_dir_all(runs_dir);
    }
}

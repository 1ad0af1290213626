use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn temp_workspace(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("qedash_cli_{label}_{}", uuid::Uuid::new_v4()))
}

fn small_plan() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../plans/small.plan.json")
}

fn qedash(workspace: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qedash"))
        .arg("--workspace")
        .arg(workspace)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("spawn qedash")
}

fn stdout_value(output: &Output, key: &str) -> Option<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .find_map(|line| line.strip_prefix(&format!("{key}=")).map(str::to_string))
}

#[test]
fn run_builds_database_exports_and_dashboard() {
    let workspace = temp_workspace("run");
    let plan = small_plan();
    let output = qedash(
        &workspace,
        &["run", "--plan", plan.to_str().expect("utf8 path"), "--csv"],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert!(workspace.join("config/settings.toml").exists());
    assert!(workspace.join("data/qe.db").exists());
    for file in [
        "kpi_pass_rate.csv",
        "assessment_turnaround_bins.csv",
        "engagement_index.csv",
        "at_risk_modules.csv",
    ] {
        assert!(workspace.join("reports/figures").join(file).exists(), "{file}");
    }
    let html = std::fs::read_to_string(workspace.join("docs/dashboard.html")).expect("dashboard");
    assert!(html.contains("Quality Enhancement Dashboard"));

    let csv_dir = stdout_value(&output, "csv_dir").expect("csv dir printed");
    assert!(Path::new(&csv_dir).join("grades.csv").exists());

    let run_dir = PathBuf::from(stdout_value(&output, "run_dir").expect("run dir printed"));
    assert!(run_dir.starts_with(workspace.join("runs")));
    let config: serde_json::Value =
        serde_json::from_slice(&std::fs::read(run_dir.join("config.json")).expect("config"))
            .expect("parse config");
    assert_eq!(config["command"], "run");
    assert_eq!(config["options"]["export"]["metrics"]["pass_mark"], 40.0);

    let logs = std::fs::read_to_string(run_dir.join("logs.ndjson")).expect("logs");
    assert!(logs.lines().any(|line| line.contains("run_finished")));
    for line in logs.lines() {
        serde_json::from_str::<serde_json::Value>(line).expect("json log line");
    }

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn export_without_database_fails() {
    let workspace = temp_workspace("nodb");
    let output = qedash(&workspace, &["export"]);
    assert!(!output.status.success());
    assert!(!workspace.join("reports/figures/kpi_pass_rate.csv").exists());
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn schema_prints_plan_schema() {
    let workspace = temp_workspace("schema");
    let output = qedash(&workspace, &["schema"]);
    assert!(output.status.success());
    let schema: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("schema is json");
    assert_eq!(schema["title"], "Plan");
    assert!(schema["properties"]["seed"].is_object());
    let _ = std::fs::remove_dir_all(workspace);
}

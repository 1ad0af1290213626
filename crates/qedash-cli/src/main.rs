mod commands;
mod registry;
mod workspace;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use qedash_generate::GenerationError;
use qedash_metrics::MetricsError;
use qedash_plan::PlanError;
use qedash_report::ReportError;
use qedash_store::StoreError;
use registry::{RunContext, init_logging, init_run_logging, start_run};
use thiserror::Error;

use commands::{BuildDbOptions, ExportOptions, Workspace};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("workspace error: {0}")]
    Workspace(#[from] workspace::WorkspaceError),
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("report error: {0}")]
    Report(#[from] ReportError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("integrity check failed: {0}")]
    Integrity(String),
}

#[derive(Parser, Debug)]
#[command(
    name = "qedash",
    version,
    about = "Synthetic Quality Enhancement data, KPI exports and a static dashboard"
)]
struct Cli {
    /// Workspace root holding config/, data/, reports/, docs/ and runs/.
    #[arg(long, global = true, default_value = ".")]
    workspace: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the dataset and load it into a fresh SQLite database.
    BuildDb(BuildDbArgs),
    /// Compute the KPI tables from the database and write them as CSV.
    Export(ExportArgs),
    /// Render the dashboard HTML from the exported KPI tables.
    Report(ReportArgs),
    /// build-db, export and report in one run.
    Run(RunArgs),
    /// Print the JSON Schema of plan files.
    Schema(SchemaArgs),
}

#[derive(Args, Debug, Clone)]
struct BuildDbArgs {
    /// Plan file; defaults to the workspace plan, or the built-in plan when absent.
    #[arg(long)]
    plan: Option<PathBuf>,
    /// Database file to (re)create.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Override the plan seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Also write per-table CSVs into the data directory.
    #[arg(long, default_value_t = false)]
    csv: bool,
}

#[derive(Args, Debug, Clone)]
struct ExportArgs {
    #[arg(long)]
    db: Option<PathBuf>,
    /// Directory for the KPI CSVs.
    #[arg(long)]
    out: Option<PathBuf>,
    /// A student passes when their mean score is above this percentage.
    #[arg(long)]
    pass_mark: Option<f64>,
    /// Quantile used as the at-risk cut for module survey score and pass rate.
    #[arg(long)]
    risk_quantile: Option<f64>,
}

#[derive(Args, Debug, Clone)]
struct ReportArgs {
    /// Directory holding the KPI CSVs.
    #[arg(long)]
    figures: Option<PathBuf>,
    /// Output HTML file.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    #[arg(long)]
    plan: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = false)]
    csv: bool,
    #[arg(long)]
    pass_mark: Option<f64>,
    #[arg(long)]
    risk_quantile: Option<f64>,
}

#[derive(Args, Debug, Clone)]
struct SchemaArgs {
    /// Write the schema to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    if let Command::Schema(args) = &cli.command {
        init_logging()?;
        return commands::print_schema(&cli.workspace, args.out.as_deref());
    }

    let workspace = Workspace::open(cli.workspace.clone())?;
    let (name, options) = resolved_options(&workspace, &cli.command)?;

    let ctx = RunContext::new(name, workspace.paths.runs_dir.clone(), options);
    let run_paths = start_run(&ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(
        event = "run_started",
        run_id = %ctx.run_id,
        command = name,
        workspace = %workspace.paths.root.display(),
        config = %run_paths.config_path.display()
    );
    let timer = Instant::now();

    let outcome = dispatch(&workspace, cli.command).await;
    let duration_ms = timer.elapsed().as_millis() as u64;
    match &outcome {
        Ok(()) => {
            tracing::info!(event = "run_finished", status = "success", duration_ms);
            println!("run_dir={}", run_paths.root.display());
        }
        Err(err) => {
            tracing::error!(event = "run_finished", status = "failed", error = %err, duration_ms);
        }
    }
    outcome
}

async fn dispatch(workspace: &Workspace, command: Command) -> Result<(), CliError> {
    match command {
        Command::BuildDb(args) => {
            let options = build_db_options(workspace, &args);
            commands::build_db(workspace, &options).await?;
        }
        Command::Export(args) => {
            let options = export_options(workspace, &args);
            commands::export(&options).await?;
        }
        Command::Report(args) => {
            commands::report(workspace, args.figures.as_deref(), args.out.as_deref())?;
        }
        Command::Run(args) => {
            let (build, export) = run_options(workspace, &args);
            commands::build_db(workspace, &build).await?;
            commands::export(&export).await?;
            commands::report(workspace, None, None)?;
        }
        Command::Schema(args) => {
            commands::print_schema(&workspace.paths.root, args.out.as_deref())?;
        }
    }
    Ok(())
}

/// Subcommand name and the options recorded in `config.json`.
fn resolved_options(
    workspace: &Workspace,
    command: &Command,
) -> Result<(&'static str, serde_json::Value), CliError> {
    let resolved = match command {
        Command::BuildDb(args) => (
            "build-db",
            serde_json::to_value(build_db_options(workspace, args))?,
        ),
        Command::Export(args) => (
            "export",
            serde_json::to_value(export_options(workspace, args))?,
        ),
        Command::Report(args) => {
            let (figures_dir, out_path) =
                workspace.report_paths(args.figures.as_deref(), args.out.as_deref());
            (
                "report",
                serde_json::json!({ "figures_dir": figures_dir, "out_path": out_path }),
            )
        }
        Command::Run(args) => {
            let (build, export) = run_options(workspace, args);
            (
                "run",
                serde_json::json!({ "build_db": build, "export": export }),
            )
        }
        Command::Schema(_) => ("schema", serde_json::Value::Null),
    };
    Ok(resolved)
}

fn build_db_options(workspace: &Workspace, args: &BuildDbArgs) -> BuildDbOptions {
    workspace.build_db_options(args.plan.as_deref(), args.db.as_deref(), args.seed, args.csv)
}

fn export_options(workspace: &Workspace, args: &ExportArgs) -> ExportOptions {
    workspace.export_options(
        args.db.as_deref(),
        args.out.as_deref(),
        args.pass_mark,
        args.risk_quantile,
    )
}

fn run_options(workspace: &Workspace, args: &RunArgs) -> (BuildDbOptions, ExportOptions) {
    (
        workspace.build_db_options(args.plan.as_deref(), None, args.seed, args.csv),
        workspace.export_options(None, None, args.pass_mark, args.risk_quantile),
    )
}

use std::path::{Path, PathBuf};

use qedash_generate::{GenerateOptions, GenerationEngine};
use qedash_metrics::{MetricsEngine, MetricsOptions};
use qedash_plan::{Plan, load_plan, plan_json_schema};
use qedash_report::{ReportOptions, render_dashboard};
use qedash_store::sqlite::queries;
use qedash_store::{SqliteStore, StoreOptions};
use serde::Serialize;
use tracing::{info, warn};

use crate::CliError;
use crate::workspace::{
    WorkspacePaths, WorkspaceSettings, load_or_create_settings, write_bytes_atomic,
};

/// Workspace root with its settings applied.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub paths: WorkspacePaths,
    pub settings: WorkspaceSettings,
}

/// Resolved `build-db` inputs.
#[derive(Debug, Clone, Serialize)]
pub struct BuildDbOptions {
    /// `None` selects the built-in plan.
    pub plan_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub db_path: PathBuf,
    pub csv_dir: Option<PathBuf>,
    pub strict: bool,
    pub store: StoreOptions,
}

/// Resolved `export` inputs.
#[derive(Debug, Clone, Serialize)]
pub struct ExportOptions {
    pub db_path: PathBuf,
    pub metrics: MetricsOptions,
}

impl Workspace {
    /// Read (or create) `config/settings.toml` under `root` and resolve paths.
    pub fn open(root: PathBuf) -> Result<Self, CliError> {
        let base = WorkspacePaths::new(root.clone());
        let settings = load_or_create_settings(&base)?;
        let paths = WorkspacePaths::with_settings(root, &settings.paths);
        paths.ensure_dirs()?;
        Ok(Self { paths, settings })
    }

    pub fn build_db_options(
        &self,
        plan: Option<&Path>,
        db: Option<&Path>,
        seed: Option<u64>,
        csv: bool,
    ) -> BuildDbOptions {
        let plan_path = match plan {
            Some(path) => Some(self.paths.resolve(path)),
            None if self.paths.plan_path.exists() => Some(self.paths.plan_path.clone()),
            None => None,
        };
        let write_csv = csv || self.settings.generation.write_csv;
        BuildDbOptions {
            plan_path,
            seed,
            db_path: db
                .map(|path| self.paths.resolve(path))
                .unwrap_or_else(|| self.paths.db_path.clone()),
            csv_dir: write_csv.then(|| self.paths.data_dir.clone()),
            strict: self.settings.generation.strict,
            store: self.settings.store.clone(),
        }
    }

    pub fn export_options(
        &self,
        db: Option<&Path>,
        out: Option<&Path>,
        pass_mark: Option<f64>,
        risk_quantile: Option<f64>,
    ) -> ExportOptions {
        let metrics = &self.settings.metrics;
        ExportOptions {
            db_path: db
                .map(|path| self.paths.resolve(path))
                .unwrap_or_else(|| self.paths.db_path.clone()),
            metrics: MetricsOptions {
                out_dir: out
                    .map(|path| self.paths.resolve(path))
                    .unwrap_or_else(|| self.paths.figures_dir.clone()),
                pass_mark: pass_mark.unwrap_or(metrics.pass_mark),
                risk_quantile: risk_quantile.unwrap_or(metrics.risk_quantile),
                weights: metrics.weights,
            },
        }
    }

    pub fn report_paths(&self, figures: Option<&Path>, out: Option<&Path>) -> (PathBuf, PathBuf) {
        (
            figures
                .map(|path| self.paths.resolve(path))
                .unwrap_or_else(|| self.paths.figures_dir.clone()),
            out.map(|path| self.paths.resolve(path))
                .unwrap_or_else(|| self.paths.dashboard_path.clone()),
        )
    }
}

/// Load the plan named by the options, falling back to the built-in plan.
pub fn resolve_plan(options: &BuildDbOptions) -> Result<Plan, CliError> {
    let plan = match &options.plan_path {
        Some(path) => {
            let validated = load_plan(path)?;
            for issue in &validated.warnings {
                warn!(
                    event = "plan_warning",
                    code = %issue.code,
                    path = %issue.path,
                    message = %issue.message
                );
            }
            info!(event = "plan_loaded", path = %path.display(), seed = validated.plan.seed);
            validated.plan
        }
        None => {
            info!(event = "plan_builtin", "no plan file found, using the built-in plan");
            Plan::default()
        }
    };
    Ok(match options.seed {
        Some(seed) => plan.with_seed(seed),
        None => plan,
    })
}

/// Generate the dataset and rebuild the database from it.
pub async fn build_db(workspace: &Workspace, options: &BuildDbOptions) -> Result<(), CliError> {
    let plan = resolve_plan(options)?;
    let generate_options = GenerateOptions {
        out_dir: options
            .csv_dir
            .clone()
            .unwrap_or_else(|| workspace.paths.data_dir.clone()),
        flat: false,
        strict: options.strict,
    };
    let engine = GenerationEngine::new(generate_options);

    let dataset = match &options.csv_dir {
        Some(_) => {
            let result = engine.run(&plan)?;
            println!("csv_dir={}", result.run_dir.display());
            result.dataset
        }
        None => engine.generate(&plan)?,
    };

    let (store, summary) = SqliteStore::build(
        &options.db_path,
        engine.schema(),
        &dataset,
        options.store.clone(),
    )
    .await?;

    let violations = queries::foreign_key_violations(store.pool()).await?;
    store.close().await;
    if violations > 0 {
        return Err(CliError::Integrity(format!(
            "{violations} foreign key violations in {}",
            options.db_path.display()
        )));
    }

    info!(
        event = "database_built",
        db = %options.db_path.display(),
        seed = plan.seed,
        rows = summary.rows_total,
        duration_ms = summary.duration_ms
    );
    println!("db={}", options.db_path.display());
    Ok(())
}

/// Write the four KPI CSVs plus summary and markdown report.
pub async fn export(options: &ExportOptions) -> Result<(), CliError> {
    let store = SqliteStore::open(&options.db_path).await?;
    let result = MetricsEngine::new(options.metrics.clone()).run(&store).await;
    store.close().await;
    let result = result?;

    println!("figures_dir={}", result.out_dir.display());
    println!("at_risk_modules={}", result.summary.at_risk_modules);
    Ok(())
}

pub fn report(
    workspace: &Workspace,
    figures: Option<&Path>,
    out: Option<&Path>,
) -> Result<(), CliError> {
    let (figures_dir, out_path) = workspace.report_paths(figures, out);
    let result = render_dashboard(&ReportOptions {
        figures_dir,
        out_path,
    })?;
    println!("dashboard={}", result.out_path.display());
    Ok(())
}

/// Print the plan JSON Schema, or write it to `out` relative to `root`.
pub fn print_schema(root: &Path, out: Option<&Path>) -> Result<(), CliError> {
    let schema = serde_json::to_string_pretty(&plan_json_schema())?;
    match out {
        Some(path) => {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                root.join(path)
            };
            write_bytes_atomic(&path, schema.as_bytes())?;
            info!(event = "schema_written", path = %path.display());
        }
        None => println!("{schema}"),
    }
    Ok(())
}

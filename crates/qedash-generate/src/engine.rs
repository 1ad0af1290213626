use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use qedash_core::{DatasetSchema, qe_schema, validate_schema};
use qedash_plan::Plan;

use crate::checks::verify_dataset;
use crate::dataset::{Dataset, TableData};
use crate::errors::GenerationError;
use crate::foreign::ParentKeys;
use crate::generators::{GeneratorContext, GeneratorRegistry};
use crate::model::{GenerateOptions, GenerationIssue, GenerationReport, TableReport};
use crate::output::csv::write_table_csv;
use crate::planner::plan_tables;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub run_dir: PathBuf,
    pub report: GenerationReport,
    pub dataset: Dataset,
}

/// Entry point for generating the synthetic dataset from a plan.
#[derive(Debug)]
pub struct GenerationEngine {
    options: GenerateOptions,
    schema: DatasetSchema,
    registry: GeneratorRegistry,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            options,
            schema: qe_schema(),
            registry: GeneratorRegistry::new(),
        }
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// Generate every table in memory.
    pub fn generate(&self, plan: &Plan) -> Result<Dataset, GenerationError> {
        let mut report = GenerationReport::new(String::new(), plan.seed);
        self.generate_into(plan, &mut report)
    }

    /// Generate, then write one CSV per table plus `generation_report.json`.
    pub fn run(&self, plan: &Plan) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let run_dir = if self.options.flat {
            self.options.out_dir.clone()
        } else {
            let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
            self.options
                .out_dir
                .join(format!("{timestamp}__run_{run_id}"))
        };
        std::fs::create_dir_all(&run_dir)?;
        std::fs::write(
            run_dir.join("resolved_plan.json"),
            serde_json::to_vec_pretty(plan)?,
        )?;

        let mut report = GenerationReport::new(run_id.clone(), plan.seed);
        info!(
            run_id = %run_id,
            seed = plan.seed,
            run_dir = %run_dir.display(),
            "generation started"
        );

        let dataset = match self.generate_into(plan, &mut report) {
            Ok(dataset) => dataset,
            Err(err) => {
                report.duration_ms = start.elapsed().as_millis() as u64;
                write_report(&run_dir, &report)?;
                warn!(run_id = %run_id, error = %err, "generation failed");
                return Err(err);
            }
        };

        let mut digest = Sha256::new();
        for table in &dataset.tables {
            let csv_path = run_dir.join(format!("{}.csv", table.name));
            let bytes = write_table_csv(&csv_path, table, &mut digest)?;
            if let Some(entry) = report.tables.iter_mut().find(|entry| entry.table == table.name) {
                entry.bytes_written = bytes;
            }
            report.bytes_written += bytes;
            debug!(table = %table.name, bytes, path = %csv_path.display(), "csv written");
        }
        report.fingerprint = Some(hex::encode(digest.finalize()));
        report.duration_ms = start.elapsed().as_millis() as u64;
        write_report(&run_dir, &report)?;

        info!(
            run_id = %run_id,
            tables = report.tables.len(),
            rows_total = report.rows_total,
            bytes_written = report.bytes_written,
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(GenerationResult {
            run_dir,
            report,
            dataset,
        })
    }

    fn generate_into(
        &self,
        plan: &Plan,
        report: &mut GenerationReport,
    ) -> Result<Dataset, GenerationError> {
        validate_schema(&self.schema)?;
        let tasks = plan_tables(&self.schema, &self.registry, plan)?;
        let mut parents = ParentKeys::new();

        for task in tasks {
            let table_start = Instant::now();
            let table = self
                .schema
                .table(&task.table)
                .ok_or_else(|| GenerationError::UnknownTable(task.table.clone()))?;
            let generator = self
                .registry
                .get(&task.table)
                .ok_or_else(|| GenerationError::UnknownTable(task.table.clone()))?;

            let mut rng = ChaCha8Rng::seed_from_u64(hash_seed(plan.seed, &task.table));
            let (rows, issues) = {
                let mut ctx = GeneratorContext::new(plan, table, &parents);
                let rows = generator.generate(&mut ctx, &mut rng)?;
                (rows, ctx.issues)
            };

            for issue in issues {
                log_issue(&issue);
                report.record_warning(issue);
            }

            let data = TableData::new(table, rows);
            if let Some(requested) = task.rows {
                if requested != data.len() as u64 {
                    let issue = GenerationIssue::warning(
                        "row_count_mismatch",
                        &task.table,
                        format!("requested {requested} rows, generated {}", data.len()),
                    );
                    log_issue(&issue);
                    report.record_warning(issue);
                }
            }

            let rows_generated = data.len() as u64;
            parents.ingest_table(table, data)?;
            let duration_ms = table_start.elapsed().as_millis() as u64;
            report.record_table(TableReport {
                table: task.table.clone(),
                rows_requested: task.rows,
                rows_generated,
                bytes_written: 0,
                duration_ms,
            });

            info!(
                table = %task.table,
                rows_generated,
                duration_ms,
                "table generated"
            );
        }

        let dataset = parents.into_dataset(plan.seed);
        for issue in verify_dataset(&self.schema, &dataset) {
            log_issue(&issue);
            report.record_violation(issue);
        }

        if self.options.strict && !report.violations.is_empty() {
            return Err(GenerationError::Failed(Box::new(report.clone())));
        }

        Ok(dataset)
    }
}

fn write_report(run_dir: &Path, report: &GenerationReport) -> Result<(), GenerationError> {
    std::fs::write(
        run_dir.join("generation_report.json"),
        serde_json::to_vec_pretty(report)?,
    )?;
    Ok(())
}

fn log_issue(issue: &GenerationIssue) {
    warn!(
        code = %issue.code,
        level = %issue.level,
        table = issue.table.as_deref().unwrap_or(""),
        column = issue.column.as_deref().unwrap_or(""),
        message = %issue.message
    );
}

/// Per-table RNG stream seed.
pub(crate) fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

use std::fs;
use std::path::Path;

use jsonschema::JSONSchema;
use serde_json::Value;

use crate::errors::{IssueSeverity, PlanError, ValidationIssue, ValidationReport};
use crate::model::{FloatRange, IntRange, PLAN_VERSION, Plan};
use crate::schema::plan_json_schema;

/// Likert scale bounds for survey scores.
const LIKERT_MIN: f64 = 1.0;
const LIKERT_MAX: f64 = 5.0;

/// Validated plan with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedPlan {
    pub plan: Plan,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a plan JSON document against the generated plan JSON Schema.
pub fn validate_plan_json(plan_json: &Value) -> Result<ValidationReport, PlanError> {
    let plan_schema = serde_json::to_value(plan_json_schema())?;
    let compiled =
        JSONSchema::compile(&plan_schema).map_err(|err| PlanError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(plan_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Check value-level rules the JSON Schema cannot express.
pub fn validate_plan_values(plan: &Plan) -> ValidationReport {
    let mut report = ValidationReport::default();

    if plan.plan_version != PLAN_VERSION {
        report.push_warning(ValidationIssue::new(
            IssueSeverity::Warning,
            "plan_version_mismatch",
            "/plan_version",
            format!(
                "plan_version '{}' differs from supported '{}'",
                plan.plan_version, PLAN_VERSION
            ),
            Some(format!("set plan_version to \"{PLAN_VERSION}\"")),
        ));
    }

    let volumes = &plan.volumes;
    check_positive(volumes.students, "/volumes/students", &mut report);
    if volumes.support_usage_rows == 0 {
        report.push_warning(ValidationIssue::new(
            IssueSeverity::Warning,
            "empty_table",
            "/volumes/support_usage_rows",
            "no support usage rows; support participation will be zero",
            None,
        ));
    }

    let curriculum = &plan.curriculum;
    check_positive(
        u64::from(curriculum.modules_per_offering),
        "/curriculum/modules_per_offering",
        &mut report,
    );
    check_int_range(curriculum.modules_taken, "/curriculum/modules_taken", &mut report);
    if curriculum.modules_taken.min < 1 {
        report.push_error(ValidationIssue::error(
            "range_out_of_bounds",
            "/curriculum/modules_taken/min",
            "students must take at least one module per term",
        ));
    }
    if curriculum.modules_taken.max > i64::from(curriculum.modules_per_offering) {
        report.push_warning(ValidationIssue::new(
            IssueSeverity::Warning,
            "modules_taken_capped",
            "/curriculum/modules_taken/max",
            "modules_taken exceeds modules_per_offering and will be capped",
            None,
        ));
    }
    check_int_range(curriculum.credits, "/curriculum/credits", &mut report);
    check_non_negative(curriculum.credits, "/curriculum/credits", &mut report);

    check_int_range(
        plan.admissions.decision_offset_days,
        "/admissions/decision_offset_days",
        &mut report,
    );
    check_non_negative(
        plan.admissions.decision_offset_days,
        "/admissions/decision_offset_days",
        &mut report,
    );

    let assessments = &plan.assessments;
    check_int_range(
        assessments.due_offset_days,
        "/assessments/due_offset_days",
        &mut report,
    );
    check_non_negative(
        assessments.due_offset_days,
        "/assessments/due_offset_days",
        &mut report,
    );
    check_int_range(
        assessments.turnaround_days,
        "/assessments/turnaround_days",
        &mut report,
    );
    check_non_negative(
        assessments.turnaround_days,
        "/assessments/turnaround_days",
        &mut report,
    );
    check_float_range(assessments.weight, "/assessments/weight", &mut report);
    if assessments.weight.min < 0.0 || assessments.weight.max > 1.0 {
        report.push_error(ValidationIssue::error(
            "range_out_of_bounds",
            "/assessments/weight",
            "assessment weight must lie within [0, 1]",
        ));
    }

    let grading = &plan.grading;
    if !grading.std_dev.is_finite() || grading.std_dev < 0.0 {
        report.push_error(ValidationIssue::error(
            "invalid_std_dev",
            "/grading/std_dev",
            "std_dev must be a finite non-negative number",
        ));
    }
    if !(grading.min < grading.max) {
        report.push_error(ValidationIssue::error(
            "invalid_range",
            "/grading",
            format!(
                "grading min {} must be below max {}",
                grading.min, grading.max
            ),
        ));
    }

    let surveys = &plan.surveys;
    check_float_range(surveys.mean_score, "/surveys/mean_score", &mut report);
    if surveys.mean_score.min < LIKERT_MIN || surveys.mean_score.max > LIKERT_MAX {
        report.push_error(ValidationIssue::error(
            "range_out_of_bounds",
            "/surveys/mean_score",
            format!("survey scores must lie within [{LIKERT_MIN}, {LIKERT_MAX}]"),
        ));
    }
    check_int_range(surveys.responses, "/surveys/responses", &mut report);
    check_non_negative(surveys.responses, "/surveys/responses", &mut report);

    check_int_range(plan.support.visits, "/support/visits", &mut report);
    if plan.support.visits.min < 1 {
        report.push_error(ValidationIssue::error(
            "range_out_of_bounds",
            "/support/visits/min",
            "a support usage row records at least one visit",
        ));
    }

    let complaints = &plan.complaints;
    check_int_range(
        complaints.submitted_offset_days,
        "/complaints/submitted_offset_days",
        &mut report,
    );
    check_non_negative(
        complaints.submitted_offset_days,
        "/complaints/submitted_offset_days",
        &mut report,
    );
    check_int_range(
        complaints.resolution_days,
        "/complaints/resolution_days",
        &mut report,
    );
    check_non_negative(
        complaints.resolution_days,
        "/complaints/resolution_days",
        &mut report,
    );

    let placements = &plan.placements;
    check_int_range(
        placements.start_offset_days,
        "/placements/start_offset_days",
        &mut report,
    );
    check_non_negative(
        placements.start_offset_days,
        "/placements/start_offset_days",
        &mut report,
    );
    check_int_range(
        placements.duration_days,
        "/placements/duration_days",
        &mut report,
    );
    check_non_negative(
        placements.duration_days,
        "/placements/duration_days",
        &mut report,
    );

    report
}

/// Validate the plan end-to-end, returning structured issues on failure.
pub fn validate_plan(plan_json: &Value) -> Result<ValidatedPlan, ValidationReport> {
    let structural = match validate_plan_json(plan_json) {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::error(
                "schema_validation_error",
                "/",
                err.to_string(),
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let plan: Plan = match serde_json::from_value(plan_json.clone()) {
        Ok(plan) => plan,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::error(
                "invalid_plan_json",
                "/",
                err.to_string(),
            ));
            return Err(report);
        }
    };

    let values_report = validate_plan_values(&plan);
    if !values_report.is_ok() {
        return Err(values_report);
    }

    Ok(ValidatedPlan {
        plan,
        warnings: values_report.warnings,
    })
}

/// Read and validate a `plan.json` file.
pub fn load_plan(path: &Path) -> Result<ValidatedPlan, PlanError> {
    let contents = fs::read_to_string(path)?;
    let plan_json: Value = serde_json::from_str(&contents)?;
    validate_plan(&plan_json).map_err(PlanError::Invalid)
}

fn check_positive(value: u64, path: &str, report: &mut ValidationReport) {
    if value == 0 {
        report.push_error(ValidationIssue::error(
            "non_positive",
            path,
            "value must be greater than zero",
        ));
    }
}

fn check_int_range(range: IntRange, path: &str, report: &mut ValidationReport) {
    if range.min > range.max {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "invalid_range",
            path,
            format!("min {} is greater than max {}", range.min, range.max),
            Some("swap min and max".to_string()),
        ));
    }
}

fn check_non_negative(range: IntRange, path: &str, report: &mut ValidationReport) {
    if range.min < 0 {
        report.push_error(ValidationIssue::error(
            "range_out_of_bounds",
            format!("{path}/min"),
            "value must not be negative",
        ));
    }
}

fn check_float_range(range: FloatRange, path: &str, report: &mut ValidationReport) {
    if !range.min.is_finite() || !range.max.is_finite() || range.min >= range.max {
        report.push_error(ValidationIssue::error(
            "invalid_range",
            path,
            format!(
                "min {} must be finite and below max {}",
                range.min, range.max
            ),
        ));
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

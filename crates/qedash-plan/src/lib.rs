//! Generation plan contracts and validation.
//!
//! A plan fixes the seed, the volumes and the value ranges used by the
//! generator. `Plan::default()` reproduces the reference demo dataset.

pub mod errors;
pub mod model;
pub mod schema;
pub mod validate;

pub use errors::{IssueSeverity, PlanError, Result, ValidationIssue, ValidationReport};
pub use model::{
    AdmissionsPlan, AssessmentPlan, ComplaintsPlan, CurriculumPlan, FloatRange, GradingPlan,
    IntRange, PLAN_VERSION, Plan, PlacementsPlan, SupportPlan, SurveyPlan, Volumes,
};
pub use schema::plan_json_schema;
pub use validate::{
    ValidatedPlan, load_plan, validate_plan, validate_plan_json, validate_plan_values,
};

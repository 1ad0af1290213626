use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Contract version for the plan format.
pub const PLAN_VERSION: &str = "0.1";

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

/// Half-open float range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
}

impl FloatRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Row volumes for the independently sized tables.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Volumes {
    /// Number of students (and admissions, one per student).
    pub students: u64,
    /// Rows of support service usage.
    pub support_usage_rows: u64,
    pub complaints: u64,
    pub placements: u64,
}

impl Default for Volumes {
    fn default() -> Self {
        Self {
            students: 1200,
            support_usage_rows: 8000,
            complaints: 150,
            placements: 900,
        }
    }
}

/// Module offerings and enrolment load.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CurriculumPlan {
    /// Modules offered per programme and term.
    pub modules_per_offering: u32,
    /// Modules a student takes in each term they are enrolled.
    pub modules_taken: IntRange,
    pub credits: IntRange,
}

impl Default for CurriculumPlan {
    fn default() -> Self {
        Self {
            modules_per_offering: 6,
            modules_taken: IntRange::new(4, 6),
            credits: IntRange::new(10, 19),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AdmissionsPlan {
    pub decision_start: NaiveDate,
    pub decision_offset_days: IntRange,
}

impl Default for AdmissionsPlan {
    fn default() -> Self {
        Self {
            decision_start: date(2023, 3, 1),
            decision_offset_days: IntRange::new(0, 119),
        }
    }
}

/// Due dates, marking turnaround and weights of assessments.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AssessmentPlan {
    pub due_start: NaiveDate,
    pub due_offset_days: IntRange,
    /// Days between due date and returned date.
    pub turnaround_days: IntRange,
    pub weight: FloatRange,
}

impl Default for AssessmentPlan {
    fn default() -> Self {
        Self {
            due_start: date(2023, 10, 1),
            due_offset_days: IntRange::new(0, 539),
            turnaround_days: IntRange::new(10, 24),
            weight: FloatRange::new(0.2, 0.6),
        }
    }
}

/// Normal score distribution, clipped to `[min, max]`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GradingPlan {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for GradingPlan {
    fn default() -> Self {
        Self {
            mean: 65.0,
            std_dev: 10.0,
            min: 0.0,
            max: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SurveyPlan {
    /// Mean Likert score on the 1-5 scale.
    pub mean_score: FloatRange,
    pub responses: IntRange,
}

impl Default for SurveyPlan {
    fn default() -> Self {
        Self {
            mean_score: FloatRange::new(3.2, 4.6),
            responses: IntRange::new(15, 219),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SupportPlan {
    pub visits: IntRange,
}

impl Default for SupportPlan {
    fn default() -> Self {
        Self {
            visits: IntRange::new(1, 3),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ComplaintsPlan {
    pub submitted_start: NaiveDate,
    pub submitted_offset_days: IntRange,
    /// Days from submission to resolution.
    pub resolution_days: IntRange,
}

impl Default for ComplaintsPlan {
    fn default() -> Self {
        Self {
            submitted_start: date(2024, 1, 1),
            submitted_offset_days: IntRange::new(0, 499),
            resolution_days: IntRange::new(10, 119),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PlacementsPlan {
    pub start: NaiveDate,
    pub start_offset_days: IntRange,
    pub duration_days: IntRange,
}

impl Default for PlacementsPlan {
    fn default() -> Self {
        Self {
            start: date(2024, 2, 1),
            start_offset_days: IntRange::new(0, 399),
            duration_days: IntRange::new(30, 199),
        }
    }
}

/// Canonical plan definition for generation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// Contract version for the plan format.
    pub plan_version: String,
    /// Seed for reproducibility.
    pub seed: u64,
    #[serde(default)]
    pub volumes: Volumes,
    #[serde(default)]
    pub curriculum: CurriculumPlan,
    #[serde(default)]
    pub admissions: AdmissionsPlan,
    #[serde(default)]
    pub assessments: AssessmentPlan,
    #[serde(default)]
    pub grading: GradingPlan,
    #[serde(default)]
    pub surveys: SurveyPlan,
    #[serde(default)]
    pub support: SupportPlan,
    #[serde(default)]
    pub complaints: ComplaintsPlan,
    #[serde(default)]
    pub placements: PlacementsPlan,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            plan_version: PLAN_VERSION.to_string(),
            seed: 42,
            volumes: Volumes::default(),
            curriculum: CurriculumPlan::default(),
            admissions: AdmissionsPlan::default(),
            assessments: AssessmentPlan::default(),
            grading: GradingPlan::default(),
            surveys: SurveyPlan::default(),
            support: SupportPlan::default(),
            complaints: ComplaintsPlan::default(),
            placements: PlacementsPlan::default(),
        }
    }
}

impl Plan {
    /// Same plan with a different seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

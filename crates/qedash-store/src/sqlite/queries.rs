//! Aggregate queries behind the KPI exports.
//!
//! Programme/term metrics start from the set of offerings in `modules` and
//! LEFT JOIN everything else, so an offering without grades, surveys or
//! enrolments still yields a row with NULL measures.

use serde::Serialize;
use sqlx::SqlitePool;

use qedash_core::DatasetSchema;

use crate::errors::Result;
use crate::sqlite::ddl::quote;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: i64,
}

/// Assessed students and passing students per programme and term.
///
/// A student passes an offering when their mean score over its graded
/// attempts is strictly above the pass mark.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PassRateRow {
    pub programme: String,
    pub term: String,
    pub assessed: i64,
    pub passed: i64,
}

/// Days between due and returned date for one assessment.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TurnaroundRow {
    pub assessment_id: i64,
    pub module_id: i64,
    pub programme: Option<String>,
    pub term: Option<String>,
    pub turnaround_days: Option<i64>,
}

/// Survey, enrolment and support counts per programme and term.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EngagementInputRow {
    pub programme: String,
    pub term: String,
    pub mean_score: Option<f64>,
    pub responses: Option<i64>,
    pub surveys: Option<i64>,
    pub modules: Option<i64>,
    pub enrolments: Option<i64>,
    pub students: Option<i64>,
    pub supported: Option<i64>,
}

/// Mean survey score and assessed/passing student counts per module.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ModuleStatsRow {
    pub module_id: i64,
    pub programme: String,
    pub term: String,
    pub mean_survey: Option<f64>,
    pub assessed: Option<i64>,
    pub passed: Option<i64>,
}

pub async fn table_counts(pool: &SqlitePool, schema: &DatasetSchema) -> Result<Vec<TableCount>> {
    let mut counts = Vec::with_capacity(schema.tables.len());
    for table in &schema.tables {
        let sql = format!("SELECT COUNT(*) FROM {}", quote(&table.name));
        let (rows,): (i64,) = sqlx::query_as(&sql).fetch_one(pool).await?;
        counts.push(TableCount {
            table: table.name.clone(),
            rows,
        });
    }
    Ok(counts)
}

pub async fn list_indexes(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT name
        FROM sqlite_master
        WHERE type = 'index'
          AND name NOT LIKE 'sqlite_%'
        ORDER BY name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Rows reported by `PRAGMA foreign_key_check`.
pub async fn foreign_key_violations(pool: &SqlitePool) -> Result<usize> {
    let rows = sqlx::query("PRAGMA foreign_key_check")
        .fetch_all(pool)
        .await?;
    Ok(rows.len())
}

pub async fn pass_rate_by_programme_term(
    pool: &SqlitePool,
    pass_mark: f64,
) -> Result<Vec<PassRateRow>> {
    let rows = sqlx::query_as::<_, PassRateRow>(
        r#"
        WITH offerings AS (
            SELECT DISTINCT programme, term FROM modules
        ),
        student_scores AS (
            SELECT m.programme, m.term, g.student_id,
                   AVG(g.score_pct) AS mean_score
            FROM grades g
            JOIN assessments a ON a.assessment_id = g.assessment_id
            JOIN modules m ON m.module_id = a.module_id
            GROUP BY m.programme, m.term, g.student_id
        )
        SELECT o.programme AS programme,
               o.term AS term,
               COUNT(ss.student_id) AS assessed,
               COALESCE(SUM(CASE WHEN ss.mean_score > ?1 THEN 1 ELSE 0 END), 0) AS passed
        FROM offerings o
        LEFT JOIN student_scores ss ON ss.programme = o.programme AND ss.term = o.term
        GROUP BY o.programme, o.term
        ORDER BY o.programme, o.term
        "#,
    )
    .bind(pass_mark)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn assessment_turnaround(pool: &SqlitePool) -> Result<Vec<TurnaroundRow>> {
    let rows = sqlx::query_as::<_, TurnaroundRow>(
        r#"
        SELECT a.assessment_id AS assessment_id,
               a.module_id AS module_id,
               m.programme AS programme,
               m.term AS term,
               CAST(julianday(a.returned_date) - julianday(a.due_date) AS INTEGER)
                   AS turnaround_days
        FROM assessments a
        LEFT JOIN modules m ON m.module_id = a.module_id
        ORDER BY a.assessment_id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn engagement_inputs(pool: &SqlitePool) -> Result<Vec<EngagementInputRow>> {
    let rows = sqlx::query_as::<_, EngagementInputRow>(
        r#"
        WITH offerings AS (
            SELECT programme, term, COUNT(*) AS modules
            FROM modules
            GROUP BY programme, term
        ),
        survey_stats AS (
            SELECT m.programme, m.term,
                   AVG(s.mean_score_1_5) AS mean_score,
                   SUM(s.responses) AS responses,
                   COUNT(s.survey_id) AS surveys
            FROM surveys s
            JOIN modules m ON m.module_id = s.module_id
            GROUP BY m.programme, m.term
        ),
        enrolment_stats AS (
            SELECT m.programme, e.term,
                   COUNT(*) AS enrolments,
                   COUNT(DISTINCT e.student_id) AS students
            FROM enrolments e
            JOIN modules m ON m.module_id = e.module_id
            GROUP BY m.programme, e.term
        ),
        support_stats AS (
            SELECT m.programme, e.term,
                   COUNT(DISTINCT su.student_id) AS supported
            FROM support_usage su
            JOIN enrolments e ON e.student_id = su.student_id AND e.term = su.term
            JOIN modules m ON m.module_id = e.module_id
            GROUP BY m.programme, e.term
        )
        SELECT o.programme AS programme,
               o.term AS term,
               ss.mean_score AS mean_score,
               ss.responses AS responses,
               ss.surveys AS surveys,
               o.modules AS modules,
               es.enrolments AS enrolments,
               es.students AS students,
               sp.supported AS supported
        FROM offerings o
        LEFT JOIN survey_stats ss ON ss.programme = o.programme AND ss.term = o.term
        LEFT JOIN enrolment_stats es ON es.programme = o.programme AND es.term = o.term
        LEFT JOIN support_stats sp ON sp.programme = o.programme AND sp.term = o.term
        ORDER BY o.programme, o.term
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn module_stats(pool: &SqlitePool, pass_mark: f64) -> Result<Vec<ModuleStatsRow>> {
    let rows = sqlx::query_as::<_, ModuleStatsRow>(
        r#"
        WITH student_scores AS (
            SELECT a.module_id, g.student_id,
                   AVG(g.score_pct) AS mean_score
            FROM grades g
            JOIN assessments a ON a.assessment_id = g.assessment_id
            GROUP BY a.module_id, g.student_id
        ),
        grade_stats AS (
            SELECT module_id,
                   COUNT(*) AS assessed,
                   SUM(CASE WHEN mean_score > ?1 THEN 1 ELSE 0 END) AS passed
            FROM student_scores
            GROUP BY module_id
        ),
        survey_stats AS (
            SELECT module_id, AVG(mean_score_1_5) AS mean_survey
            FROM surveys
            GROUP BY module_id
        )
        SELECT m.module_id AS module_id,
               m.programme AS programme,
               m.term AS term,
               ss.mean_survey AS mean_survey,
               gs.assessed AS assessed,
               gs.passed AS passed
        FROM modules m
        LEFT JOIN grade_stats gs ON gs.module_id = m.module_id
        LEFT JOIN survey_stats ss ON ss.module_id = m.module_id
        ORDER BY m.module_id
        "#,
    )
    .bind(pass_mark)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

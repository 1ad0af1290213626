//! Student experience: surveys, support usage, complaints and placements.

use chrono::Duration;
use rand::RngCore;

use qedash_core::catalog::{
    COMPLAINT_CATEGORIES, PLACEMENT_OUTCOMES, PLACEMENT_PARTNERS, QAA_THEMES, SUPPORT_SERVICES,
    TERMS, UPHELD_FLAGS,
};
use qedash_core::tables;
use qedash_plan::Plan;

use crate::dataset::{GeneratedValue, Row};
use crate::errors::GenerationError;
use crate::generators::sampling::{WeightedPick, date_offset, float_in, int_in, pick, round_to};
use crate::generators::{GeneratorContext, GeneratorRegistry, TableGenerator};

pub fn register(registry: &mut GeneratorRegistry) {
    registry.register_generator(Box::new(SurveysGenerator));
    registry.register_generator(Box::new(SupportUsageGenerator));
    registry.register_generator(Box::new(ComplaintsGenerator));
    registry.register_generator(Box::new(PlacementsGenerator));
}

/// One survey per module and QAA theme, in the module's term.
struct SurveysGenerator;

impl TableGenerator for SurveysGenerator {
    fn table(&self) -> &'static str {
        tables::SURVEYS
    }

    fn generate(
        &self,
        ctx: &mut GeneratorContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Row>, GenerationError> {
        let parents = ctx.parents;
        let surveys = &ctx.plan.surveys;
        let modules = parents.keys(tables::MODULES)?;
        let mut rows = Vec::with_capacity(modules.len() * QAA_THEMES.len());
        let mut survey_id = 0_i64;

        for module_id in modules {
            let term = parents
                .lookup_parent(tables::MODULES, *module_id, "term")
                .cloned()
                .unwrap_or(GeneratedValue::Null);
            for theme in QAA_THEMES {
                survey_id += 1;
                rows.push(vec![
                    GeneratedValue::Int(survey_id),
                    GeneratedValue::Int(*module_id),
                    term.clone(),
                    GeneratedValue::text(theme.code),
                    GeneratedValue::text(theme.name),
                    GeneratedValue::Float(round_to(float_in(surveys.mean_score, rng), 2)),
                    GeneratedValue::Int(int_in(surveys.responses, rng)),
                ]);
            }
        }
        Ok(rows)
    }
}

struct SupportUsageGenerator;

impl TableGenerator for SupportUsageGenerator {
    fn table(&self) -> &'static str {
        tables::SUPPORT_USAGE
    }

    fn requested_rows(&self, plan: &Plan) -> Option<u64> {
        Some(plan.volumes.support_usage_rows)
    }

    fn generate(
        &self,
        ctx: &mut GeneratorContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Row>, GenerationError> {
        let count = ctx.plan.volumes.support_usage_rows as usize;
        let visits = ctx.plan.support.visits;
        let mut rows = Vec::with_capacity(count);

        for _ in 0..count {
            rows.push(vec![
                GeneratedValue::Int(ctx.parents.sample(tables::STUDENTS, rng)?),
                GeneratedValue::text(pick(TERMS, rng)?),
                GeneratedValue::text(pick(SUPPORT_SERVICES, rng)?),
                GeneratedValue::Int(int_in(visits, rng)),
            ]);
        }
        Ok(rows)
    }
}

/// Complaints resolve after they are submitted.
struct ComplaintsGenerator;

impl TableGenerator for ComplaintsGenerator {
    fn table(&self) -> &'static str {
        tables::COMPLAINTS
    }

    fn requested_rows(&self, plan: &Plan) -> Option<u64> {
        Some(plan.volumes.complaints)
    }

    fn generate(
        &self,
        ctx: &mut GeneratorContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Row>, GenerationError> {
        let categories = WeightedPick::new(COMPLAINT_CATEGORIES)?;
        let upheld = WeightedPick::new(UPHELD_FLAGS)?;
        let plan = &ctx.plan.complaints;
        let count = ctx.plan.volumes.complaints as i64;
        let mut rows = Vec::with_capacity(count as usize);

        for complaint_id in 1..=count {
            let student_id = ctx.parents.sample(tables::STUDENTS, rng)?;
            let category = categories.sample(rng);
            let submitted = date_offset(plan.submitted_start, plan.submitted_offset_days, rng);
            let resolved = submitted + Duration::days(int_in(plan.resolution_days, rng));
            rows.push(vec![
                GeneratedValue::Int(complaint_id),
                GeneratedValue::Int(student_id),
                GeneratedValue::text(category),
                GeneratedValue::Date(submitted),
                GeneratedValue::Date(resolved),
                GeneratedValue::Int(upheld.sample(rng)),
            ]);
        }
        Ok(rows)
    }
}

/// Placements end after they start.
struct PlacementsGenerator;

impl TableGenerator for PlacementsGenerator {
    fn table(&self) -> &'static str {
        tables::PLACEMENTS
    }

    fn requested_rows(&self, plan: &Plan) -> Option<u64> {
        Some(plan.volumes.placements)
    }

    fn generate(
        &self,
        ctx: &mut GeneratorContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Row>, GenerationError> {
        let outcomes = WeightedPick::new(PLACEMENT_OUTCOMES)?;
        let plan = &ctx.plan.placements;
        let count = ctx.plan.volumes.placements as usize;
        let mut rows = Vec::with_capacity(count);

        for _ in 0..count {
            let student_id = ctx.parents.sample(tables::STUDENTS, rng)?;
            let partner = pick(PLACEMENT_PARTNERS, rng)?;
            let start = date_offset(plan.start, plan.start_offset_days, rng);
            let end = date_offset(start, plan.duration_days, rng);
            rows.push(vec![
                GeneratedValue::Int(student_id),
                GeneratedValue::text(partner),
                GeneratedValue::Date(start),
                GeneratedValue::Date(end),
                GeneratedValue::text(outcomes.sample(rng)),
            ]);
        }
        Ok(rows)
    }
}

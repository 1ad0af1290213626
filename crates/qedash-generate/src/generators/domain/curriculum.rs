//! Module offerings, enrolments, assessments and grades.

use rand::RngCore;
use rand::seq::IndexedRandom;

use qedash_core::catalog::{self, ASSESSMENT_TYPES, TERMS};
use qedash_core::tables;

use crate::dataset::{GeneratedValue, Row};
use crate::errors::GenerationError;
use crate::generators::sampling::{ClippedNormal, date_offset, float_in, int_in, round_to};
use crate::generators::{GeneratorContext, GeneratorRegistry, TableGenerator};

pub fn register(registry: &mut GeneratorRegistry) {
    registry.register_generator(Box::new(ModulesGenerator));
    registry.register_generator(Box::new(EnrolmentsGenerator));
    registry.register_generator(Box::new(AssessmentsGenerator));
    registry.register_generator(Box::new(GradesGenerator));
}

/// A fixed number of modules for every programme and term.
struct ModulesGenerator;

impl TableGenerator for ModulesGenerator {
    fn table(&self) -> &'static str {
        tables::MODULES
    }

    fn generate(
        &self,
        ctx: &mut GeneratorContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Row>, GenerationError> {
        let curriculum = &ctx.plan.curriculum;
        let mut rows = Vec::new();
        let mut module_id = 0_i64;

        for programme in catalog::programme_names() {
            for term in TERMS {
                for _ in 0..curriculum.modules_per_offering {
                    module_id += 1;
                    rows.push(vec![
                        GeneratedValue::Int(module_id),
                        GeneratedValue::text(programme),
                        GeneratedValue::text(term),
                        GeneratedValue::Int(int_in(curriculum.credits, rng)),
                    ]);
                }
            }
        }
        Ok(rows)
    }
}

/// Each student takes distinct modules of their programme in every term
/// from their intake onwards.
struct EnrolmentsGenerator;

impl TableGenerator for EnrolmentsGenerator {
    fn table(&self) -> &'static str {
        tables::ENROLMENTS
    }

    fn generate(
        &self,
        ctx: &mut GeneratorContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Row>, GenerationError> {
        let parents = ctx.parents;
        let taken = ctx.plan.curriculum.modules_taken;
        let offerings = parents.group_keys(tables::MODULES, &["programme", "term"])?;
        let mut rows = Vec::new();
        let mut short_pools = 0_u64;

        for student_id in parents.keys(tables::STUDENTS)? {
            let programme = parents
                .lookup_parent(tables::STUDENTS, *student_id, "programme")
                .and_then(GeneratedValue::as_str)
                .unwrap_or_default();
            let intake = parents
                .lookup_parent(tables::STUDENTS, *student_id, "intake")
                .and_then(GeneratedValue::as_str)
                .and_then(catalog::intake);
            let Some(intake) = intake else {
                ctx.warn(
                    "unknown_intake",
                    format!("student {student_id} has no known intake"),
                );
                continue;
            };

            for term in catalog::terms_from(intake.first_term) {
                let key = vec![programme.to_string(), term.to_string()];
                let pool = offerings.get(&key).map(Vec::as_slice).unwrap_or_default();
                let wanted = int_in(taken, rng).max(0) as usize;
                if wanted > pool.len() {
                    short_pools += 1;
                }

                let mut picked: Vec<i64> = pool
                    .choose_multiple(rng, wanted.min(pool.len()))
                    .copied()
                    .collect();
                picked.sort_unstable();
                for module_id in picked {
                    rows.push(vec![
                        GeneratedValue::Int(*student_id),
                        GeneratedValue::Int(module_id),
                        GeneratedValue::text(term),
                    ]);
                }
            }
        }

        if short_pools > 0 {
            ctx.warn(
                "enrolment_pool_capped",
                format!("{short_pools} student terms took every available module"),
            );
        }
        Ok(rows)
    }
}

/// Two coursework pieces and an exam per module.
struct AssessmentsGenerator;

impl TableGenerator for AssessmentsGenerator {
    fn table(&self) -> &'static str {
        tables::ASSESSMENTS
    }

    fn generate(
        &self,
        ctx: &mut GeneratorContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Row>, GenerationError> {
        let plan = &ctx.plan.assessments;
        let modules = ctx.parents.keys(tables::MODULES)?;
        let mut rows = Vec::with_capacity(modules.len() * ASSESSMENT_TYPES.len());
        let mut assessment_id = 0_i64;

        for module_id in modules {
            for kind in ASSESSMENT_TYPES {
                assessment_id += 1;
                let due = date_offset(plan.due_start, plan.due_offset_days, rng);
                let returned = date_offset(due, plan.turnaround_days, rng);
                let weight = round_to(float_in(plan.weight, rng), 2);
                rows.push(vec![
                    GeneratedValue::Int(assessment_id),
                    GeneratedValue::Int(*module_id),
                    GeneratedValue::text(kind),
                    GeneratedValue::Date(due),
                    GeneratedValue::Float(weight),
                    GeneratedValue::Date(returned),
                ]);
            }
        }
        Ok(rows)
    }
}

/// One score per enrolment and assessment of the enrolled module.
struct GradesGenerator;

impl TableGenerator for GradesGenerator {
    fn table(&self) -> &'static str {
        tables::GRADES
    }

    fn reads(&self) -> &'static [&'static str] {
        &[tables::ENROLMENTS]
    }

    fn generate(
        &self,
        ctx: &mut GeneratorContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Row>, GenerationError> {
        let parents = ctx.parents;
        let scores = ClippedNormal::new(&ctx.plan.grading)?;
        let by_module = parents.group_keys(tables::ASSESSMENTS, &["module_id"])?;
        let enrolments = parents.table(tables::ENROLMENTS)?;
        let (Some(student_idx), Some(module_idx)) = (
            enrolments.column_index("student_id"),
            enrolments.column_index("module_id"),
        ) else {
            return Err(GenerationError::InvalidPlan(
                "enrolments lack student_id/module_id".to_string(),
            ));
        };

        let mut rows = Vec::new();
        let mut unassessed = 0_u64;
        for enrolment in &enrolments.rows {
            let (Some(student_id), Some(module_id)) = (
                enrolment.get(student_idx).and_then(GeneratedValue::as_i64),
                enrolment.get(module_idx).and_then(GeneratedValue::as_i64),
            ) else {
                continue;
            };
            let Some(assessments) = by_module.get(&vec![module_id.to_string()]) else {
                unassessed += 1;
                continue;
            };
            for assessment_id in assessments {
                rows.push(vec![
                    GeneratedValue::Int(student_id),
                    GeneratedValue::Int(*assessment_id),
                    GeneratedValue::Float(round_to(scores.sample(rng), 2)),
                ]);
            }
        }

        if unassessed > 0 {
            ctx.warn(
                "module_without_assessments",
                format!("{unassessed} enrolments have no assessments to grade"),
            );
        }
        Ok(rows)
    }
}

//! Students and their admission records.

use rand::RngCore;

use qedash_core::catalog::{
    ADMISSION_ROUTES, AGE_BANDS, GENDERS, INTAKES, OFFER_STATUSES, PROGRAMMES, WP_FLAGS,
};
use qedash_core::tables;
use qedash_plan::Plan;

use crate::dataset::{GeneratedValue, Row};
use crate::errors::GenerationError;
use crate::generators::sampling::{WeightedPick, date_offset};
use crate::generators::{GeneratorContext, GeneratorRegistry, TableGenerator};

pub fn register(registry: &mut GeneratorRegistry) {
    registry.register_generator(Box::new(StudentsGenerator));
    registry.register_generator(Box::new(AdmissionsGenerator));
}

struct StudentsGenerator;

impl TableGenerator for StudentsGenerator {
    fn table(&self) -> &'static str {
        tables::STUDENTS
    }

    fn requested_rows(&self, plan: &Plan) -> Option<u64> {
        Some(plan.volumes.students)
    }

    fn generate(
        &self,
        ctx: &mut GeneratorContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Row>, GenerationError> {
        let programmes = WeightedPick::new(PROGRAMMES)?;
        let intakes = WeightedPick::new(INTAKES)?;
        let wp_flags = WeightedPick::new(WP_FLAGS)?;
        let age_bands = WeightedPick::new(AGE_BANDS)?;
        let genders = WeightedPick::new(GENDERS)?;

        let count = ctx.plan.volumes.students as i64;
        let mut rows = Vec::with_capacity(count as usize);
        for student_id in 1..=count {
            rows.push(vec![
                GeneratedValue::Int(student_id),
                GeneratedValue::text(programmes.sample(rng)),
                GeneratedValue::text(intakes.sample(rng).name),
                GeneratedValue::Int(wp_flags.sample(rng)),
                GeneratedValue::text(age_bands.sample(rng)),
                GeneratedValue::text(genders.sample(rng)),
            ]);
        }
        Ok(rows)
    }
}

/// One application per student.
struct AdmissionsGenerator;

impl TableGenerator for AdmissionsGenerator {
    fn table(&self) -> &'static str {
        tables::ADMISSIONS
    }

    fn requested_rows(&self, plan: &Plan) -> Option<u64> {
        Some(plan.volumes.students)
    }

    fn generate(
        &self,
        ctx: &mut GeneratorContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Row>, GenerationError> {
        let routes = WeightedPick::new(ADMISSION_ROUTES)?;
        let statuses = WeightedPick::new(OFFER_STATUSES)?;
        let admissions = &ctx.plan.admissions;

        let students = ctx.parents.keys(tables::STUDENTS)?;
        let mut rows = Vec::with_capacity(students.len());
        for (idx, student_id) in students.iter().enumerate() {
            let decision = date_offset(
                admissions.decision_start,
                admissions.decision_offset_days,
                rng,
            );
            rows.push(vec![
                GeneratedValue::Int(idx as i64 + 1),
                GeneratedValue::Int(*student_id),
                GeneratedValue::text(routes.sample(rng)),
                GeneratedValue::text(statuses.sample(rng)),
                GeneratedValue::Date(decision),
            ]);
        }
        Ok(rows)
    }
}

//! Sampling primitives shared by the domain generators.

use chrono::{Duration, NaiveDate};
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, RngCore};
use rand_distr::Normal;

use qedash_core::catalog::Weighted;
use qedash_plan::{FloatRange, GradingPlan, IntRange};

use crate::errors::GenerationError;

/// Categorical sampler over a weighted vocabulary.
#[derive(Debug, Clone)]
pub struct WeightedPick<T: Copy> {
    values: Vec<T>,
    index: WeightedIndex<f64>,
}

impl<T: Copy> WeightedPick<T> {
    pub fn new(entries: &[Weighted<T>]) -> Result<Self, GenerationError> {
        let index = WeightedIndex::new(entries.iter().map(|entry| entry.weight))
            .map_err(|err| GenerationError::InvalidPlan(format!("invalid weights: {err}")))?;
        Ok(Self {
            values: entries.iter().map(|entry| entry.value).collect(),
            index,
        })
    }

    pub fn sample(&self, rng: &mut dyn RngCore) -> T {
        self.values[self.index.sample(rng)]
    }
}

/// Uniform choice from a non-empty slice.
pub fn pick<T: Copy>(values: &[T], rng: &mut dyn RngCore) -> Result<T, GenerationError> {
    if values.is_empty() {
        return Err(GenerationError::InvalidPlan(
            "cannot pick from an empty vocabulary".to_string(),
        ));
    }
    Ok(values[rng.random_range(0..values.len())])
}

/// Uniform integer in the inclusive range.
pub fn int_in(range: IntRange, rng: &mut dyn RngCore) -> i64 {
    if range.min >= range.max {
        return range.min;
    }
    rng.random_range(range.min..=range.max)
}

/// Uniform float in the half-open range.
pub fn float_in(range: FloatRange, rng: &mut dyn RngCore) -> f64 {
    if range.min >= range.max {
        return range.min;
    }
    rng.random_range(range.min..range.max)
}

/// `start` shifted by a uniform day offset.
pub fn date_offset(start: NaiveDate, offset_days: IntRange, rng: &mut dyn RngCore) -> NaiveDate {
    start + Duration::days(int_in(offset_days, rng))
}

/// Normal sampler clipped to the grading bounds.
#[derive(Debug, Clone, Copy)]
pub struct ClippedNormal {
    normal: Normal<f64>,
    min: f64,
    max: f64,
}

impl ClippedNormal {
    pub fn new(grading: &GradingPlan) -> Result<Self, GenerationError> {
        let normal = Normal::new(grading.mean, grading.std_dev)
            .map_err(|err| GenerationError::InvalidPlan(format!("invalid grading: {err}")))?;
        Ok(Self {
            normal,
            min: grading.min,
            max: grading.max,
        })
    }

    pub fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        self.normal.sample(rng).clamp(self.min, self.max)
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

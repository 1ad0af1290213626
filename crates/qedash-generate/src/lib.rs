//! Seeded synthetic data generation for the quality enhancement dataset.
//!
//! Tables are generated parent-first; every child foreign key is drawn from
//! the primary keys of a table that has already been materialized.

pub mod checks;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod foreign;
pub mod generators;
pub mod model;
pub mod output;
pub mod planner;

pub use checks::verify_dataset;
pub use dataset::{Dataset, GeneratedValue, Row, TableData};
pub use engine::{GenerationEngine, GenerationResult};
pub use errors::GenerationError;
pub use foreign::ParentKeys;
pub use model::{GenerateOptions, GenerationIssue, GenerationReport, TableReport};
pub use output::csv::dataset_fingerprint;

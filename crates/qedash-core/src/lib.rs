//! Core contracts and helpers for qedash.
//!
//! This crate defines the canonical table catalogue of the Quality Enhancement
//! dataset, its foreign-key graph, and the domain vocabularies shared by the
//! generator, the store, the metric exporter and the report renderer.

pub mod atomic;
pub mod catalog;
pub mod constraints;
pub mod error;
pub mod graph;
pub mod schema;
pub mod validation;

pub use atomic::write_bytes_atomic;
pub use constraints::{ForeignKeyDef, IndexDef};
pub use error::{Error, Result};
pub use graph::{FkGraphReport, FkGraphSummary, build_fk_graph_report, load_order};
pub use schema::{ColumnDef, ColumnKind, DatasetSchema, TableDef, qe_schema, tables};
pub use validation::validate_schema;

/// Current contract version for the dataset catalogue.
pub const SCHEMA_VERSION: &str = "0.1";

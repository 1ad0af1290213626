//! SQLite store for the generated dataset and the queries behind the KPIs.

pub mod adapter;
pub mod errors;
pub mod options;
pub mod sqlite;

pub use adapter::Store;
pub use errors::{Result, StoreError};
pub use options::StoreOptions;
pub use sqlite::queries::{
    EngagementInputRow, ModuleStatsRow, PassRateRow, TableCount, TurnaroundRow,
};
pub use sqlite::{LoadSummary, SqliteStore};

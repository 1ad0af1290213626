use std::collections::BTreeMap;

use rand::RngCore;

use qedash_core::TableDef;
use qedash_plan::Plan;

use crate::dataset::Row;
use crate::errors::GenerationError;
use crate::foreign::ParentKeys;
use crate::model::GenerationIssue;

pub mod domain;
pub mod sampling;

/// Inputs available to a table generator.
pub struct GeneratorContext<'a> {
    pub plan: &'a Plan,
    pub table: &'a TableDef,
    pub parents: &'a ParentKeys,
    pub issues: Vec<GenerationIssue>,
}

impl<'a> GeneratorContext<'a> {
    pub fn new(plan: &'a Plan, table: &'a TableDef, parents: &'a ParentKeys) -> Self {
        Self {
            plan,
            table,
            parents,
            issues: Vec::new(),
        }
    }

    pub fn warn(&mut self, code: &str, message: impl Into<String>) {
        let issue = GenerationIssue::warning(code, &self.table.name, message);
        self.issues.push(issue);
    }
}

/// Produces every row of one table.
pub trait TableGenerator: Send + Sync {
    fn table(&self) -> &'static str;

    /// Rows requested by the plan, when the table has a fixed volume.
    fn requested_rows(&self, _plan: &Plan) -> Option<u64> {
        None
    }

    /// Tables read while generating that are not foreign-key parents.
    fn reads(&self) -> &'static [&'static str] {
        &[]
    }

    fn generate(
        &self,
        ctx: &mut GeneratorContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Row>, GenerationError>;
}

/// Table generators keyed by table name.
pub struct GeneratorRegistry {
    generators: BTreeMap<&'static str, Box<dyn TableGenerator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            generators: BTreeMap::new(),
        };
        domain::register(&mut registry);
        registry
    }

    pub fn register_generator(&mut self, generator: Box<dyn TableGenerator>) {
        self.generators.insert(generator.table(), generator);
    }

    pub fn get(&self, table: &str) -> Option<&dyn TableGenerator> {
        self.generators.get(table).map(|generator| generator.as_ref())
    }

    pub fn tables(&self) -> Vec<&'static str> {
        self.generators.keys().copied().collect()
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("tables", &self.tables())
            .finish()
    }
}

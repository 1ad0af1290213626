use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::Plan;

/// JSON Schema for `plan.json`, derived from the [`Plan`] model.
pub fn plan_json_schema() -> RootSchema {
    schema_for!(Plan)
}

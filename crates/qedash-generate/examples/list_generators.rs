use qedash_generate::generators::GeneratorRegistry;
use qedash_plan::Plan;

fn main() {
    let registry = GeneratorRegistry::new();
    let plan = Plan::default();
    for table in registry.tables() {
        let rows = registry
            .get(table)
            .and_then(|generator| generator.requested_rows(&plan))
            .map(|rows| rows.to_string())
            .unwrap_or_else(|| "derived".to_string());
        println!("{table}\t{rows}");
    }
}

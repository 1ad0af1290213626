use qedash_core::{IndexDef, TableDef};

/// `CREATE TABLE` statement for a catalogue table.
pub fn create_table_sql(table: &TableDef, with_foreign_keys: bool) -> String {
    let mut parts: Vec<String> = table
        .ordered_columns()
        .into_iter()
        .map(|column| {
            let mut definition = format!("{} {}", quote(&column.name), column.kind.sql_type());
            if table.primary_key.as_deref() == Some(column.name.as_str()) {
                definition.push_str(" PRIMARY KEY");
            } else if !column.nullable {
                definition.push_str(" NOT NULL");
            }
            definition
        })
        .collect();

    if with_foreign_keys {
        for fk in &table.foreign_keys {
            parts.push(format!(
                "FOREIGN KEY ({}) REFERENCES {}({})",
                quote(&fk.column),
                quote(&fk.referenced_table),
                quote(&fk.referenced_column)
            ));
        }
    }

    format!(
        "CREATE TABLE {} (\n  {}\n)",
        quote(&table.name),
        parts.join(",\n  ")
    )
}

pub fn create_index_sql(table: &TableDef, index: &IndexDef) -> String {
    let columns: Vec<String> = index.columns.iter().map(|column| quote(column)).collect();
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {}({})",
        quote(&index.name),
        quote(&table.name),
        columns.join(", ")
    )
}

/// `INSERT INTO table (cols) ` prefix for a batched insert.
pub fn insert_prefix(table: &str, columns: &[String]) -> String {
    let columns: Vec<String> = columns.iter().map(|column| quote(column)).collect();
    format!("INSERT INTO {} ({}) ", quote(table), columns.join(", "))
}

pub fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

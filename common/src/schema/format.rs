use super::catalog::SchemaDescription;

/// render the schema as prompt text, one block per table
pub fn format_schema(schema: &SchemaDescription) -> String {
    let mut text = String::new();

    for table in schema.tables() {
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| format!("{} ({})", c.name, c.declared_type))
            .collect();

        text.push_str(&format!(
            "Table: {}\nColumns: {}\n\n",
            table.name,
            columns.join(", ")
        ));
    }

    text.trim().to_string()
}

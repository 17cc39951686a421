use crate::db::Database;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// columns of the connected database only, in catalog ordinal order
pub const CATALOG_QUERY: &str = "SELECT \
        CAST(table_name AS CHAR) AS table_name, \
        CAST(column_name AS CHAR) AS column_name, \
        CAST(data_type AS CHAR) AS data_type \
    FROM information_schema.columns \
    WHERE table_schema = DATABASE() \
    ORDER BY table_name, ordinal_position";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

/// tables of one database in catalog order, each with its columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    tables: Vec<TableSchema>,
}

/// one row of the information_schema.columns query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
}

impl SchemaDescription {
    /// group catalog rows into tables, preserving arrival order
    pub fn from_catalog_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = CatalogRow>,
    {
        let mut tables: Vec<TableSchema> = Vec::new();

        for row in rows {
            let column = ColumnInfo {
                name: row.column_name,
                declared_type: row.data_type,
            };

            // rows arrive grouped by table, so the last entry is the usual hit
            match tables.iter_mut().rev().find(|t| t.name == row.table_name) {
                Some(table) => table.columns.push(column),
                None => tables.push(TableSchema {
                    name: row.table_name,
                    columns: vec![column],
                }),
            }
        }

        Self { tables }
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[tracing::instrument(skip(db))]
pub async fn read_schema(db: &dyn Database) -> Result<SchemaDescription> {
    let schema = db.read_schema().await?;
    tracing::info!(tables = schema.len(), "schema introspected");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(table: &str, column: &str, ty: &str) -> CatalogRow {
        CatalogRow {
            table_name: table.to_string(),
            column_name: column.to_string(),
            data_type: ty.to_string(),
        }
    }

    #[test]
    fn test_from_catalog_rows_groups_in_order() {
        let schema = SchemaDescription::from_catalog_rows(vec![
            row("drivers", "id", "int"),
            row("drivers", "name", "varchar"),
            row("riders", "id", "int"),
            row("riders", "joined_at", "datetime"),
        ]);

        let names: Vec<&str> = schema.table_names().collect();
        assert_eq!(names, vec!["drivers", "riders"]);

        let riders = schema.table("riders").unwrap();
        assert_eq!(riders.columns[1].name, "joined_at");
        assert_eq!(riders.columns[1].declared_type, "datetime");
    }

    #[test]
    fn test_repeated_table_name_stays_unique() {
        let schema = SchemaDescription::from_catalog_rows(vec![
            row("a", "x", "int"),
            row("b", "y", "int"),
            row("a", "z", "int"),
        ]);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.table("a").unwrap().columns.len(), 2);
    }

    #[test]
    fn test_catalog_query_is_scoped_to_current_database() {
        assert!(CATALOG_QUERY.contains("table_schema = DATABASE()"));
        assert!(CATALOG_QUERY.contains("ORDER BY table_name, ordinal_position"));
    }
}

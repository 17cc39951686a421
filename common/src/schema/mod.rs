pub mod cache;
pub mod catalog;
pub mod format;

pub use cache::{CachedSchema, SchemaCache};
pub use catalog::{read_schema, CatalogRow, ColumnInfo, SchemaDescription, TableSchema};
pub use format::format_schema;

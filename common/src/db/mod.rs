pub mod mysql;
pub mod shape;
pub mod value;
#[cfg(test)]
pub(crate) mod testing;

pub use mysql::MySqlDatabase;
pub use shape::{shape, ResultSet, Row};
pub use value::{NativeRow, NativeRows, NativeValue, TimeValue};

use crate::agent::validator::ValidatedQuery;
use crate::error::Result;
use crate::schema::catalog::SchemaDescription;
use async_trait::async_trait;

/// the database a pipeline introspects and queries
///
/// `execute` only accepts a [`ValidatedQuery`], so no unvalidated text can
/// reach an implementation.
#[async_trait]
pub trait Database: Send + Sync {
    /// tables and columns of the connected database, in catalog order
    async fn read_schema(&self) -> Result<SchemaDescription>;

    /// run one validated statement; the connection lives for this call only
    async fn execute(&self, query: &ValidatedQuery) -> Result<NativeRows>;
}

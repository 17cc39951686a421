use super::value::{NativeRows, NativeValue};
use super::Database;
use crate::agent::validator::ValidatedQuery;
use crate::error::{Result, TalkDbError};
use crate::schema::catalog::{CatalogRow, SchemaDescription};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// in-memory database that records every statement it is handed
pub(crate) struct StubDatabase {
    schema: SchemaDescription,
    rows: Mutex<NativeRows>,
    execution_error: Mutex<Option<String>>,
    fail_catalog: AtomicBool,
    schema_reads: AtomicUsize,
    executed: Mutex<Vec<String>>,
}

impl StubDatabase {
    pub(crate) fn new(schema: SchemaDescription) -> Self {
        Self {
            schema,
            rows: Mutex::new(NativeRows::default()),
            execution_error: Mutex::new(None),
            fail_catalog: AtomicBool::new(false),
            schema_reads: AtomicUsize::new(0),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// `riders(id int, name varchar)`
    pub(crate) fn riders() -> Self {
        let rows = [("riders", "id", "int"), ("riders", "name", "varchar")];
        Self::new(SchemaDescription::from_catalog_rows(rows.iter().map(
            |(t, c, d)| CatalogRow {
                table_name: t.to_string(),
                column_name: c.to_string(),
                data_type: d.to_string(),
            },
        )))
    }

    pub(crate) fn with_rows(self, rows: NativeRows) -> Self {
        *self.rows.lock().unwrap() = rows;
        self
    }

    pub(crate) fn with_count(self, column: &str, n: i64) -> Self {
        self.with_rows(NativeRows::new(
            vec![column.to_string()],
            vec![vec![NativeValue::Int(n)]],
        ))
    }

    pub(crate) fn with_execution_error(self, message: &str) -> Self {
        *self.execution_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub(crate) fn fail_catalog(&self, fail: bool) {
        self.fail_catalog.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn schema_reads(&self) -> usize {
        self.schema_reads.load(Ordering::SeqCst)
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Database for StubDatabase {
    async fn read_schema(&self) -> Result<SchemaDescription> {
        self.schema_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(TalkDbError::Catalog("connection refused".to_string()));
        }
        // yield so concurrent callers actually interleave
        tokio::task::yield_now().await;
        Ok(self.schema.clone())
    }

    async fn execute(&self, query: &ValidatedQuery) -> Result<NativeRows> {
        self.executed.lock().unwrap().push(query.as_str().to_string());
        if let Some(message) = self.execution_error.lock().unwrap().clone() {
            return Err(TalkDbError::Execution(message));
        }
        Ok(self.rows.lock().unwrap().clone())
    }
}

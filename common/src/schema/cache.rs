use super::catalog::{read_schema, SchemaDescription};
use super::format::format_schema;
use crate::db::Database;
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::RwLock;

/// introspected schema together with its prompt rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSchema {
    pub description: SchemaDescription,
    pub text: String,
}

/// lazily populated schema shared by every request
///
/// The first caller to find the cache empty populates it under the write
/// lock; callers queued behind it see the stored value on re-check. Failed
/// introspection leaves the cache empty.
#[derive(Debug, Default)]
pub struct SchemaCache {
    inner: RwLock<Option<Arc<CachedSchema>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_load(&self, db: &dyn Database) -> Result<Arc<CachedSchema>> {
        if let Some(cached) = self.inner.read().await.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let mut slot = self.inner.write().await;
        if let Some(cached) = slot.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let loaded = Arc::new(load(db).await?);
        *slot = Some(Arc::clone(&loaded));
        tracing::debug!(bytes = loaded.text.len(), "schema cache populated");
        Ok(loaded)
    }

    /// drop the cached schema and read it again
    pub async fn refresh(&self, db: &dyn Database) -> Result<Arc<CachedSchema>> {
        let mut slot = self.inner.write().await;
        *slot = None;

        let loaded = Arc::new(load(db).await?);
        *slot = Some(Arc::clone(&loaded));
        tracing::info!(tables = loaded.description.len(), "schema cache refreshed");
        Ok(loaded)
    }

    pub async fn invalidate(&self) {
        *self.inner.write().await = None;
    }

    pub async fn is_populated(&self) -> bool {
        self.inner.read().await.is_some()
    }
}

async fn load(db: &dyn Database) -> Result<CachedSchema> {
    let description = read_schema(db).await?;
    let text = format_schema(&description);
    Ok(CachedSchema { description, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::StubDatabase;

    #[tokio::test]
    async fn test_get_or_load_reads_catalog_once() {
        let db = StubDatabase::riders();
        let cache = SchemaCache::new();

        let first = cache.get_or_load(&db).await.unwrap();
        let second = cache.get_or_load(&db).await.unwrap();

        assert_eq!(first.text, second.text);
        assert!(first.text.starts_with("Table: riders"));
        assert_eq!(db.schema_reads(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_population_is_single_writer() {
        let db = Arc::new(StubDatabase::riders());
        let cache = Arc::new(SchemaCache::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let db = Arc::clone(&db);
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.get_or_load(db.as_ref()).await.map(|s| s.text.clone())
            }));
        }

        let mut texts = Vec::new();
        for handle in handles {
            texts.push(handle.await.unwrap().unwrap());
        }

        assert!(texts.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(db.schema_reads(), 1);
    }

    #[tokio::test]
    async fn test_catalog_error_is_not_cached() {
        let db = StubDatabase::riders();
        db.fail_catalog(true);
        let cache = SchemaCache::new();

        assert!(cache.get_or_load(&db).await.is_err());
        assert!(!cache.is_populated().await);

        db.fail_catalog(false);
        assert!(cache.get_or_load(&db).await.is_ok());
        assert!(cache.is_populated().await);
    }

    #[tokio::test]
    async fn test_refresh_rereads_catalog() {
        let db = StubDatabase::riders();
        let cache = SchemaCache::new();

        cache.get_or_load(&db).await.unwrap();
        cache.refresh(&db).await.unwrap();
        assert_eq!(db.schema_reads(), 2);

        cache.invalidate().await;
        assert!(!cache.is_populated().await);
    }
}

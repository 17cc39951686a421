use crate::agent::parser::extract_sql;
use crate::agent::prompt::{build_generation_request, normalize_question};
use crate::agent::validator::validate_sql;
use crate::config::PipelineConfig;
use crate::db::{shape, Database, ResultSet};
use crate::error::{Result, TalkDbError};
use crate::llm::model::Generator;
use crate::schema::cache::{CachedSchema, SchemaCache};
use serde::Serialize;
use std::sync::Arc;

/// where a question is in its single pass through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    SchemaReady,
    Prompted,
    Generated,
    Extracted,
    Validated,
    Executed,
    Shaped,
    Returned,
    Rejected,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::SchemaReady => "schema_ready",
            Stage::Prompted => "prompted",
            Stage::Generated => "generated",
            Stage::Extracted => "extracted",
            Stage::Validated => "validated",
            Stage::Executed => "executed",
            Stage::Shaped => "shaped",
            Stage::Returned => "returned",
            Stage::Rejected => "rejected",
            Stage::Failed => "failed",
        }
    }
}

/// the executed statement and its rows
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub sql: String,
    pub results: ResultSet,
}

/// drives one question from schema to shaped rows
///
/// Shared across requests; the only state it carries between them is the
/// schema cache. There is no retry at any stage.
pub struct QueryPipeline {
    db: Arc<dyn Database>,
    generator: Arc<dyn Generator>,
    schema: SchemaCache,
    config: PipelineConfig,
}

impl QueryPipeline {
    pub fn new(
        db: Arc<dyn Database>,
        generator: Arc<dyn Generator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            db,
            generator,
            schema: SchemaCache::new(),
            config,
        }
    }

    pub async fn schema(&self) -> Result<Arc<CachedSchema>> {
        self.schema.get_or_load(self.db.as_ref()).await
    }

    pub async fn refresh_schema(&self) -> Result<Arc<CachedSchema>> {
        self.schema.refresh(self.db.as_ref()).await
    }

    /// answer one question, bounded by the configured timeout
    #[tracing::instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn run(&self, question: &str) -> Result<QueryOutcome> {
        let timeout = self.config.timeout;

        // dropping the inner future aborts whichever call is in flight
        match tokio::time::timeout(timeout, self.run_stages(question)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(stage = Stage::Failed.as_str(), "request timed out");
                Err(TalkDbError::Timeout(timeout.as_secs()))
            }
        }
    }

    async fn run_stages(&self, question: &str) -> Result<QueryOutcome> {
        tracing::debug!(stage = Stage::Received.as_str());
        let question = normalize_question(question)?;

        let schema = self.schema().await?;
        tracing::debug!(stage = Stage::SchemaReady.as_str(), tables = schema.description.len());

        let request = build_generation_request(&schema.text, question)?;
        tracing::debug!(stage = Stage::Prompted.as_str(), prompt_len = request.prompt().len());

        let raw = self.generator.generate(&request).await?;
        tracing::debug!(stage = Stage::Generated.as_str(), output_len = raw.len());

        let validated = extract_sql(&raw)
            .and_then(|candidate| {
                tracing::debug!(stage = Stage::Extracted.as_str(), sql = %candidate);
                validate_sql(candidate)
            })
            .map_err(|e| {
                tracing::warn!(stage = Stage::Rejected.as_str(), error = %e, "candidate rejected");
                e
            })?;
        tracing::info!(stage = Stage::Validated.as_str(), sql = %validated, "executing query");

        let rows = self.db.execute(&validated).await.map_err(|e| {
            tracing::warn!(stage = Stage::Failed.as_str(), error = %e, "query failed");
            e
        })?;
        tracing::debug!(stage = Stage::Executed.as_str(), rows = rows.rows.len());

        let results = shape(rows);
        tracing::debug!(stage = Stage::Shaped.as_str());

        tracing::info!(stage = Stage::Returned.as_str(), rows = results.len(), "query answered");
        Ok(QueryOutcome {
            sql: validated.as_str().to_string(),
            results,
        })
    }
}

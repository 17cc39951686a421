use super::value::{NativeRows, NativeValue, TimeValue};
use super::Database;
use crate::agent::validator::ValidatedQuery;
use crate::config::DatabaseConfig;
use crate::error::{Result, TalkDbError};
use crate::schema::catalog::{CatalogRow, SchemaDescription, CATALOG_QUERY};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::mysql::types::MySqlTime;
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Executor, Row, Statement, TypeInfo, ValueRef};
use std::time::Duration;
use tokio::sync::OnceCell;

const MAX_CONNECTIONS: u32 = 8;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// mysql backend; the pool is built on first use so missing settings
/// surface as a config error at that point
pub struct MySqlDatabase {
    config: DatabaseConfig,
    pool: OnceCell<MySqlPool>,
}

impl MySqlDatabase {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
        }
    }

    fn connect_options(&self) -> Result<MySqlConnectOptions> {
        let mut options = MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(self.config.user()?)
            .database(self.config.name()?);

        if let Some(password) = self.config.password() {
            options = options.password(password);
        }

        Ok(options)
    }

    async fn pool(&self) -> Result<&MySqlPool> {
        self.pool
            .get_or_try_init(|| async {
                let options = self.connect_options()?;
                tracing::info!(
                    host = %self.config.host,
                    port = self.config.port,
                    "configuring mysql pool"
                );

                let pool = MySqlPoolOptions::new()
                    .max_connections(MAX_CONNECTIONS)
                    .acquire_timeout(ACQUIRE_TIMEOUT)
                    .after_connect(|conn, _meta| {
                        Box::pin(async move {
                            // every transaction on this session refuses writes
                            conn.execute("SET SESSION TRANSACTION READ ONLY").await?;
                            Ok(())
                        })
                    })
                    .connect_lazy_with(options);

                Ok::<_, TalkDbError>(pool)
            })
            .await
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    #[tracing::instrument(skip(self))]
    async fn read_schema(&self) -> Result<SchemaDescription> {
        let pool = self.pool().await?;
        let mut conn = pool
            .acquire()
            .await
            .map_err(|e| TalkDbError::Catalog(format!("database unavailable: {}", e)))?;

        let rows = sqlx::query(CATALOG_QUERY)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| TalkDbError::Catalog(format!("information_schema query failed: {}", e)))?;

        let catalog_rows = rows
            .iter()
            .map(|row| {
                Ok(CatalogRow {
                    table_name: row.try_get::<String, _>(0).map_err(catalog_decode)?,
                    column_name: row.try_get::<String, _>(1).map_err(catalog_decode)?,
                    data_type: row.try_get::<String, _>(2).map_err(catalog_decode)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SchemaDescription::from_catalog_rows(catalog_rows))
    }

    #[tracing::instrument(skip(self, query), fields(sql_len = query.as_str().len()))]
    async fn execute(&self, query: &ValidatedQuery) -> Result<NativeRows> {
        let pool = self.pool().await?;

        // connection goes back to the pool when this call returns or is dropped
        let mut conn = pool
            .acquire()
            .await
            .map_err(|e| TalkDbError::Execution(format!("database unavailable: {}", e)))?;

        // prepared statements hold exactly one statement; their metadata
        // names the columns even when no row comes back
        let statement = (&mut *conn)
            .prepare(query.as_str())
            .await
            .map_err(|e| TalkDbError::Execution(e.to_string()))?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let rows = statement
            .query()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| TalkDbError::Execution(e.to_string()))?;

        let decoded = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(rows = decoded.len(), "query returned");
        Ok(NativeRows::new(columns, decoded))
    }
}

fn catalog_decode(e: sqlx::Error) -> TalkDbError {
    TalkDbError::Catalog(format!("unexpected catalog row: {}", e))
}

fn decode_row(row: &MySqlRow) -> Result<Vec<NativeValue>> {
    (0..row.columns().len())
        .map(|idx| decode_cell(row, idx))
        .collect()
}

fn get<'r, T>(row: &'r MySqlRow, idx: usize) -> Result<T>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get::<T, _>(idx).map_err(|e| {
        TalkDbError::Execution(format!(
            "failed to decode column '{}': {}",
            row.column(idx).name(),
            e
        ))
    })
}

fn get_unchecked<'r, T>(row: &'r MySqlRow, idx: usize) -> Result<T>
where
    T: sqlx::Decode<'r, MySql>,
{
    row.try_get_unchecked::<T, _>(idx).map_err(|e| {
        TalkDbError::Execution(format!(
            "failed to decode column '{}': {}",
            row.column(idx).name(),
            e
        ))
    })
}

fn decode_cell(row: &MySqlRow, idx: usize) -> Result<NativeValue> {
    let raw = row
        .try_get_raw(idx)
        .map_err(|e| TalkDbError::Execution(e.to_string()))?;
    if raw.is_null() {
        return Ok(NativeValue::Null);
    }

    let type_name = row.column(idx).type_info().name();

    let value = match type_name {
        "BOOLEAN" => NativeValue::Bool(get(row, idx)?),
        name if name.ends_with("UNSIGNED") && name != "DECIMAL UNSIGNED" => {
            NativeValue::UInt(get(row, idx)?)
        }
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            NativeValue::Int(get(row, idx)?)
        }
        "FLOAT" => NativeValue::Float(f64::from(get::<f32>(row, idx)?)),
        "DOUBLE" => NativeValue::Float(get(row, idx)?),
        "DECIMAL" | "DECIMAL UNSIGNED" => NativeValue::Decimal(get::<Decimal>(row, idx)?),
        "DATE" => NativeValue::Date(get::<NaiveDate>(row, idx)?),
        "DATETIME" => NativeValue::DateTime(get::<NaiveDateTime>(row, idx)?),
        "TIMESTAMP" => NativeValue::Timestamp(get::<DateTime<Utc>>(row, idx)?),
        // signed and may exceed 24h, so not a chrono time of day
        "TIME" => NativeValue::Time(time_value(get::<MySqlTime>(row, idx)?)),
        "YEAR" => NativeValue::UInt(u64::from(get_unchecked::<u16>(row, idx)?)),
        "JSON" => NativeValue::Json(get::<serde_json::Value>(row, idx)?),
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => {
            NativeValue::Bytes(get::<Vec<u8>>(row, idx)?)
        }
        _ => fallback(row, idx)?,
    };

    Ok(value)
}

fn time_value(t: MySqlTime) -> TimeValue {
    TimeValue {
        negative: t.is_negative(),
        hours: t.hours(),
        minutes: t.minutes(),
        seconds: t.seconds(),
        microseconds: t.microseconds(),
    }
}

/// text-like and unrecognised types (ENUM, SET, BIT, ...) decode as raw bytes
fn fallback(row: &MySqlRow, idx: usize) -> Result<NativeValue> {
    let bytes = get_unchecked::<Vec<u8>>(row, idx)?;
    Ok(match String::from_utf8(bytes) {
        Ok(s) => NativeValue::Text(s),
        Err(e) => NativeValue::Bytes(e.into_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_require_name() {
        let db = MySqlDatabase::new(DatabaseConfig {
            user: Some("reader".to_string()),
            ..DatabaseConfig::default()
        });
        let err = db.connect_options().unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_time_beyond_a_day_keeps_sign_and_hours() {
        use sqlx::mysql::types::MySqlTimeSign;

        let t = MySqlTime::new(MySqlTimeSign::Negative, 838, 59, 59, 0).unwrap();
        assert_eq!(time_value(t).to_string(), "-838:59:59");

        let t = MySqlTime::new(MySqlTimeSign::Positive, 26, 30, 0, 500_000).unwrap();
        assert_eq!(time_value(t).to_string(), "26:30:00.500");
    }

    #[tokio::test]
    async fn test_missing_config_surfaces_at_first_use() {
        let db = MySqlDatabase::new(DatabaseConfig::default());
        let err = db.read_schema().await.unwrap_err();
        assert!(matches!(err, TalkDbError::Config(_)));
        assert!(err.to_string().contains("DB_USER"));
    }
}

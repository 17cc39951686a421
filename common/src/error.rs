use std::fmt;
use thiserror::Error;

/// why the safety gate refused a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenReason {
    NotSelect,
    DeniedKeyword(String),
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForbiddenReason::NotSelect => write!(f, "only SELECT queries are allowed"),
            ForbiddenReason::DeniedKeyword(word) => {
                write!(f, "forbidden sql operation detected: {}", word.to_uppercase())
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum TalkDbError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("no sql found in model output: {0}")]
    NoSqlFound(String),

    #[error("forbidden operation: {0}")]
    ForbiddenOperation(ForbiddenReason),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tracing initialization failed: {0}")]
    Tracing(String),
}

impl TalkDbError {
    /// stable machine-readable name for the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            TalkDbError::InvalidInput(_) => "invalid_input",
            TalkDbError::GenerationUnavailable(_) => "generation_unavailable",
            TalkDbError::NoSqlFound(_) => "no_sql_found",
            TalkDbError::ForbiddenOperation(_) => "forbidden_operation",
            TalkDbError::Execution(_) => "execution",
            TalkDbError::Catalog(_) => "catalog",
            TalkDbError::Timeout(_) => "timeout",
            TalkDbError::Config(_) => "config",
            TalkDbError::Io(_) => "io",
            TalkDbError::Json(_) => "json",
            TalkDbError::Tracing(_) => "tracing",
        }
    }

    /// true when the root cause is the request or an upstream dependency,
    /// false when the process itself is misconfigured
    pub fn is_client_visible(&self) -> bool {
        !matches!(
            self,
            TalkDbError::Config(_)
                | TalkDbError::Io(_)
                | TalkDbError::Json(_)
                | TalkDbError::Tracing(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TalkDbError>;

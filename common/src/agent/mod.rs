pub mod executor;
pub mod parser;
pub mod prompt;
pub mod validator;

pub use executor::{QueryOutcome, QueryPipeline, Stage};
pub use parser::{extract_sql, SqlCandidate};
pub use prompt::{build_generation_request, GenerationRequest, SQL_RULES_PROMPT};
pub use validator::{validate_sql, ValidatedQuery, DENIED_KEYWORDS};

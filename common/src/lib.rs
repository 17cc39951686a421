pub mod agent;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod llm;
pub mod render;
pub mod schema;
pub mod tracing;

pub use error::{ForbiddenReason, Result, TalkDbError};

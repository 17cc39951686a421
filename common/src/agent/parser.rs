use crate::error::{Result, TalkDbError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

// an optional language tag must end its line, so "```SELECT 1```" keeps SELECT
static FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:[A-Za-z0-9_+.-]*[ \t]*\r?\n)?(.*?)```").unwrap()
});

static SELECT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bselect\b").unwrap());

// statements other than SELECT, recognised only at the start of a line so
// ordinary prose is not mistaken for sql
static OTHER_STATEMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:insert|update|delete|drop|alter|truncate|create|replace|rename|grant|revoke|call|set|lock|load|merge|handler)\b",
    )
    .unwrap()
});

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// sql text pulled out of model output; untrusted until validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlCandidate(String);

impl SqlCandidate {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SqlCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// isolate the first SELECT statement in raw model output
///
/// A fenced block wins over surrounding prose. The statement runs from the
/// first `select` token through the first semicolon after it, or to the end
/// of the text; anything after that semicolon is dropped. Without a `select`
/// token, a line opening with another statement keyword is still returned
/// so the validator can reject it by name.
pub fn extract_sql(raw_text: &str) -> Result<SqlCandidate> {
    let text = raw_text.trim();

    if text.is_empty() {
        return Err(TalkDbError::NoSqlFound(
            "model returned empty output".to_string(),
        ));
    }

    let search = FENCE_REGEX
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    let start = SELECT_REGEX
        .find(search)
        .or_else(|| OTHER_STATEMENT_REGEX.find(search))
        .ok_or_else(|| {
            TalkDbError::NoSqlFound("model output did not contain a sql statement".to_string())
        })?
        .start();

    let statement = &search[start..];
    let statement = match statement.find(';') {
        Some(end) => &statement[..=end],
        None => statement,
    };

    let normalized = WHITESPACE_REGEX.replace_all(statement, " ");
    Ok(SqlCandidate::new(normalized.trim()))
}

//! Safety gate between model output and the database.
//!
//! This is a deny-list, not a parser. It accepts statements that begin with
//! `SELECT` and contain none of [`DENIED_KEYWORDS`] as a whole word. It cannot
//! tell that a `SELECT` calls a stored function with side effects, and it
//! accepts `SELECT ... INTO OUTFILE` / `INTO DUMPFILE`, which write files on
//! the server host. The execution account should therefore hold read grants
//! only, and never the FILE privilege.

use crate::agent::parser::SqlCandidate;
use crate::error::{ForbiddenReason, Result, TalkDbError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

pub const DENIED_KEYWORDS: &[&str] = &["insert", "update", "delete", "drop", "alter", "truncate"];

// `\b` treats `_` as a word character, so `update_time` is not a match
static DENIED_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})\b", DENIED_KEYWORDS.join("|"))).unwrap()
});

static LEADING_SELECT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^select\b").unwrap());

/// a candidate that passed the gate; only [`validate_sql`] can build one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    sql: String,
}

impl ValidatedQuery {
    pub fn as_str(&self) -> &str {
        &self.sql
    }
}

impl fmt::Display for ValidatedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// accept or reject the candidate without changing its text
pub fn validate_sql(candidate: SqlCandidate) -> Result<ValidatedQuery> {
    let text = candidate.as_str();

    if !LEADING_SELECT_REGEX.is_match(text.trim()) {
        return Err(TalkDbError::ForbiddenOperation(ForbiddenReason::NotSelect));
    }

    if let Some(found) = DENIED_REGEX.find(text) {
        return Err(TalkDbError::ForbiddenOperation(
            ForbiddenReason::DeniedKeyword(found.as_str().to_lowercase()),
        ));
    }

    Ok(ValidatedQuery {
        sql: candidate.into_inner(),
    })
}

//! Error types for central-query.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid coordinate `{0}`: expected group:artifact:version[:classifier][@extension]")]
    InvalidCoordinate(String),

    #[error("page size must be greater than zero")]
    ZeroRows,

    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("search service error{}: {message}", code_suffix(.code))]
    Api { code: Option<i64>, message: String },
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(" (code {c})")).unwrap_or_default()
}

impl From<serde_json::Error> for QueryError {
    fn from(e: serde_json::Error) -> Self { QueryError::Decode(e.to_string()) }
}

//! Error types for central-fetch.
//!
//! Every fetch fails with exactly one [`FetchError`]; raw transport errors are
//! flattened into [`FetchError::Network`] or [`FetchError::Timeout`] and never
//! escape. The enum is `Clone` so a failed iterator can hand the same error
//! back on every later call.

use central_query::QueryError;
use thiserror::Error;

pub type Result<T, E = FetchError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("too many requests (HTTP 429){}", detail_suffix(.detail))]
    TooManyRequests { detail: Option<String> },

    #[error("service unavailable (HTTP 503){}", detail_suffix(.detail))]
    ServiceUnavailable { detail: Option<String> },

    #[error("bad gateway (HTTP 502){}", detail_suffix(.detail))]
    BadGateway { detail: Option<String> },

    #[error("gateway timeout (HTTP 504){}", detail_suffix(.detail))]
    GatewayTimeout { detail: Option<String> },

    #[error("internal server error (HTTP 500){}", detail_suffix(.detail))]
    InternalServerError { detail: Option<String> },

    #[error("not found (HTTP 404){}", detail_suffix(.detail))]
    NotFound { detail: Option<String> },

    #[error("bad request (HTTP 400){}", detail_suffix(.detail))]
    BadRequest { detail: Option<String> },

    #[error("unauthorized (HTTP 401){}", detail_suffix(.detail))]
    Unauthorized { detail: Option<String> },

    #[error("forbidden (HTTP 403){}", detail_suffix(.detail))]
    Forbidden { detail: Option<String> },

    #[error("unexpected HTTP status {status}{}", detail_suffix(.detail))]
    UnexpectedStatus { status: u16, detail: Option<String> },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("search service error{}: {message}", code_suffix(.code))]
    Api { code: Option<i64>, message: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("iterator exhausted")]
    IteratorExhausted,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A batch task ended without producing a result (it panicked).
    #[error("task failed: {0}")]
    Task(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(" (code {c})")).unwrap_or_default()
}

impl FetchError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        match status {
            429 => FetchError::TooManyRequests { detail },
            503 => FetchError::ServiceUnavailable { detail },
            502 => FetchError::BadGateway { detail },
            504 => FetchError::GatewayTimeout { detail },
            500 => FetchError::InternalServerError { detail },
            404 => FetchError::NotFound { detail },
            400 => FetchError::BadRequest { detail },
            401 => FetchError::Unauthorized { detail },
            403 => FetchError::Forbidden { detail },
            status => FetchError::UnexpectedStatus { status, detail },
        }
    }

    /// The HTTP status this error was classified from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::TooManyRequests { .. } => Some(429),
            FetchError::ServiceUnavailable { .. } => Some(503),
            FetchError::BadGateway { .. } => Some(502),
            FetchError::GatewayTimeout { .. } => Some(504),
            FetchError::InternalServerError { .. } => Some(500),
            FetchError::NotFound { .. } => Some(404),
            FetchError::BadRequest { .. } => Some(400),
            FetchError::Unauthorized { .. } => Some(401),
            FetchError::Forbidden { .. } => Some(403),
            FetchError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether retrying after a delay may succeed.
    ///
    /// Server overload statuses and connection-level failures are transient.
    /// Cancellation is never transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::TooManyRequests { .. }
                | FetchError::ServiceUnavailable { .. }
                | FetchError::BadGateway { .. }
                | FetchError::GatewayTimeout { .. }
                | FetchError::InternalServerError { .. }
                | FetchError::Network(_)
                | FetchError::Timeout
        )
    }

    pub fn is_cancelled(&self) -> bool { matches!(self, FetchError::Cancelled) }
}

impl From<QueryError> for FetchError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::Decode(msg) => FetchError::Decode(msg),
            QueryError::Api { code, message } => FetchError::Api { code, message },
            other => FetchError::InvalidRequest(other.to_string()),
        }
    }
}

//! Huginn error types

use std::time::Duration;

/// Huginn error types
///
/// `Clone` so a single failed computation can be handed to every caller
/// coalesced onto the same cache key.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HuginnError {
    // Backend/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("backend rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("backend request timed out")]
    BackendTimeout,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(String),

    #[error("empty response from model")]
    EmptyResponse,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Orchestration outcomes
    #[error("too many requests for '{subject}'")]
    AdmissionRejected { subject: String },

    #[error("circuit '{0}' is open")]
    CircuitOpen(String),

    #[error("request timeout after {0:?}")]
    Timeout(Duration),

    #[error("background task failed: {0}")]
    TaskFailed(String),

    // Configuration errors
    #[error("no backend configured")]
    NoBackend,

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Coarse classification of a [`HuginnError`].
///
/// Drives the retry decision, the HTTP status mapping in
/// [`ApiResponse`](crate::types::ApiResponse) and the `kind` label on metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Per-domain request ceiling exceeded. Never retried.
    AdmissionRejected,
    /// Caller supplied malformed parameters.
    InvalidInput,
    /// Backend failure worth retrying.
    Transient,
    /// Backend failure that will not improve on retry.
    Permanent,
    /// Call short-circuited by an open breaker.
    CircuitOpen,
    /// Async deadline elapsed before the work finished.
    Timeout,
    /// Worker panic, misconfiguration, or other internal fault.
    Internal,
}

impl ErrorKind {
    /// Stable lowercase label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AdmissionRejected => "admission_rejected",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Transient => "transient",
            ErrorKind::Permanent => "permanent",
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Internal => "internal",
        }
    }
}

impl HuginnError {
    /// Whether retrying the same backend call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            HuginnError::Http(_)
            | HuginnError::RateLimited { .. }
            | HuginnError::BackendTimeout => true,
            HuginnError::Api { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            _ => false,
        }
    }

    /// Backend-provided delay hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            HuginnError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Map onto the orchestration error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HuginnError::AdmissionRejected { .. } => ErrorKind::AdmissionRejected,
            HuginnError::InvalidInput(_) => ErrorKind::InvalidInput,
            HuginnError::CircuitOpen(_) => ErrorKind::CircuitOpen,
            HuginnError::Timeout(_) => ErrorKind::Timeout,
            HuginnError::TaskFailed(_)
            | HuginnError::NoBackend
            | HuginnError::Configuration(_) => ErrorKind::Internal,
            e if e.is_transient() => ErrorKind::Transient,
            _ => ErrorKind::Permanent,
        }
    }
}

impl From<reqwest::Error> for HuginnError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HuginnError::BackendTimeout
        } else if err.is_decode() {
            HuginnError::Json(err.to_string())
        } else {
            HuginnError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HuginnError {
    fn from(err: serde_json::Error) -> Self {
        HuginnError::Json(err.to_string())
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;

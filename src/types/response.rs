//! Invocation outcomes and the response envelope handed to the HTTP layer

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::request::Domain;
use crate::gateway::Resolution;
use crate::{ErrorKind, HuginnError, Result};

/// Outcome of one [`ResilientInvoker::invoke`](crate::resilience::ResilientInvoker::invoke).
///
/// Exactly one of text or error is carried.
#[derive(Debug, Clone)]
pub enum InvocationResult {
    /// The backend produced this text.
    Success(String),
    /// The backend was unavailable; this is the domain's canned response.
    Fallback(String),
    /// The backend was unavailable and no fallback was supplied.
    Failure(HuginnError),
}

impl InvocationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success(_))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, InvocationResult::Fallback(_))
    }

    /// Text for `Success` and `Fallback`, `None` for `Failure`.
    pub fn text(&self) -> Option<&str> {
        match self {
            InvocationResult::Success(t) | InvocationResult::Fallback(t) => Some(t),
            InvocationResult::Failure(_) => None,
        }
    }

    /// Failure classification, `None` unless this is a `Failure`.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            InvocationResult::Failure(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Content delivered to a caller of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub domain: Domain,
    pub text: String,
    /// `true` when `text` is a fallback rather than a backend completion.
    pub degraded: bool,
}

impl Completion {
    /// Convert an invocation outcome, surfacing `Failure` as an error.
    pub fn from_invocation(domain: Domain, result: InvocationResult) -> Result<Self> {
        match result {
            InvocationResult::Success(text) => Ok(Self {
                domain,
                text,
                degraded: false,
            }),
            InvocationResult::Fallback(text) => Ok(Self {
                domain,
                text,
                degraded: true,
            }),
            InvocationResult::Failure(e) => Err(e),
        }
    }
}

/// Message shown for admission rejections.
pub const TOO_MANY_REQUESTS: &str = "Too many requests. Please try again later.";

/// Message shown for async deadline expiry.
pub const REQUEST_TIMEOUT: &str = "Request timeout";

/// `{success, data?, error?}` envelope returned to the HTTP layer.
///
/// `status_code()` is the status-equivalent the transport should use:
/// content and fallback content are 200, admission rejection 429, async
/// timeout 408, invalid input 400, anything else 500. Backend error text is
/// never copied into the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    #[serde(skip)]
    status: u16,
}

impl ApiResponse {
    /// Successful envelope carrying `data`.
    pub fn success(data: impl Into<String>) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data.into()),
            error: None,
            timestamp: now_millis(),
            processing_time_ms: None,
            status: 200,
        }
    }

    /// Error envelope with the standard reason phrase for `status` as message.
    pub fn error(status: u16, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(reason_phrase(status).to_string()),
            data: None,
            error: Some(error.into()),
            timestamp: now_millis(),
            processing_time_ms: None,
            status,
        }
    }

    /// Envelope for a synchronous orchestrator result.
    pub fn from_result(domain: Domain, result: &Result<Completion>) -> Self {
        match result {
            Ok(completion) => Self::success(completion.text.clone()),
            Err(e) => Self::from_error(domain, e),
        }
    }

    /// Envelope for a resolved async handle.
    pub fn from_resolution(domain: Domain, resolution: &Resolution<Completion>) -> Self {
        match resolution {
            Resolution::Completed(completion) => Self::success(completion.text.clone()),
            Resolution::Failed(e) => Self::from_error(domain, e),
            Resolution::TimedOut(_) => Self::error(408, REQUEST_TIMEOUT),
        }
    }

    fn from_error(domain: Domain, err: &HuginnError) -> Self {
        match err {
            HuginnError::AdmissionRejected { .. } => Self::error(429, TOO_MANY_REQUESTS),
            HuginnError::Timeout(_) => Self::error(408, REQUEST_TIMEOUT),
            HuginnError::InvalidInput(reason) => Self::error(400, reason.clone()),
            _ => Self::error(500, generic_failure(domain)),
        }
    }

    /// Attach the elapsed processing time.
    pub fn with_processing_time(mut self, elapsed: Duration) -> Self {
        self.processing_time_ms = Some(elapsed.as_millis() as u64);
        self
    }

    /// Status-equivalent for the transport layer.
    pub fn status_code(&self) -> u16 {
        self.status
    }
}

fn generic_failure(domain: Domain) -> &'static str {
    match domain {
        Domain::Chat => "Failed to process request. Please try again.",
        Domain::Recipe => "Failed to generate recipe. Please try again.",
        Domain::Travel => "Failed to generate itinerary. Please try again.",
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        408 => "Request Timeout",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Error",
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `domain`: operation domain ("chat", "recipe", "travel")
//! - `namespace`: cache namespace (e.g. "recipes")
//! - `outcome`: "success" | "fallback" | "failure"
//! - `kind`: [`ErrorKind`](crate::ErrorKind) label

/// Total requests that reached the orchestrator after validation.
///
/// Labels: `domain`, `outcome`.
pub const REQUESTS_TOTAL: &str = "huginn_requests_total";

/// End-to-end request duration in seconds.
///
/// Labels: `domain`.
pub const REQUEST_DURATION_SECONDS: &str = "huginn_request_duration_seconds";

/// Requests rejected by the rate limiter.
///
/// Labels: `domain`.
pub const ADMISSIONS_REJECTED_TOTAL: &str = "huginn_admissions_rejected_total";

/// Total retry attempts (not counting the initial call).
///
/// Labels: `domain`.
pub const RETRIES_TOTAL: &str = "huginn_retries_total";

/// Total cache hits.
///
/// Labels: `namespace`.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Total cache misses (each miss runs or joins one computation).
///
/// Labels: `namespace`.
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Full cache flushes performed by the eviction schedule.
pub const CACHE_FLUSHES_TOTAL: &str = "huginn_cache_flushes_total";

/// Circuit breaker state transitions.
///
/// Labels: `circuit`, `to` ("closed" | "open" | "half_open").
pub const CIRCUIT_TRANSITIONS_TOTAL: &str = "huginn_circuit_transitions_total";

/// Calls short-circuited by an open breaker.
///
/// Labels: `circuit`.
pub const CIRCUIT_REJECTIONS_TOTAL: &str = "huginn_circuit_rejections_total";

/// Fallback responses served in place of a backend completion.
///
/// Labels: `domain`.
pub const FALLBACKS_TOTAL: &str = "huginn_fallbacks_total";

/// Async submissions that hit their deadline.
pub const ASYNC_TIMEOUTS_TOTAL: &str = "huginn_async_timeouts_total";

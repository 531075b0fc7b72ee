//! Fault handling around backend calls.
//!
//! - [`retry`]: exponential backoff on transient errors
//! - [`circuit`]: per-domain circuit breaker
//! - [`fallback`]: canned degraded responses
//! - [`invoker`]: [`ResilientInvoker`], composing the three

pub mod circuit;
pub mod fallback;
pub mod invoker;
pub mod retry;

pub use circuit::{CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use fallback::{DomainFallback, Fallback};
pub use invoker::ResilientInvoker;
pub use retry::{RetryConfig, with_retry};

//! Retry + circuit breaker + fallback around one backend call.

use std::future::Future;

use tracing::{debug, warn};

use super::circuit::{CircuitBreaker, CircuitBreakerConfig};
use super::fallback::Fallback;
use super::retry::{RetryConfig, with_retry};
use crate::telemetry;
use crate::types::{Domain, InvocationResult};
use crate::{HuginnError, Result};

/// Resilient wrapper for the backend calls of one domain.
///
/// Layering, outermost first:
///
/// 1. circuit breaker: an open circuit skips the operation entirely
/// 2. retry: transient errors are re-attempted with backoff, except for a
///    half-open trial, which gets exactly one attempt
/// 3. the operation itself
///
/// A whole retry sequence counts as one outcome for the breaker. Whenever
/// the circuit rejects the call or the retries end in an error, the
/// fallback (if any) is rendered and returned as
/// [`InvocationResult::Fallback`]; the error is only logged.
pub struct ResilientInvoker {
    domain: Domain,
    retry: RetryConfig,
    breaker: CircuitBreaker,
}

impl ResilientInvoker {
    /// The breaker is named after the domain.
    pub fn new(domain: Domain, retry: RetryConfig, breaker: CircuitBreakerConfig) -> Self {
        Self {
            domain,
            retry,
            breaker: CircuitBreaker::new(domain.as_str(), breaker),
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Run `operation` under the breaker and retry policy.
    ///
    /// `operation` is called once per attempt. Without a fallback, failures
    /// surface as [`InvocationResult::Failure`].
    pub async fn invoke<F, Fut>(
        &self,
        operation: F,
        fallback: Option<&dyn Fallback>,
    ) -> InvocationResult
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let domain = self.domain.as_str();

        let Some(permit) = self.breaker.try_acquire() else {
            debug!(domain, "circuit open, skipping backend");
            return self.degrade(HuginnError::CircuitOpen(domain.to_string()), fallback);
        };

        // a half-open trial is a single call, never a retry sequence
        let single_attempt;
        let retry = if permit.is_probe() {
            single_attempt = RetryConfig::disabled();
            &single_attempt
        } else {
            &self.retry
        };

        match with_retry(retry, domain, operation).await {
            Ok(text) => {
                permit.success();
                InvocationResult::Success(text)
            }
            Err(e) => {
                permit.failure();
                self.degrade(e, fallback)
            }
        }
    }

    fn degrade(&self, error: HuginnError, fallback: Option<&dyn Fallback>) -> InvocationResult {
        let domain = self.domain.as_str();
        match fallback {
            Some(fallback) => {
                warn!(domain, kind = error.kind().as_str(), error = %error, "serving fallback");
                metrics::counter!(telemetry::FALLBACKS_TOTAL, "domain" => domain).increment(1);
                InvocationResult::Fallback(fallback.render())
            }
            None => {
                warn!(domain, kind = error.kind().as_str(), error = %error, "backend call failed");
                InvocationResult::Failure(error)
            }
        }
    }
}

//! Backoff policy for transient backend failures.
//!
//! [`with_retry`] is the innermost layer of
//! [`ResilientInvoker`](super::ResilientInvoker). The circuit breaker sees
//! one outcome per retry sequence, however many attempts it took.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::telemetry;
use crate::Result;

/// How often, and how patiently, a backend call is re-attempted.
///
/// Delays double from `initial_delay` up to `max_delay`:
///
/// ```rust
/// # use huginn::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(200));
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total calls per sequence, first one included. Default: 3.
    pub max_attempts: u32,
    /// Pause after the first failure. Default: 500ms.
    pub initial_delay: Duration,
    /// Upper bound for any single pause. Default: 30s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// One attempt, no pauses.
    pub fn disabled() -> Self {
        Self::default().max_attempts(1)
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Pause after failed attempt `attempt` (0 = the first call).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Like [`delay_for_attempt`](Self::delay_for_attempt), but a backend
    /// `Retry-After` hint replaces the backoff. Both are bounded by `max_delay`.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(hint) => hint.min(self.max_delay),
            None => self.delay_for_attempt(attempt),
        }
    }
}

/// Call `f` until it succeeds, fails permanently, or runs out of attempts.
///
/// Only errors with [`HuginnError::is_transient`](crate::HuginnError::is_transient) are re-attempted. The
/// error of the final attempt is returned. `max_attempts = 0` behaves like 1.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, domain: &str, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        let err = match f().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        attempt += 1;
        if !err.is_transient() || attempt >= attempts {
            return Err(err);
        }

        let delay = config.effective_delay(attempt - 1, err.retry_after());
        metrics::counter!(telemetry::RETRIES_TOTAL, "domain" => domain.to_owned()).increment(1);
        warn!(
            domain,
            attempt,
            max_attempts = attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient backend error, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_until_cap() {
        let config = RetryConfig::new()
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(350));
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(350));
        assert_eq!(config.delay_for_attempt(30), Duration::from_millis(350));
    }

    #[test]
    fn retry_after_hint_takes_precedence() {
        let config = RetryConfig::new();
        assert_eq!(
            config.effective_delay(0, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(
            config.effective_delay(0, Some(Duration::from_secs(300))),
            config.max_delay
        );
    }

    #[test]
    fn disabled_means_single_attempt() {
        assert_eq!(RetryConfig::disabled().max_attempts, 1);
    }
}

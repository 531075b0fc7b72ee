//! Retry + circuit breaker + fallback composition.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use huginn::{
    CircuitBreakerConfig, CircuitState, Domain, DomainFallback, ErrorKind, Fallback, HuginnError,
    InvocationResult, ResilientInvoker, Result, RetryConfig,
};

/// Counts calls; fails while `failing` is set.
struct Backend {
    calls: AtomicU32,
    failures_left: AtomicU32,
}

impl Backend {
    fn failing(times: u32) -> Self {
        Self {
            calls: AtomicU32::new(0),
            failures_left: AtomicU32::new(times),
        }
    }

    fn healthy() -> Self {
        Self::failing(0)
    }

    async fn complete(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(HuginnError::Api {
                status: 503,
                message: "overloaded".into(),
            });
        }
        Ok("real completion".to_string())
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

fn invoker(retry: RetryConfig) -> ResilientInvoker {
    ResilientInvoker::new(Domain::Travel, retry, CircuitBreakerConfig::default())
}

#[tokio::test(start_paused = true)]
async fn success_passes_through() {
    let backend = Backend::healthy();
    let invoker = invoker(RetryConfig::default());
    let result = invoker
        .invoke(|| backend.complete(), Some(&DomainFallback::Recipe))
        .await;
    assert!(result.is_success());
    assert_eq!(result.text(), Some("real completion"));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_failure_recovered_by_retry() {
    let backend = Backend::failing(2);
    let invoker = invoker(RetryConfig::default());
    let result = invoker.invoke(|| backend.complete(), None).await;
    assert!(result.is_success());
    assert_eq!(backend.calls(), 3);
    assert_eq!(invoker.breaker().failure_rate(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_serve_fallback() {
    let backend = Backend::failing(u32::MAX);
    let invoker = invoker(RetryConfig::default());
    let fallback = DomainFallback::itinerary("Oslo");
    let result = invoker.invoke(|| backend.complete(), Some(&fallback)).await;

    assert!(result.is_fallback());
    assert!(result.text().unwrap().contains("Oslo"));
    assert_eq!(backend.calls(), 3);
    // one failed retry sequence is one breaker outcome
    assert_eq!(invoker.breaker().failure_rate(), 1.0);
    assert_eq!(invoker.breaker().state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn failure_without_fallback_is_reported() {
    let backend = Backend::failing(u32::MAX);
    let invoker = invoker(RetryConfig::disabled());
    let result = invoker.invoke(|| backend.complete(), None).await;
    assert!(matches!(
        result,
        InvocationResult::Failure(HuginnError::Api { status: 503, .. })
    ));
    assert_eq!(result.error_kind(), Some(ErrorKind::Transient));
}

#[tokio::test(start_paused = true)]
async fn open_circuit_skips_operation() {
    let backend = Backend::failing(u32::MAX);
    let invoker = invoker(RetryConfig::disabled());
    for _ in 0..5 {
        invoker
            .invoke(|| backend.complete(), Some(&DomainFallback::Chat))
            .await;
    }
    assert_eq!(invoker.breaker().state(), CircuitState::Open);
    assert_eq!(backend.calls(), 5);

    for _ in 0..7 {
        let result = invoker
            .invoke(|| backend.complete(), Some(&DomainFallback::Chat))
            .await;
        assert!(result.is_fallback());
    }
    assert_eq!(backend.calls(), 5, "open circuit must not reach the backend");

    let result = invoker.invoke(|| backend.complete(), None).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::CircuitOpen));
}

#[tokio::test(start_paused = true)]
async fn exactly_one_trial_after_cool_down() {
    let backend = Backend::failing(u32::MAX);
    let invoker = invoker(RetryConfig::disabled());
    for _ in 0..5 {
        invoker
            .invoke(|| backend.complete(), Some(&DomainFallback::Chat))
            .await;
    }

    tokio::time::advance(Duration::from_secs(30)).await;

    for _ in 0..5 {
        invoker
            .invoke(|| backend.complete(), Some(&DomainFallback::Chat))
            .await;
    }
    assert_eq!(backend.calls(), 6);
    assert_eq!(invoker.breaker().state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn trial_is_single_attempt_under_default_retry() {
    let backend = Backend::failing(u32::MAX);
    let invoker = invoker(RetryConfig::default());
    for _ in 0..5 {
        invoker
            .invoke(|| backend.complete(), Some(&DomainFallback::Chat))
            .await;
    }
    assert_eq!(backend.calls(), 15);
    assert_eq!(invoker.breaker().state(), CircuitState::Open);

    tokio::time::advance(Duration::from_secs(30)).await;

    let result = invoker
        .invoke(|| backend.complete(), Some(&DomainFallback::Chat))
        .await;
    assert!(result.is_fallback());
    assert_eq!(backend.calls(), 16, "trial must not be retried");
    assert_eq!(invoker.breaker().state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn successful_trial_resumes_traffic() {
    let backend = Backend::failing(5);
    let invoker = invoker(RetryConfig::disabled());
    for _ in 0..5 {
        invoker
            .invoke(|| backend.complete(), Some(&DomainFallback::Chat))
            .await;
    }
    tokio::time::advance(Duration::from_secs(30)).await;

    let result = invoker
        .invoke(|| backend.complete(), Some(&DomainFallback::Chat))
        .await;
    assert!(result.is_success());
    assert_eq!(invoker.breaker().state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn fallback_does_not_touch_backend_or_breaker() {
    let backend = Backend::failing(u32::MAX);
    let invoker = invoker(RetryConfig::disabled());
    invoker.breaker().force_open();

    let renders = AtomicU32::new(0);
    let fallback = || {
        renders.fetch_add(1, Ordering::SeqCst);
        "canned".to_string()
    };
    let result = invoker
        .invoke(|| backend.complete(), Some(&fallback as &dyn Fallback))
        .await;

    assert_eq!(result.text(), Some("canned"));
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert_eq!(backend.calls(), 0);
    assert_eq!(invoker.breaker().failure_rate(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn permanent_error_counts_once_without_retry() {
    let calls = AtomicU32::new(0);
    let invoker = invoker(RetryConfig::default());
    let result = invoker
        .invoke(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(HuginnError::ModelNotFound("missing".into()))
            },
            Some(&DomainFallback::Recipe),
        )
        .await;
    assert!(result.is_fallback());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(invoker.breaker().failure_rate(), 1.0);
}

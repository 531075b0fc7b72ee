//! Fixed-window admission control.

use std::sync::Arc;
use std::time::Duration;

use huginn::{RateLimitConfig, RateLimiter};

fn limiter() -> RateLimiter {
    RateLimiter::new(RateLimitConfig::default())
}

#[tokio::test(start_paused = true)]
async fn admits_up_to_ceiling_then_rejects() {
    let limiter = limiter();
    for i in 0..10 {
        assert!(limiter.try_acquire("chat"), "call {i} should be admitted");
    }
    assert!(!limiter.try_acquire("chat"));
    assert!(!limiter.try_acquire("chat"));
}

#[tokio::test(start_paused = true)]
async fn count_keeps_growing_past_ceiling() {
    let limiter = limiter();
    for _ in 0..15 {
        limiter.try_acquire("recipe");
    }
    assert_eq!(limiter.window("recipe").unwrap().count, 15);
    assert_eq!(limiter.remaining("recipe"), 0);
}

#[tokio::test(start_paused = true)]
async fn window_resets_after_expiry() {
    let limiter = limiter();
    for _ in 0..12 {
        limiter.try_acquire("chat");
    }
    assert!(!limiter.try_acquire("chat"));

    tokio::time::advance(Duration::from_secs(61)).await;

    assert!(limiter.try_acquire("chat"));
    // only the post-rollover call is counted
    assert_eq!(limiter.window("chat").unwrap().count, 1);
    assert_eq!(limiter.remaining("chat"), 9);
}

#[tokio::test(start_paused = true)]
async fn window_is_still_active_at_exact_boundary() {
    let limiter = limiter();
    for _ in 0..10 {
        assert!(limiter.try_acquire("travel"));
    }

    tokio::time::advance(Duration::from_secs(60)).await;

    assert!(!limiter.try_acquire("travel"));
}

#[tokio::test(start_paused = true)]
async fn burst_can_straddle_window_boundary() {
    let limiter = limiter();
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(limiter.try_acquire("chat"));

    tokio::time::advance(Duration::from_secs(59)).await;
    for _ in 0..9 {
        assert!(limiter.try_acquire("chat"));
    }

    tokio::time::advance(Duration::from_millis(1001)).await;
    for _ in 0..10 {
        assert!(limiter.try_acquire("chat"));
    }
}

#[tokio::test(start_paused = true)]
async fn subjects_are_independent() {
    let limiter = limiter();
    for _ in 0..10 {
        assert!(limiter.try_acquire("chat"));
    }
    assert!(!limiter.try_acquire("chat"));
    assert!(limiter.try_acquire("recipe"));
    assert!(limiter.try_acquire("travel"));
    assert_eq!(limiter.remaining("recipe"), 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_never_exceed_ceiling() {
    let limiter = Arc::new(RateLimiter::new(
        RateLimitConfig::new()
            .max_requests(25)
            .window(Duration::from_secs(3600)),
    ));

    let mut tasks = Vec::new();
    for _ in 0..200 {
        let limiter = Arc::clone(&limiter);
        tasks.push(tokio::spawn(async move { limiter.try_acquire("chat") }));
    }

    let mut admitted = 0;
    for task in tasks {
        if task.await.unwrap() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 25);
    assert_eq!(limiter.window("chat").unwrap().count, 200);
}

#[test]
fn custom_ceiling_is_respected() {
    let limiter = RateLimiter::new(RateLimitConfig::new().max_requests(1));
    assert!(limiter.try_acquire("chat"));
    assert!(!limiter.try_acquire("chat"));
    assert_eq!(limiter.config().max_requests, 1);
}

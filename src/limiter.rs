//! Per-subject fixed-window admission control.
//!
//! [`RateLimiter`] keeps one [`RateWindow`] per subject (here: the operation
//! domain). A window lives for `config.window`; the first call that arrives
//! *strictly later* than `window_start + window` resets it. This is a fixed
//! window, not a sliding one, so a burst of `2 * max_requests` can straddle
//! a boundary.
//!
//! The counter keeps increasing past the ceiling while a window is active;
//! rejected calls are still counted. Callers must not assume the count
//! saturates at `max_requests`.
//!
//! # Concurrency
//!
//! Windows live in a [`DashMap`], so updates to one subject are serialised
//! by its shard lock while unrelated subjects proceed in parallel. There is
//! no global lock.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// Rate limit configuration.
///
/// ```rust
/// # use huginn::RateLimitConfig;
/// # use std::time::Duration;
/// let config = RateLimitConfig::new()
///     .max_requests(100)
///     .window(Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Admissions allowed per window. Default: 10.
    pub max_requests: u32,
    /// Window length. Default: 60s.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_requests(mut self, n: u32) -> Self {
        self.max_requests = n;
        self
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

/// Mutable per-subject window state.
#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    /// Calls seen in this window, including rejected ones.
    pub count: u64,
    pub window_start: Instant,
}

impl RateWindow {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }
}

/// Fixed-window rate limiter keyed by subject.
pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    /// Count one call against `subject` and report whether it is admitted.
    ///
    /// An unseen subject starts a fresh window. Never blocks.
    pub fn try_acquire(&self, subject: &str) -> bool {
        let now = Instant::now();
        let mut window = self
            .windows
            .entry(subject.to_string())
            .or_insert_with(|| RateWindow::new(now));

        if now.duration_since(window.window_start) > self.config.window {
            *window = RateWindow::new(now);
        }

        window.count += 1;
        window.count <= u64::from(self.config.max_requests)
    }

    /// Snapshot of the window for `subject`, if one exists.
    pub fn window(&self, subject: &str) -> Option<RateWindow> {
        self.windows.get(subject).map(|w| *w)
    }

    /// Admissions still available to `subject` in its current window.
    ///
    /// Does not account for a pending reset; a subject whose window has
    /// expired reports the stale remainder until its next call.
    pub fn remaining(&self, subject: &str) -> u32 {
        let used = self.window(subject).map(|w| w.count).unwrap_or(0);
        u64::from(self.config.max_requests).saturating_sub(used) as u32
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 10);
        assert_eq!(config.window, Duration::from_secs(60));
    }

    #[test]
    fn unseen_subject_has_full_allowance() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        assert_eq!(limiter.remaining("chat"), 10);
        assert!(limiter.window("chat").is_none());
    }

    #[test]
    fn remaining_saturates_at_zero() {
        let limiter = RateLimiter::new(RateLimitConfig::new().max_requests(2));
        for _ in 0..5 {
            limiter.try_acquire("chat");
        }
        assert_eq!(limiter.remaining("chat"), 0);
        assert_eq!(limiter.window("chat").unwrap().count, 5);
    }
}

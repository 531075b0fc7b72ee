//! Scheduled full flush of the response cache.
//!
//! [`EvictionTask::spawn`] starts a tokio task that calls
//! [`ResponseCache::clear_all`] every `interval`, first firing one interval
//! after spawn. The task is aborted when the [`EvictionTask`] is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;

use super::response::{Cacheable, ResponseCache};
use crate::telemetry;

/// Handle to the periodic flush task.
pub struct EvictionTask {
    handle: JoinHandle<()>,
    interval: Duration,
}

impl EvictionTask {
    /// Spawn the flush loop on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Requires a tokio runtime context, and `interval` must be non-zero.
    pub fn spawn<V>(cache: Arc<ResponseCache<V>>, interval: Duration) -> Self
    where
        V: Cacheable + Clone + Send + Sync + 'static,
    {
        Self::spawn_on(&tokio::runtime::Handle::current(), cache, interval)
    }

    /// Spawn the flush loop on a specific runtime.
    pub fn spawn_on<V>(
        runtime: &tokio::runtime::Handle,
        cache: Arc<ResponseCache<V>>,
        interval: Duration,
    ) -> Self
    where
        V: Cacheable + Clone + Send + Sync + 'static,
    {
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                cache.clear_all();
                metrics::counter!(telemetry::CACHE_FLUSHES_TOTAL).increment(1);
                info!(interval_secs = interval.as_secs(), "response cache flushed");
            }
        });
        Self { handle, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the flush loop is still scheduled.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for EvictionTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

//! Namespaced single-flight response cache.
//!
//! [`ResponseCache`] memoises backend completions per [`Namespace`]. Each
//! namespace is an independent moka cache with no capacity bound and no
//! per-entry expiry; memory is reclaimed only by [`ResponseCache::clear`]
//! / [`ResponseCache::clear_all`], which the eviction task in
//! [`super::eviction`] calls on a fixed schedule.
//!
//! # Single flight
//!
//! [`ResponseCache::get_or_compute`] goes through moka's entry API, which
//! coalesces concurrent initialisations of the same key: the first caller
//! runs the supplier, later callers wait and receive a clone of its outcome.
//!
//! # What gets stored
//!
//! Only values whose [`Cacheable::is_cacheable`] returns `true` are stored.
//! Uncacheable values (empty text, fallback content) and supplier errors are
//! still delivered to every coalesced waiter, but the next lookup misses and
//! runs the supplier again.
//!
//! # Interaction with clearing
//!
//! Clearing uses `invalidate_all`, which is safe to call concurrently with
//! lookups. A computation in flight when the cache is cleared still
//! delivers its value to its waiters; whether that value survives the flush
//! depends on whether it was written before or after the invalidation point.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::telemetry;
use crate::types::{CacheKey, InvocationResult};
use crate::{HuginnError, Result};

/// Configuration for the response cache.
///
/// ```rust
/// # use huginn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new().flush_interval(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Interval between full flushes of every namespace. Default: 1 hour.
    pub flush_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }
}

/// Logically independent cache partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    ChatResponses,
    ChatOptions,
    Recipes,
    Itineraries,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::ChatResponses,
        Namespace::ChatOptions,
        Namespace::Recipes,
        Namespace::Itineraries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::ChatResponses => "chatResponses",
            Namespace::ChatOptions => "chatOptions",
            Namespace::Recipes => "recipes",
            Namespace::Itineraries => "itineraries",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values that decide for themselves whether they may be stored.
pub trait Cacheable {
    fn is_cacheable(&self) -> bool;
}

impl Cacheable for String {
    fn is_cacheable(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Cacheable for InvocationResult {
    /// Only real, non-blank completions are stored. Fallback text is a
    /// transient substitute and must not outlive the outage.
    fn is_cacheable(&self) -> bool {
        match self {
            InvocationResult::Success(text) => text.is_cacheable(),
            _ => false,
        }
    }
}

/// Outcome that was computed but not stored, shared with coalesced waiters.
enum Uncached<V> {
    Value(V),
    Failed(HuginnError),
}

/// In-memory, namespaced, single-flight response cache.
pub struct ResponseCache<V = InvocationResult> {
    namespaces: [Cache<String, V>; 4],
}

impl<V> ResponseCache<V>
where
    V: Cacheable + Clone + Send + Sync + 'static,
{
    /// Create an empty cache with one unbounded partition per namespace.
    pub fn new() -> Self {
        Self {
            namespaces: std::array::from_fn(|_| Cache::builder().build()),
        }
    }

    fn partition(&self, namespace: Namespace) -> &Cache<String, V> {
        &self.namespaces[namespace.index()]
    }

    /// Return the cached value for `key`, or run `supplier` to produce it.
    ///
    /// At most one supplier runs per `(namespace, key)` at a time. Errors
    /// from the supplier propagate to the caller and every waiter, and are
    /// not cached.
    pub async fn get_or_compute<F, Fut>(
        &self,
        namespace: Namespace,
        key: &CacheKey,
        supplier: F,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let init = async move {
            match supplier().await {
                Ok(value) if value.is_cacheable() => Ok(value),
                Ok(value) => Err(Uncached::Value(value)),
                Err(e) => Err(Uncached::Failed(e)),
            }
        };

        let outcome = self
            .partition(namespace)
            .entry(key.as_str().to_string())
            .or_try_insert_with(init)
            .await;

        match outcome {
            Ok(entry) => {
                let label = if entry.is_fresh() {
                    telemetry::CACHE_MISSES_TOTAL
                } else {
                    telemetry::CACHE_HITS_TOTAL
                };
                metrics::counter!(label, "namespace" => namespace.as_str()).increment(1);
                Ok(entry.into_value())
            }
            Err(shared) => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "namespace" => namespace.as_str())
                    .increment(1);
                match shared.as_ref() {
                    Uncached::Value(value) => {
                        debug!(%namespace, key = %key, "computed value not cacheable");
                        Ok(value.clone())
                    }
                    Uncached::Failed(e) => Err(e.clone()),
                }
            }
        }
    }

    /// Look up `key` without computing.
    pub async fn get(&self, namespace: Namespace, key: &CacheKey) -> Option<V> {
        self.partition(namespace).get(key.as_str()).await
    }

    /// Whether `key` currently has a stored value.
    pub fn contains(&self, namespace: Namespace, key: &CacheKey) -> bool {
        self.partition(namespace).contains_key(key.as_str())
    }

    /// Evict every entry in one namespace.
    pub fn clear(&self, namespace: Namespace) {
        self.partition(namespace).invalidate_all();
    }

    /// Evict every entry in every namespace.
    pub fn clear_all(&self) {
        for namespace in Namespace::ALL {
            self.clear(namespace);
        }
    }
}

impl<V> Default for ResponseCache<V>
where
    V: Cacheable + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_config_defaults() {
        assert_eq!(CacheConfig::default().flush_interval, Duration::from_secs(3600));
    }

    #[test]
    fn namespace_indices_are_distinct() {
        let mut seen: Vec<usize> = Namespace::ALL.iter().map(|n| n.index()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn only_non_blank_success_is_cacheable() {
        assert!(InvocationResult::Success("text".into()).is_cacheable());
        assert!(!InvocationResult::Success("  ".into()).is_cacheable());
        assert!(!InvocationResult::Fallback("canned".into()).is_cacheable());
        assert!(!InvocationResult::Failure(HuginnError::EmptyResponse).is_cacheable());
    }
}

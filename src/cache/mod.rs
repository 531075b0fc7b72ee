//! Caching subsystem.
//!
//! - [`response::ResponseCache`]: namespaced single-flight memoisation of
//!   backend completions. Unbounded between flushes; only successful,
//!   non-blank completions are stored.
//!
//! - [`eviction::EvictionTask`]: the fixed-rate full flush. Owned by the
//!   [`Orchestrator`](crate::Orchestrator) and stopped when it is dropped.
//!   Every namespace shares the one schedule, but each can also be cleared
//!   on its own via [`ResponseCache::clear`].

pub mod eviction;
pub mod response;

pub use eviction::EvictionTask;
pub use response::{CacheConfig, Cacheable, Namespace, ResponseCache};

//! Builder for configuring orchestrator instances

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use super::Orchestrator;
use crate::backend::{DEFAULT_MODEL, OllamaClient, TextCompletion};
use crate::cache::{CacheConfig, EvictionTask, ResponseCache};
use crate::config::Config;
use crate::gateway::{AsyncGateway, DEFAULT_TIMEOUT};
use crate::limiter::{RateLimitConfig, RateLimiter};
use crate::resilience::{CircuitBreakerConfig, ResilientInvoker, RetryConfig};
use crate::types::Domain;
use crate::{HuginnError, Result};

/// Main entry point for creating orchestrator instances.
pub struct Huginn;

impl Huginn {
    /// Create a new builder for configuring the orchestrator.
    pub fn builder() -> HuginnBuilder {
        HuginnBuilder::new()
    }
}

/// Builder for configuring orchestrator instances.
pub struct HuginnBuilder {
    backend: Option<Arc<dyn TextCompletion>>,
    ollama_url: Option<String>,
    backend_timeout: Duration,
    default_model: Option<String>,
    rate_limit: RateLimitConfig,
    cache: CacheConfig,
    scheduled_eviction: bool,
    retry: RetryConfig,
    circuit_breaker: CircuitBreakerConfig,
    async_timeout: Duration,
    async_runtime: Option<Handle>,
}

impl Default for HuginnBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HuginnBuilder {
    pub fn new() -> Self {
        Self {
            backend: None,
            ollama_url: None,
            backend_timeout: Duration::from_secs(120),
            default_model: None,
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
            scheduled_eviction: true,
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            async_timeout: DEFAULT_TIMEOUT,
            async_runtime: None,
        }
    }

    /// Apply every setting from a loaded [`Config`], including an Ollama
    /// backend at `backend.base_url`.
    pub fn from_config(self, config: &Config) -> Self {
        self.ollama(&config.backend.base_url)
            .backend_timeout(config.backend_timeout())
            .default_model(&config.backend.model)
            .rate_limit(config.rate_limit_config())
            .cache(config.cache_config())
            .scheduled_eviction(config.cache.scheduled_eviction)
            .retry(config.retry_config())
            .circuit_breaker(config.circuit_breaker_config())
            .async_timeout(config.gateway_timeout())
    }

    /// Use a custom text-completion backend. Takes precedence over
    /// [`ollama`](Self::ollama).
    pub fn backend(mut self, backend: Arc<dyn TextCompletion>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use an Ollama server at `url`.
    pub fn ollama(mut self, url: impl Into<String>) -> Self {
        self.ollama_url = Some(url.into());
        self
    }

    /// HTTP timeout for the Ollama backend.
    pub fn backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    /// Model for chat-with-options requests that do not name one.
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Enable or disable the periodic full cache flush (default: enabled).
    ///
    /// When enabled, [`build`](Self::build) must run inside a tokio runtime.
    pub fn scheduled_eviction(mut self, enabled: bool) -> Self {
        self.scheduled_eviction = enabled;
        self
    }

    /// Retry policy, shared by every domain.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Circuit breaker settings; each domain gets its own breaker.
    pub fn circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = config;
        self
    }

    /// Deadline for the `*_async` entry points (default: 60s).
    pub fn async_timeout(mut self, timeout: Duration) -> Self {
        self.async_timeout = timeout;
        self
    }

    /// Run async submissions on a dedicated runtime instead of the caller's.
    pub fn async_runtime(mut self, runtime: Handle) -> Self {
        self.async_runtime = Some(runtime);
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> Result<Orchestrator> {
        let default_model = self
            .default_model
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let backend: Arc<dyn TextCompletion> = match (self.backend, self.ollama_url) {
            (Some(backend), _) => backend,
            (None, Some(url)) => Arc::new(OllamaClient::with_base_url(
                url,
                default_model.clone(),
                self.backend_timeout,
            )?),
            (None, None) => return Err(HuginnError::NoBackend),
        };

        let cache = Arc::new(ResponseCache::new());

        let eviction = if self.scheduled_eviction {
            if self.cache.flush_interval.is_zero() {
                return Err(HuginnError::Configuration(
                    "cache flush interval must be non-zero".to_string(),
                ));
            }
            let runtime = Handle::try_current().map_err(|e| {
                HuginnError::Configuration(format!(
                    "scheduled eviction requires a tokio runtime: {e}"
                ))
            })?;
            Some(EvictionTask::spawn_on(
                &runtime,
                Arc::clone(&cache),
                self.cache.flush_interval,
            ))
        } else {
            None
        };

        let invoker =
            |domain| ResilientInvoker::new(domain, self.retry.clone(), self.circuit_breaker.clone());

        let gateway = match self.async_runtime {
            Some(runtime) => AsyncGateway::with_runtime(self.async_timeout, runtime),
            None => AsyncGateway::new(self.async_timeout),
        };

        Ok(Orchestrator {
            backend,
            limiter: RateLimiter::new(self.rate_limit),
            cache,
            chat: invoker(Domain::Chat),
            recipe: invoker(Domain::Recipe),
            travel: invoker(Domain::Travel),
            gateway,
            default_model,
            eviction,
        })
    }
}

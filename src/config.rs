//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. explicit path (e.g. `--config <path>`)
//! 2. `~/.huginn/config.toml` (user)
//! 3. `/etc/huginn/config.toml` (system)
//!
//! Every section and field is optional; missing values take the defaults of
//! the corresponding runtime config type.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::cache::CacheConfig;
use crate::gateway::DEFAULT_TIMEOUT;
use crate::limiter::RateLimitConfig;
use crate::resilience::{CircuitBreakerConfig, RetryConfig};
use crate::{HuginnError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub rate_limit: RateLimitSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSection,
    #[serde(default)]
    pub gateway: GatewaySection,
}

/// Text-completion backend (Ollama).
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL (default: http://localhost:11434).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used when a request does not name one (default: llama3.2:1b).
    #[serde(default = "default_model")]
    pub model: String,
    /// HTTP request timeout in seconds (default: 120).
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_backend_timeout() -> u64 {
    120
}

/// `[rate_limit]`
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSection {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    60
}

/// `[cache]`
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: u64,
    /// Run the periodic flush (default: true).
    #[serde(default = "default_true")]
    pub scheduled_eviction: bool,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            flush_interval_secs: default_flush_interval(),
            scheduled_eviction: true,
        }
    }
}

fn default_flush_interval() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

/// `[retry]`
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

/// `[circuit_breaker]`
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerSection {
    #[serde(default = "default_failure_rate")]
    pub failure_rate_threshold: f64,
    #[serde(default = "default_sliding_window")]
    pub sliding_window_size: usize,
    #[serde(default = "default_minimum_calls")]
    pub minimum_number_of_calls: usize,
    #[serde(default = "default_wait_secs")]
    pub wait_duration_secs: u64,
    #[serde(default = "default_half_open_calls")]
    pub permitted_calls_in_half_open: usize,
}

impl Default for CircuitBreakerSection {
    fn default() -> Self {
        Self {
            failure_rate_threshold: default_failure_rate(),
            sliding_window_size: default_sliding_window(),
            minimum_number_of_calls: default_minimum_calls(),
            wait_duration_secs: default_wait_secs(),
            permitted_calls_in_half_open: default_half_open_calls(),
        }
    }
}

fn default_failure_rate() -> f64 {
    0.5
}

fn default_sliding_window() -> usize {
    10
}

fn default_minimum_calls() -> usize {
    5
}

fn default_wait_secs() -> u64 {
    30
}

fn default_half_open_calls() -> usize {
    1
}

/// `[gateway]`
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySection {
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            timeout_secs: default_gateway_timeout(),
        }
    }
}

fn default_gateway_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.huginn/config.toml`
    /// 3. `/etc/huginn/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?.ok_or_else(|| {
            HuginnError::Configuration(
                "No config file found. Create ~/.huginn/config.toml or /etc/huginn/config.toml"
                    .to_string(),
            )
        })?;
        Self::load_from_file(&path)
    }

    /// Like [`load`](Self::load), but returns defaults when no file exists
    /// in the standard locations. A missing explicit path is still an error.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| HuginnError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path; `None` when no standard file exists.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(HuginnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".huginn").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/huginn/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig::new()
            .max_requests(self.rate_limit.max_requests)
            .window(Duration::from_secs(self.rate_limit.window_secs))
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new().flush_interval(Duration::from_secs(self.cache.flush_interval_secs))
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_attempts(self.retry.max_attempts)
            .initial_delay(Duration::from_millis(self.retry.initial_delay_ms))
            .max_delay(Duration::from_millis(self.retry.max_delay_ms))
    }

    pub fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        let cb = &self.circuit_breaker;
        CircuitBreakerConfig::new()
            .failure_rate_threshold(cb.failure_rate_threshold)
            .sliding_window_size(cb.sliding_window_size)
            .minimum_number_of_calls(cb.minimum_number_of_calls)
            .wait_duration_in_open(Duration::from_secs(cb.wait_duration_secs))
            .permitted_calls_in_half_open(cb.permitted_calls_in_half_open)
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.timeout_secs)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://localhost:11434");
        assert_eq!(config.backend.model, "llama3.2:1b");
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.cache.flush_interval_secs, 3600);
        assert!(config.cache.scheduled_eviction);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.circuit_breaker.minimum_number_of_calls, 5);
        assert_eq!(config.gateway.timeout_secs, 60);
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [rate_limit]
            max_requests = 25
        "#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.rate_limit.max_requests, 25);
        // Defaults preserved
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.backend.model, "llama3.2:1b");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [backend]
            base_url = "http://ollama.internal:11434"
            model = "mistral"
            timeout_secs = 30

            [rate_limit]
            max_requests = 100
            window_secs = 1

            [cache]
            flush_interval_secs = 600
            scheduled_eviction = false

            [retry]
            max_attempts = 5
            initial_delay_ms = 100
            max_delay_ms = 2000

            [circuit_breaker]
            failure_rate_threshold = 0.25
            sliding_window_size = 20
            minimum_number_of_calls = 8
            wait_duration_secs = 10
            permitted_calls_in_half_open = 2

            [gateway]
            timeout_secs = 15
        "#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.backend.model, "mistral");
        assert_eq!(config.backend_timeout(), Duration::from_secs(30));
        assert!(!config.cache.scheduled_eviction);

        let rl = config.rate_limit_config();
        assert_eq!(rl.max_requests, 100);
        assert_eq!(rl.window, Duration::from_secs(1));

        assert_eq!(config.cache_config().flush_interval, Duration::from_secs(600));

        let retry = config.retry_config();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.initial_delay, Duration::from_millis(100));
        assert_eq!(retry.max_delay, Duration::from_secs(2));

        let cb = config.circuit_breaker_config();
        assert_eq!(cb.failure_rate_threshold, 0.25);
        assert_eq!(cb.sliding_window_size, 20);
        assert_eq!(cb.minimum_number_of_calls, 8);
        assert_eq!(cb.wait_duration_in_open, Duration::from_secs(10));
        assert_eq!(cb.permitted_calls_in_half_open, 2);

        assert_eq!(config.gateway_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn malformed_toml_is_configuration_error() {
        let err = Config::from_toml("[rate_limit\nmax_requests = 1").unwrap_err();
        assert!(matches!(err, HuginnError::Configuration(_)));
    }

    #[test]
    fn missing_explicit_path_is_error() {
        let path = Path::new("/nonexistent/huginn/config.toml");
        assert!(Config::load(Some(path)).is_err());
        assert!(Config::load_or_default(Some(path)).is_err());
    }
}

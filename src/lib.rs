//! Huginn - Resilient orchestration for generative-text backends
//!
//! This crate wraps every call to a text-completion backend in one ordered
//! pipeline: per-domain rate limiting, single-flight response caching,
//! retry with a circuit breaker and a canned fallback, and an optional
//! asynchronous entry point with a deadline. Three domains share the
//! pipeline: freeform chat, recipe generation and travel itineraries.
//!
//! # Example
//!
//! ```rust,no_run
//! use huginn::{ApiResponse, Domain, Huginn, RecipeRequest};
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let orchestrator = Huginn::builder()
//!         .ollama("http://localhost:11434")
//!         .build()?;
//!
//!     let result = orchestrator
//!         .recipe(RecipeRequest::new("chicken, rice").cuisine("asian"))
//!         .await;
//!
//!     let response = ApiResponse::from_result(Domain::Recipe, &result);
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```
//!
//! # Async Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use huginn::{Huginn, Resolution, TravelRequest};
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let orchestrator = Arc::new(Huginn::builder().ollama("http://localhost:11434").build()?);
//!
//!     let handle = orchestrator.travel_async(TravelRequest::new("Kyoto", 3).interests("temples"));
//!     match handle.wait().await {
//!         Resolution::Completed(itinerary) => println!("{}", itinerary.text),
//!         Resolution::TimedOut(after) => eprintln!("request timeout after {after:?}"),
//!         Resolution::Failed(e) => eprintln!("failed: {e}"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod limiter;
pub mod orchestrator;
pub mod resilience;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use backend::{OllamaClient, TextCompletion};
pub use cache::{CacheConfig, Namespace, ResponseCache};
pub use config::Config;
pub use error::{ErrorKind, HuginnError, Result};
pub use gateway::{AsyncGateway, DeferredResult, Resolution};
pub use limiter::{RateLimitConfig, RateLimiter};
pub use orchestrator::{Huginn, HuginnBuilder, Orchestrator};
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, DomainFallback, Fallback,
    ResilientInvoker, RetryConfig,
};
pub use version::PKG_VERSION;

// Re-export all types
pub use types::{
    ApiResponse, CacheKey, ChatOptionsRequest, ChatRequest, Completion, CompletionOptions,
    Domain, InvocationResult, RecipeRequest, TravelRequest,
};

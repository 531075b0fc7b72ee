//! The per-domain request pipeline.
//!
//! Every entry point runs the same ordered chain:
//!
//! 1. normalise and validate the request (`InvalidInput` stops here)
//! 2. admission check against the domain's rate window
//!    (`AdmissionRejected` stops here, before any cache lookup)
//! 3. single-flight cache lookup in the domain's namespace
//! 4. on a miss, the domain's [`ResilientInvoker`] calls the backend with
//!    the domain fallback
//!
//! The `*_async` variants submit the same chain to the [`AsyncGateway`].

mod builder;

pub use builder::{Huginn, HuginnBuilder};

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::backend::TextCompletion;
use crate::cache::{EvictionTask, Namespace, ResponseCache};
use crate::gateway::{AsyncGateway, DeferredResult};
use crate::limiter::RateLimiter;
use crate::resilience::{DomainFallback, Fallback, ResilientInvoker};
use crate::telemetry;
use crate::types::{
    CacheKey, ChatOptionsRequest, ChatRequest, Completion, CompletionOptions, Domain,
    InvocationResult, RecipeRequest, TravelRequest,
};
use crate::{HuginnError, Result};

/// Orchestrates rate limiting, caching, resilience and async execution
/// around one text-completion backend.
///
/// Create with [`Huginn::builder()`]. Owns the scheduled cache flush, which
/// stops when the orchestrator is dropped.
pub struct Orchestrator {
    backend: Arc<dyn TextCompletion>,
    limiter: RateLimiter,
    cache: Arc<ResponseCache<InvocationResult>>,
    chat: ResilientInvoker,
    recipe: ResilientInvoker,
    travel: ResilientInvoker,
    gateway: AsyncGateway,
    default_model: String,
    eviction: Option<EvictionTask>,
}

impl Orchestrator {
    /// Freeform chat.
    pub async fn chat(&self, request: ChatRequest) -> Result<Completion> {
        let request = request.normalize()?;
        let prompt = request.prompt();
        let backend = &self.backend;
        self.run(
            Domain::Chat,
            Namespace::ChatResponses,
            request.cache_key(),
            DomainFallback::Chat,
            || backend.complete(&prompt),
        )
        .await
    }

    /// Chat with explicit completion options. Shares the chat rate window
    /// and circuit, but caches in its own namespace.
    pub async fn chat_with_options(&self, request: ChatOptionsRequest) -> Result<Completion> {
        let request = request.normalize(&self.default_model)?;
        let prompt = request.prompt();
        let options = CompletionOptions {
            model: request.model.clone(),
            ..CompletionOptions::default()
        };
        let backend = &self.backend;
        self.run(
            Domain::Chat,
            Namespace::ChatOptions,
            request.cache_key(),
            DomainFallback::Chat,
            || backend.complete_with_options(&prompt, &options),
        )
        .await
    }

    /// Recipe from a list of ingredients.
    pub async fn recipe(&self, request: RecipeRequest) -> Result<Completion> {
        let request = request.normalize()?;
        let prompt = request.prompt();
        let backend = &self.backend;
        self.run(
            Domain::Recipe,
            Namespace::Recipes,
            request.cache_key(),
            DomainFallback::Recipe,
            || backend.complete(&prompt),
        )
        .await
    }

    /// Day-by-day travel itinerary.
    pub async fn travel(&self, request: TravelRequest) -> Result<Completion> {
        let request = request.normalize()?;
        let prompt = request.prompt();
        let backend = &self.backend;
        self.run(
            Domain::Travel,
            Namespace::Itineraries,
            request.cache_key(),
            DomainFallback::itinerary(&request.destination),
            || backend.complete(&prompt),
        )
        .await
    }

    pub fn chat_async(self: &Arc<Self>, request: ChatRequest) -> DeferredResult<Completion> {
        let this = Arc::clone(self);
        self.gateway.submit(async move { this.chat(request).await })
    }

    pub fn chat_with_options_async(
        self: &Arc<Self>,
        request: ChatOptionsRequest,
    ) -> DeferredResult<Completion> {
        let this = Arc::clone(self);
        self.gateway
            .submit(async move { this.chat_with_options(request).await })
    }

    pub fn recipe_async(self: &Arc<Self>, request: RecipeRequest) -> DeferredResult<Completion> {
        let this = Arc::clone(self);
        self.gateway.submit(async move { this.recipe(request).await })
    }

    pub fn travel_async(self: &Arc<Self>, request: TravelRequest) -> DeferredResult<Completion> {
        let this = Arc::clone(self);
        self.gateway.submit(async move { this.travel(request).await })
    }

    pub fn backend(&self) -> &Arc<dyn TextCompletion> {
        &self.backend
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &ResponseCache<InvocationResult> {
        &self.cache
    }

    /// Resilient invoker guarding `domain`.
    pub fn invoker(&self, domain: Domain) -> &ResilientInvoker {
        match domain {
            Domain::Chat => &self.chat,
            Domain::Recipe => &self.recipe,
            Domain::Travel => &self.travel,
        }
    }

    pub fn gateway(&self) -> &AsyncGateway {
        &self.gateway
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Whether the scheduled cache flush is active.
    pub fn has_scheduled_eviction(&self) -> bool {
        self.eviction.as_ref().is_some_and(EvictionTask::is_running)
    }

    async fn run<F, Fut>(
        &self,
        domain: Domain,
        namespace: Namespace,
        key: CacheKey,
        fallback: DomainFallback,
        call: F,
    ) -> Result<Completion>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let start = Instant::now();
        let subject = domain.as_str();

        if !self.limiter.try_acquire(subject) {
            metrics::counter!(telemetry::ADMISSIONS_REJECTED_TOTAL, "domain" => subject)
                .increment(1);
            warn!(domain = subject, "admission rejected");
            return Err(HuginnError::AdmissionRejected {
                subject: subject.to_string(),
            });
        }

        let invoker = self.invoker(domain);
        let fallback: &dyn Fallback = &fallback;
        let result = self
            .cache
            .get_or_compute(namespace, &key, move || async move {
                Ok(invoker.invoke(call, Some(fallback)).await)
            })
            .await?;

        let outcome = match &result {
            InvocationResult::Success(_) => "success",
            InvocationResult::Fallback(_) => "fallback",
            InvocationResult::Failure(_) => "failure",
        };
        let elapsed = start.elapsed();
        metrics::counter!(telemetry::REQUESTS_TOTAL, "domain" => subject, "outcome" => outcome)
            .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "domain" => subject)
            .record(elapsed.as_secs_f64());
        info!(
            domain = subject,
            %namespace,
            outcome,
            elapsed_ms = elapsed.as_millis() as u64,
            "request completed"
        );

        Completion::from_invocation(domain, result)
    }
}

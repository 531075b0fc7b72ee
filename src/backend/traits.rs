//! Backend capability trait.
//!
//! A backend is an opaque text-completion service. It may fail with a
//! transport or model error; classification into retryable and permanent
//! failures happens through [`HuginnError::is_transient()`](crate::HuginnError::is_transient).

use async_trait::async_trait;

use crate::Result;
use crate::types::CompletionOptions;

/// Synchronous-from-the-caller's-view text completion.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Backend name for logging/debugging.
    fn name(&self) -> &str;

    /// Complete `prompt` with the backend's default settings.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Complete `prompt` with explicit options.
    ///
    /// Default implementation ignores `options` and calls `complete`.
    async fn complete_with_options(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String> {
        let _ = options;
        self.complete(prompt).await
    }
}

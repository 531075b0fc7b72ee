//! Ollama client for text completion.
//!
//! Talks to the non-streaming generate endpoint of a local or remote Ollama
//! server. See: <https://github.com/ollama/ollama/blob/main/docs/api.md>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::TextCompletion;
use crate::types::CompletionOptions;
use crate::{HuginnError, Result};

/// Default base URL for a local Ollama server
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Model used when neither the request nor the configuration names one.
pub const DEFAULT_MODEL: &str = "llama3.2:1b";

/// Client for the Ollama generate API.
#[derive(Clone)]
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create a client for the default local server and model.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_MODEL, Duration::from_secs(120))
    }

    /// Create a client with a custom base URL (also used for testing with wiremock).
    pub fn with_base_url(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(crate::version::user_agent())
            .build()
            .map_err(|e| {
                HuginnError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Model used when the caller does not override it.
    pub fn default_model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let model = options.model.as_deref().unwrap_or(&self.model);

        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: ModelOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        debug!(model, prompt_len = prompt.len(), "ollama generate");

        let response = self.http.post(&url).json(&body).send().await?;

        Self::handle_response_errors(&response, model)?;

        let parsed: GenerateResponse = response.json().await?;
        if parsed.response.trim().is_empty() {
            return Err(HuginnError::EmptyResponse);
        }
        Ok(parsed.response)
    }

    fn handle_response_errors(response: &reqwest::Response, model: &str) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        match status.as_u16() {
            404 => Err(HuginnError::ModelNotFound(model.to_string())),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(HuginnError::RateLimited { retry_after })
            }
            code => Err(HuginnError::Api {
                status: code,
                message: format!("Ollama API error: {status}"),
            }),
        }
    }
}

#[async_trait]
impl TextCompletion for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.generate(prompt, &CompletionOptions::default()).await
    }

    async fn complete_with_options(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String> {
        self.generate(prompt, options).await
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: ModelOptions,
}

#[derive(Serialize)]
struct ModelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

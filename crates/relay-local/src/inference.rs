use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError, StatusCode};
use std::time::{Duration, Instant};

use relay_core::{
    Completion, Error as CoreError, GenerationRequest, InferenceBackend, ModelProvider,
    Result as CoreResult, TokenUsage,
};

use crate::models::{OllamaGenerateRequest, OllamaGenerateResponse, OllamaOptions};
use crate::{LocalError, OllamaManager, Result};

/// Default request timeout, matching the generous budget local models need on CPU.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Local inference backend using Ollama's `/api/generate` endpoint.
///
/// One instance serves every local model; the model is chosen per request.
#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
    manager: OllamaManager,
}

impl OllamaBackend {
    /// Creates a backend pointed at `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a backend with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let client = Client::builder().timeout(timeout).build()?;
        let manager = OllamaManager::new()
            .with_url(&base_url)
            .with_client(client.clone());

        Ok(Self {
            client,
            base_url,
            timeout,
            manager,
        })
    }

    /// Model-listing helper sharing this backend's client.
    pub fn manager(&self) -> &OllamaManager {
        &self.manager
    }

    async fn generate_completion(
        &self,
        request: &GenerationRequest,
    ) -> Result<OllamaGenerateResponse> {
        let payload = OllamaGenerateRequest {
            model: request.model.clone(),
            prompt: request.flattened_prompt(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        tracing::debug!(
            model = %payload.model,
            num_predict = payload.options.num_predict,
            temperature = payload.options.temperature,
            "Sending Ollama generate request"
        );

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|err| self.send_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::NOT_FOUND {
                return Err(LocalError::ModelNotFound {
                    model: request.model.clone(),
                    body,
                });
            }
            return Err(LocalError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let ollama_response: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|err| LocalError::InferenceFailed(format!("Failed to parse Ollama response: {err}")))?;

        Ok(ollama_response)
    }

    fn send_error(&self, err: ReqwestError) -> LocalError {
        if err.is_timeout() {
            LocalError::Timeout(self.timeout.as_millis() as u64)
        } else if err.is_connect() {
            LocalError::OllamaUnavailable(err.to_string())
        } else {
            LocalError::Http(err)
        }
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn provider(&self) -> ModelProvider {
        ModelProvider::Local
    }

    async fn generate(&self, request: &GenerationRequest) -> CoreResult<Completion> {
        let start = Instant::now();

        let ollama_response = self.generate_completion(request).await?;

        let latency = start.elapsed();
        let tokens_used = TokenUsage {
            input: ollama_response.prompt_eval_count,
            output: ollama_response.eval_count,
        };

        Ok(Completion {
            text: ollama_response.response,
            model: request.model.clone(),
            tokens_used,
            latency,
        })
    }

    async fn list_models(&self) -> CoreResult<Vec<String>> {
        let models = self.manager.list_models().await.map_err(CoreError::from)?;
        Ok(models.into_iter().map(|model| model.name).collect())
    }
}

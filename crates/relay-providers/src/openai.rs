use std::time::{Duration, Instant};

use async_trait::async_trait;
use relay_core::error::classify_send_error;
use relay_core::{
    Completion, Error, GenerationRequest, InferenceBackend, ModelProvider, Result, TokenUsage,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Public `OpenAI` API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Env var key for the `OpenAI` API key.
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// `OpenAI` chat completions backend.
///
/// The model is taken from each [`GenerationRequest`], so one instance can
/// serve any chat model the account has access to.
pub struct OpenAiBackend {
    /// HTTP client for API requests.
    client: Client,
    /// `OpenAI` API key.
    api_key: String,
    /// API root, without a trailing slash.
    base_url: String,
    /// Timeout the client was built with, reported on expiry.
    timeout: Duration,
}

impl OpenAiBackend {
    /// Creates a new `OpenAiBackend` with the given API key.
    ///
    /// # Errors
    /// Returns an error if the provided API key is empty or the HTTP client
    /// cannot be built.
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Creates a backend whose requests expire after `timeout`.
    ///
    /// # Errors
    /// Returns an error if the provided API key is empty or the HTTP client
    /// cannot be built.
    pub fn with_timeout(api_key: String, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey(ENV_OPENAI_API_KEY.to_owned()));
        }

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout,
        })
    }

    /// Points the backend at an OpenAI-compatible API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// API root requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_prompt.as_deref().filter(|text| !text.is_empty()) {
            messages.push(ChatMessage {
                role: "system".to_owned(),
                content: system.to_owned(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_owned(),
            content: request.prompt.clone(),
        });
        messages
    }
}

/// Request payload sent to the chat completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    /// Model identifier.
    model: String,
    /// Conversation, system message first when present.
    messages: Vec<ChatMessage>,
    /// Sampling temperature controlling response randomness.
    temperature: f32,
    /// Maximum number of tokens allowed in the completion.
    max_tokens: u32,
}

/// Message delivered to the API.
#[derive(Debug, Serialize)]
struct ChatMessage {
    /// Role of the message author (`system` or `user`).
    role: String,
    /// Textual content of the message.
    content: String,
}

/// Response payload returned by the API.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    /// List of candidate completions.
    #[serde(default)]
    choices: Vec<ChatChoice>,
    /// Token accounting information, absent on some compatible servers.
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Token usage metrics for a response.
#[derive(Debug, Deserialize)]
struct ChatUsage {
    /// Number of tokens in the prompt portion of the request.
    #[serde(default)]
    prompt_tokens: u64,
    /// Number of tokens produced in the completion.
    #[serde(default)]
    completion_tokens: u64,
}

#[async_trait]
impl InferenceBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn provider(&self) -> ModelProvider {
        ModelProvider::External
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Completion> {
        let start = Instant::now();

        let payload = ChatRequest {
            model: request.model.clone(),
            messages: Self::build_messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        tracing::debug!(
            model = %payload.model,
            max_tokens = payload.max_tokens,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| classify_send_error(err, self.timeout.as_millis() as u64))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(Error::Protocol { status, body });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|err| {
            Error::InvalidResponse(format!("Failed to parse chat completion: {err}"))
        })?;

        let latency = start.elapsed();

        let text = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::InvalidResponse("No choices in chat completion".to_owned()))?;

        let tokens_used = chat_response
            .usage
            .map(|usage| TokenUsage {
                input: usage.prompt_tokens,
                output: usage.completion_tokens,
            })
            .unwrap_or_default();

        Ok(Completion {
            text,
            model: request.model.clone(),
            tokens_used,
            latency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(text: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}],
            "usage": {"prompt_tokens": 40, "completion_tokens": 60, "total_tokens": 100}
        })
    }

    #[test]
    fn empty_key_is_rejected() {
        let result = OpenAiBackend::new("  ".to_owned());
        assert!(matches!(result, Err(Error::MissingApiKey(_))));
    }

    #[test]
    fn base_url_is_normalised() {
        let backend = OpenAiBackend::new("sk-test".to_owned())
            .unwrap()
            .with_base_url("http://proxy.local/v1/");
        assert_eq!(backend.base_url(), "http://proxy.local/v1");
        assert_eq!(backend.provider(), ModelProvider::External);
    }

    /// Tests that system and user roles are sent and usage is read back.
    ///
    /// # Panics
    /// Panics if assertions fail during test execution.
    #[tokio::test]
    async fn sends_roles_and_reads_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 8000,
                "messages": [
                    {"role": "system", "content": "You are careful."},
                    {"role": "user", "content": "Prove it."}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Done.")))
            .expect(1)
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new("sk-test".to_owned())
            .unwrap()
            .with_base_url(server.uri());
        let request = GenerationRequest::new("gpt-4o-mini", "Prove it.")
            .with_system_prompt(Some("You are careful.".to_owned()))
            .with_limits(8000, 0.7);

        let completion = backend.generate(&request).await.unwrap();
        assert_eq!(completion.text, "Done.");
        assert_eq!(completion.tokens_used, TokenUsage { input: 40, output: 60 });
    }

    #[tokio::test]
    async fn error_status_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new("sk-test".to_owned())
            .unwrap()
            .with_base_url(server.uri());
        let err = backend
            .generate(&GenerationRequest::new("gpt-4o-mini", "hi"))
            .await
            .unwrap_err();

        match err {
            Error::Protocol { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new("sk-test".to_owned())
            .unwrap()
            .with_base_url(server.uri());
        let err = backend
            .generate(&GenerationRequest::new("gpt-4o-mini", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn slow_api_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("late"))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let backend = OpenAiBackend::with_timeout("sk-test".to_owned(), Duration::from_millis(100))
            .unwrap()
            .with_base_url(server.uri());
        let err = backend
            .generate(&GenerationRequest::new("gpt-4o-mini", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(100)));
    }
}

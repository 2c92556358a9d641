use crate::models::{OllamaListResponse, OllamaModel};
use crate::{LocalError, Result};
use reqwest::Client;

/// Talks to the Ollama model-listing endpoint.
#[derive(Clone)]
pub struct OllamaManager {
    /// HTTP client used to interact with the Ollama service.
    client: Client,
    /// Base URL pointing to the Ollama runtime.
    base_url: String,
}

impl OllamaManager {
    /// Manager pointed at the default `http://localhost:11434` runtime.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_owned(),
        }
    }

    /// Point the manager at another runtime; a trailing slash is dropped.
    #[must_use]
    pub fn with_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_owned();
        self
    }

    /// Reuse an existing HTTP client, so its timeout applies to listings too.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Base URL the manager talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List installed models
    ///
    /// # Errors
    ///
    /// Returns an error if Ollama is not available or if the response cannot be parsed
    pub async fn list_models(&self) -> Result<Vec<OllamaModel>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|err| LocalError::OllamaUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LocalError::Status { status, body });
        }

        let list: OllamaListResponse = response.json().await?;
        Ok(list.models)
    }
}

impl Default for OllamaManager {
    fn default() -> Self {
        Self::new()
    }
}

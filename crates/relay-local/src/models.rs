use serde::{Deserialize, Serialize};

/// Ollama API response for model list
#[derive(Debug, Deserialize)]
pub struct OllamaListResponse {
    /// List of models installed in Ollama.
    #[serde(default)]
    pub models: Vec<OllamaModel>,
}

/// Information about an Ollama model returned from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaModel {
    /// Model identifier, including the tag (e.g. `mistral:7b`).
    pub name: String,
    /// Size of the model in bytes.
    #[serde(default)]
    pub size: u64,
    /// Content digest for the model.
    #[serde(default)]
    pub digest: String,
    /// Timestamp of last modification.
    #[serde(default)]
    pub modified_at: String,
}

/// Sampling options nested in a generate request.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaOptions {
    /// Sampling temperature (0.0 to 1.0).
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub num_predict: u32,
}

/// Ollama API request for generation
#[derive(Debug, Serialize)]
pub struct OllamaGenerateRequest {
    /// Model to use for generation.
    pub model: String,
    /// Input prompt, with any system preamble already folded in.
    pub prompt: String,
    /// Whether to stream the response.
    pub stream: bool,
    /// Generation options.
    pub options: OllamaOptions,
}

/// Ollama API response for generation
#[derive(Debug, Deserialize)]
pub struct OllamaGenerateResponse {
    /// Model that generated the response.
    #[serde(default)]
    pub model: String,
    /// Generated text content.
    pub response: String,
    /// Whether generation is complete.
    #[serde(default)]
    pub done: bool,
    /// Total time taken in nanoseconds.
    #[serde(default)]
    pub total_duration: u64,
    /// Number of tokens in the prompt.
    #[serde(default)]
    pub prompt_eval_count: u64,
    /// Number of tokens generated.
    #[serde(default)]
    pub eval_count: u64,
}

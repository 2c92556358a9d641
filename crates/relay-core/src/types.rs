use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use crate::Error;

/// Classification tag attached to every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Text embeddings, always served locally.
    Embedding,
    /// Condensing longer text.
    Summarization,
    /// Entity or fact extraction.
    Extraction,
    /// Multi-step reasoning, the only type that may leave the local tier.
    Reasoning,
    /// Code-related queries, served by the code model.
    Code,
    /// Short, straightforward questions.
    Simple,
}

impl QueryType {
    /// All query types in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Embedding,
        Self::Summarization,
        Self::Extraction,
        Self::Reasoning,
        Self::Code,
        Self::Simple,
    ];

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::Summarization => "summarization",
            Self::Extraction => "extraction",
            Self::Reasoning => "reasoning",
            Self::Code => "code",
            Self::Simple => "simple",
        }
    }
}

impl Display for QueryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| Error::Other(format!("unknown query type: {value}")))
    }
}

/// Execution tier serving a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// Operator-controlled backend with no per-query cost.
    Local,
    /// Metered third-party API.
    External,
}

impl Display for ModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Local => f.write_str("local"),
            Self::External => f.write_str("external"),
        }
    }
}

/// Parameters for a single generation call against a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier understood by the backend.
    pub model: String,
    /// User prompt.
    pub prompt: String,
    /// Optional system preamble.
    pub system_prompt: Option<String>,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 to 1.0).
    pub temperature: f32,
}

impl GenerationRequest {
    /// Request with default limits (2000 tokens, temperature 0.3) and no system prompt.
    pub fn new<M: Into<String>, P: Into<String>>(model: M, prompt: P) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: 2000,
            temperature: 0.3,
        }
    }

    /// Set or clear the system preamble.
    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    /// Override the token cap and sampling temperature.
    #[must_use]
    pub fn with_limits(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Prompt with the system preamble folded in, for backends without roles.
    #[must_use]
    pub fn flattened_prompt(&self) -> String {
        match self.system_prompt.as_deref() {
            Some(system) if !system.is_empty() => format!("{system}\n\n{}", self.prompt),
            _ => self.prompt.clone(),
        }
    }
}

/// Text produced by a backend together with its accounting data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text.
    pub text: String,
    /// Model that produced the text, as reported by the backend.
    pub model: String,
    /// Token accounting for the call.
    pub tokens_used: TokenUsage,
    /// Wall-clock time spent in the backend call.
    pub latency: Duration,
}

/// Prompt and completion token counts reported by a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens.
    pub input: u64,
    /// Generated tokens.
    pub output: u64,
}

impl TokenUsage {
    /// Combined token count, clamped at `u64::MAX` for absurd backend reports.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.input.saturating_add(self.output)
    }
}

//! Scripted backend for exercising the router.
//!
//! Outcomes are queued up front and consumed one per call; once the queue is
//! empty every call gets the default reply. Calls are recorded so tests can
//! check which backend served which request.

use async_trait::async_trait;
use relay_core::{
    Completion, Error, GenerationRequest, IgnoreLock as _, InferenceBackend, ModelProvider,
    Result, TokenUsage,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// One scripted result for a single call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Answer with this text.
    Reply(String),
    /// Fail as if the connection was refused.
    Unreachable,
    /// Fail with the given HTTP status and body.
    Status(u16, String),
    /// Answer successfully with an unusable payload.
    Malformed,
}

/// Scripted inference backend.
#[derive(Clone)]
pub struct MockBackend {
    /// Tier reported to the router.
    provider: ModelProvider,
    /// Pending outcomes, consumed front to back.
    script: Arc<Mutex<VecDeque<MockOutcome>>>,
    /// Reply used when the script runs dry.
    default_reply: String,
    /// Artificial latency added to every call.
    delay: Duration,
    /// Fixed usage reported for successful calls, if set.
    usage: Option<TokenUsage>,
    /// Models reported by `list_models`, or an unreachable error when `None`.
    models: Option<Vec<String>>,
    /// Every request received, in order.
    call_history: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockBackend {
    /// Create a mock serving the given tier.
    #[must_use]
    pub fn new(provider: ModelProvider) -> Self {
        Self {
            provider,
            script: Arc::new(Mutex::new(VecDeque::new())),
            default_reply: format!("{provider} mock reply"),
            delay: Duration::ZERO,
            usage: None,
            models: Some(Vec::new()),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Local-tier mock.
    #[must_use]
    pub fn local() -> Self {
        Self::new(ModelProvider::Local)
    }

    /// External-tier mock.
    #[must_use]
    pub fn external() -> Self {
        Self::new(ModelProvider::External)
    }

    /// Queue an outcome for a future call.
    #[must_use]
    pub fn with_outcome(self, outcome: MockOutcome) -> Self {
        self.script.lock_ignore_poison().push_back(outcome);
        self
    }

    /// Set the reply used once the script is exhausted.
    #[must_use]
    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Add artificial latency to every call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Report fixed token usage instead of word counts.
    #[must_use]
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Set the models reported by `list_models`.
    #[must_use]
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = Some(models.into_iter().map(Into::into).collect());
        self
    }

    /// Make `list_models` fail the way a dead server would.
    #[must_use]
    pub fn offline(mut self) -> Self {
        self.models = None;
        self
    }

    /// Get the requests received so far.
    #[must_use]
    pub fn get_call_history(&self) -> Vec<GenerationRequest> {
        self.call_history.lock_ignore_poison().clone()
    }

    /// Get the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_history.lock_ignore_poison().len()
    }

    fn next_outcome(&self) -> MockOutcome {
        self.script
            .lock_ignore_poison()
            .pop_front()
            .unwrap_or_else(|| MockOutcome::Reply(self.default_reply.clone()))
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn provider(&self) -> ModelProvider {
        self.provider
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Completion> {
        let start = Instant::now();
        self.call_history.lock_ignore_poison().push(request.clone());

        let outcome = self.next_outcome();
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let text = match outcome {
            MockOutcome::Reply(text) => text,
            MockOutcome::Unreachable => {
                return Err(Error::Unreachable("mock connection refused".to_owned()));
            }
            MockOutcome::Status(status, body) => return Err(Error::Protocol { status, body }),
            MockOutcome::Malformed => {
                return Err(Error::InvalidResponse("mock payload".to_owned()));
            }
        };

        let tokens_used = self.usage.unwrap_or_else(|| TokenUsage {
            input: request.prompt.split_whitespace().count() as u64,
            output: text.split_whitespace().count() as u64,
        });

        Ok(Completion {
            text,
            model: request.model.clone(),
            tokens_used,
            latency: start.elapsed(),
        })
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        self.models
            .clone()
            .ok_or_else(|| Error::Unreachable("mock backend offline".to_owned()))
    }
}

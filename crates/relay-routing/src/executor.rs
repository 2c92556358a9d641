//! Dispatches routing decisions to backends and records the outcome.

use relay_core::{GenerationRequest, InferenceBackend, ModelProvider, TokenUsage};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::metrics::MetricsTracker;
use crate::policy::RoutingDecision;
use crate::{Result, RoutingError};

/// Normalized outcome of one executed query.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Generated text.
    pub text: String,
    /// Tier that served the call.
    pub provider: ModelProvider,
    /// Model that served the call.
    pub model: String,
    /// Token usage reported by the backend.
    pub tokens: TokenUsage,
    /// Wall-clock latency measured around the backend call.
    pub latency: Duration,
    /// Usage-derived cost; 0 for local calls.
    pub cost: f64,
    /// Decision that selected the backend, including the a-priori estimate.
    pub decision: RoutingDecision,
}

/// Holds the backend clients and applies successful results to metrics.
pub struct Executor {
    local: Arc<dyn InferenceBackend>,
    external: Option<Arc<dyn InferenceBackend>>,
    metrics: Arc<MetricsTracker>,
    /// External price per million tokens, used for actual cost.
    price_per_million_tokens: f64,
}

impl Executor {
    /// Executor recording into `metrics`; external calls are priced at
    /// `price_per_million_tokens`.
    pub fn new(
        local: Arc<dyn InferenceBackend>,
        external: Option<Arc<dyn InferenceBackend>>,
        metrics: Arc<MetricsTracker>,
        price_per_million_tokens: f64,
    ) -> Self {
        Self {
            local,
            external,
            metrics,
            price_per_million_tokens,
        }
    }

    /// Backend serving local decisions.
    pub fn local_backend(&self) -> &Arc<dyn InferenceBackend> {
        &self.local
    }

    /// Whether an external backend is wired in.
    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    fn backend_for(&self, decision: &RoutingDecision) -> Result<&Arc<dyn InferenceBackend>> {
        match decision.provider {
            ModelProvider::Local => Ok(&self.local),
            ModelProvider::External => self.external.as_ref().ok_or_else(|| {
                RoutingError::Configuration(format!(
                    "decision selected external model {} but no external credential is configured",
                    decision.model
                ))
            }),
        }
    }

    /// Runs one decision against its backend.
    ///
    /// Metrics are only touched after the backend answered successfully, so
    /// a failed call or a dropped future leaves them unchanged.
    ///
    /// # Errors
    /// Returns a configuration error when the external backend is missing,
    /// or the backend failure tagged with provider and model.
    pub async fn run(
        &self,
        decision: RoutingDecision,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<ExecutionResult> {
        let backend = self.backend_for(&decision)?;

        let request = GenerationRequest::new(decision.model.clone(), prompt)
            .with_system_prompt(system_prompt.map(ToOwned::to_owned))
            .with_limits(decision.max_tokens, decision.temperature);

        let start = Instant::now();
        let completion = match backend.generate(&request).await {
            Ok(completion) => completion,
            Err(err) => {
                tracing::warn!(
                    provider = %decision.provider,
                    model = %decision.model,
                    error = %err,
                    "Backend call failed"
                );
                return Err(RoutingError::from_backend(
                    decision.provider,
                    &decision.model,
                    err,
                ));
            }
        };
        let latency = start.elapsed();

        let cost = match decision.provider {
            ModelProvider::Local => 0.0,
            ModelProvider::External => {
                completion.tokens_used.total() as f64 / 1_000_000.0 * self.price_per_million_tokens
            }
        };

        self.metrics
            .record_success(decision.provider, latency, cost);

        tracing::info!(
            "✓ {} ({}) - {:.2}s - Cost: ${cost:.4}",
            decision.provider,
            decision.model,
            latency.as_secs_f64()
        );

        Ok(ExecutionResult {
            text: completion.text,
            provider: decision.provider,
            model: decision.model.clone(),
            tokens: completion.tokens_used,
            latency,
            cost,
            decision,
        })
    }
}

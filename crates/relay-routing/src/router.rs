//! The query router: classifier, policy, executor and metrics behind one
//! caller-owned handle.
//!
//! Nothing here is global. Construct one [`QueryRouter`] at startup and share
//! it (for example behind an `Arc`) with whatever serves requests.

use relay_core::{InferenceBackend, ModelProvider, RouterConfig};
use relay_local::OllamaBackend;
use relay_providers::OpenAiBackend;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::classifier::Classification;
use crate::executor::{ExecutionResult, Executor};
use crate::health::{HealthStatus, probe};
use crate::metrics::{MetricsSnapshot, MetricsTracker};
use crate::policy::{PolicyEngine, RouteRequest, RoutingDecision};
use crate::registry::ModelRegistry;
use crate::{ExecutionStage, Result, RoutingError};

/// Days per month used for cost projections.
const DAYS_PER_MONTH: u64 = 30;

/// Expected spend for a given query volume and local share.
#[derive(Debug, Clone, Serialize)]
pub struct CostProjection {
    /// Daily volume times thirty.
    pub queries_per_month: u64,
    /// Queries expected to run locally.
    pub local_queries: f64,
    /// Queries expected to run externally.
    pub external_queries: f64,
    /// Projected external spend (USD).
    pub monthly_cost: f64,
    /// Cost if every query went to the external backend.
    pub all_external_cost: f64,
    /// Spend avoided by serving the local share.
    pub monthly_savings: f64,
}

/// Routes, executes and accounts for inference queries.
pub struct QueryRouter {
    config: RouterConfig,
    policy: PolicyEngine,
    executor: Executor,
    metrics: Arc<MetricsTracker>,
}

impl QueryRouter {
    /// Builds a router with the Ollama backend and, when a credential is
    /// configured, the `OpenAI` backend.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or an HTTP client
    /// cannot be built.
    pub fn new(config: RouterConfig) -> Result<Self> {
        config.validate()?;

        let local = OllamaBackend::with_timeout(&config.local.base_url, config.request_timeout())
            .map_err(|err| RoutingError::Core(err.into()))?;

        let credential = config
            .external
            .api_key
            .as_deref()
            .filter(|_| config.external_enabled());
        let external: Option<Arc<dyn InferenceBackend>> = match credential {
            Some(key) => Some(Arc::new(
                OpenAiBackend::with_timeout(key.trim().to_owned(), config.request_timeout())?
                    .with_base_url(&config.external.base_url),
            )),
            None => {
                tracing::warn!("No external credential configured; complex queries stay local");
                None
            }
        };

        Self::with_backends(config, Arc::new(local), external)
    }

    /// Builds a router over caller-supplied backends.
    ///
    /// External routing is enabled exactly when `external` is present.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_backends(
        config: RouterConfig,
        local: Arc<dyn InferenceBackend>,
        external: Option<Arc<dyn InferenceBackend>>,
    ) -> Result<Self> {
        config.validate()?;

        let registry =
            ModelRegistry::from_roles(&config.models, config.external.price_per_million_tokens);
        let policy = PolicyEngine::new(
            registry,
            config.thresholds.clone(),
            config.external.per_query_estimate,
            external.is_some(),
        );
        let metrics = Arc::new(MetricsTracker::new());
        let executor = Executor::new(
            local,
            external,
            Arc::clone(&metrics),
            config.external.price_per_million_tokens,
        );

        tracing::info!(
            "Router initialized - local: {}, target: {}% local routing",
            config.local.base_url,
            config.thresholds.target_local_pct
        );

        Ok(Self {
            config,
            policy,
            executor,
            metrics,
        })
    }

    /// Configuration the router was built from.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Models the policy chooses from.
    pub fn registry(&self) -> &ModelRegistry {
        self.policy.registry()
    }

    /// Classifies `text` without routing it.
    pub fn classify(&self, text: &str, context_length_hint: Option<u32>) -> Classification {
        self.policy.classifier().classify(text, context_length_hint)
    }

    /// Decides where `request` would run, against the current metrics.
    ///
    /// # Errors
    /// Returns [`RoutingError::Classification`] for an invalid complexity
    /// override.
    pub fn route(&self, request: &RouteRequest) -> Result<RoutingDecision> {
        let decision = self
            .policy
            .route(request, self.metrics.local_percentage())?;

        tracing::info!(
            "🎯 Routing decision: {} / {} ({:?}, complexity {})",
            decision.provider,
            decision.model,
            decision.classification.query_type,
            decision.classification.complexity
        );
        tracing::info!("   Reason: {}", decision.reason);

        Ok(decision)
    }

    /// Routes and executes `request`.
    ///
    /// Dropping the returned future cancels the backend call; metrics are
    /// then left as they were.
    ///
    /// # Errors
    /// Returns routing, configuration or backend errors. Failed calls are
    /// not retried and do not count towards metrics.
    pub async fn execute(&self, request: &RouteRequest) -> Result<ExecutionResult> {
        let decision = self.route(request)?;
        self.executor
            .run(decision, &request.text, request.system_prompt.as_deref())
            .await
    }

    /// Like [`Self::execute`], abandoning the call after `limit`.
    ///
    /// # Errors
    /// Returns [`RoutingError::Timeout`] if the deadline passes first.
    pub async fn execute_with_timeout(
        &self,
        request: &RouteRequest,
        limit: Duration,
    ) -> Result<ExecutionResult> {
        timeout(limit, self.execute(request))
            .await
            .map_err(|_| RoutingError::Timeout(limit.as_millis() as u64))?
    }

    /// Current counters, averages and target status.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.policy.target_local_pct())
    }

    /// Probes the local backend within the configured health timeout.
    pub async fn health(&self) -> HealthStatus {
        probe(
            self.executor.local_backend().as_ref(),
            self.registry(),
            self.executor.has_external(),
            self.config.health_timeout(),
        )
        .await
    }

    /// Checks that every registered local model is installed.
    ///
    /// # Errors
    /// Returns [`RoutingError::BackendUnreachable`] if the local backend
    /// does not answer, or [`RoutingError::Configuration`] naming the
    /// missing models.
    pub async fn verify_local_models(&self) -> Result<()> {
        let status = self.health().await;
        if !status.local_backend_reachable {
            return Err(RoutingError::BackendUnreachable {
                provider: ModelProvider::Local,
                model: String::new(),
                stage: ExecutionStage::Dispatch,
                message: format!("no model listing from {}", self.config.local.base_url),
            });
        }
        if !status.missing_local_models.is_empty() {
            return Err(RoutingError::Configuration(format!(
                "local models not installed: {}",
                status.missing_local_models.join(", ")
            )));
        }
        Ok(())
    }

    /// Projects monthly spend when `local_share` (0.0-1.0) of
    /// `queries_per_day` run locally, priced at the external per-query
    /// estimate.
    pub fn project_monthly_cost(&self, queries_per_day: u64, local_share: f64) -> CostProjection {
        let share = local_share.clamp(0.0, 1.0);
        let per_query = self.config.external.per_query_estimate;
        let queries_per_month = queries_per_day.saturating_mul(DAYS_PER_MONTH);
        let total = queries_per_month as f64;
        let external_queries = total * (1.0 - share);
        let monthly_cost = external_queries * per_query;
        let all_external_cost = total * per_query;

        CostProjection {
            queries_per_month,
            local_queries: total * share,
            external_queries,
            monthly_cost,
            all_external_cost,
            monthly_savings: all_external_cost - monthly_cost,
        }
    }
}

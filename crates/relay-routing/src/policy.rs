//! Routing policy: maps a classified query and the live local ratio to a
//! backend, model and generation parameters.

use relay_core::config::ThresholdConfig;
use relay_core::{ModelProvider, QueryType};
use serde::Serialize;

use crate::classifier::{
    Classification, Complexity, MAX_COMPLEXITY, MIN_COMPLEXITY, QueryClassifier,
    resolve_context_length,
};
use crate::registry::{ModelRegistry, ModelRole};
use crate::{Result, RoutingError};

/// Complexity assumed for queries whose type the caller supplied.
pub const DEFAULT_EXPLICIT_COMPLEXITY: Complexity = 5;

/// A query plus the optional hints callers may attach to it.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    /// Query text.
    pub text: String,
    /// Caller-supplied type; skips classification when set.
    pub query_type: Option<QueryType>,
    /// Context length in tokens; estimated from the text when absent or zero.
    pub context_length: Option<u32>,
    /// Caller-supplied complexity, taking precedence over the classifier.
    pub complexity: Option<Complexity>,
    /// System preamble forwarded to the backend.
    pub system_prompt: Option<String>,
    /// Never route to the external backend.
    pub force_local: bool,
}

impl RouteRequest {
    /// Request with no hints attached.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Fix the query type instead of classifying.
    #[must_use]
    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = Some(query_type);
        self
    }

    /// Supply the context length in tokens.
    #[must_use]
    pub fn with_context_length(mut self, context_length: u32) -> Self {
        self.context_length = Some(context_length);
        self
    }

    /// Override the complexity score.
    #[must_use]
    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = Some(complexity);
        self
    }

    /// Attach a system preamble.
    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Keep the query on the local tier whatever the policy would pick.
    #[must_use]
    pub fn force_local(mut self, force_local: bool) -> Self {
        self.force_local = force_local;
        self
    }
}

/// Which backend and parameters serve one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    /// Tier that serves the query.
    pub provider: ModelProvider,
    /// Model identifier sent to the backend.
    pub model: String,
    /// Human-readable rationale.
    pub reason: String,
    /// A-priori cost estimate; 0 for local decisions.
    pub estimated_cost: f64,
    /// Generation cap passed to the backend.
    pub max_tokens: u32,
    /// Sampling temperature passed to the backend.
    pub temperature: f32,
    /// Classification the decision was made from.
    pub classification: Classification,
}

/// Stateless routing policy.
///
/// Reads the live local percentage but never mutates metrics.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    classifier: QueryClassifier,
    registry: ModelRegistry,
    thresholds: ThresholdConfig,
    /// Fixed per-query price quoted for external decisions.
    external_estimate: f64,
    /// Whether an external backend is available at all.
    external_enabled: bool,
}

impl PolicyEngine {
    /// Policy over `registry`; external decisions are only possible when
    /// `external_enabled` is set.
    pub fn new(
        registry: ModelRegistry,
        thresholds: ThresholdConfig,
        external_estimate: f64,
        external_enabled: bool,
    ) -> Self {
        Self {
            classifier: QueryClassifier::new(thresholds.simple_query_tokens),
            registry,
            thresholds,
            external_estimate,
            external_enabled,
        }
    }

    /// Classifier used for requests without an explicit type.
    pub fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    /// Models the policy chooses from.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Target share of local queries, in percent.
    pub fn target_local_pct(&self) -> f64 {
        self.thresholds.target_local_pct
    }

    /// Resolves type, complexity and context length for a request.
    ///
    /// An explicit type is kept as given and scored at
    /// [`DEFAULT_EXPLICIT_COMPLEXITY`]; otherwise the classifier decides. An
    /// explicit complexity overrides both.
    ///
    /// # Errors
    /// Returns [`RoutingError::Classification`] for a complexity outside 1-10.
    pub fn resolve(&self, request: &RouteRequest) -> Result<Classification> {
        if let Some(complexity) = request
            .complexity
            .filter(|value| !(MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(value))
        {
            return Err(RoutingError::Classification(format!(
                "complexity must be between {MIN_COMPLEXITY} and {MAX_COMPLEXITY}, got {complexity}"
            )));
        }

        let mut classification = match request.query_type {
            Some(query_type) => Classification {
                query_type,
                complexity: DEFAULT_EXPLICIT_COMPLEXITY,
                context_length: resolve_context_length(&request.text, request.context_length),
            },
            None => self
                .classifier
                .classify(&request.text, request.context_length),
        };

        if let Some(complexity) = request.complexity {
            classification.complexity = complexity;
        }

        Ok(classification)
    }

    /// Produces the routing decision for `request` given the current local
    /// percentage.
    ///
    /// # Errors
    /// Returns [`RoutingError::Classification`] for an invalid complexity
    /// override.
    pub fn route(&self, request: &RouteRequest, local_pct: f64) -> Result<RoutingDecision> {
        let classification = self.resolve(request)?;
        Ok(self.decide(classification, request.force_local, local_pct))
    }

    /// Applies the decision cascade. The first matching rule wins.
    pub fn decide(
        &self,
        classification: Classification,
        force_local: bool,
        local_pct: f64,
    ) -> RoutingDecision {
        let Classification {
            query_type,
            complexity,
            context_length,
        } = classification;

        if query_type == QueryType::Embedding {
            return self.local(
                classification,
                ModelRole::Embedding,
                "Embedding queries always use the local embedding model".to_owned(),
                512,
                0.0,
            );
        }

        if query_type == QueryType::Code {
            return self.local(
                classification,
                ModelRole::Code,
                format!(
                    "Code query - using specialized {} local model",
                    self.registry.get(ModelRole::Code).name
                ),
                output_budget(context_length, 2, 4000),
                0.1,
            );
        }

        if query_type == QueryType::Simple || complexity <= 3 {
            return self.local(
                classification,
                ModelRole::Fast,
                format!(
                    "Simple query - using fast {} local model",
                    self.registry.get(ModelRole::Fast).name
                ),
                output_budget(context_length, 2, 2000),
                0.3,
            );
        }

        if complexity <= 6 || context_length < self.thresholds.medium_query_tokens {
            return self.local(
                classification,
                ModelRole::Balanced,
                format!(
                    "Medium complexity - using {} local model",
                    self.registry.get(ModelRole::Balanced).name
                ),
                output_budget(context_length, 2, 4000),
                0.3,
            );
        }

        if !force_local {
            return self.gate_complex(classification, local_pct);
        }

        self.local(
            classification,
            ModelRole::Balanced,
            format!(
                "Default routing - {} local model",
                self.registry.get(ModelRole::Balanced).name
            ),
            2000,
            0.3,
        )
    }

    /// Complex queries leave the local tier only once the live local share
    /// has reached the target.
    fn gate_complex(&self, classification: Classification, local_pct: f64) -> RoutingDecision {
        if !self.external_enabled {
            return self.local(
                classification,
                ModelRole::Balanced,
                "Complex query kept local: no external credential configured".to_owned(),
                4000,
                0.5,
            );
        }

        let target = self.thresholds.target_local_pct;
        if local_pct < target {
            return self.local(
                classification,
                ModelRole::Balanced,
                format!("Complex query but staying under {target}% local target"),
                4000,
                0.5,
            );
        }

        let external = self.registry.get(ModelRole::External);
        RoutingDecision {
            provider: ModelProvider::External,
            model: external.name.clone(),
            reason: format!(
                "Complex reasoning query - local ratio {local_pct:.1}% meets {target}% target, using {}",
                external.name
            ),
            estimated_cost: self.external_estimate,
            max_tokens: output_budget(classification.context_length, 3, 8000).max(1),
            temperature: 0.7,
            classification,
        }
    }

    fn local(
        &self,
        classification: Classification,
        role: ModelRole,
        reason: String,
        max_tokens: u32,
        temperature: f32,
    ) -> RoutingDecision {
        RoutingDecision {
            provider: ModelProvider::Local,
            model: self.registry.get(role).name.clone(),
            reason,
            estimated_cost: 0.0,
            max_tokens: max_tokens.max(1),
            temperature,
            classification,
        }
    }
}

/// `context_length * factor`, capped.
fn output_budget(context_length: u32, factor: u32, cap: u32) -> u32 {
    context_length.saturating_mul(factor).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(external_enabled: bool) -> PolicyEngine {
        PolicyEngine::new(
            ModelRegistry::default(),
            ThresholdConfig::default(),
            0.015,
            external_enabled,
        )
    }

    fn complex_reasoning() -> RouteRequest {
        RouteRequest::new("Compare the two architectures in depth")
            .with_query_type(QueryType::Reasoning)
            .with_context_length(5000)
            .with_complexity(9)
    }

    #[test]
    fn test_simple_scenario() {
        let decision = engine(true)
            .route(&RouteRequest::new("What is 2+2?"), 0.0)
            .unwrap();
        assert_eq!(decision.provider, ModelProvider::Local);
        assert_eq!(decision.model, "mistral:7b");
        assert_eq!(decision.classification.query_type, QueryType::Simple);
        assert!(decision.max_tokens <= 2000);
        assert!(decision.estimated_cost.abs() < f64::EPSILON);
    }

    #[test]
    fn test_code_scenario() {
        let decision = engine(true)
            .route(&RouteRequest::new("def calculate_fibonacci(n):"), 100.0)
            .unwrap();
        assert_eq!(decision.model, "deepseek-coder:6.7b");
        assert_eq!(decision.classification.complexity, 3);
        assert!((decision.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_embedding_is_absolute() {
        let request = RouteRequest::new("encode this paragraph")
            .with_context_length(50_000)
            .with_complexity(10);
        let decision = engine(true).route(&request, 100.0).unwrap();
        assert_eq!(decision.provider, ModelProvider::Local);
        assert_eq!(decision.model, "nomic-embed-text:latest");
        assert_eq!(decision.max_tokens, 512);
        assert!(decision.temperature.abs() < f32::EPSILON);
    }

    #[test]
    fn test_explicit_type_uses_default_complexity() {
        let request = RouteRequest::new("anything at all")
            .with_query_type(QueryType::Reasoning)
            .with_context_length(5000);
        let decision = engine(true).route(&request, 100.0).unwrap();
        assert_eq!(decision.classification.complexity, DEFAULT_EXPLICIT_COMPLEXITY);
        assert_eq!(decision.model, "codellama:13b");
        assert_eq!(decision.max_tokens, 4000);
    }

    #[test]
    fn test_short_context_keeps_complex_query_local() {
        let request = complex_reasoning().with_context_length(3999);
        let decision = engine(true).route(&request, 100.0).unwrap();
        assert_eq!(decision.provider, ModelProvider::Local);
        assert!(decision.reason.starts_with("Medium complexity"));
    }

    #[test]
    fn test_ratio_gate() {
        let policy = engine(true);

        let under = policy.route(&complex_reasoning(), 94.9).unwrap();
        assert_eq!(under.provider, ModelProvider::Local);
        assert_eq!(under.model, "codellama:13b");
        assert!(under.reason.contains("95% local target"));
        assert!((under.temperature - 0.5).abs() < f32::EPSILON);

        let over = policy.route(&complex_reasoning(), 95.0).unwrap();
        assert_eq!(over.provider, ModelProvider::External);
        assert_eq!(over.model, "gpt-4o-mini");
        assert_eq!(over.max_tokens, 8000);
        assert!((over.estimated_cost - 0.015).abs() < f64::EPSILON);
    }

    #[test]
    fn test_force_local_reaches_fallback() {
        let request = complex_reasoning().force_local(true);
        let decision = engine(true).route(&request, 100.0).unwrap();
        assert_eq!(decision.provider, ModelProvider::Local);
        assert_eq!(decision.max_tokens, 2000);
        assert!(decision.reason.starts_with("Default routing"));
    }

    #[test]
    fn test_missing_credential_keeps_query_local() {
        let decision = engine(false).route(&complex_reasoning(), 100.0).unwrap();
        assert_eq!(decision.provider, ModelProvider::Local);
        assert!(decision.reason.contains("no external credential"));
    }

    #[test]
    fn test_invalid_complexity_is_rejected() {
        let request = RouteRequest::new("hello").with_complexity(11);
        let err = engine(true).route(&request, 0.0).unwrap_err();
        assert!(matches!(err, RoutingError::Classification(_)));
    }

    #[test]
    fn test_output_budget_is_positive() {
        let decision = engine(true).route(&RouteRequest::new(""), 0.0).unwrap();
        assert!(decision.max_tokens > 0);
    }
}

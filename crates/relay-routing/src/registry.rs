//! Static registry of the models the router can pick from.
//!
//! Each routing role maps to exactly one model. Model names come from
//! configuration; the descriptive attributes are fixed per role.

use relay_core::{ModelProvider, ModelRoles};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::slice::Iter;
use std::time::Duration;

/// Part a model plays in the routing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    /// Small general model for simple queries.
    Fast,
    /// Larger general model for medium and complex queries kept local.
    Balanced,
    /// Code-specialised model.
    Code,
    /// Embedding model.
    Embedding,
    /// Metered model for complex reasoning.
    External,
}

impl ModelRole {
    /// Every role, in registry order.
    pub const ALL: [Self; 5] = [
        Self::Fast,
        Self::Balanced,
        Self::Code,
        Self::Embedding,
        Self::External,
    ];

    /// Tier that serves models in this role.
    #[must_use]
    pub const fn provider(self) -> ModelProvider {
        match self {
            Self::External => ModelProvider::External,
            Self::Fast | Self::Balanced | Self::Code | Self::Embedding => ModelProvider::Local,
        }
    }
}

impl Display for ModelRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Code => "code",
            Self::Embedding => "embedding",
            Self::External => "external",
        };
        f.write_str(name)
    }
}

/// What kind of output a model produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Free-form text generation.
    General,
    /// Code generation and review.
    Code,
    /// Vector embeddings.
    Embedding,
}

/// Registry entry for one model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    /// Identifier sent to the backend.
    pub name: String,
    /// Role the model fills.
    pub role: ModelRole,
    /// Output the model produces.
    pub kind: ModelKind,
    /// Maximum context window in tokens.
    pub max_context_length: u32,
    /// Price per million tokens; always 0 for local models.
    pub unit_cost: f64,
    /// Typical end-to-end latency.
    pub nominal_latency: Duration,
    /// Query categories the model is suited to.
    pub best_for: Vec<&'static str>,
}

impl ModelDescriptor {
    fn for_role(role: ModelRole, name: &str, external_unit_cost: f64) -> Self {
        let (kind, max_context_length, latency_ms, best_for): (_, _, u64, Vec<&'static str>) =
            match role {
                ModelRole::Fast => (
                    ModelKind::General,
                    8192,
                    1500,
                    vec!["simple", "summarization", "extraction"],
                ),
                ModelRole::Balanced => (ModelKind::General, 16384, 3000, vec!["medium", "balanced"]),
                ModelRole::Code => (ModelKind::Code, 16384, 2000, vec!["code", "technical"]),
                ModelRole::Embedding => (ModelKind::Embedding, 8192, 500, vec!["embedding"]),
                ModelRole::External => (ModelKind::General, 128_000, 2500, vec!["reasoning"]),
            };

        let unit_cost = match role.provider() {
            ModelProvider::Local => 0.0,
            ModelProvider::External => external_unit_cost,
        };

        Self {
            name: name.to_owned(),
            role,
            kind,
            max_context_length,
            unit_cost,
            nominal_latency: Duration::from_millis(latency_ms),
            best_for,
        }
    }

    /// Tier serving this model.
    #[must_use]
    pub const fn provider(&self) -> ModelProvider {
        self.role.provider()
    }
}

/// Read-only set of model descriptors, one per role.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    /// Indexed in `ModelRole::ALL` order.
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// Builds the registry from configured model names.
    ///
    /// `external_unit_cost` is the external model's price per million tokens.
    #[must_use]
    pub fn from_roles(roles: &ModelRoles, external_unit_cost: f64) -> Self {
        let models = ModelRole::ALL
            .into_iter()
            .map(|role| {
                let name = match role {
                    ModelRole::Fast => &roles.fast,
                    ModelRole::Balanced => &roles.balanced,
                    ModelRole::Code => &roles.code,
                    ModelRole::Embedding => &roles.embedding,
                    ModelRole::External => &roles.external,
                };
                ModelDescriptor::for_role(role, name, external_unit_cost)
            })
            .collect();

        Self { models }
    }

    /// Descriptor serving `role`.
    #[must_use]
    pub fn get(&self, role: ModelRole) -> &ModelDescriptor {
        &self.models[role as usize]
    }

    /// Looks a model up by backend identifier.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|model| model.name == name)
    }

    /// Descriptors in role order.
    pub fn iter(&self) -> Iter<'_, ModelDescriptor> {
        self.models.iter()
    }

    /// Distinct local model names, in role order.
    #[must_use]
    pub fn local_model_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for model in self.iter().filter(|model| model.provider() == ModelProvider::Local) {
            let name = model.name.as_str();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

impl<'registry> IntoIterator for &'registry ModelRegistry {
    type Item = &'registry ModelDescriptor;
    type IntoIter = Iter<'registry, ModelDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::from_roles(&ModelRoles::default(), 0.375)
    }
}

/// Whether a name reported by Ollama refers to `wanted`.
///
/// Ollama lists untagged pulls as `name:latest`, so the `:latest` suffix is
/// optional on either side.
#[must_use]
pub fn model_name_matches(reported: &str, wanted: &str) -> bool {
    let strip = |name: &str| name.strip_suffix(":latest").unwrap_or(name).to_owned();
    reported == wanted || strip(reported) == strip(wanted)
}

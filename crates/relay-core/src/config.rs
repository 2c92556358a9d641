//! Router configuration: defaults, an optional TOML file, and an environment overlay.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Env var holding the local backend base URL.
pub const ENV_OLLAMA_URL: &str = "OLLAMA_URL";
/// Env var holding the external backend credential.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Env var overriding the external backend base URL.
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
/// Env var holding the target local-routing percentage.
pub const ENV_LOCAL_THRESHOLD: &str = "LLM_LOCAL_THRESHOLD";
/// Env var holding the simple query token threshold.
pub const ENV_SIMPLE_QUERY_TOKENS: &str = "LLM_SIMPLE_QUERY_TOKENS";
/// Env var holding the medium query token threshold.
pub const ENV_MEDIUM_QUERY_TOKENS: &str = "LLM_MEDIUM_QUERY_TOKENS";
/// Env var holding the health probe timeout in milliseconds.
pub const ENV_HEALTH_TIMEOUT_MS: &str = "LLM_HEALTH_TIMEOUT_MS";
/// Env var holding the backend request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "LLM_REQUEST_TIMEOUT_SECS";

/// Complete router configuration.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Local backend connection settings
    pub local: LocalBackendConfig,
    /// External backend credential and pricing
    pub external: ExternalBackendConfig,
    /// Routing thresholds
    pub thresholds: ThresholdConfig,
    /// Model identifier assigned to each routing role
    pub models: ModelRoles,
}

/// Local backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalBackendConfig {
    /// Base URL of the Ollama runtime
    pub base_url: String,
    /// Timeout in seconds for generation requests
    pub request_timeout_secs: u64,
    /// Timeout in milliseconds for the health probe
    pub health_timeout_ms: u64,
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_owned(),
            request_timeout_secs: 120,
            health_timeout_ms: 5_000,
        }
    }
}

/// External backend credential and pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalBackendConfig {
    /// API key; external routing is disabled when absent
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Fixed a-priori cost estimate attached to external routing decisions (USD)
    pub per_query_estimate: f64,
    /// Blended price per million tokens used for the post-call ledger (USD)
    pub price_per_million_tokens: f64,
}

impl Default for ExternalBackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_owned(),
            per_query_estimate: 0.015,
            price_per_million_tokens: 0.375,
        }
    }
}

/// Routing thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Target share of queries served locally, in percent
    pub target_local_pct: f64,
    /// Token count below which a query is considered simple
    pub simple_query_tokens: u32,
    /// Token count below which a complex query still stays on the balanced model
    pub medium_query_tokens: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            target_local_pct: 95.0,
            simple_query_tokens: 2_000,
            medium_query_tokens: 4_000,
        }
    }
}

/// Model identifier assigned to each routing role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelRoles {
    /// Fast general model for simple queries
    pub fast: String,
    /// Balanced general model for medium and budgeted complex queries
    pub balanced: String,
    /// Code-specialized model
    pub code: String,
    /// Dedicated embedding model
    pub embedding: String,
    /// Cost-effective external reasoning model
    pub external: String,
}

impl Default for ModelRoles {
    fn default() -> Self {
        Self {
            fast: "mistral:7b".to_owned(),
            balanced: "codellama:13b".to_owned(),
            code: "deepseek-coder:6.7b".to_owned(),
            embedding: "nomic-embed-text:latest".to_owned(),
            external: "gpt-4o-mini".to_owned(),
        }
    }
}

impl RouterConfig {
    /// Get the default config directory path (`~/.relay`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_owned()))?;
        Ok(home.join(".relay"))
    }

    /// Get the default config file path (`~/.relay/config.toml`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration the way the router expects it at process start.
    ///
    /// Reads `path` (or `~/.relay/config.toml` when `None`) if the file exists,
    /// falls back to defaults otherwise, then applies the process environment.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if an
    /// environment override is malformed or the result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(explicit) => Some(explicit.to_path_buf()),
            None => Self::config_path().ok(),
        };

        let base = match path {
            Some(file) if file.exists() => Self::load_from_file(&file)?,
            _ => Self::default(),
        };

        let config = base.with_env_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        tracing::debug!(
            "Loaded config from {:?}: local={}, external_api_key={}",
            path,
            config.local.base_url,
            if config.external.api_key.is_some() {
                "present"
            } else {
                "missing"
            }
        );

        Ok(config)
    }

    /// Apply environment-style overrides supplied by `lookup`.
    ///
    /// # Errors
    /// Returns an error if a numeric override cannot be parsed.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = non_empty(lookup(ENV_OLLAMA_URL)) {
            self.local.base_url = url;
        }
        if let Some(key) = non_empty(lookup(ENV_OPENAI_API_KEY)) {
            self.external.api_key = Some(key);
        }
        if let Some(url) = non_empty(lookup(ENV_OPENAI_BASE_URL)) {
            self.external.base_url = url;
        }
        if let Some(pct) = parse_override(&lookup, ENV_LOCAL_THRESHOLD)? {
            self.thresholds.target_local_pct = pct;
        }
        if let Some(tokens) = parse_override(&lookup, ENV_SIMPLE_QUERY_TOKENS)? {
            self.thresholds.simple_query_tokens = tokens;
        }
        if let Some(tokens) = parse_override(&lookup, ENV_MEDIUM_QUERY_TOKENS)? {
            self.thresholds.medium_query_tokens = tokens;
        }
        if let Some(millis) = parse_override(&lookup, ENV_HEALTH_TIMEOUT_MS)? {
            self.local.health_timeout_ms = millis;
        }
        if let Some(secs) = parse_override(&lookup, ENV_REQUEST_TIMEOUT_SECS)? {
            self.local.request_timeout_secs = secs;
        }
        Ok(self)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// Returns a configuration error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let target = self.thresholds.target_local_pct;
        if !(0.0..=100.0).contains(&target) {
            return Err(Error::Config(format!(
                "target local percentage must be within 0-100, got {target}"
            )));
        }
        if self.thresholds.simple_query_tokens == 0 || self.thresholds.medium_query_tokens == 0 {
            return Err(Error::Config(
                "query token thresholds must be greater than zero".to_owned(),
            ));
        }
        if self.thresholds.simple_query_tokens > self.thresholds.medium_query_tokens {
            return Err(Error::Config(format!(
                "simple threshold ({}) exceeds medium threshold ({})",
                self.thresholds.simple_query_tokens, self.thresholds.medium_query_tokens
            )));
        }
        if self.external.per_query_estimate < 0.0 || self.external.price_per_million_tokens < 0.0 {
            return Err(Error::Config("external pricing must not be negative".to_owned()));
        }
        Ok(())
    }

    /// Whether a non-blank external credential is configured.
    pub fn external_enabled(&self) -> bool {
        self.external
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// Timeout applied to generation requests.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.local.request_timeout_secs)
    }

    /// Timeout applied to the health probe.
    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.local.health_timeout_ms)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

fn parse_override<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match non_empty(lookup(key)) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} has an invalid value: {raw}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert_eq!(config.local.base_url, "http://localhost:11434");
        assert!((config.thresholds.target_local_pct - 95.0).abs() < f64::EPSILON);
        assert_eq!(config.thresholds.simple_query_tokens, 2_000);
        assert_eq!(config.thresholds.medium_query_tokens, 4_000);
        assert_eq!(config.models.fast, "mistral:7b");
        assert!(!config.external_enabled());
        config.validate().unwrap();
    }

    #[test]
    fn test_env_overrides_apply() {
        let config = RouterConfig::default()
            .with_env_overrides(lookup_from(&[
                (ENV_OLLAMA_URL, "http://gpu-box:11434"),
                (ENV_OPENAI_API_KEY, "sk-test"),
                (ENV_LOCAL_THRESHOLD, "90"),
                (ENV_MEDIUM_QUERY_TOKENS, "6000"),
                (ENV_HEALTH_TIMEOUT_MS, "250"),
            ]))
            .unwrap();

        assert_eq!(config.local.base_url, "http://gpu-box:11434");
        assert_eq!(config.external.api_key.as_deref(), Some("sk-test"));
        assert!(config.external_enabled());
        assert!((config.thresholds.target_local_pct - 90.0).abs() < f64::EPSILON);
        assert_eq!(config.thresholds.medium_query_tokens, 6_000);
        assert_eq!(config.health_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = RouterConfig::default()
            .with_env_overrides(lookup_from(&[(ENV_OPENAI_API_KEY, "   ")]))
            .unwrap();
        assert!(config.external.api_key.is_none());
        assert!(!config.external_enabled());
    }

    #[test]
    fn test_malformed_env_value_is_rejected() {
        let result = RouterConfig::default()
            .with_env_overrides(lookup_from(&[(ENV_LOCAL_THRESHOLD, "ninety")]));
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(ENV_LOCAL_THRESHOLD));
    }

    #[test]
    fn test_validation_rejects_bad_ranges() {
        let mut config = RouterConfig::default();
        config.thresholds.target_local_pct = 120.0;
        config.validate().unwrap_err();

        let mut inverted = RouterConfig::default();
        inverted.thresholds.simple_query_tokens = 5_000;
        inverted.validate().unwrap_err();

        let mut zero = RouterConfig::default();
        zero.thresholds.medium_query_tokens = 0;
        zero.validate().unwrap_err();
    }

    #[test]
    fn test_whitespace_api_key_is_not_enabled() {
        let mut config = RouterConfig::default();
        config.external.api_key = Some("  \t ".to_owned());
        assert!(!config.external_enabled());

        config.external.api_key = Some(" sk-live ".to_owned());
        assert!(config.external_enabled());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[thresholds]\ntarget_local_pct = 99.0\n\n[models]\nfast = \"phi3:mini\"\n",
        )
        .unwrap();

        let loaded = RouterConfig::load_from_file(&path).unwrap();
        assert!((loaded.thresholds.target_local_pct - 99.0).abs() < f64::EPSILON);
        assert_eq!(loaded.thresholds.medium_query_tokens, 4_000);
        assert_eq!(loaded.models.fast, "phi3:mini");
        assert_eq!(loaded.models.code, "deepseek-coder:6.7b");
    }
}

//! Backend availability check for the local model runtime.

use relay_core::InferenceBackend;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;

use crate::registry::{ModelRegistry, model_name_matches};

/// Backend availability as seen by one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// The local backend answered its model listing in time.
    pub local_backend_reachable: bool,
    /// A credentialed external backend is wired in.
    pub external_backend_configured: bool,
    /// Models the local backend reported.
    pub available_local_models: Vec<String>,
    /// Registered local models the backend did not report. Empty when the
    /// backend could not be reached.
    pub missing_local_models: Vec<String>,
}

/// Probes the local backend's model listing, giving up after `limit`.
///
/// Never fails: timeouts and transport errors both read as unreachable.
pub async fn probe(
    local: &dyn InferenceBackend,
    registry: &ModelRegistry,
    external_backend_configured: bool,
    limit: Duration,
) -> HealthStatus {
    let listing = match timeout(limit, local.list_models()).await {
        Ok(Ok(models)) => Some(models),
        Ok(Err(err)) => {
            tracing::warn!(backend = local.name(), error = %err, "Local backend health probe failed");
            None
        }
        Err(_) => {
            tracing::warn!(
                backend = local.name(),
                timeout_ms = limit.as_millis() as u64,
                "Local backend health probe timed out"
            );
            None
        }
    };

    let Some(available_local_models) = listing else {
        return HealthStatus {
            local_backend_reachable: false,
            external_backend_configured,
            available_local_models: Vec::new(),
            missing_local_models: Vec::new(),
        };
    };

    let missing_local_models = registry
        .local_model_names()
        .into_iter()
        .filter(|wanted| {
            !available_local_models
                .iter()
                .any(|reported| model_name_matches(reported, wanted))
        })
        .map(ToOwned::to_owned)
        .collect();

    HealthStatus {
        local_backend_reachable: true,
        external_backend_configured,
        available_local_models,
        missing_local_models,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_providers::MockBackend;
    use std::time::Instant;

    #[tokio::test]
    async fn test_reports_missing_models() {
        let local = MockBackend::local().with_models(["mistral:7b", "nomic-embed-text:latest"]);
        let status = probe(&local, &ModelRegistry::default(), false, Duration::from_secs(1)).await;

        assert!(status.local_backend_reachable);
        assert!(!status.external_backend_configured);
        assert_eq!(status.available_local_models.len(), 2);
        assert_eq!(
            status.missing_local_models,
            vec!["codellama:13b".to_owned(), "deepseek-coder:6.7b".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_offline_backend_is_unreachable() {
        let local = MockBackend::local().offline();
        let started = Instant::now();
        let status = probe(&local, &ModelRegistry::default(), true, Duration::from_secs(1)).await;

        assert!(!status.local_backend_reachable);
        assert!(status.external_backend_configured);
        assert!(status.available_local_models.is_empty());
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}

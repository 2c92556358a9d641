//! Routing failures, tagged with the backend and call stage they came from.

use relay_core::{Error as CoreError, ModelProvider};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::result::Result as StdResult;
use thiserror::Error;

/// Result type for routing operations.
pub type Result<T> = StdResult<T, RoutingError>;

/// Point in a backend call where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStage {
    /// Sending the request, before any response was read.
    Dispatch,
    /// Reading or decoding the backend's response.
    Response,
}

impl Display for ExecutionStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Dispatch => f.write_str("dispatch"),
            Self::Response => f.write_str("response"),
        }
    }
}

/// Errors surfaced by the router.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Classification produced something outside its contract. Indicates a
    /// caller or programming defect, never a backend problem.
    #[error("Classification error: {0}")]
    Classification(String),

    /// Invalid settings or a missing credential for the chosen backend.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The backend could not be reached or did not answer in time.
    #[error("{provider} backend unreachable ({model}, {stage}): {message}")]
    BackendUnreachable {
        /// Tier the call was sent to.
        provider: ModelProvider,
        /// Model the call asked for.
        model: String,
        /// Where the call failed.
        stage: ExecutionStage,
        /// Underlying failure.
        message: String,
    },

    /// The backend answered with an error status or an unusable payload.
    #[error("{provider} backend protocol error ({model}, {stage}): {message}")]
    BackendProtocol {
        /// Tier the call was sent to.
        provider: ModelProvider,
        /// Model the call asked for.
        model: String,
        /// Where the call failed.
        stage: ExecutionStage,
        /// Underlying failure, including the backend's body.
        message: String,
    },

    /// The caller's deadline passed, in milliseconds.
    #[error("Query abandoned after {0}ms")]
    Timeout(u64),

    /// Error from the shared core layer, such as invalid configuration.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl RoutingError {
    /// Wraps a backend failure with the provider and model that were attempted.
    pub fn from_backend(provider: ModelProvider, model: &str, err: CoreError) -> Self {
        match err {
            CoreError::MissingApiKey(key) => {
                Self::Configuration(format!("{provider} backend is missing credential {key}"))
            }
            CoreError::Config(message) => Self::Configuration(message),
            other if other.is_transport() => Self::BackendUnreachable {
                provider,
                model: model.to_owned(),
                stage: ExecutionStage::Dispatch,
                message: other.to_string(),
            },
            other => Self::BackendProtocol {
                provider,
                model: model.to_owned(),
                stage: ExecutionStage::Response,
                message: other.to_string(),
            },
        }
    }

    /// Provider a backend error is attributed to, if any.
    #[must_use]
    pub fn provider(&self) -> Option<ModelProvider> {
        match self {
            Self::BackendUnreachable { provider, .. } | Self::BackendProtocol { provider, .. } => {
                Some(*provider)
            }
            _ => None,
        }
    }

    /// Whether the same request may succeed on another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnreachable { .. } | Self::Timeout(_))
    }
}

//! Errors raised while talking to the Ollama runtime.

use core::result::Result as CoreResult;
use thiserror::Error;

use relay_core::Error as CoreError;
use relay_core::error::classify_send_error;

/// Result type for Ollama operations.
pub type Result<T> = CoreResult<T, LocalError>;

/// Failures specific to the Ollama backend.
#[derive(Debug, Error)]
pub enum LocalError {
    /// Error bubbled up from the shared core layer.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// HTTP failure not classified as a timeout or refused connection.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The runtime could not be reached.
    #[error("Ollama not available: {0}")]
    OllamaUnavailable(String),

    /// No response within the client timeout, in milliseconds.
    #[error("Ollama timed out after {0}ms")]
    Timeout(u64),

    /// The runtime answered 404 for the requested model.
    #[error("Model not found: {model}: {body}")]
    ModelNotFound {
        /// Model identifier that was requested.
        model: String,
        /// Response body exactly as Ollama sent it.
        body: String,
    },

    /// Any other non-success status.
    #[error("Ollama returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body exactly as Ollama sent it.
        body: String,
    },

    /// The runtime answered successfully with an unusable payload.
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

impl From<LocalError> for CoreError {
    fn from(value: LocalError) -> Self {
        match value {
            LocalError::Core(inner) => inner,
            LocalError::Http(inner) => classify_send_error(inner, 0),
            LocalError::OllamaUnavailable(message) => Self::Unreachable(message),
            LocalError::Timeout(millis) => Self::Timeout(millis),
            LocalError::ModelNotFound { body, .. } => Self::Protocol { status: 404, body },
            LocalError::Status { status, body } => Self::Protocol { status, body },
            LocalError::InferenceFailed(message) => Self::InvalidResponse(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_maps_to_unreachable() {
        let core: CoreError = LocalError::OllamaUnavailable("connection refused".to_owned()).into();
        assert!(matches!(core, CoreError::Unreachable(_)));
        assert!(core.is_transport());
    }

    #[test]
    fn test_missing_model_keeps_ollama_body() {
        let body = "{\"error\":\"model 'mistral:7b' not found, try pulling it first\"}";
        let core: CoreError = LocalError::ModelNotFound {
            model: "mistral:7b".to_owned(),
            body: body.to_owned(),
        }
        .into();
        match core {
            CoreError::Protocol {
                status,
                body: forwarded,
            } => {
                assert_eq!(status, 404);
                assert_eq!(forwarded, body);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_status_is_kept_verbatim() {
        let core: CoreError = LocalError::Status {
            status: 500,
            body: "{\"error\":\"out of memory\"}".to_owned(),
        }
        .into();
        assert_eq!(
            core.to_string(),
            "Backend returned status 500: {\"error\":\"out of memory\"}"
        );
    }
}

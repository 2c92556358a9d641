use core::result::Result as CoreResult;
use std::io::Error as IoError;

use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use toml::de::Error as TomlError;

/// Result type for core operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur while talking to a backend or loading configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// An HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required API key was not found.
    #[error("API key not found: {0}")]
    MissingApiKey(String),

    /// The backend could not be reached (connection refused, DNS, reset).
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// The backend did not answer within the allotted time.
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// The backend answered with a non-success status.
    #[error("Backend returned status {status}: {body}")]
    Protocol {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Raw response body, kept verbatim for diagnosis.
        body: String,
    },

    /// The backend answered successfully but the payload was unusable.
    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    /// A general error not covered by other variants.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Determines whether this error may succeed if retried.
    ///
    /// Returns `true` for transient errors like network failures, timeouts and
    /// server-side statuses.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) | Self::Unreachable(_) | Self::Timeout(_) => true,
            Self::Protocol { status, .. } => matches!(*status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Whether the failure happened before any backend response was read.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Unreachable(_) | Self::Timeout(_) => true,
            Self::Request(err) => !err.is_decode() && !err.is_status(),
            _ => false,
        }
    }
}

/// Converts a `reqwest` send failure into the matching transport error.
///
/// `timeout_ms` is the client timeout that was in force, reported back when
/// the request expired.
pub fn classify_send_error(err: ReqwestError, timeout_ms: u64) -> Error {
    if err.is_timeout() {
        Error::Timeout(timeout_ms)
    } else if err.is_connect() {
        Error::Unreachable(err.to_string())
    } else {
        Error::Request(err)
    }
}

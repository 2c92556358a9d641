//! Local inference backend backed by an Ollama runtime.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::float_cmp,
        reason = "Allow for tests"
    )
)]

/// Error types and result definitions.
pub mod error;
/// Generation client implementing the shared backend trait.
pub mod inference;
/// Installed-model listing.
pub mod manager;
/// Ollama wire types.
pub mod models;

pub use error::{LocalError, Result};
pub use inference::OllamaBackend;
pub use manager::OllamaManager;
pub use models::{OllamaGenerateRequest, OllamaGenerateResponse, OllamaModel, OllamaOptions};

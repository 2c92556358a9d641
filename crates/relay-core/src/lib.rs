//! Core types and traits for the relay inference router.
//!
//! This crate provides the shared vocabulary used by every backend client and
//! by the routing engine: query classification tags, generation requests and
//! completions, the uniform backend trait, error handling and configuration.
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

/// Router configuration loading and validation.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Poison-tolerant lock helpers.
pub mod sync;
/// Trait definitions for inference backends.
pub mod traits;
/// Core data types for requests, completions, and classification.
pub mod types;

pub use config::{ModelRoles, RouterConfig};
pub use error::{Error, Result};
pub use sync::IgnoreLock;
pub use traits::InferenceBackend;
pub use types::{Completion, GenerationRequest, ModelProvider, QueryType, TokenUsage};

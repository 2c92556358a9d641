//! Backend adapters for metered external inference services, plus a
//! scripted backend for exercising the router without a network.
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

/// Scripted backend for tests and dry runs.
pub mod mock;
/// `OpenAI` chat completions backend.
pub mod openai;

pub use mock::{MockBackend, MockOutcome};
pub use openai::OpenAiBackend;

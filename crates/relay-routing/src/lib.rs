//! Inference query routing: classify a query, pick a local or external
//! backend under a local-ratio target, run it and keep score.
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

pub mod classifier;
pub mod error;
pub mod executor;
pub mod health;
pub mod metrics;
pub mod policy;
pub mod registry;
pub mod router;

pub use classifier::{Classification, Complexity, QueryClassifier, estimate_context_length};
pub use error::{ExecutionStage, Result, RoutingError};
pub use executor::{ExecutionResult, Executor};
pub use health::HealthStatus;
pub use metrics::{MetricsSnapshot, MetricsTracker, QueryMetrics};
pub use policy::{PolicyEngine, RouteRequest, RoutingDecision};
pub use registry::{ModelDescriptor, ModelKind, ModelRegistry, ModelRole};
pub use router::{CostProjection, QueryRouter};

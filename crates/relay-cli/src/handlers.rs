//! Command handlers for CLI operations

use anyhow::Result;
use relay_routing::{QueryRouter, RouteRequest};
use serde::Serialize;
use std::time::Duration;

use crate::cli::QueryArgs;

/// Write a command result to stdout as pretty JSON.
#[allow(
    clippy::print_stdout,
    reason = "stdout carries the command result; logs go to stderr"
)]
fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_request(args: QueryArgs) -> RouteRequest {
    let mut request = RouteRequest::new(args.query).force_local(args.force_local);
    if let Some(query_type) = args.query_type {
        request = request.with_query_type(query_type);
    }
    if let Some(context_length) = args.context_length {
        request = request.with_context_length(context_length);
    }
    if let Some(complexity) = args.complexity {
        request = request.with_complexity(complexity);
    }
    request
}

/// Handle `relay classify`
///
/// # Errors
/// Returns an error if the result cannot be serialized
pub fn handle_classify(
    router: &QueryRouter,
    query: &str,
    context_length: Option<u32>,
) -> Result<()> {
    emit(&router.classify(query, context_length))
}

/// Handle `relay route`
///
/// # Errors
/// Returns an error if the request carries an invalid complexity override
pub fn handle_route(router: &QueryRouter, args: QueryArgs) -> Result<()> {
    let decision = router.route(&build_request(args))?;
    emit(&decision)
}

/// Handle `relay execute`
///
/// # Errors
/// Returns an error if routing fails, the backend call fails or the deadline passes
pub async fn handle_execute(
    router: &QueryRouter,
    args: QueryArgs,
    system: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let mut request = build_request(args);
    if let Some(system_prompt) = system {
        request = request.with_system_prompt(system_prompt);
    }

    let result = match timeout_secs {
        Some(secs) => {
            router
                .execute_with_timeout(&request, Duration::from_secs(secs))
                .await?
        }
        None => router.execute(&request).await?,
    };

    emit(&result)
}

/// Handle `relay health`
///
/// # Errors
/// Returns an error if the result cannot be serialized
pub async fn handle_health(router: &QueryRouter) -> Result<()> {
    let status = router.health().await;
    if !status.missing_local_models.is_empty() {
        tracing::warn!(
            "Local models not installed: {}",
            status.missing_local_models.join(", ")
        );
    }
    emit(&status)
}

/// Handle `relay models`
///
/// # Errors
/// Returns an error if the registry cannot be serialized
pub fn handle_models(router: &QueryRouter) -> Result<()> {
    let models: Vec<_> = router.registry().iter().collect();
    emit(&models)
}

/// Handle `relay cost`
///
/// # Errors
/// Returns an error if the projection cannot be serialized
pub fn handle_cost(router: &QueryRouter, per_day: u64, local_share: f64) -> Result<()> {
    emit(&router.project_monthly_cost(per_day, local_share))
}

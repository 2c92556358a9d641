//! Relay CLI - route inference queries between local and external models
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        reason = "Allow for tests"
    )
)]

use anyhow::Result;
use clap::Parser as _;
use relay_core::RouterConfig;
use relay_routing::QueryRouter;
use std::io;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use cli::{Cli, Commands};

mod cli;
mod handlers;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs on stderr keep stdout a clean JSON channel
    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "relay_routing=info,relay_local=info,relay_providers=info".into()
        }))
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();

    let cli = Cli::parse();

    let config = RouterConfig::load(cli.config.as_deref())?;
    let router = QueryRouter::new(config)?;

    match cli.command {
        Commands::Classify {
            query,
            context_length,
        } => handlers::handle_classify(&router, &query, context_length)?,
        Commands::Route(args) => handlers::handle_route(&router, args)?,
        Commands::Execute {
            query,
            system,
            timeout,
        } => handlers::handle_execute(&router, query, system, timeout).await?,
        Commands::Health => handlers::handle_health(&router).await?,
        Commands::Models => handlers::handle_models(&router)?,
        Commands::Cost {
            per_day,
            local_share,
        } => handlers::handle_cost(&router, per_day, local_share)?,
    }

    Ok(())
}

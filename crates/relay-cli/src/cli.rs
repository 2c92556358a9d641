use clap::{Args, Parser, Subcommand};
use relay_core::QueryType;
use std::path::PathBuf;

/// Command-line arguments for the relay binary
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Route inference queries between local and external models", long_about = None)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        help = "Config file (defaults to ~/.relay/config.toml)"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Classify a query without routing it")]
    Classify {
        #[arg(help = "Query text")]
        query: String,

        #[arg(long, help = "Context length hint in tokens")]
        context_length: Option<u32>,
    },

    #[command(about = "Show where a query would be routed")]
    Route(QueryArgs),

    #[command(about = "Route and run a query")]
    Execute {
        #[command(flatten)]
        query: QueryArgs,

        #[arg(long, help = "System prompt forwarded to the backend")]
        system: Option<String>,

        #[arg(long, help = "Abandon the call after this many seconds")]
        timeout: Option<u64>,
    },

    #[command(about = "Probe backend availability")]
    Health,

    #[command(about = "List the model registry")]
    Models,

    #[command(about = "Project monthly spend for a query volume")]
    Cost {
        #[arg(long, default_value_t = 1000, help = "Queries per day")]
        per_day: u64,

        #[arg(
            long,
            default_value_t = 0.95,
            help = "Share of queries served locally (0.0-1.0)"
        )]
        local_share: f64,
    },
}

/// Query text plus the optional routing overrides.
#[derive(Args, Debug)]
pub struct QueryArgs {
    #[arg(help = "Query text")]
    pub query: String,

    #[arg(long = "type", help = "Query type (skips classification)")]
    pub query_type: Option<QueryType>,

    #[arg(long, help = "Context length in tokens")]
    pub context_length: Option<u32>,

    #[arg(long, help = "Complexity override (1-10)")]
    pub complexity: Option<u8>,

    #[arg(long, help = "Never route to the external backend")]
    pub force_local: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_execute_with_overrides() {
        let cli = Cli::try_parse_from([
            "relay",
            "execute",
            "Compare both designs",
            "--type",
            "reasoning",
            "--complexity",
            "9",
            "--timeout",
            "30",
        ])
        .unwrap();

        let Commands::Execute { query, timeout, .. } = cli.command else {
            panic!("expected execute command");
        };
        assert_eq!(query.query, "Compare both designs");
        assert_eq!(query.query_type, Some(QueryType::Reasoning));
        assert_eq!(query.complexity, Some(9));
        assert_eq!(timeout, Some(30));
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["relay", "health", "--config", "/tmp/relay.toml"]).unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/relay.toml")));
        assert!(matches!(cli.command, Commands::Health));
    }

    #[test]
    fn test_unknown_query_type_is_rejected() {
        let err = Cli::try_parse_from(["relay", "route", "hello", "--type", "poetry"]).unwrap_err();
        assert!(err.to_string().contains("poetry"));
    }
}

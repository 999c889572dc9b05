// Loadrun CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Support text/json/yaml output formats for scripting.
// Design Decision: Logs go to stderr so they never mix with reports on stdout.
// Design Decision: Flags override LOADRUN_* environment variables, which override defaults.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ClientConfig;

#[derive(Parser)]
#[command(name = "loadrun")]
#[command(about = "Loadrun CLI - Inspect load test runs, their metrics and summaries")]
#[command(version)]
pub struct Cli {
    /// API base URL (defaults to LOADRUN_API_URL, then http://localhost:9000)
    #[arg(long)]
    pub api_url: Option<String>,

    /// API token (defaults to LOADRUN_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Request timeout in seconds (defaults to LOADRUN_TIMEOUT_SECS, then 30)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json", "yaml"])]
    pub output: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(api_url) = &self.api_url {
            config = config.with_base_url(api_url);
        }
        if let Some(token) = &self.token {
            config = config.with_token(token);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect test runs
    Testrun {
        #[command(subcommand)]
        command: commands::testrun::TestRunCommand,
    },

    /// Inspect the metrics of a test run
    Metrics {
        #[command(subcommand)]
        command: commands::metrics::MetricsCommand,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loadrun=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.client_config();
    tracing::debug!(api_url = %config.base_url, timeout = ?config.timeout, "client configured");

    let client = client::Client::new(config).context("Failed to create API client")?;
    let output_format = output::OutputFormat::from_str(&cli.output);

    let color = !cli.no_color && std::io::stdout().is_terminal();

    match cli.command {
        Commands::Testrun { command } => {
            commands::testrun::run(command, &client, output_format, color).await
        }
        Commands::Metrics { command } => {
            commands::metrics::run(command, &client, output_format).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_summary_command() {
        let cli = Cli::try_parse_from([
            "loadrun",
            "--output",
            "json",
            "--api-url",
            "http://127.0.0.1:9999",
            "testrun",
            "summary",
            "42",
        ])
        .unwrap();

        assert_eq!(cli.output, "json");
        assert_eq!(cli.client_config().base_url, "http://127.0.0.1:9999");
        assert!(matches!(
            cli.command,
            Commands::Testrun {
                command: commands::testrun::TestRunCommand::Summary { id: 42 }
            }
        ));
    }

    #[test]
    fn test_parse_aggregate_command() {
        let cli = Cli::try_parse_from([
            "loadrun",
            "--timeout",
            "5",
            "metrics",
            "aggregate",
            "--test-run-id",
            "7",
            "--metric",
            "http_req_duration",
            "--query",
            "histogram_avg",
        ])
        .unwrap();

        assert_eq!(cli.timeout, Some(5));
        assert!(matches!(
            cli.command,
            Commands::Metrics {
                command: commands::metrics::MetricsCommand::Aggregate { test_run_id: 7, .. }
            }
        ));
    }

    #[test]
    fn test_httpurls_subcommand_name() {
        let cli = Cli::try_parse_from(["loadrun", "testrun", "httpurls", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Testrun {
                command: commands::testrun::TestRunCommand::HttpUrls { id: 3 }
            }
        ));
    }
}

//! Deckcheck CLI
//!
//! Command-line client for the pitch-deck analysis server: upload a deck,
//! follow the analysis job and fetch its report.

mod commands;
mod config;
mod view;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "deckcheck")]
#[command(about = "Pitch deck verification client", long_about = None)]
struct Cli {
    /// Analysis server URL
    #[arg(long, env = "DECKCHECK_SERVER_URL", default_value = "http://localhost:5000")]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so they never interleave with rendered job output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "deckcheck_cli=warn,deckcheck_controller=warn,deckcheck_client=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::new(cli.server_url);
    config.validate()?;

    handle_command(cli.command, &config).await
}

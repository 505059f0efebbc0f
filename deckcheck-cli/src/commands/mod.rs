//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod report;

pub use job::{StatusArgs, SubmitArgs, WatchArgs};
pub use report::DownloadArgs;

use anyhow::Result;
use clap::Subcommand;
use std::process::ExitCode;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Upload a pitch deck and follow its analysis
    Submit(SubmitArgs),
    /// Follow an analysis job that is already running
    Watch(WatchArgs),
    /// Show the current status of a job
    Status(StatusArgs),
    /// Download the PDF report of a completed job
    Download(DownloadArgs),
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<ExitCode> {
    match command {
        Commands::Submit(args) => job::submit(args, config).await,
        Commands::Watch(args) => job::watch(args, config).await,
        Commands::Status(args) => job::status(args, config).await,
        Commands::Download(args) => report::download(args, config).await,
    }
}

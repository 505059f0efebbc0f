//! Report command handlers

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use deckcheck_client::AnalysisClient;
use deckcheck_core::domain::job::JobId;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Args)]
pub struct DownloadArgs {
    /// Job ID of a completed analysis
    job_id: String,

    /// Where to write the PDF (defaults to `<job_id>_report.pdf`)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Download the PDF report of a completed job
pub async fn download(args: DownloadArgs, config: &crate::config::Config) -> Result<ExitCode> {
    let client = AnalysisClient::new(&config.server_url);
    let job_id = JobId::new(args.job_id);

    let bytes = client
        .download_report(&job_id)
        .await
        .with_context(|| format!("Failed to download the report of job {}", job_id))?;

    let output = args.output.unwrap_or_else(|| default_report_path(&job_id));
    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} {} ({} bytes)",
        "Saved report to".green(),
        output.display(),
        bytes.len()
    );

    Ok(ExitCode::SUCCESS)
}

fn default_report_path(job_id: &JobId) -> PathBuf {
    PathBuf::from(format!("{}_report.pdf", job_id))
}

//! Job command handlers
//!
//! Submitting a deck and following a job both run the job controller with a
//! terminal view until the job settles. Ctrl-C resets the controller, which
//! stops polling immediately.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use deckcheck_client::{AnalysisClient, ClientError};
use deckcheck_controller::{ControllerConfig, JobController};
use deckcheck_core::domain::job::{JobId, JobSnapshot, Phase};
use deckcheck_core::domain::upload::{AnalysisOptions, Upload};
use deckcheck_core::dto::job::{RemoteStatus, StatusResponse};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::view::{TerminalView, print_result};

/// Exit status after an interrupt, as shells report SIGINT
const INTERRUPTED: u8 = 130;

#[derive(Args)]
pub struct SubmitArgs {
    /// Pitch deck to analyze (PDF)
    file: PathBuf,

    /// Email the finished report to this address
    #[arg(long)]
    email: Option<String>,

    /// Investor name used for the analysis profile
    #[arg(long)]
    investor_name: Option<String>,

    /// Comma-separated investor focus areas
    #[arg(long)]
    focus_areas: Option<String>,

    /// Investment stage (e.g. "Seed", "Series A")
    #[arg(long)]
    investment_stage: Option<String>,

    /// Print the job id once the upload is accepted instead of following the job
    #[arg(long)]
    no_wait: bool,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Job ID returned by `submit`
    job_id: String,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Job ID returned by `submit`
    job_id: String,

    /// Print the raw status response as JSON
    #[arg(long)]
    json: bool,
}

/// Upload a deck and follow the created job
pub async fn submit(args: SubmitArgs, config: &Config) -> Result<ExitCode> {
    let upload = read_upload(&args.file).await?.with_options(&AnalysisOptions {
        email: args.email,
        investor_name: args.investor_name,
        focus_areas: args.focus_areas,
        investment_stage: args.investment_stage,
    });

    let controller = build_controller(config)?;

    let submitted = tokio::select! {
        submitted = controller.submit(Some(upload)) => submitted,
        _ = tokio::signal::ctrl_c() => return Ok(interrupt(&controller)),
    };

    let job_id = match submitted {
        Ok(job_id) => job_id,
        // The view already rendered the failure
        Err(err) => {
            debug!("Submission failed: {}", err);
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("{} {}", "Job".bold(), job_id.to_string().cyan());

    if args.no_wait {
        println!(
            "{}",
            format!("Follow it with: deckcheck watch {}", job_id).dimmed()
        );
        return Ok(ExitCode::SUCCESS);
    }

    follow(&controller).await
}

/// Follow a job created earlier
pub async fn watch(args: WatchArgs, config: &Config) -> Result<ExitCode> {
    let controller = build_controller(config)?;

    println!("{} {}", "Following job".bold(), args.job_id.cyan());
    controller.start_polling(JobId::new(args.job_id));

    follow(&controller).await
}

/// Query and print a job's status once
pub async fn status(args: StatusArgs, config: &Config) -> Result<ExitCode> {
    let client = AnalysisClient::new(&config.server_url);
    let job_id = JobId::new(args.job_id);

    let response = match client.get_status(&job_id).await {
        Ok(response) => response,
        Err(err) => {
            debug!("Status request failed: {}", err);
            eprintln!("{}", status_error_message(&job_id, &err).red());
            return Ok(ExitCode::FAILURE);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_status(&client, &job_id, &response);
    }

    Ok(ExitCode::SUCCESS)
}

fn build_controller(config: &Config) -> Result<JobController> {
    let controller_config =
        ControllerConfig::from_env().context("Invalid controller configuration")?;
    let client = Arc::new(AnalysisClient::new(&config.server_url));
    let view = Arc::new(TerminalView::new());

    Ok(JobController::new(controller_config, client, view))
}

async fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file", path.display()))?;

    Ok(Upload::new(file_name, bytes))
}

/// Waits for the controller to settle, resetting it on Ctrl-C
async fn follow(controller: &JobController) -> Result<ExitCode> {
    let snapshot = tokio::select! {
        snapshot = controller.wait_for_terminal() => snapshot,
        _ = tokio::signal::ctrl_c() => return Ok(interrupt(controller)),
    };

    print_elapsed(&snapshot);

    Ok(match snapshot.phase {
        Phase::Completed => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn interrupt(controller: &JobController) -> ExitCode {
    controller.reset();
    eprintln!("{}", "Interrupted; the server keeps processing the job.".yellow());
    ExitCode::from(INTERRUPTED)
}

fn print_elapsed(snapshot: &JobSnapshot) {
    let Some(job) = &snapshot.job else {
        return;
    };

    if let Some(finished) = job.finished_at {
        let seconds = finished.signed_duration_since(job.created_at).num_seconds();
        println!("{}", format!("Finished in {}s", seconds).dimmed());
    }
}

fn print_status(client: &AnalysisClient, job_id: &JobId, response: &StatusResponse) {
    println!("{}", "Job Status:".bold());
    println!("  ID:       {}", job_id.to_string().cyan());
    println!("  Status:   {}", colorize_status(response.status));

    if let Some(progress) = response.progress {
        println!("  Progress: {}%", progress.clamp(0, 100));
    }

    if let Some(message) = &response.message {
        println!("  Message:  {}", message);
    }

    if let Some(error) = &response.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }

    if let Some(result) = &response.result {
        print_result(result);
        let links = client.report_links(job_id);
        println!();
        println!("  PDF report:  {}", links.download.cyan());
        println!("  HTML report: {}", links.view.cyan());
    }
}

fn status_error_message(job_id: &JobId, err: &ClientError) -> String {
    if err.is_not_found() {
        return format!("Job {} not found", job_id);
    }

    if err.is_transport() {
        return "Could not reach the analysis server".to_string();
    }

    match err.server_message() {
        Some(message) => format!("Failed to fetch status of job {}: {}", job_id, message),
        None => format!("Failed to fetch status of job {}: {}", job_id, err),
    }
}

/// Colorize remote job status for display
fn colorize_status(status: RemoteStatus) -> ColoredString {
    match status {
        RemoteStatus::InProgress => "in progress".cyan(),
        RemoteStatus::Completed => "completed".green(),
        RemoteStatus::Error => "error".red(),
    }
}

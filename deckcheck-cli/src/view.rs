//! Terminal view
//!
//! Renders controller updates as colored lines on stdout.

use colored::*;
use deckcheck_controller::View;
use deckcheck_core::domain::job::{AnalysisResult, ReportLinks};
use std::sync::Mutex;

const BAR_WIDTH: usize = 30;

/// Line-oriented renderer for a job's lifecycle
#[derive(Default)]
pub struct TerminalView {
    /// Last progress line printed, to avoid repeating identical polls
    last_progress: Mutex<Option<(u8, String)>>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    fn forget_progress(&self) {
        *self.last_progress.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl View for TerminalView {
    fn set_submit_enabled(&self, _enabled: bool) {
        // A one-shot command has no submit control to toggle
    }

    fn show_submitting(&self, file_name: &str) {
        self.forget_progress();
        println!("{} {}", "Uploading".cyan().bold(), file_name);
    }

    fn show_progress(&self, progress: u8, message: &str) {
        let mut last = self.last_progress.lock().unwrap_or_else(|e| e.into_inner());
        let current = (progress, message.to_string());
        if last.as_ref() == Some(&current) {
            return;
        }

        println!("{} {}", progress_bar(progress), message);
        *last = Some(current);
    }

    fn show_completed(&self, result: &AnalysisResult, links: &ReportLinks) {
        self.forget_progress();
        print_result(result);
        println!();
        println!("  PDF report:  {}", links.download.cyan());
        println!("  HTML report: {}", links.view.cyan());
    }

    fn show_failed(&self, message: &str) {
        self.forget_progress();
        println!("{} {}", "✗ Analysis failed:".red().bold(), message.red());
    }

    fn clear(&self) {
        self.forget_progress();
        println!("{}", "Job discarded.".dimmed());
    }
}

/// Prints the summary card of a completed analysis
pub fn print_result(result: &AnalysisResult) {
    println!();
    println!("{}", "✓ Analysis complete".green().bold());
    println!("  Company:      {}", result.company_name.bold());
    println!(
        "  Verification: {}",
        colorize_score(result.verification_score)
    );
    println!("  Claims:       {}", result.num_claims);
    println!("  Questions:    {}", result.num_questions);

    if result.email_sent {
        println!("  Email:        {}", "sent".green());
    } else if let Some(error) = &result.email_error {
        println!("  Email:        {} ({})", "not sent".yellow(), error);
    }
}

fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "█".repeat(filled).cyan(),
        "░".repeat(BAR_WIDTH - filled).dimmed(),
        progress
    )
}

/// Score in [0, 1] shown as a percentage, colored by band
pub fn colorize_score(score: f64) -> ColoredString {
    let text = format!("{:.0}%", score.clamp(0.0, 1.0) * 100.0);
    if score >= 0.75 {
        text.green()
    } else if score >= 0.5 {
        text.yellow()
    } else {
        text.red()
    }
}

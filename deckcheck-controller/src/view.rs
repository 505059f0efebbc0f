//! View collaborator
//!
//! The controller never formats output itself. Each state change is pushed
//! to a `View`, which may be a terminal renderer, a GUI or a test recorder.

use deckcheck_core::domain::job::{AnalysisResult, ReportLinks};

/// Rendering surface driven by the job controller
///
/// Methods are called while the controller holds its state lock, so they
/// must return quickly and must not call back into the controller.
pub trait View: Send + Sync {
    /// Enables or disables the submission affordance
    fn set_submit_enabled(&self, enabled: bool);

    /// A file is being uploaded
    fn show_submitting(&self, file_name: &str);

    /// The job is running; `progress` is within 0..=100
    fn show_progress(&self, progress: u8, message: &str);

    /// The job finished successfully
    fn show_completed(&self, result: &AnalysisResult, links: &ReportLinks);

    /// The submission or the job failed
    fn show_failed(&self, message: &str);

    /// The controller was reset; remove any job output
    fn clear(&self);
}

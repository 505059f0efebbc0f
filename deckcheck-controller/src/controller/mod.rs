//! Job controller
//!
//! Owns the single active job and its poll timer, and drives the
//! transitions between phases:
//!
//! | From       | Event                           | To        |
//! |------------|---------------------------------|-----------|
//! | Idle       | `submit`                        | Submitting|
//! | Submitting | job created                     | Polling   |
//! | Submitting | create-job failed               | Failed    |
//! | Polling    | status `in-progress`            | Polling   |
//! | Polling    | status `completed`              | Completed |
//! | Polling    | `completed` without a result    | Polling   |
//! | Polling    | status `error` / request failed | Failed    |
//! | any        | `reset`                         | Idle      |
//!
//! Polls are serialized: the timer waits for a poll to finish before it
//! waits for the next tick, and ticks missed meanwhile are skipped. Every
//! poll result is checked against the active timer token and job id before
//! it is applied, so results arriving after `cancel`, `reset` or a new
//! submission are dropped. Dropping a `submit` future before the server
//! answers fails the submission, so the submit control is never left
//! disabled.

mod state;
mod timer;

#[cfg(test)]
mod tests;

use chrono::Utc;
use deckcheck_client::{AnalysisApi, ClientError};
use deckcheck_core::domain::job::{
    AnalysisResult, FailureKind, Job, JobFailure, JobId, JobSnapshot, Phase,
};
use deckcheck_core::domain::upload::Upload;
use deckcheck_core::dto::job::{RemoteStatus, StatusResponse};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::{ControllerError, Result};
use crate::view::View;
use state::ControllerState;
use timer::PollTimer;

const JOB_ACCEPTED_MESSAGE: &str = "Analysis started";
const JOB_COMPLETED_MESSAGE: &str = "Analysis complete";

const UPLOAD_FAILED: &str = "Upload failed";
const STATUS_FAILED: &str = "Failed to fetch job status";
const ANALYSIS_FAILED: &str = "Analysis failed";
const CONNECTION_FAILED: &str = "Connection to the analysis server failed";
const MALFORMED_RESPONSE: &str = "Unexpected response from the analysis server";
const MISSING_RESULT: &str = "Analysis completed without a result";
const SUBMISSION_INTERRUPTED: &str = "Upload interrupted before the server answered";

/// Consecutive `completed` responses without a result tolerated before the
/// job fails; the server marks a job completed before storing its result
const MAX_RESULTLESS_COMPLETIONS: u32 = 3;

/// Client-side controller of one analysis job at a time
///
/// Must be used from within a tokio runtime: the poll timer is a spawned
/// task. Dropping the controller stops the timer.
pub struct JobController {
    shared: Arc<Shared>,
}

struct Shared {
    config: ControllerConfig,
    api: Arc<dyn AnalysisApi>,
    view: Arc<dyn View>,
    state: Mutex<ControllerState>,
    snapshots: watch::Sender<JobSnapshot>,
}

impl JobController {
    /// Creates an idle controller
    pub fn new(config: ControllerConfig, api: Arc<dyn AnalysisApi>, view: Arc<dyn View>) -> Self {
        let (snapshots, _) = watch::channel(JobSnapshot::default());

        Self {
            shared: Arc::new(Shared {
                config,
                api,
                view,
                state: Mutex::new(ControllerState::new()),
                snapshots,
            }),
        }
    }

    /// Submits a file for analysis and starts polling the created job
    ///
    /// Any previous job is discarded and its timer stopped first. A missing
    /// or unacceptable upload fails with `ControllerError::Validation`
    /// without contacting the server.
    ///
    /// # Returns
    /// The identifier of the created job, which is then being polled
    pub async fn submit(&self, upload: Option<Upload>) -> Result<JobId> {
        let shared = &self.shared;

        let (submission, upload) = {
            let mut state = shared.lock();
            state.cancel_timer();
            state.submission += 1;

            let upload = match validate_upload(&shared.config, upload) {
                Ok(upload) => upload,
                Err(message) => {
                    let failure = JobFailure::new(FailureKind::Validation, message);
                    let err = ControllerError::from(&failure);
                    state.snapshot.job = None;
                    shared.fail(&mut state, failure);
                    return Err(err);
                }
            };

            info!(
                "Submitting {} ({} bytes) for analysis",
                upload.file_name,
                upload.len()
            );

            state.snapshot = JobSnapshot {
                phase: Phase::Submitting,
                job: None,
                error: None,
            };
            shared.view.set_submit_enabled(false);
            shared.view.show_submitting(&upload.file_name);
            shared.publish(&state);

            (state.submission, upload)
        };

        let pending = PendingSubmission::new(shared, submission);
        let outcome = shared.api.create_job(upload).await;
        pending.settle();

        let mut state = shared.lock();
        if state.submission != submission {
            debug!("Discarding create-job response of a superseded submission");
            return Err(ControllerError::Superseded);
        }

        match outcome {
            Ok(job_id) => {
                shared.begin_polling(&mut state, job_id.clone());
                Ok(job_id)
            }
            Err(err) => {
                warn!("Create-job request failed: {}", err);
                let failure = failure_from_client_error(&err, UPLOAD_FAILED);
                let controller_err = ControllerError::from(&failure);
                shared.fail(&mut state, failure);
                Err(controller_err)
            }
        }
    }

    /// Starts polling an existing job, replacing whatever job was active
    pub fn start_polling(&self, job_id: JobId) {
        let mut state = self.shared.lock();
        state.submission += 1;
        self.shared.view.set_submit_enabled(false);
        self.shared.begin_polling(&mut state, job_id);
    }

    /// Stops the poll timer without touching the recorded job
    ///
    /// Returns whether a timer was running. A poll already in flight is
    /// discarded when it returns.
    pub fn cancel(&self) -> bool {
        let mut state = self.shared.lock();
        let stopped = state.cancel_timer();
        if stopped {
            info!("Poll timer stopped");
        }
        stopped
    }

    /// Returns the controller to `Idle`, stopping the timer and clearing the job
    ///
    /// Calling it on an idle controller does nothing.
    pub fn reset(&self) {
        let shared = &self.shared;
        let mut state = shared.lock();

        let had_timer = state.cancel_timer();
        if !had_timer && state.snapshot == JobSnapshot::default() {
            return;
        }

        info!("Resetting job controller");
        state.submission += 1;
        state.snapshot = JobSnapshot::default();
        shared.view.clear();
        shared.view.set_submit_enabled(true);
        shared.publish(&state);
    }

    /// Current state of the controller
    pub fn snapshot(&self) -> JobSnapshot {
        self.shared.lock().snapshot.clone()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.shared.lock().snapshot.phase
    }

    /// Whether the poll timer is running
    pub fn is_timer_active(&self) -> bool {
        self.shared.lock().timer.is_some()
    }

    /// Receives a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Resolves once the controller is neither submitting nor polling
    ///
    /// A controller stopped with `cancel` while polling stays in `Polling`;
    /// pair `cancel` with `reset` when waiting on it.
    pub async fn wait_for_terminal(&self) -> JobSnapshot {
        let mut snapshots = self.subscribe();
        let settled = snapshots
            .wait_for(|snapshot| snapshot.phase.is_terminal() || snapshot.phase == Phase::Idle)
            .await
            .map(|snapshot| snapshot.clone());

        match settled {
            Ok(snapshot) => snapshot,
            Err(_) => self.snapshot(),
        }
    }
}

impl Drop for JobController {
    fn drop(&mut self) {
        self.shared.lock().cancel_timer();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &ControllerState) {
        self.snapshots.send_replace(state.snapshot.clone());
    }

    fn timer_active(&self, token: u64) -> bool {
        self.lock()
            .timer
            .as_ref()
            .is_some_and(|timer| timer.token() == token)
    }

    /// Enters `Polling` for `job_id` and starts a fresh poll timer
    fn begin_polling(self: &Arc<Self>, state: &mut ControllerState, job_id: JobId) {
        state.cancel_timer();

        state.resultless_completions = 0;
        let job = Job::new(job_id.clone(), JOB_ACCEPTED_MESSAGE);
        self.view.show_progress(job.progress, &job.message);
        state.snapshot = JobSnapshot {
            phase: Phase::Polling,
            job: Some(job),
            error: None,
        };

        let token = state.next_timer_token();
        info!(
            "Polling job {} every {:?}",
            job_id, self.config.poll_interval
        );
        state.timer = Some(PollTimer::start(
            Arc::downgrade(self),
            token,
            job_id,
            self.config.poll_interval,
        ));

        self.publish(state);
    }

    /// Applies the outcome of one poll
    ///
    /// Returns whether the timer should keep polling.
    fn apply_poll(
        &self,
        token: u64,
        job_id: &JobId,
        outcome: deckcheck_client::Result<StatusResponse>,
    ) -> bool {
        let mut state = self.lock();

        if !state.polls_job(token, job_id) {
            debug!("Discarding stale status response for job {}", job_id);
            return false;
        }

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                warn!("Status poll for job {} failed: {}", job_id, err);
                let failure = failure_from_client_error(&err, STATUS_FAILED);
                self.fail(&mut state, failure);
                return false;
            }
        };

        match response.status {
            RemoteStatus::InProgress => {
                state.resultless_completions = 0;
                self.record_progress(&mut state, job_id, response.progress, response.message)
            }
            RemoteStatus::Completed => match response.result {
                Some(result) => {
                    self.complete(&mut state, result, response.message);
                    false
                }
                None => {
                    state.resultless_completions += 1;
                    if state.resultless_completions > MAX_RESULTLESS_COMPLETIONS {
                        self.fail(
                            &mut state,
                            JobFailure::new(FailureKind::Server, MISSING_RESULT),
                        );
                        return false;
                    }

                    debug!("Job {} completed but its result is not stored yet", job_id);
                    self.record_progress(&mut state, job_id, response.progress, response.message)
                }
            },
            RemoteStatus::Error => {
                let message = response
                    .error
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| ANALYSIS_FAILED.to_string());
                self.fail(&mut state, JobFailure::new(FailureKind::Server, message));
                false
            }
        }
    }

    /// Records a progress update and keeps polling
    fn record_progress(
        &self,
        state: &mut ControllerState,
        job_id: &JobId,
        progress: Option<i64>,
        message: Option<String>,
    ) -> bool {
        let Some(job) = state.snapshot.job.as_mut() else {
            return false;
        };

        let reported = progress.unwrap_or(i64::from(job.progress));
        let progress = job.record_progress(reported);
        if let Some(message) = message {
            job.message = message;
        }

        debug!("Job {} at {}%: {}", job_id, progress, job.message);
        self.view.show_progress(progress, &job.message);
        self.publish(state);
        true
    }

    fn complete(
        &self,
        state: &mut ControllerState,
        result: AnalysisResult,
        message: Option<String>,
    ) {
        state.cancel_timer();

        let Some(job) = state.snapshot.job.as_mut() else {
            return;
        };

        job.record_progress(100);
        job.message = message.unwrap_or_else(|| JOB_COMPLETED_MESSAGE.to_string());
        job.finished_at = Some(Utc::now());

        info!(
            "Job {} completed: {} scored {:.2}",
            job.id, result.company_name, result.verification_score
        );

        let links = self.api.report_links(&job.id);
        self.view.show_completed(&result, &links);
        job.result = Some(result);

        state.snapshot.phase = Phase::Completed;
        state.snapshot.error = None;
        self.view.set_submit_enabled(true);
        self.publish(state);
    }

    fn fail(&self, state: &mut ControllerState, failure: JobFailure) {
        state.cancel_timer();

        if let Some(job) = state.snapshot.job.as_mut() {
            job.finished_at = Some(Utc::now());
        }

        warn!("Job failed ({:?}): {}", failure.kind, failure.message);

        self.view.show_failed(&failure.message);
        state.snapshot.phase = Phase::Failed;
        state.snapshot.error = Some(failure);
        self.view.set_submit_enabled(true);
        self.publish(state);
    }
}

/// Fails its submission if dropped while the create-job request is pending
///
/// A `submit` future dropped mid-request (timeout, `select!`, abort) would
/// otherwise leave the controller in `Submitting` with submit disabled.
struct PendingSubmission<'a> {
    shared: &'a Shared,
    submission: u64,
    settled: bool,
}

impl<'a> PendingSubmission<'a> {
    fn new(shared: &'a Shared, submission: u64) -> Self {
        Self {
            shared,
            submission,
            settled: false,
        }
    }

    /// The request returned; its outcome is applied by `submit`
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let mut state = self.shared.lock();
        if state.submission != self.submission || state.snapshot.phase != Phase::Submitting {
            return;
        }

        warn!("Submission dropped before the server answered");
        state.submission += 1;
        self.shared.fail(
            &mut state,
            JobFailure::new(FailureKind::Transport, SUBMISSION_INTERRUPTED),
        );
    }
}

/// Local checks run before an upload is sent
fn validate_upload(
    config: &ControllerConfig,
    upload: Option<Upload>,
) -> std::result::Result<Upload, String> {
    let Some(upload) = upload else {
        return Err("No file selected".to_string());
    };

    if upload.file_name.trim().is_empty() {
        return Err("No file selected".to_string());
    }

    let allowed = upload
        .extension()
        .is_some_and(|ext| config.allows_extension(&ext));
    if !allowed {
        return Err("Only PDF files are allowed".to_string());
    }

    if upload.is_empty() {
        return Err(format!("{} is empty", upload.file_name));
    }

    if upload.len() > config.max_upload_bytes {
        return Err(format!(
            "{} is {} bytes; the limit is {} bytes",
            upload.file_name,
            upload.len(),
            config.max_upload_bytes
        ));
    }

    Ok(upload)
}

/// Maps a client error to the failure shown to the user
///
/// `fallback` is used when the server rejected the request without saying why.
fn failure_from_client_error(err: &ClientError, fallback: &str) -> JobFailure {
    match err {
        ClientError::Transport(_) => JobFailure::new(FailureKind::Transport, CONNECTION_FAILED),
        ClientError::InvalidRequest(message) => {
            JobFailure::new(FailureKind::Transport, message.clone())
        }
        ClientError::Api { .. } => JobFailure::new(
            FailureKind::Server,
            err.server_message().unwrap_or(fallback),
        ),
        ClientError::Parse(_) => JobFailure::new(FailureKind::Server, MALFORMED_RESPONSE),
    }
}

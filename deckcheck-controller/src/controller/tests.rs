use super::*;
use async_trait::async_trait;
use deckcheck_core::domain::job::ReportLinks;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::{Duration, Instant, sleep};

// =============================================================================
// Test doubles
// =============================================================================

/// Analysis API answering from scripted queues
struct ScriptedApi {
    creates: Mutex<VecDeque<deckcheck_client::Result<JobId>>>,
    create_delay: Duration,
    polls: Mutex<VecDeque<deckcheck_client::Result<StatusResponse>>>,
    poll_delay: Duration,
    create_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    polled: Mutex<Vec<JobId>>,
}

impl ScriptedApi {
    fn new(polls: Vec<deckcheck_client::Result<StatusResponse>>) -> Self {
        Self {
            creates: Mutex::new(VecDeque::new()),
            create_delay: Duration::ZERO,
            polls: Mutex::new(polls.into()),
            poll_delay: Duration::ZERO,
            create_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            polled: Mutex::new(Vec::new()),
        }
    }

    fn with_creates(self, creates: Vec<deckcheck_client::Result<JobId>>) -> Self {
        *self.creates.lock().unwrap() = creates.into();
        self
    }

    fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    fn polled(&self) -> Vec<JobId> {
        self.polled.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisApi for ScriptedApi {
    async fn create_job(&self, _upload: Upload) -> deckcheck_client::Result<JobId> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if !self.create_delay.is_zero() {
            sleep(self.create_delay).await;
        }

        self.creates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(JobId::new("abc")))
    }

    async fn get_status(&self, job_id: &JobId) -> deckcheck_client::Result<StatusResponse> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.polled.lock().unwrap().push(job_id.clone());

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        if !self.poll_delay.is_zero() {
            sleep(self.poll_delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StatusResponse::in_progress(0, "Waiting")))
    }

    fn report_links(&self, job_id: &JobId) -> ReportLinks {
        ReportLinks {
            download: format!("/download/{}", job_id),
            view: format!("/view/{}", job_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    SubmitEnabled(bool),
    Submitting(String),
    Progress(u8, String),
    Completed(AnalysisResult, ReportLinks),
    Failed(String),
    Cleared,
}

/// View recording every call in order
#[derive(Default)]
struct RecordingView {
    events: Mutex<Vec<Event>>,
}

impl RecordingView {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|&event| matches(event)).count()
    }

    fn progress_values(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Progress(progress, _) => Some(progress),
                _ => None,
            })
            .collect()
    }

    fn last_submit_enabled(&self) -> Option<bool> {
        self.events().into_iter().rev().find_map(|event| match event {
            Event::SubmitEnabled(enabled) => Some(enabled),
            _ => None,
        })
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl View for RecordingView {
    fn set_submit_enabled(&self, enabled: bool) {
        self.push(Event::SubmitEnabled(enabled));
    }

    fn show_submitting(&self, file_name: &str) {
        self.push(Event::Submitting(file_name.to_string()));
    }

    fn show_progress(&self, progress: u8, message: &str) {
        self.push(Event::Progress(progress, message.to_string()));
    }

    fn show_completed(&self, result: &AnalysisResult, links: &ReportLinks) {
        self.push(Event::Completed(result.clone(), links.clone()));
    }

    fn show_failed(&self, message: &str) {
        self.push(Event::Failed(message.to_string()));
    }

    fn clear(&self) {
        self.push(Event::Cleared);
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn setup(api: ScriptedApi) -> (JobController, Arc<ScriptedApi>, Arc<RecordingView>) {
    setup_with_config(ControllerConfig::default(), api)
}

fn setup_with_config(
    config: ControllerConfig,
    api: ScriptedApi,
) -> (JobController, Arc<ScriptedApi>, Arc<RecordingView>) {
    let api = Arc::new(api);
    let view = Arc::new(RecordingView::default());
    let controller = JobController::new(config, api.clone(), view.clone());
    (controller, api, view)
}

fn deck() -> Upload {
    Upload::new("deck.pdf", b"%PDF-1.4 pitch deck".to_vec())
}

/// The server marks a job completed a moment before it stores the result
fn completed_without_result() -> StatusResponse {
    let mut response = StatusResponse::completed(acme());
    response.result = None;
    response
}

fn acme() -> AnalysisResult {
    AnalysisResult {
        company_name: "Acme".to_string(),
        verification_score: 0.87,
        num_claims: 12,
        num_questions: 5,
        email_sent: true,
        email_error: None,
        extra: BTreeMap::new(),
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_submit_poll_until_completed() {
    let (controller, api, view) = setup(ScriptedApi::new(vec![
        Ok(StatusResponse::in_progress(40, "Extracting claims")),
        Ok(StatusResponse::completed(acme())),
    ]));
    let start = Instant::now();

    let job_id = controller.submit(Some(deck())).await.unwrap();
    assert_eq!(job_id, JobId::new("abc"));
    assert_eq!(controller.phase(), Phase::Polling);
    assert!(controller.is_timer_active());

    let snapshot = controller.wait_for_terminal().await;
    assert_eq!(snapshot.phase, Phase::Completed);
    assert_eq!(snapshot.result(), Some(&acme()));
    assert!(snapshot.error.is_none());
    assert!(!controller.is_timer_active());

    // Two polls, one interval apart, the first one interval after submission
    assert_eq!(api.poll_calls(), 2);
    assert!(start.elapsed() >= Duration::from_secs(4));
    assert!(start.elapsed() < Duration::from_secs(5));

    assert!(
        view.events()
            .contains(&Event::Progress(40, "Extracting claims".to_string()))
    );
    assert_eq!(
        view.count(|e| matches!(e, Event::Completed(..))),
        1,
        "completion is rendered exactly once"
    );
    assert!(view.events().contains(&Event::Completed(
        acme(),
        ReportLinks {
            download: "/download/abc".to_string(),
            view: "/view/abc".to_string(),
        }
    )));
    assert_eq!(view.last_submit_enabled(), Some(true));

    // No orphaned timer keeps polling
    sleep(Duration::from_secs(10)).await;
    assert_eq!(api.poll_calls(), 2);
    assert_eq!(controller.phase(), Phase::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_create_job_server_error() {
    let api = ScriptedApi::new(vec![]).with_creates(vec![Err(ClientError::api_error(
        500,
        Some("disk full".to_string()),
    ))]);
    let (controller, api, view) = setup(api);

    let err = controller.submit(Some(deck())).await.unwrap_err();
    assert_eq!(err, ControllerError::Server("disk full".to_string()));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Failed);
    assert_eq!(
        snapshot.error,
        Some(JobFailure::new(FailureKind::Server, "disk full"))
    );
    assert!(snapshot.job.is_none());
    assert!(!controller.is_timer_active());

    sleep(Duration::from_secs(10)).await;
    assert_eq!(api.poll_calls(), 0, "polling never started");
    assert_eq!(view.count(|e| *e == Event::Failed("disk full".to_string())), 1);
    assert_eq!(view.last_submit_enabled(), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_create_job_error_without_message_uses_fallback() {
    let api =
        ScriptedApi::new(vec![]).with_creates(vec![Err(ClientError::api_error(413, None))]);
    let (controller, _api, _view) = setup(api);

    let err = controller.submit(Some(deck())).await.unwrap_err();
    assert_eq!(err, ControllerError::Server(UPLOAD_FAILED.to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_create_job_malformed_body() {
    let api = ScriptedApi::new(vec![])
        .with_creates(vec![Err(ClientError::Parse("missing field `job_id`".to_string()))]);
    let (controller, _api, _view) = setup(api);

    let err = controller.submit(Some(deck())).await.unwrap_err();
    assert_eq!(err, ControllerError::Server(MALFORMED_RESPONSE.to_string()));
    assert_eq!(controller.phase(), Phase::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_poll_transport_failure() {
    let (controller, api, view) = setup(ScriptedApi::new(vec![Err(ClientError::Transport(
        "connection reset".to_string(),
    ))]));

    controller.submit(Some(deck())).await.unwrap();
    let snapshot = controller.wait_for_terminal().await;

    assert_eq!(snapshot.phase, Phase::Failed);
    let error = snapshot.error.unwrap();
    assert_eq!(error.kind, FailureKind::Transport);
    assert_eq!(error.message, CONNECTION_FAILED);
    assert!(!controller.is_timer_active());

    sleep(Duration::from_secs(10)).await;
    assert_eq!(api.poll_calls(), 1);
    assert_eq!(view.count(|e| matches!(e, Event::Failed(_))), 1);
    assert_eq!(view.last_submit_enabled(), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_poll_reports_error_status() {
    let (controller, api, view) = setup(ScriptedApi::new(vec![
        Ok(StatusResponse::in_progress(20, "Analyzing pitch deck...")),
        Ok(StatusResponse::failed("PDF contains no text")),
    ]));

    controller.submit(Some(deck())).await.unwrap();
    let snapshot = controller.wait_for_terminal().await;

    assert_eq!(snapshot.phase, Phase::Failed);
    assert_eq!(
        snapshot.error,
        Some(JobFailure::new(FailureKind::Server, "PDF contains no text"))
    );
    // The job record survives so its id can still be shown
    assert_eq!(snapshot.job_id(), Some(&JobId::new("abc")));
    assert!(snapshot.job.unwrap().finished_at.is_some());

    sleep(Duration::from_secs(10)).await;
    assert_eq!(api.poll_calls(), 2);
    assert_eq!(view.count(|e| matches!(e, Event::Failed(_))), 1);
}

#[tokio::test(start_paused = true)]
async fn test_error_status_without_message_uses_fallback() {
    let mut response = StatusResponse::failed("");
    response.error = None;
    let (controller, _api, _view) = setup(ScriptedApi::new(vec![Ok(response)]));

    controller.submit(Some(deck())).await.unwrap();
    let snapshot = controller.wait_for_terminal().await;

    assert_eq!(snapshot.error.unwrap().message, ANALYSIS_FAILED);
}

#[tokio::test(start_paused = true)]
async fn test_completed_before_result_is_stored_keeps_polling() {
    let (controller, api, view) = setup(ScriptedApi::new(vec![
        Ok(StatusResponse::in_progress(80, "Generating report...")),
        Ok(completed_without_result()),
        Ok(StatusResponse::completed(acme())),
    ]));

    controller.submit(Some(deck())).await.unwrap();
    let snapshot = controller.wait_for_terminal().await;

    assert_eq!(snapshot.phase, Phase::Completed);
    assert_eq!(snapshot.result(), Some(&acme()));
    assert!(snapshot.error.is_none());
    assert_eq!(api.poll_calls(), 3);
    assert_eq!(view.progress_values(), vec![0, 80, 100]);
    assert_eq!(view.count(|e| matches!(e, Event::Failed(_))), 0);
    assert_eq!(view.count(|e| matches!(e, Event::Completed(..))), 1);
}

#[tokio::test(start_paused = true)]
async fn test_completed_without_result_eventually_fails() {
    let polls = (0..=MAX_RESULTLESS_COMPLETIONS)
        .map(|_| Ok(completed_without_result()))
        .collect();
    let (controller, api, view) = setup(ScriptedApi::new(polls));

    controller.submit(Some(deck())).await.unwrap();
    let snapshot = controller.wait_for_terminal().await;

    assert_eq!(snapshot.phase, Phase::Failed);
    assert_eq!(snapshot.error.unwrap().message, MISSING_RESULT);
    assert_eq!(api.poll_calls(), MAX_RESULTLESS_COMPLETIONS as usize + 1);
    assert_eq!(view.count(|e| matches!(e, Event::Completed(..))), 0);
    assert!(!controller.is_timer_active());
}

#[tokio::test(start_paused = true)]
async fn test_poll_not_found_uses_server_message() {
    let (controller, _api, _view) = setup(ScriptedApi::new(vec![Err(ClientError::api_error(
        404,
        Some("Job not found".to_string()),
    ))]));

    controller.submit(Some(deck())).await.unwrap();
    let snapshot = controller.wait_for_terminal().await;

    assert_eq!(
        snapshot.error,
        Some(JobFailure::new(FailureKind::Server, "Job not found"))
    );
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_submit_without_file_never_hits_the_network() {
    let (controller, api, view) = setup(ScriptedApi::new(vec![]));

    let err = controller.submit(None).await.unwrap_err();
    assert_eq!(err, ControllerError::Validation("No file selected".to_string()));
    assert_eq!(api.create_calls(), 0);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Failed);
    assert_eq!(snapshot.error.unwrap().kind, FailureKind::Validation);
    assert_eq!(view.count(|e| matches!(e, Event::Submitting(_))), 0);
    assert_eq!(view.last_submit_enabled(), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_submit_rejects_non_pdf() {
    let (controller, api, _view) = setup(ScriptedApi::new(vec![]));

    let err = controller
        .submit(Some(Upload::new("deck.pptx", vec![1, 2, 3])))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ControllerError::Validation("Only PDF files are allowed".to_string())
    );
    assert_eq!(api.create_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_submit_rejects_empty_and_oversized_files() {
    let config = ControllerConfig {
        max_upload_bytes: 4,
        ..ControllerConfig::default()
    };
    let (controller, api, _view) = setup_with_config(config, ScriptedApi::new(vec![]));

    let err = controller
        .submit(Some(Upload::new("deck.pdf", Vec::new())))
        .await
        .unwrap_err();
    assert!(matches!(err, ControllerError::Validation(_)));

    let err = controller.submit(Some(deck())).await.unwrap_err();
    assert!(matches!(err, ControllerError::Validation(_)));

    assert_eq!(api.create_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_validation_failure_stops_running_job() {
    let (controller, api, _view) = setup(ScriptedApi::new(vec![]));

    controller.submit(Some(deck())).await.unwrap();
    assert!(controller.is_timer_active());

    controller.submit(None).await.unwrap_err();
    assert!(!controller.is_timer_active());
    assert!(controller.snapshot().job.is_none());

    sleep(Duration::from_secs(10)).await;
    assert_eq!(api.poll_calls(), 0);
}

// =============================================================================
// Progress
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_progress_never_decreases() {
    let (controller, _api, view) = setup(ScriptedApi::new(vec![
        Ok(StatusResponse::in_progress(40, "Extracting claims")),
        Ok(StatusResponse::in_progress(30, "Searching the web")),
        Ok(StatusResponse::in_progress(150, "Generating report...")),
        Ok(StatusResponse::completed(acme())),
    ]));

    controller.submit(Some(deck())).await.unwrap();
    controller.wait_for_terminal().await;

    assert_eq!(view.progress_values(), vec![0, 40, 40, 100]);
    assert!(
        view.events()
            .contains(&Event::Progress(40, "Searching the web".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_progress_keeps_previous_values() {
    let mut bare = StatusResponse::in_progress(0, "");
    bare.progress = None;
    bare.message = None;
    let (controller, _api, _view) = setup(ScriptedApi::new(vec![
        Ok(StatusResponse::in_progress(60, "Verifying claims")),
        Ok(bare),
    ]));

    controller.submit(Some(deck())).await.unwrap();
    sleep(Duration::from_millis(4500)).await;

    let job = controller.snapshot().job.unwrap();
    assert_eq!(job.progress, 60);
    assert_eq!(job.message, "Verifying claims");
}

// =============================================================================
// Timer, cancellation and reset
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_polls_never_overlap() {
    let api = ScriptedApi::new(vec![]).with_poll_delay(Duration::from_secs(5));
    let (controller, api, _view) = setup(api);

    controller.submit(Some(deck())).await.unwrap();
    sleep(Duration::from_secs(20)).await;

    assert_eq!(api.max_in_flight.load(Ordering::SeqCst), 1);
    let calls = api.poll_calls();
    assert!((2..=4).contains(&calls), "unexpected poll count {}", calls);
    assert_eq!(controller.phase(), Phase::Polling);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_timer_and_keeps_job() {
    let (controller, api, _view) = setup(ScriptedApi::new(vec![Ok(
        StatusResponse::in_progress(40, "Extracting claims"),
    )]));

    controller.submit(Some(deck())).await.unwrap();
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(api.poll_calls(), 1);

    assert!(controller.cancel());
    assert!(!controller.is_timer_active());

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Polling);
    assert_eq!(snapshot.job.as_ref().unwrap().progress, 40);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(api.poll_calls(), 1);
    assert!(!controller.cancel());
}

#[tokio::test(start_paused = true)]
async fn test_reset_discards_in_flight_poll() {
    let api = ScriptedApi::new(vec![Ok(StatusResponse::completed(acme()))])
        .with_poll_delay(Duration::from_secs(5));
    let (controller, api, view) = setup(api);

    controller.submit(Some(deck())).await.unwrap();
    // First poll goes out at 2s and answers at 7s
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(api.poll_calls(), 1);

    controller.reset();
    sleep(Duration::from_secs(10)).await;

    assert_eq!(controller.snapshot(), JobSnapshot::default());
    assert_eq!(view.count(|e| matches!(e, Event::Completed(..))), 0);
    assert_eq!(api.poll_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_discards_in_flight_poll() {
    let api = ScriptedApi::new(vec![Ok(StatusResponse::failed("boom"))])
        .with_poll_delay(Duration::from_secs(5));
    let (controller, _api, view) = setup(api);

    controller.submit(Some(deck())).await.unwrap();
    sleep(Duration::from_millis(2500)).await;

    controller.cancel();
    sleep(Duration::from_secs(10)).await;

    assert_eq!(controller.phase(), Phase::Polling);
    assert_eq!(view.count(|e| matches!(e, Event::Failed(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reset_is_idempotent() {
    let (controller, _api, view) = setup(ScriptedApi::new(vec![Ok(
        StatusResponse::in_progress(40, "Extracting claims"),
    )]));

    // Resetting an idle controller is a no-op
    controller.reset();
    assert!(view.events().is_empty());

    controller.submit(Some(deck())).await.unwrap();
    sleep(Duration::from_millis(2500)).await;

    controller.reset();
    let first = controller.snapshot();
    controller.reset();
    let second = controller.snapshot();

    assert_eq!(first, JobSnapshot::default());
    assert_eq!(first, second);
    assert!(!controller.is_timer_active());
    assert_eq!(view.count(|e| *e == Event::Cleared), 1);
    assert_eq!(view.last_submit_enabled(), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_reset_from_terminal_phases() {
    let api = ScriptedApi::new(vec![]).with_creates(vec![Err(ClientError::api_error(
        500,
        Some("disk full".to_string()),
    ))]);
    let (controller, _api, _view) = setup(api);

    controller.submit(Some(deck())).await.unwrap_err();
    assert_eq!(controller.phase(), Phase::Failed);

    controller.reset();
    assert_eq!(controller.snapshot(), JobSnapshot::default());
    controller.reset();
    assert_eq!(controller.snapshot(), JobSnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn test_new_submission_replaces_running_job() {
    let api = ScriptedApi::new(vec![Ok(StatusResponse::in_progress(40, "Extracting claims"))])
        .with_creates(vec![Ok(JobId::new("first")), Ok(JobId::new("second"))]);
    let (controller, api, _view) = setup(api);

    controller.submit(Some(deck())).await.unwrap();
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(controller.snapshot().job.unwrap().progress, 40);

    let second = controller.submit(Some(deck())).await.unwrap();
    assert_eq!(second, JobId::new("second"));

    let job = controller.snapshot().job.unwrap();
    assert_eq!(job.id, JobId::new("second"));
    assert_eq!(job.progress, 0);

    sleep(Duration::from_secs(5)).await;
    let polled = api.polled();
    assert_eq!(polled[0], JobId::new("first"));
    assert!(polled[1..].iter().all(|id| *id == JobId::new("second")));
    assert!(polled.len() >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_reset_during_submission_supersedes_it() {
    let api = ScriptedApi::new(vec![]).with_create_delay(Duration::from_secs(1));
    let (controller, api, _view) = setup(api);

    let (outcome, _) = tokio::join!(controller.submit(Some(deck())), async {
        sleep(Duration::from_millis(500)).await;
        assert_eq!(controller.phase(), Phase::Submitting);
        controller.reset();
    });

    assert_eq!(outcome, Err(ControllerError::Superseded));
    assert_eq!(controller.phase(), Phase::Idle);
    assert!(!controller.is_timer_active());

    sleep(Duration::from_secs(10)).await;
    assert_eq!(api.poll_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_submission_reenables_submit() {
    let api = ScriptedApi::new(vec![]).with_create_delay(Duration::from_secs(5));
    let (controller, api, view) = setup(api);

    let outcome = tokio::time::timeout(
        Duration::from_secs(1),
        controller.submit(Some(deck())),
    )
    .await;
    assert!(outcome.is_err(), "create-job outlasts the timeout");

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Failed);
    assert_eq!(
        snapshot.error,
        Some(JobFailure::new(FailureKind::Transport, SUBMISSION_INTERRUPTED))
    );
    assert_eq!(view.last_submit_enabled(), Some(true));
    assert_eq!(controller.wait_for_terminal().await.phase, Phase::Failed);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(controller.phase(), Phase::Failed);
    assert!(!controller.is_timer_active());
    assert_eq!(api.create_calls(), 1);
    assert_eq!(api.poll_calls(), 0);

    // The controller accepts the next submission
    controller.submit(Some(deck())).await.unwrap();
    assert_eq!(controller.phase(), Phase::Polling);
}

#[tokio::test(start_paused = true)]
async fn test_abandoning_a_superseded_submission_changes_nothing() {
    let api = ScriptedApi::new(vec![]).with_create_delay(Duration::from_secs(5));
    let (controller, _api, view) = setup(api);

    tokio::select! {
        _ = controller.submit(Some(deck())) => panic!("create-job should still be pending"),
        _ = async {
            sleep(Duration::from_secs(1)).await;
            controller.reset();
        } => {}
    }

    assert_eq!(controller.snapshot(), JobSnapshot::default());
    assert_eq!(view.count(|e| matches!(e, Event::Failed(_))), 0);
    assert_eq!(view.last_submit_enabled(), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_controller_stops_timer() {
    let (controller, api, _view) = setup(ScriptedApi::new(vec![]));

    controller.submit(Some(deck())).await.unwrap();
    drop(controller);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(api.poll_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_polling_existing_job() {
    let (controller, api, view) = setup(ScriptedApi::new(vec![Ok(StatusResponse::completed(
        acme(),
    ))]));

    controller.start_polling(JobId::new("existing"));
    assert_eq!(controller.phase(), Phase::Polling);
    assert_eq!(view.last_submit_enabled(), Some(false));

    let snapshot = controller.wait_for_terminal().await;
    assert_eq!(snapshot.phase, Phase::Completed);
    assert_eq!(api.polled(), vec![JobId::new("existing")]);
    assert_eq!(api.create_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_each_phase() {
    let (controller, _api, _view) = setup(ScriptedApi::new(vec![Ok(StatusResponse::completed(
        acme(),
    ))]));
    let mut snapshots = controller.subscribe();

    controller.submit(Some(deck())).await.unwrap();
    assert_eq!(snapshots.borrow_and_update().phase, Phase::Polling);

    snapshots.changed().await.unwrap();
    assert_eq!(snapshots.borrow_and_update().phase, Phase::Completed);
}

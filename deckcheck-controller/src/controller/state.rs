//! Mutable state behind the controller's lock

use deckcheck_core::domain::job::{JobId, JobSnapshot};

use super::timer::PollTimer;

pub(super) struct ControllerState {
    pub(super) snapshot: JobSnapshot,
    /// Bumped by every submit, reset and `start_polling`; a create-job
    /// response is applied only if its number is still current
    pub(super) submission: u64,
    pub(super) timer: Option<PollTimer>,
    /// `completed` responses in a row that carried no result
    pub(super) resultless_completions: u32,
    next_token: u64,
}

impl ControllerState {
    pub(super) fn new() -> Self {
        Self {
            snapshot: JobSnapshot::default(),
            submission: 0,
            timer: None,
            resultless_completions: 0,
            next_token: 0,
        }
    }

    pub(super) fn next_timer_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Stops the poll timer, returning whether one was running
    pub(super) fn cancel_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                timer.stop();
                true
            }
            None => false,
        }
    }

    /// Whether a poll issued by timer `token` for `job_id` may still be applied
    pub(super) fn polls_job(&self, token: u64, job_id: &JobId) -> bool {
        let timer_current = self
            .timer
            .as_ref()
            .is_some_and(|timer| timer.token() == token);

        timer_current && self.snapshot.job_id() == Some(job_id)
    }
}

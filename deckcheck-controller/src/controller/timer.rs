//! Poll timer
//!
//! A spawned task ticking at the poll interval. Each tick issues one status
//! request and waits for it before waiting for the next tick, so a job never
//! has two polls in flight. A request outlasting the interval is followed
//! directly by the next poll; further missed ticks are dropped.

use deckcheck_core::domain::job::JobId;
use std::sync::Weak;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::debug;

use super::Shared;

pub(super) struct PollTimer {
    token: u64,
    handle: JoinHandle<()>,
}

impl PollTimer {
    /// Spawns the timer task; the first poll happens one interval from now
    pub(super) fn start(shared: Weak<Shared>, token: u64, job_id: JobId, period: Duration) -> Self {
        let handle = tokio::spawn(run(shared, token, job_id, period));
        Self { token, handle }
    }

    pub(super) fn token(&self) -> u64 {
        self.token
    }

    pub(super) fn stop(self) {
        self.handle.abort();
    }
}

async fn run(shared: Weak<Shared>, token: u64, job_id: JobId, period: Duration) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let Some(shared) = shared.upgrade() else {
            break;
        };

        if !shared.timer_active(token) {
            break;
        }

        debug!("Polling status of job {}", job_id);
        let outcome = shared.api.get_status(&job_id).await;

        if !shared.apply_poll(token, &job_id, outcome) {
            break;
        }
    }

    debug!("Poll timer for job {} finished", job_id);
}

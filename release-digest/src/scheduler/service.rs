//! In-process job scheduler.
//!
//! The Scheduler owns at most one recurring job and at most one pending
//! one-shot job. Each job runs on its own tokio task; the scheduler's
//! bookkeeping happens under a short synchronous lock and never waits on a
//! job body.
//!
//! Replacing a job cancels the old task and registers the new one while the
//! lock is held, so no observer ever sees two recurring jobs. Replaced tasks
//! are retired rather than forgotten so that [`Scheduler::stop`] can wait for
//! every task it ever spawned.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::schedule::{DailySchedule, ScheduleZone};
use super::task::{JobHandle, JobInfo, JobKind, ScheduledJob};

/// How long `stop` waits for a running job before aborting it.
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Snapshot of the scheduler's active jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    pub recurring: Option<JobInfo>,
    pub one_shot: Option<JobInfo>,
}

impl SchedulerSnapshot {
    pub fn job_count(&self) -> usize {
        usize::from(self.recurring.is_some()) + usize::from(self.one_shot.is_some())
    }
}

#[derive(Default)]
struct SchedulerState {
    recurring: Option<JobHandle>,
    one_shot: Option<JobHandle>,
    /// Cancelled tasks that may still be finishing a run.
    retired: Vec<JobHandle>,
}

impl SchedulerState {
    fn retire(&mut self, handle: Option<JobHandle>) -> bool {
        let Some(handle) = handle else {
            return false;
        };
        let was_active = handle.is_active();
        handle.cancel();
        self.retired.retain(|h| !h.is_finished());
        self.retired.push(handle);
        was_active
    }
}

/// The Scheduler.
pub struct Scheduler {
    state: Mutex<SchedulerState>,
    shutdown_grace: Duration,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_shutdown_grace(DEFAULT_SHUTDOWN_GRACE)
    }

    pub fn with_shutdown_grace(shutdown_grace: Duration) -> Self {
        Self {
            state: Mutex::new(SchedulerState::default()),
            shutdown_grace,
        }
    }

    /// Run `job` every day per `schedule`, replacing any existing recurring job.
    ///
    /// Returns the new job's id.
    pub fn schedule_daily(
        &self,
        schedule: DailySchedule,
        zone: ScheduleZone,
        job: Arc<dyn ScheduledJob>,
    ) -> String {
        let mut state = self.state.lock();

        let replaced = state.recurring.take();
        let replaced_active = state.retire(replaced);

        let token = CancellationToken::new();
        let next_run = Arc::new(Mutex::new(None));
        let name = job.name().to_string();
        let join = tokio::spawn(run_recurring(
            job,
            schedule,
            zone,
            token.clone(),
            next_run.clone(),
        ));
        let handle = JobHandle::new(name, JobKind::Recurring(schedule), next_run, token, join);
        let id = handle.id.clone();

        info!(
            job = %handle.name,
            id = %id,
            schedule = %schedule,
            zone = %zone,
            replaced = replaced_active,
            "Recurring job scheduled"
        );
        state.recurring = Some(handle);
        id
    }

    /// Run `job` once after `delay`, replacing any pending one-shot job.
    pub fn schedule_once(&self, delay: Duration, job: Arc<dyn ScheduledJob>) -> String {
        let mut state = self.state.lock();

        let replaced = state.one_shot.take();
        let replaced_active = state.retire(replaced);

        let token = CancellationToken::new();
        let run_at = Utc::now() + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::zero());
        let next_run = Arc::new(Mutex::new(Some(run_at)));
        let name = job.name().to_string();
        let join = tokio::spawn(run_once(job, delay, token.clone(), next_run.clone()));
        let handle = JobHandle::new(name, JobKind::OneShot, next_run, token, join);
        let id = handle.id.clone();

        info!(
            job = %handle.name,
            id = %id,
            delay_ms = delay.as_millis() as u64,
            replaced = replaced_active,
            "One-shot job scheduled"
        );
        state.one_shot = Some(handle);
        id
    }

    /// Cancel the recurring job. Returns `true` if one was active.
    pub fn cancel_recurring(&self) -> bool {
        let mut state = self.state.lock();
        let handle = state.recurring.take();
        state.retire(handle)
    }

    /// Cancel the pending one-shot job. Returns `true` if one was pending.
    pub fn cancel_one_shot(&self) -> bool {
        let mut state = self.state.lock();
        let handle = state.one_shot.take();
        state.retire(handle)
    }

    /// Active jobs. Fired one-shot jobs and cancelled jobs are not listed.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let state = self.state.lock();
        SchedulerSnapshot {
            recurring: state
                .recurring
                .as_ref()
                .filter(|h| h.is_active())
                .map(JobHandle::info),
            one_shot: state
                .one_shot
                .as_ref()
                .filter(|h| h.is_active())
                .map(JobHandle::info),
        }
    }

    /// Cancel every job and wait for all scheduler tasks to exit.
    ///
    /// No job fires after this returns. The scheduler can be reused afterwards.
    pub async fn stop(&self) {
        let handles: Vec<JobHandle> = {
            let mut state = self.state.lock();
            let mut handles: Vec<JobHandle> = state.retired.drain(..).collect();
            handles.extend(state.recurring.take());
            handles.extend(state.one_shot.take());
            handles
        };

        if handles.is_empty() {
            return;
        }

        for handle in &handles {
            handle.cancel();
        }

        let count = handles.len();
        shutdown_all(handles, self.shutdown_grace).await;
        info!(tasks = count, "Scheduler stopped");
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for handle in state
            .retired
            .iter()
            .chain(state.recurring.iter())
            .chain(state.one_shot.iter())
        {
            handle.cancel();
        }
    }
}

async fn shutdown_all(handles: Vec<JobHandle>, grace: Duration) {
    let mut set = tokio::task::JoinSet::new();
    for handle in handles {
        set.spawn(handle.shutdown(grace));
    }
    while set.join_next().await.is_some() {}
}

async fn run_recurring(
    job: Arc<dyn ScheduledJob>,
    schedule: DailySchedule,
    zone: ScheduleZone,
    token: CancellationToken,
    next_run: Arc<Mutex<Option<DateTime<Utc>>>>,
) {
    let mut last_fire: Option<DateTime<Utc>> = None;

    loop {
        let now = Utc::now();
        // Never fire the same slot twice, even if the wall clock lags the timer
        let after = match last_fire {
            Some(last) if last > now => last,
            _ => now,
        };
        let fire_at = zone.next_fire(&schedule, after);
        *next_run.lock() = Some(fire_at);

        let wait = (fire_at - now).to_std().unwrap_or(Duration::ZERO);
        debug!(job = job.name(), fire_at = %fire_at, wait_secs = wait.as_secs(), "Waiting for next run");

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }

        last_fire = Some(fire_at);
        info!(job = job.name(), "Running recurring job");
        job.run().await;
    }

    debug!(job = job.name(), "Recurring task exited");
}

async fn run_once(
    job: Arc<dyn ScheduledJob>,
    delay: Duration,
    token: CancellationToken,
    next_run: Arc<Mutex<Option<DateTime<Utc>>>>,
) {
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!(job = job.name(), "One-shot job cancelled before firing");
            return;
        }
        _ = tokio::time::sleep(delay) => {}
    }

    *next_run.lock() = None;
    info!(job = job.name(), "Running one-shot job");
    job.run().await;
}

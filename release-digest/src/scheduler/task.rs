//! Scheduled job definitions and task handles.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::schedule::DailySchedule;

/// Work run by the scheduler.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Execute one run. Failures are the job's own concern.
    async fn run(&self);
}

/// Kind of scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Fires every day at a fixed hour.
    Recurring(DailySchedule),
    /// Fires once after a delay.
    OneShot,
}

/// Public view of a scheduled task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub id: String,
    pub name: String,
    pub kind: JobKind,
    /// When the task fires next, once known.
    pub next_run: Option<DateTime<Utc>>,
}

/// A handle to a spawned scheduler task.
#[derive(Debug)]
pub struct JobHandle {
    /// Unique task identifier.
    pub id: String,
    pub name: String,
    pub kind: JobKind,
    /// When the task was created.
    pub created_at: Instant,
    next_run: Arc<Mutex<Option<DateTime<Utc>>>>,
    cancellation_token: CancellationToken,
    join: JoinHandle<()>,
}

impl JobHandle {
    pub(super) fn new(
        name: impl Into<String>,
        kind: JobKind,
        next_run: Arc<Mutex<Option<DateTime<Utc>>>>,
        cancellation_token: CancellationToken,
        join: JoinHandle<()>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            created_at: Instant::now(),
            next_run,
            cancellation_token,
            join,
        }
    }

    /// Cancel this task. A run already in progress is not interrupted.
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Active means neither cancelled nor finished.
    pub fn is_active(&self) -> bool {
        !self.is_cancelled() && !self.is_finished()
    }

    pub fn info(&self) -> JobInfo {
        JobInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            next_run: *self.next_run.lock(),
        }
    }

    /// Cancel and wait for the task to exit.
    ///
    /// A run that does not finish within `grace` is aborted.
    pub async fn shutdown(self, grace: Duration) {
        self.cancel();
        let JobHandle { id, name, join, .. } = self;
        let abort = join.abort_handle();

        match tokio::time::timeout(grace, join).await {
            Ok(Ok(())) => debug!(job = %name, id = %id, "Scheduled task exited"),
            Ok(Err(e)) if e.is_cancelled() => debug!(job = %name, id = %id, "Scheduled task aborted"),
            Ok(Err(e)) => warn!(job = %name, id = %id, error = %e, "Scheduled task panicked"),
            Err(_) => {
                warn!(job = %name, id = %id, "Scheduled task did not stop in time, aborting");
                abort.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_handle_cancel_and_shutdown() {
        let token = CancellationToken::new();
        let child = token.clone();
        let join = tokio::spawn(async move { child.cancelled().await });
        let handle = JobHandle::new(
            "test",
            JobKind::OneShot,
            Arc::new(Mutex::new(None)),
            token,
            join,
        );

        assert!(handle.is_active());
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(!handle.is_active());
        handle.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_stuck_task() {
        let join = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        let handle = JobHandle::new(
            "stuck",
            JobKind::OneShot,
            Arc::new(Mutex::new(None)),
            CancellationToken::new(),
            join,
        );
        let abort_probe = handle.join.abort_handle();

        handle.shutdown(Duration::from_millis(10)).await;
        for _ in 0..10 {
            if abort_probe.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(abort_probe.is_finished());
    }

    #[test]
    fn test_job_kind_equality() {
        let schedule = DailySchedule::at_hour(9).unwrap();
        assert_eq!(JobKind::Recurring(schedule), JobKind::Recurring(schedule));
        assert_ne!(JobKind::Recurring(schedule), JobKind::OneShot);
    }
}

//! Daily and one-shot job scheduling.

mod schedule;
mod service;
mod task;

pub use schedule::{DailySchedule, ScheduleError, ScheduleZone};
pub use service::{Scheduler, SchedulerSnapshot};
pub use task::{JobHandle, JobInfo, JobKind, ScheduledJob};

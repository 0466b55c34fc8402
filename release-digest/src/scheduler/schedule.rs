//! Typed schedule descriptions.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Error type for schedule validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("hour of day '{0}' is not a number")]
    NotNumeric(String),

    #[error("hour of day {0} is outside 0-23")]
    OutOfRange(i64),

    #[error("'{0}' is not a valid IANA timezone")]
    InvalidTimezone(String),
}

/// Fires once a day at minute 0 of `hour`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DailySchedule {
    hour: u32,
}

impl DailySchedule {
    pub fn at_hour(hour: i64) -> Result<Self, ScheduleError> {
        if !(0..=23).contains(&hour) {
            return Err(ScheduleError::OutOfRange(hour));
        }
        Ok(Self { hour: hour as u32 })
    }

    /// Parse a user-supplied hour such as `"9"` or `" 21 "`.
    pub fn parse(raw: &str) -> Result<Self, ScheduleError> {
        let trimmed = raw.trim();
        let hour: i64 = trimmed
            .parse()
            .map_err(|_| ScheduleError::NotNumeric(trimmed.to_string()))?;
        Self::at_hour(hour)
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// First firing strictly after `after`, in `after`'s timezone.
    ///
    /// When the hour does not exist on a day (DST gap) the firing moves to the
    /// next existing hour of that day.
    pub fn next_after<T: TimeZone>(&self, after: &DateTime<T>) -> DateTime<T> {
        let tz = after.timezone();
        let mut date = after.date_naive();

        loop {
            if let Some(candidate) = self.on_date(&tz, date)
                && candidate > *after
            {
                return candidate;
            }
            date = date.succ_opt().unwrap_or(date + Duration::days(1));
        }
    }

    fn on_date<T: TimeZone>(&self, tz: &T, date: NaiveDate) -> Option<DateTime<T>> {
        let naive = date.and_hms_opt(self.hour, 0, 0)?;
        tz.from_local_datetime(&naive)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
    }
}

impl std::fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "daily at {:02}:00", self.hour)
    }
}

/// Timezone in which "today" and daily firing times are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleZone {
    /// The host's local timezone.
    #[default]
    Local,
    /// A named IANA timezone.
    Named(Tz),
}

impl ScheduleZone {
    /// Parse an optional IANA name; `None` or blank means the local zone.
    pub fn parse(name: Option<&str>) -> Result<Self, ScheduleError> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => Ok(Self::Local),
            Some(name) => name
                .parse::<Tz>()
                .map(Self::Named)
                .map_err(|_| ScheduleError::InvalidTimezone(name.to_string())),
        }
    }

    /// The calendar date at `now` in this zone.
    pub fn date_at(&self, now: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => now.with_timezone(&Local).date_naive(),
            Self::Named(tz) => now.with_timezone(tz).date_naive(),
        }
    }

    /// Today's date in this zone.
    pub fn today(&self) -> NaiveDate {
        self.date_at(Utc::now())
    }

    /// Next firing of `schedule` strictly after `after`.
    pub fn next_fire(&self, schedule: &DailySchedule, after: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Local => schedule
                .next_after(&after.with_timezone(&Local))
                .with_timezone(&Utc),
            Self::Named(tz) => schedule
                .next_after(&after.with_timezone(tz))
                .with_timezone(&Utc),
        }
    }
}

impl std::fmt::Display for ScheduleZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

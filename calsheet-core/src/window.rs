//! Sync window for filtering appointments and timesheets.

use std::fmt;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};

/// Half-open range of whole days: [begin 00:00, end 00:00) in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl SyncWindow {
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Self {
        SyncWindow { begin, end }
    }

    /// Build a window from command line dates. `end` defaults to tomorrow.
    pub fn from_args(begin: NaiveDate, end: Option<NaiveDate>) -> Self {
        SyncWindow {
            begin,
            end: end.unwrap_or_else(tomorrow),
        }
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.begin.and_time(NaiveTime::MIN).and_utc()
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.and_time(NaiveTime::MIN).and_utc()
    }

    /// An end date on or before the begin date selects nothing.
    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start_utc() <= instant && instant < self.end_utc()
    }

    /// Lower bound sent to Kimai when listing timesheets.
    pub fn query_begin(&self) -> String {
        format!("{}T00:00:01", self.begin.format("%Y-%m-%d"))
    }

    /// Upper bound sent to Kimai when listing timesheets.
    pub fn query_end(&self) -> String {
        format!("{}T23:59:59", self.end.format("%Y-%m-%d"))
    }
}

impl fmt::Display for SyncWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} and {}",
            self.begin.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

fn tomorrow() -> NaiveDate {
    Local::now().date_naive() + Duration::days(1)
}

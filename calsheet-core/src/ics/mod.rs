//! ICS parsing for the local calendar store.
//!
//! This module reads VEVENTs according to RFC 5545 and resolves their times
//! against a timezone.

mod parse;

pub use parse::parse_events;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::appointment::{BusyStatus, Sensitivity};

/// A DTSTART/DTEND/RECURRENCE-ID value as written in the file.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    /// Resolve to an instant. Floating times and TZIDs that aren't IANA names
    /// (desktop clients often write Windows zone names) use `fallback`.
    pub fn to_utc(&self, fallback: Tz) -> Option<DateTime<Utc>> {
        match self {
            EventTime::Date(d) => local_to_utc(&d.and_time(NaiveTime::MIN), fallback),
            EventTime::DateTimeUtc(dt) => Some(*dt),
            EventTime::DateTimeFloating(naive) => local_to_utc(naive, fallback),
            EventTime::DateTimeZoned { datetime, tzid } => {
                local_to_utc(datetime, resolve_tzid(tzid, fallback))
            }
        }
    }

    /// Stable key used to pair recurrence instances with their overrides.
    pub fn key(&self) -> String {
        match self {
            EventTime::Date(d) => d.format("%Y%m%d").to_string(),
            EventTime::DateTimeUtc(dt) => dt.format("%Y%m%dT%H%M%SZ").to_string(),
            EventTime::DateTimeFloating(dt) | EventTime::DateTimeZoned { datetime: dt, .. } => {
                dt.format("%Y%m%dT%H%M%S").to_string()
            }
        }
    }
}

/// Map a TZID to a chrono-tz zone, falling back when it isn't an IANA name.
pub fn resolve_tzid(tzid: &str, fallback: Tz) -> Tz {
    tzid.parse().unwrap_or(fallback)
}

/// Resolve a wall-clock time in `tz`.
///
/// Ambiguous times (fall back) take the first occurrence. Times inside a
/// spring-forward gap are read with the offset in effect before the gap, so
/// 02:30 on a 02:00 → 03:00 switch becomes 03:30 (RFC 5545, 3.3.5).
pub(crate) fn local_to_utc(naive: &NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.with_timezone(&Utc)),
        LocalResult::None => {
            let before = *naive - Duration::hours(3);
            let offset = tz.from_local_datetime(&before).earliest()?.offset().fix();
            debug!(time = %naive, zone = %tz.name(), "Local time falls in a DST gap");
            let utc = *naive - Duration::seconds(i64::from(offset.local_minus_utc()));
            Some(DateTime::from_naive_utc_and_offset(utc, Utc))
        }
    }
}

/// RRULE and EXDATEs of a recurring master event.
#[derive(Debug, Clone, PartialEq)]
pub struct Recurrence {
    pub rrule: String,
    pub exdates: Vec<EventTime>,
}

/// A VEVENT reduced to what appointments need.
#[derive(Debug, Clone, PartialEq)]
pub struct IcsEvent {
    pub uid: String,
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    pub cancelled: bool,
    pub busy_status: BusyStatus,
    pub sensitivity: Sensitivity,
    pub recurrence: Option<Recurrence>,
    /// Set on instance overrides of a recurring event
    pub recurrence_id: Option<EventTime>,
}

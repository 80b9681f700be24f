//! RRULE expansion for recurring appointments.
//!
//! Desktop calendars hand out every occurrence of a series as its own
//! appointment. ICS stores the series once, so masters are expanded into
//! instances within the sync window before filtering.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::error::{SyncError, SyncResult};
use crate::ics::{EventTime, IcsEvent, Recurrence, local_to_utc, resolve_tzid};

/// Upper bound on instances generated per series and window.
const MAX_INSTANCES: u16 = 1000;

/// Build an iCalendar-format RRULE string for the rrule crate parser.
///
/// Floating times and non-IANA TZIDs are pinned to `tz` so occurrences land
/// where the appointment shows up in the calendar client.
fn build_rrule_string(start: &EventTime, recurrence: &Recurrence, tz: Tz) -> String {
    let mut lines = vec![format_time_line("DTSTART", start, tz)];

    lines.push(format!("RRULE:{}", normalize_until(&recurrence.rrule, start, tz)));

    for exdate in &recurrence.exdates {
        lines.push(format_time_line("EXDATE", exdate, tz));
    }

    lines.join("\n")
}

/// Rewrite UNTIL so it agrees with the DTSTART written by `format_time_line`.
///
/// The rrule crate wants UNTIL in UTC whenever DTSTART is zoned or UTC, while
/// RFC 5545 files carry a DATE for all-day series and a floating time for
/// floating series. Values that don't parse are left alone.
fn normalize_until(rrule: &str, start: &EventTime, tz: Tz) -> String {
    rrule
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") => {
                let until = until_utc(value, start, tz).unwrap_or_else(|| value.to_string());
                format!("{}={}", key, until)
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn until_utc(value: &str, start: &EventTime, tz: Tz) -> Option<String> {
    if value.ends_with('Z') {
        return Some(value.to_string());
    }

    let naive = match NaiveDate::parse_from_str(value, "%Y%m%d") {
        // all-day DTSTART is midnight UTC, so the last day's instance sits at midnight too
        Ok(date) if matches!(start, EventTime::Date(_)) => date.and_time(NaiveTime::MIN),
        Ok(date) => date.and_hms_opt(23, 59, 59)?,
        Err(_) => NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?,
    };

    let utc = match start {
        EventTime::Date(_) | EventTime::DateTimeUtc(_) => naive.and_utc(),
        EventTime::DateTimeFloating(_) => local_to_utc(&naive, tz)?,
        EventTime::DateTimeZoned { tzid, .. } => local_to_utc(&naive, resolve_tzid(tzid, tz))?,
    };

    Some(utc.format("%Y%m%dT%H%M%SZ").to_string())
}

fn format_time_line(name: &str, time: &EventTime, tz: Tz) -> String {
    match time {
        // the rrule crate needs a datetime, so all-day dates become midnight UTC
        EventTime::Date(d) => format!("{}:{}T000000Z", name, d.format("%Y%m%d")),
        EventTime::DateTimeUtc(dt) => format!("{}:{}", name, dt.format("%Y%m%dT%H%M%SZ")),
        EventTime::DateTimeFloating(dt) => format!(
            "{};TZID={}:{}",
            name,
            tz.name(),
            dt.format("%Y%m%dT%H%M%S")
        ),
        EventTime::DateTimeZoned { datetime, tzid } => format!(
            "{};TZID={}:{}",
            name,
            resolve_tzid(tzid, tz).name(),
            datetime.format("%Y%m%dT%H%M%S")
        ),
    }
}

/// Convert an rrule occurrence back to an EventTime matching the master's variant.
fn occurrence_to_event_time(dt: &DateTime<rrule::Tz>, master_start: &EventTime) -> EventTime {
    match master_start {
        EventTime::Date(_) => EventTime::Date(dt.date_naive()),
        EventTime::DateTimeUtc(_) => EventTime::DateTimeUtc(dt.with_timezone(&Utc)),
        EventTime::DateTimeFloating(_) => EventTime::DateTimeFloating(dt.naive_local()),
        EventTime::DateTimeZoned { tzid, .. } => EventTime::DateTimeZoned {
            datetime: dt.naive_local(),
            tzid: tzid.clone(),
        },
    }
}

/// Shift the master's end by the same amount the occurrence moved its start.
fn instance_end(master: &IcsEvent, occurrence: &EventTime) -> EventTime {
    match (&master.start, &master.end, occurrence) {
        (EventTime::Date(start), EventTime::Date(end), EventTime::Date(occ)) => {
            EventTime::Date(*occ + (*end - *start))
        }
        (EventTime::DateTimeUtc(start), EventTime::DateTimeUtc(end), EventTime::DateTimeUtc(occ)) => {
            EventTime::DateTimeUtc(*occ + (*end - *start))
        }
        _ => {
            let duration = naive_duration(&master.start, &master.end);
            match occurrence {
                EventTime::Date(d) => EventTime::Date(*d + Duration::days(duration.num_days().max(1))),
                EventTime::DateTimeUtc(dt) => EventTime::DateTimeUtc(*dt + duration),
                EventTime::DateTimeFloating(dt) => EventTime::DateTimeFloating(*dt + duration),
                EventTime::DateTimeZoned { datetime, tzid } => EventTime::DateTimeZoned {
                    datetime: *datetime + duration,
                    tzid: tzid.clone(),
                },
            }
        }
    }
}

/// Wall-clock duration of the master, ignoring zone differences between DTSTART and DTEND.
fn naive_duration(start: &EventTime, end: &EventTime) -> Duration {
    let wall = |t: &EventTime| match t {
        EventTime::Date(d) => d.and_hms_opt(0, 0, 0),
        EventTime::DateTimeUtc(dt) => Some(dt.naive_utc()),
        EventTime::DateTimeFloating(dt) => Some(*dt),
        EventTime::DateTimeZoned { datetime, .. } => Some(*datetime),
    };

    match (wall(start), wall(end)) {
        (Some(s), Some(e)) if e > s => e - s,
        _ => Duration::zero(),
    }
}

/// Expand a recurring master event into instances within [range_start, range_end].
///
/// - `overridden` holds the keys of occurrences that have their own
///   RECURRENCE-ID event; those are skipped here since the override is read
///   as a standalone event.
/// - The master itself is not included.
pub fn expand_recurring_event(
    master: &IcsEvent,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    overridden: &HashSet<String>,
    tz: Tz,
) -> SyncResult<Vec<IcsEvent>> {
    let Some(recurrence) = &master.recurrence else {
        return Ok(Vec::new());
    };

    let rrule_str = build_rrule_string(&master.start, recurrence, tz);

    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        SyncError::IcsParse(format!(
            "Failed to parse RRULE for event '{}': {}",
            master.uid, e
        ))
    })?;

    // after/before are exclusive, widen by a second to make the range inclusive
    let utc: rrule::Tz = Utc.into();
    let after = (range_start - Duration::seconds(1)).with_timezone(&utc);
    let before = (range_end + Duration::seconds(1)).with_timezone(&utc);

    let result = rrule_set.after(after).before(before).all(MAX_INSTANCES);

    Ok(result
        .dates
        .iter()
        .map(|occ| occurrence_to_event_time(occ, &master.start))
        .filter(|occ| !overridden.contains(&occ.key()))
        .map(|occ| IcsEvent {
            uid: master.uid.clone(),
            summary: master.summary.clone(),
            end: instance_end(master, &occ),
            start: occ.clone(),
            cancelled: master.cancelled,
            busy_status: master.busy_status,
            sensitivity: master.sensitivity,
            recurrence: None,
            recurrence_id: Some(occ),
        })
        .collect())
}

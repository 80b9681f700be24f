//! Appointment → timesheet mapping.

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;

use crate::appointment::Appointment;
use crate::config::Config;
use crate::timesheet::TimesheetEntry;

/// Map one appointment. Private appointments go to the "off" project and
/// activity, everything else to "work".
pub fn to_timesheet(appointment: &Appointment, config: &Config, timezone: Tz) -> TimesheetEntry {
    let (project, activity) = if appointment.sensitivity.is_private() {
        (config.off_project, config.off_activity)
    } else {
        (config.work_project, config.work_activity)
    };

    TimesheetEntry {
        begin: in_zone(appointment.start, timezone),
        end: in_zone(appointment.end, timezone),
        project,
        activity,
        description: appointment.subject.clone(),
        fixed_rate: 0.0,
        hourly_rate: 0.0,
        user: config.user_id,
        exported: false,
        billable: true,
        tags: Vec::new(),
    }
}

pub fn to_timesheets(
    appointments: &[Appointment],
    config: &Config,
    timezone: Tz,
) -> Vec<TimesheetEntry> {
    appointments
        .iter()
        .map(|a| to_timesheet(a, config, timezone))
        .collect()
}

/// The offset is taken from the zone at that instant, so DST is respected.
fn in_zone(instant: DateTime<Utc>, timezone: Tz) -> DateTime<FixedOffset> {
    instant.with_timezone(&timezone).fixed_offset()
}

//! Local calendar store access.
//!
//! `AppointmentSource` is the seam between the sync pipeline and whatever
//! holds the user's calendar. `IcsStore` reads a single .ics file or a
//! directory of .ics files, such as a vdir-style export.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::appointment::Appointment;
use crate::error::{SyncError, SyncResult};
use crate::ics::{IcsEvent, parse_events};
use crate::recurrence::expand_recurring_event;
use crate::window::SyncWindow;

/// Subject keyword filter applied to every appointment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    /// Keep only appointments whose subject contains this keyword
    pub include: Option<String>,
    /// Drop appointments whose subject contains this keyword
    pub exclude: Option<String>,
}

impl AppointmentFilter {
    pub fn new(include: Option<String>, exclude: Option<String>) -> Self {
        // An empty keyword would match every subject
        let non_empty = |kw: Option<String>| kw.filter(|k| !k.is_empty());
        AppointmentFilter {
            include: non_empty(include),
            exclude: non_empty(exclude),
        }
    }

    /// Free appointments never pass, whatever their subject.
    pub fn accepts(&self, appointment: &Appointment) -> bool {
        if appointment.busy_status.is_free() {
            return false;
        }
        if let Some(include) = &self.include {
            if !appointment.subject.contains(include.as_str()) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if appointment.subject.contains(exclude.as_str()) {
                return false;
            }
        }
        true
    }
}

pub trait AppointmentSource {
    /// All appointments starting inside the window, sorted by start.
    fn fetch(&self, window: &SyncWindow) -> SyncResult<Vec<Appointment>>;

    /// Appointments inside the window that pass `filter`.
    fn appointments(
        &self,
        window: &SyncWindow,
        filter: &AppointmentFilter,
    ) -> SyncResult<Vec<Appointment>> {
        let appointments: Vec<Appointment> = self
            .fetch(window)?
            .into_iter()
            .filter(|a| {
                let keep = filter.accepts(a);
                if !keep {
                    debug!(appointment = %a, "Skipping appointment");
                }
                keep
            })
            .collect();

        Ok(appointments)
    }
}

pub struct IcsStore {
    path: PathBuf,
    timezone: Tz,
}

impl IcsStore {
    /// `timezone` resolves floating times and unknown TZIDs.
    pub fn new(path: impl Into<PathBuf>, timezone: Tz) -> Self {
        IcsStore {
            path: path.into(),
            timezone,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_events(&self) -> SyncResult<Vec<IcsEvent>> {
        if self.path.is_file() {
            let content = std::fs::read_to_string(&self.path)?;
            return parse_events(&content);
        }

        if !self.path.is_dir() {
            return Err(SyncError::Calendar(format!(
                "{} does not exist",
                self.path.display()
            )));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.path)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "ics"))
            .collect();
        paths.sort();

        let mut events = Vec::new();
        for path in paths {
            let parsed = std::fs::read_to_string(&path)
                .map_err(SyncError::from)
                .and_then(|content| parse_events(&content));

            match parsed {
                Ok(mut file_events) => events.append(&mut file_events),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable event file"),
            }
        }

        Ok(events)
    }

    /// Turn parsed events into concrete occurrences: masters are expanded,
    /// overrides stand on their own, cancelled instances disappear. A series
    /// whose rule can't be expanded is skipped like an unreadable file.
    fn occurrences(&self, events: Vec<IcsEvent>, window: &SyncWindow) -> Vec<IcsEvent> {
        let mut overridden: HashMap<String, HashSet<String>> = HashMap::new();
        for event in &events {
            if let Some(rid) = &event.recurrence_id {
                overridden
                    .entry(event.uid.clone())
                    .or_default()
                    .insert(rid.key());
            }
        }

        let mut occurrences = Vec::new();
        for event in events {
            if event.recurrence.is_some() {
                let skip = overridden.get(&event.uid).cloned().unwrap_or_default();
                let expanded = expand_recurring_event(
                    &event,
                    window.start_utc(),
                    window.end_utc(),
                    &skip,
                    self.timezone,
                );

                match expanded {
                    Ok(instances) => occurrences.extend(instances),
                    Err(e) => warn!(uid = %event.uid, error = %e, "Skipping recurring event"),
                }
            } else {
                occurrences.push(event);
            }
        }

        occurrences.retain(|e| !e.cancelled);
        occurrences
    }

    fn to_appointment(&self, event: &IcsEvent) -> Option<Appointment> {
        let start = event.start.to_utc(self.timezone)?;
        let end = event.end.to_utc(self.timezone).unwrap_or(start);

        Some(Appointment {
            subject: event.summary.clone(),
            start,
            end,
            busy_status: event.busy_status,
            sensitivity: event.sensitivity,
        })
    }
}

impl AppointmentSource for IcsStore {
    fn fetch(&self, window: &SyncWindow) -> SyncResult<Vec<Appointment>> {
        if window.is_empty() {
            return Ok(Vec::new());
        }

        let events = self.read_events()?;
        debug!(count = events.len(), path = %self.path.display(), "Read calendar events");

        let mut appointments: Vec<Appointment> = self
            .occurrences(events, window)
            .iter()
            .filter_map(|e| self.to_appointment(e))
            .filter(|a| window.contains(a.start))
            .collect();

        appointments.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(appointments)
    }
}

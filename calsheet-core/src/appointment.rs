//! Calendar appointments as read from the local store.
//!
//! Busy status and sensitivity follow the values desktop calendaring clients
//! attach to an appointment. ICS files carry them as `TRANSP`/`CLASS` or the
//! `X-MICROSOFT-CDO-*` extensions.

use std::fmt;

use chrono::{DateTime, Utc};

/// How the appointment blocks time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusyStatus {
    /// Shows as free; never becomes a timesheet
    Free,
    Tentative,
    #[default]
    Busy,
    OutOfOffice,
    WorkingElsewhere,
}

impl BusyStatus {
    pub fn is_free(&self) -> bool {
        *self == BusyStatus::Free
    }

    /// Parse an `X-MICROSOFT-CDO-BUSYSTATUS` value.
    pub fn from_cdo(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "FREE" => Some(BusyStatus::Free),
            "TENTATIVE" => Some(BusyStatus::Tentative),
            "BUSY" => Some(BusyStatus::Busy),
            "OOF" => Some(BusyStatus::OutOfOffice),
            "WORKINGELSEWHERE" => Some(BusyStatus::WorkingElsewhere),
            _ => None,
        }
    }

    /// Parse a `TRANSP` value.
    pub fn from_transparency(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("TRANSPARENT") {
            BusyStatus::Free
        } else {
            BusyStatus::Busy
        }
    }
}

/// Privacy flag of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sensitivity {
    #[default]
    Normal,
    Private,
    Confidential,
}

impl Sensitivity {
    /// Parse a `CLASS` value. Unknown classes are treated as normal.
    pub fn from_class(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "PRIVATE" => Sensitivity::Private,
            "CONFIDENTIAL" => Sensitivity::Confidential,
            _ => Sensitivity::Normal,
        }
    }

    pub fn is_private(&self) -> bool {
        *self == Sensitivity::Private
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub busy_status: BusyStatus,
    pub sensitivity: Sensitivity,
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.subject, self.start.format("%Y-%m-%d %H:%M UTC"))
    }
}

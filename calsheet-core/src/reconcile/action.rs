use std::fmt;

use crate::timesheet::{RemoteTimesheet, TimesheetEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Create,
    Update,
}

impl ActionKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ActionKind::Create => "+",
            ActionKind::Update => "~",
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            ActionKind::Create => "creating",
            ActionKind::Update => "updating",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// What to do with one local timesheet.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    /// No remote timesheet has this description and begin
    Create(TimesheetEntry),
    /// Overwrite the first matching remote timesheet with the full entry
    Update {
        entry: TimesheetEntry,
        remote: RemoteTimesheet,
    },
}

impl SyncAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            SyncAction::Create(_) => ActionKind::Create,
            SyncAction::Update { .. } => ActionKind::Update,
        }
    }

    /// Id of the remote timesheet an update overwrites.
    pub fn remote_id(&self) -> Option<u64> {
        match self {
            SyncAction::Create(_) => None,
            SyncAction::Update { remote, .. } => Some(remote.id),
        }
    }

    pub fn entry(&self) -> &TimesheetEntry {
        match self {
            SyncAction::Create(entry) => entry,
            SyncAction::Update { entry, .. } => entry,
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.entry();
        write!(f, "{} {} ({})", self.kind(), entry.description, entry.begin_string())
    }
}

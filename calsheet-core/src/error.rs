//! Error types for calsheet.

use reqwest::StatusCode;
use thiserror::Error;

use crate::reconcile::ActionKind;

/// Errors that can occur while reading the calendar or talking to Kimai.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calendar store unavailable: {0}")]
    Calendar(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Listing timesheets failed with status {0}")]
    ListRejected(StatusCode),

    #[error("Could not decode timesheets: {0}")]
    Decode(String),

    #[error(
        "Error code {code} received while {verb} {description} begin:{begin}",
        code = .status.as_u16(),
        verb = .action.verb()
    )]
    Rejected {
        action: ActionKind,
        status: StatusCode,
        description: String,
        begin: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for calsheet operations.
pub type SyncResult<T> = Result<T, SyncError>;

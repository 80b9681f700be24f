//! Core of calsheet: turn calendar appointments into Kimai timesheets.
//!
//! The pipeline is
//! - `source` reads appointments for a `window` from the local calendar store,
//! - `transform` maps them to `timesheet` entries using the `config`,
//! - `reconcile` matches them against what `kimai` already has and creates or
//!   updates accordingly.

pub mod appointment;
pub mod config;
pub mod error;
pub mod ics;
pub mod kimai;
pub mod reconcile;
pub mod recurrence;
pub mod source;
pub mod timesheet;
pub mod transform;
pub mod window;

pub use error::{SyncError, SyncResult};

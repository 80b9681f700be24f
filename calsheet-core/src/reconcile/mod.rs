//! Create-or-update reconciliation of local timesheets against Kimai.

mod action;
mod reconciler;

pub use action::{ActionKind, SyncAction};
pub use reconciler::{Reconciler, SyncReport, plan};

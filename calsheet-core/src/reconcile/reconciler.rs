use reqwest::StatusCode;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::kimai::TimesheetApi;
use crate::reconcile::{ActionKind, SyncAction};
use crate::timesheet::{RemoteTimesheet, TimesheetEntry};
use crate::window::SyncWindow;

/// Decide create vs. update for every local entry, in local order.
///
/// A remote timesheet matches when description and begin are equal. If
/// several remote timesheets share a key, the first one in listing order is
/// the one that gets updated.
pub fn plan(local: &[TimesheetEntry], remote: &[RemoteTimesheet]) -> Vec<SyncAction> {
    local
        .iter()
        .map(|entry| match remote.iter().find(|r| r.matches(entry)) {
            Some(existing) => {
                debug!(id = existing.id, description = %entry.description, "Matched remote timesheet");
                SyncAction::Update {
                    entry: entry.clone(),
                    remote: existing.clone(),
                }
            }
            None => SyncAction::Create(entry.clone()),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
}

impl SyncReport {
    fn record(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::Create => self.created += 1,
            ActionKind::Update => self.updated += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated
    }
}

pub struct Reconciler<'a, A: TimesheetApi> {
    api: &'a A,
}

impl<'a, A: TimesheetApi> Reconciler<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Reconciler { api }
    }

    /// Fetch remote timesheets for the window and plan the actions.
    /// Nothing local means nothing to ask the server.
    pub async fn preview(
        &self,
        window: &SyncWindow,
        local: &[TimesheetEntry],
    ) -> SyncResult<Vec<SyncAction>> {
        if local.is_empty() {
            return Ok(Vec::new());
        }

        let remote = self.api.list(window).await?;
        Ok(plan(local, &remote))
    }

    /// Apply actions one at a time. Anything but HTTP 200 stops the run;
    /// actions applied before the failure stay applied.
    pub async fn apply(
        &self,
        actions: &[SyncAction],
        mut on_progress: impl FnMut(&SyncAction),
    ) -> SyncResult<SyncReport> {
        let mut report = SyncReport::default();

        for action in actions {
            let status = match action {
                SyncAction::Create(entry) => self.api.create(entry).await?,
                SyncAction::Update { entry, remote } => self.api.update(entry, remote.id).await?,
            };

            if status != StatusCode::OK {
                let entry = action.entry();
                return Err(SyncError::Rejected {
                    action: action.kind(),
                    status,
                    description: entry.description.clone(),
                    begin: entry.begin_string(),
                });
            }

            report.record(action.kind());
            on_progress(action);
        }

        info!(created = report.created, updated = report.updated, "Applied timesheet changes");
        Ok(report)
    }

    /// `preview` followed by `apply`.
    pub async fn run(
        &self,
        window: &SyncWindow,
        local: &[TimesheetEntry],
        on_progress: impl FnMut(&SyncAction),
    ) -> SyncResult<SyncReport> {
        let actions = self.preview(window, local).await?;
        self.apply(&actions, on_progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timesheet::kimai_time;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        List,
        Create(String),
        Update(u64, String),
    }

    /// In-memory Kimai double that records calls and answers with canned statuses.
    struct FakeKimai {
        remote: Vec<RemoteTimesheet>,
        statuses: Mutex<Vec<StatusCode>>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeKimai {
        fn new(remote: Vec<RemoteTimesheet>) -> Self {
            FakeKimai {
                remote,
                statuses: Mutex::new(Vec::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Statuses returned by successive mutations; 200 once exhausted.
        fn with_statuses(mut self, statuses: &[u16]) -> Self {
            let mut codes: Vec<StatusCode> = statuses
                .iter()
                .map(|s| StatusCode::from_u16(*s).unwrap())
                .collect();
            codes.reverse();
            self.statuses = Mutex::new(codes);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn next_status(&self) -> StatusCode {
            self.statuses.lock().unwrap().pop().unwrap_or(StatusCode::OK)
        }
    }

    #[async_trait]
    impl TimesheetApi for FakeKimai {
        async fn list(&self, _window: &SyncWindow) -> SyncResult<Vec<RemoteTimesheet>> {
            self.calls.lock().unwrap().push(Call::List);
            Ok(self.remote.clone())
        }

        async fn create(&self, entry: &TimesheetEntry) -> SyncResult<StatusCode> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Create(entry.description.clone()));
            Ok(self.next_status())
        }

        async fn update(&self, entry: &TimesheetEntry, id: u64) -> SyncResult<StatusCode> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Update(id, entry.description.clone()));
            Ok(self.next_status())
        }
    }

    fn window() -> SyncWindow {
        SyncWindow::new(
            NaiveDate::from_ymd_opt(2022, 10, 12).unwrap(),
            NaiveDate::from_ymd_opt(2022, 10, 13).unwrap(),
        )
    }

    fn entry(description: &str, begin: &str) -> TimesheetEntry {
        TimesheetEntry {
            begin: kimai_time::parse(begin).unwrap(),
            end: kimai_time::parse(begin).unwrap(),
            project: 4,
            activity: 1,
            description: description.to_string(),
            fixed_rate: 0.0,
            hourly_rate: 0.0,
            user: 2,
            exported: false,
            billable: true,
            tags: Vec::new(),
        }
    }

    fn remote(id: u64, description: &str, begin: &str) -> RemoteTimesheet {
        RemoteTimesheet {
            id,
            description: Some(description.to_string()),
            begin: kimai_time::parse(begin).unwrap(),
            end: None,
            project: Some(4),
            activity: Some(1),
        }
    }

    #[test]
    fn plan_updates_matches_and_creates_the_rest() {
        let local = vec![
            entry("Standup", "2022-10-12T09:00:00+0200"),
            entry("Review", "2022-10-12T14:00:00+0200"),
        ];
        let remote = vec![remote(77, "Standup", "2022-10-12T09:00:00+0200")];

        let actions = plan(&local, &remote);

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind(), ActionKind::Update);
        assert_eq!(actions[0].remote_id(), Some(77));
        assert_eq!(actions[1].remote_id(), None);
        assert_eq!(actions[1], SyncAction::Create(local[1].clone()));
    }

    #[test]
    fn plan_requires_both_description_and_begin() {
        let local = vec![entry("Standup", "2022-10-12T09:00:00+0200")];
        let remote = vec![
            remote(1, "Standup", "2022-10-12T09:30:00+0200"),
            remote(2, "Daily", "2022-10-12T09:00:00+0200"),
        ];

        assert_eq!(plan(&local, &remote), vec![SyncAction::Create(local[0].clone())]);
    }

    #[test]
    fn plan_first_duplicate_wins() {
        let local = vec![entry("Standup", "2022-10-12T09:00:00+0200")];
        let remote = vec![
            remote(77, "Standup", "2022-10-12T09:00:00+0200"),
            remote(78, "Standup", "2022-10-12T09:00:00+0200"),
        ];

        assert_eq!(plan(&local, &remote)[0].remote_id(), Some(77));
    }

    #[tokio::test]
    async fn empty_local_set_makes_no_calls() {
        let api = FakeKimai::new(vec![remote(77, "Standup", "2022-10-12T09:00:00+0200")]);

        let report = Reconciler::new(&api).run(&window(), &[], |_| {}).await.unwrap();

        assert_eq!(report, SyncReport::default());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn run_lists_once_then_mutates_in_order() {
        let api = FakeKimai::new(vec![remote(77, "Standup", "2022-10-12T09:00:00+0200")]);
        let local = vec![
            entry("Standup", "2022-10-12T09:00:00+0200"),
            entry("Review", "2022-10-12T14:00:00+0200"),
        ];
        let mut seen = Vec::new();

        let report = Reconciler::new(&api)
            .run(&window(), &local, |action| seen.push(action.kind()))
            .await
            .unwrap();

        assert_eq!(report, SyncReport { created: 1, updated: 1 });
        assert_eq!(report.total(), 2);
        assert_eq!(seen, vec![ActionKind::Update, ActionKind::Create]);
        assert_eq!(
            api.calls(),
            vec![
                Call::List,
                Call::Update(77, "Standup".to_string()),
                Call::Create("Review".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn non_200_aborts_remaining_entries() {
        // 201 is a success in REST terms, but only an exact 200 counts here
        let api = FakeKimai::new(Vec::new()).with_statuses(&[200, 201]);
        let local = vec![
            entry("Standup", "2022-10-12T09:00:00+0200"),
            entry("Review", "2022-10-12T14:00:00+0200"),
            entry("Retro", "2022-10-12T16:00:00+0200"),
        ];

        let err = Reconciler::new(&api)
            .run(&window(), &local, |_| {})
            .await
            .unwrap_err();

        match err {
            SyncError::Rejected {
                action,
                status,
                description,
                begin,
            } => {
                assert_eq!(action, ActionKind::Create);
                assert_eq!(status, StatusCode::CREATED);
                assert_eq!(description, "Review");
                assert_eq!(begin, "2022-10-12T14:00:00+0200");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }

        assert_eq!(
            api.calls(),
            vec![
                Call::List,
                Call::Create("Standup".to_string()),
                Call::Create("Review".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn rejected_update_names_the_entry() {
        let api = FakeKimai::new(vec![remote(77, "Standup", "2022-10-12T09:00:00+0200")])
            .with_statuses(&[403]);
        let local = vec![entry("Standup", "2022-10-12T09:00:00+0200")];

        let err = Reconciler::new(&api)
            .run(&window(), &local, |_| {})
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error code 403 received while updating Standup begin:2022-10-12T09:00:00+0200"
        );
    }
}

//! Colored terminal rendering for sync plans and results.

use calsheet_core::reconcile::{ActionKind, SyncAction, SyncReport};
use calsheet_core::timesheet::kimai_time;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for ActionKind {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            ActionKind::Create => symbol.green().to_string(),
            ActionKind::Update => symbol.yellow().to_string(),
        }
    }
}

fn colorize(kind: ActionKind, text: &str) -> String {
    match kind {
        ActionKind::Create => text.green().to_string(),
        ActionKind::Update => text.yellow().to_string(),
    }
}

impl Render for SyncAction {
    fn render(&self) -> String {
        let entry = self.entry();
        let description = colorize(self.kind(), &entry.description);
        let time = format!("{} - {}", entry.begin_string(), entry.end_string());

        format!("{} {} {}", self.kind().render(), description, time.dimmed())
    }
}

impl Render for SyncReport {
    fn render(&self) -> String {
        format!(
            "calendar to timesheet sync done: {} created, {} updated",
            self.created, self.updated
        )
    }
}

/// Above this many actions the plan is summarized as counts
const COMPACT_THRESHOLD: usize = 5;

pub fn render_plan(actions: &[SyncAction], verbose: bool) -> String {
    if actions.is_empty() {
        return "   No timesheets to synchronize".dimmed().to_string();
    }

    let mut lines = Vec::new();

    if verbose || actions.len() <= COMPACT_THRESHOLD {
        for action in actions {
            lines.push(format!("   {}", action.render()));
            lines.extend(render_field_diffs(action).into_iter().map(|l| format!("      {}", l)));
        }
    } else {
        let creates = actions.iter().filter(|a| a.kind() == ActionKind::Create).count();
        let updates = actions.len() - creates;

        if creates > 0 {
            let label = format!("({} new {})", creates, pluralize(creates));
            lines.push(format!("   {} {}", "+".green(), label.green()));
        }
        if updates > 0 {
            let label = format!("({} changed {})", updates, pluralize(updates));
            lines.push(format!("   {} {}", "~".yellow(), label.yellow()));
        }
    }

    lines.join("\n")
}

fn pluralize(count: usize) -> &'static str {
    if count == 1 { "timesheet" } else { "timesheets" }
}

/// What an update will overwrite on the remote timesheet.
fn render_field_diffs(action: &SyncAction) -> Vec<String> {
    let SyncAction::Update { entry, remote, .. } = action else {
        return Vec::new();
    };

    let mut lines = Vec::new();

    let old_end = remote.end.as_ref().map(kimai_time::format);
    if old_end.as_deref() != Some(entry.end_string().as_str()) {
        lines.push(render_field("end", old_end, entry.end_string()));
    }
    if remote.project != Some(entry.project) {
        lines.push(render_field("project", remote.project, entry.project));
    }
    if remote.activity != Some(entry.activity) {
        lines.push(render_field("activity", remote.activity, entry.activity));
    }

    lines
}

fn render_field<T: ToString>(field: &str, old: Option<T>, new: T) -> String {
    let old = old.map(|v| v.to_string()).unwrap_or_else(|| "(none)".to_string());
    format!("{}: {} → {}", field.dimmed(), old.red(), new.to_string().green())
}

pub fn render_error(err: &anyhow::Error) -> String {
    format!("{:#}", err).red().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calsheet_core::timesheet::{RemoteTimesheet, TimesheetEntry};

    fn entry(description: &str, begin: &str, end: &str) -> TimesheetEntry {
        TimesheetEntry {
            begin: kimai_time::parse(begin).unwrap(),
            end: kimai_time::parse(end).unwrap(),
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

    fn update(remote_end: Option<&str>, remote_project: u64) -> SyncAction {
        let entry = entry("Standup", "2022-10-12T09:00:00+0200", "2022-10-12T09:15:00+0200");
        SyncAction::Update {
            remote: RemoteTimesheet {
                id: 77,
                description: Some("Standup".to_string()),
                begin: entry.begin,
                end: remote_end.map(|e| kimai_time::parse(e).unwrap()),
                project: Some(remote_project),
                activity: Some(1),
            },
            entry,
        }
    }

    #[test]
    fn create_shows_description_and_times() {
        let action = SyncAction::Create(entry(
            "Standup",
            "2022-10-12T09:00:00+0200",
            "2022-10-12T09:15:00+0200",
        ));

        let line = action.render();

        assert!(line.contains("Standup"));
        assert!(line.contains("2022-10-12T09:00:00+0200 - 2022-10-12T09:15:00+0200"));
        assert!(render_field_diffs(&action).is_empty());
    }

    #[test]
    fn update_lists_only_changed_fields() {
        let unchanged = update(Some("2022-10-12T09:15:00+0200"), 4);
        assert!(render_field_diffs(&unchanged).is_empty());

        let changed = update(Some("2022-10-12T09:10:00+0200"), 9);
        let lines = render_field_diffs(&changed);

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("end"));
        assert!(lines[0].contains("2022-10-12T09:10:00+0200"));
        assert!(lines[1].contains("project"));
    }

    #[test]
    fn running_remote_timesheet_has_no_old_end() {
        let lines = render_field_diffs(&update(None, 4));

        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("(none)"));
    }

    #[test]
    fn long_plans_are_compacted() {
        let actions: Vec<SyncAction> = (0..6)
            .map(|h| {
                SyncAction::Create(entry(
                    "Meeting",
                    &format!("2022-10-12T1{}:00:00+0200", h),
                    &format!("2022-10-12T1{}:30:00+0200", h),
                ))
            })
            .collect();

        let compact = render_plan(&actions, false);
        assert!(compact.contains("(6 new timesheets)"));
        assert!(!compact.contains("Meeting"));

        let verbose = render_plan(&actions, true);
        assert_eq!(verbose.lines().count(), 6);
    }

    #[test]
    fn report_line() {
        let report = SyncReport { created: 2, updated: 1 };
        assert_eq!(report.render(), "calendar to timesheet sync done: 2 created, 1 updated");
    }
}

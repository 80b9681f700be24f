use std::path::PathBuf;

use anyhow::{Context, Result};
use calsheet_core::config::Config;
use calsheet_core::kimai::KimaiClient;
use calsheet_core::reconcile::{Reconciler, SyncReport};
use calsheet_core::source::{AppointmentFilter, AppointmentSource, IcsStore};
use calsheet_core::transform;
use calsheet_core::window::SyncWindow;
use owo_colors::OwoColorize;
use tracing::info;

use crate::render::{self, Render};
use crate::utils::tui;

pub struct SyncOptions {
    pub window: SyncWindow,
    /// Overrides the calendar path from the config
    pub calendar: Option<PathBuf>,
    pub filter: AppointmentFilter,
    pub dry_run: bool,
    pub verbose: bool,
}

pub async fn run(config: &Config, options: SyncOptions) -> Result<()> {
    let window = &options.window;
    let timezone = config.timezone()?;
    let calendar = options.calendar.unwrap_or_else(|| config.calendar_path());

    println!("Collecting calendar appointments between {}", window);
    let store = IcsStore::new(calendar, timezone);
    let appointments = store
        .appointments(window, &options.filter)
        .with_context(|| format!("Reading calendar at {}", store.path().display()))?;
    info!(count = appointments.len(), "Collected appointments");

    let entries = transform::to_timesheets(&appointments, config, timezone);

    let client = KimaiClient::new(config)?;
    let reconciler = Reconciler::new(&client);

    println!("Collecting timesheets between {}", window);
    let spinner = tui::create_spinner(config.url.dimmed().to_string());
    let result = reconciler.preview(window, &entries).await;
    spinner.finish_and_clear();
    let actions = result?;

    if options.dry_run {
        println!("{}", render::render_plan(&actions, options.verbose));
        return Ok(());
    }

    let bar = tui::create_progress_bar(actions.len());
    let result = reconciler.apply(&actions, |_| bar.inc(1)).await;
    bar.finish();
    let report: SyncReport = result?;

    println!("{}", report.render().green());
    Ok(())
}

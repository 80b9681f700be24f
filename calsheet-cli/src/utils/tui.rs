use std::fmt::Write;

use indicatif::{ProgressBar, ProgressState, ProgressStyle};

pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/"])
            .template("{msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Bar advanced once per applied timesheet.
pub fn create_progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("Progress: |{bar:50}| {percent_one}% Complete")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key("percent_one", |state: &ProgressState, w: &mut dyn Write| {
                let _ = w.write_str(&format_percent(state.fraction()));
            })
            .progress_chars("█-"),
    );
    bar
}

/// Percentage with one decimal, e.g. `50.0`.
fn format_percent(fraction: f32) -> String {
    format!("{:.1}", fraction * 100.0)
}

mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use calsheet_core::SyncError;
use calsheet_core::config::Config;
use calsheet_core::source::AppointmentFilter;
use calsheet_core::window::SyncWindow;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, ValueEnum};
use owo_colors::OwoColorize;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use crate::commands::sync::SyncOptions;

/// A required option is missing.
const EXIT_MISSING_OPTION: i32 = 1;
/// The config file could not be read or parsed.
const EXIT_BAD_CONFIG: i32 = 2;
/// Kimai refused a create or update.
const EXIT_REJECTED: i32 = -2;
const EXIT_FAILURE: i32 = 1;

#[derive(Parser, Debug)]
#[command(name = "calsheet")]
#[command(about = "Synchronize calendar appointments into Kimai timesheets")]
#[command(after_help = "\
Examples:
  synchronize all appointments from Oct 12th 2022 until Oct 15th 2022
    calsheet -c kimai.api.json -b 2022-10-12 -e 2022-10-15

  synchronize all appointments from Oct 12th 2022 until tomorrow
    calsheet -c kimai.api.json -b 2022-10-12")]
struct Cli {
    /// JSON file with the Kimai URL, API credentials and project/activity ids
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First day to synchronize (YYYY-MM-DD)
    #[arg(short, long)]
    begin: Option<NaiveDate>,

    /// Day after the last day to synchronize (YYYY-MM-DD, defaults to tomorrow)
    #[arg(short, long)]
    end: Option<NaiveDate>,

    /// Local calendar store: an .ics file or a directory of .ics files
    #[arg(long)]
    calendar: Option<PathBuf>,

    /// Only synchronize appointments whose subject contains this keyword
    #[arg(long)]
    include: Option<String>,

    /// Skip appointments whose subject contains this keyword
    #[arg(long, default_value = "Mittagspause")]
    exclude: String,

    /// Show what would be created or updated without changing anything
    #[arg(long)]
    dry_run: bool,

    /// List every planned timesheet in a dry run, even long plans
    #[arg(short, long)]
    verbose: bool,

    /// Verbosity, from least (critical) to most (notset) verbose
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    loglevel: LogLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Notset,
}

impl LogLevel {
    /// tracing has no level above ERROR, so critical shares it.
    fn directive(&self) -> &'static str {
        match self {
            LogLevel::Critical | LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Notset => "trace",
        }
    }
}

fn init_tracing(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.loglevel);

    let Some(begin) = cli.begin else {
        eprintln!("{}", "cannot proceed, some parameters are missing: --begin".red());
        eprintln!("{}", Cli::command().render_usage());
        std::process::exit(EXIT_MISSING_OPTION);
    };

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            std::process::exit(EXIT_BAD_CONFIG);
        }
    };

    let options = SyncOptions {
        window: SyncWindow::from_args(begin, cli.end),
        calendar: cli.calendar,
        filter: AppointmentFilter::new(cli.include, Some(cli.exclude)),
        dry_run: cli.dry_run,
        verbose: cli.verbose,
    };

    if let Err(e) = commands::sync::run(&config, options).await {
        eprintln!("{}", render::render_error(&e));
        std::process::exit(exit_code(&e));
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config, SyncError> {
    match path {
        Some(path) => Config::load(path),
        None => {
            println!(
                "{}",
                "no config file provided... using default settings".yellow()
            );
            warn!("The placeholder config will not authenticate against a real Kimai server");
            Config::placeholder()
        }
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SyncError>() {
        Some(SyncError::Rejected { .. }) => EXIT_REJECTED,
        Some(SyncError::Config(_)) => EXIT_BAD_CONFIG,
        _ => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["calsheet", "-b", "2022-10-12"]);

        assert_eq!(cli.begin, NaiveDate::from_ymd_opt(2022, 10, 12));
        assert_eq!(cli.end, None);
        assert_eq!(cli.config, None);
        assert_eq!(cli.exclude, "Mittagspause");
        assert_eq!(cli.loglevel, LogLevel::Info);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_parse_all_flags() {
        let cli = Cli::parse_from([
            "calsheet",
            "--config",
            "kimai.api.json",
            "--begin",
            "2022-10-12",
            "-e",
            "2022-10-15",
            "--calendar",
            "~/calendar/work",
            "--include",
            "Kunde",
            "--exclude",
            "",
            "--dry-run",
            "-v",
            "--loglevel",
            "notset",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("kimai.api.json")));
        assert_eq!(cli.end, NaiveDate::from_ymd_opt(2022, 10, 15));
        assert_eq!(cli.calendar, Some(PathBuf::from("~/calendar/work")));
        assert_eq!(cli.include.as_deref(), Some("Kunde"));
        assert_eq!(cli.exclude, "");
        assert!(cli.dry_run);
        assert!(cli.verbose);
        assert_eq!(cli.loglevel.directive(), "trace");
    }

    #[test]
    fn test_begin_is_optional_at_parse_time() {
        // Missing --begin is reported by main with its own exit code
        let cli = Cli::try_parse_from(["calsheet"]).unwrap();
        assert_eq!(cli.begin, None);
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let err = Cli::try_parse_from(["calsheet", "-b", "12.10.2022"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_invalid_loglevel_is_rejected() {
        assert!(Cli::try_parse_from(["calsheet", "-b", "2022-10-12", "--loglevel", "loud"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let rejected = anyhow::Error::new(SyncError::Rejected {
            action: calsheet_core::reconcile::ActionKind::Create,
            status: calsheet_core::kimai::StatusCode::BAD_REQUEST,
            description: "Standup".to_string(),
            begin: "2022-10-12T09:00:00+0200".to_string(),
        });
        assert_eq!(exit_code(&rejected), EXIT_REJECTED);

        let calendar = anyhow::Error::new(SyncError::Calendar("gone".to_string()));
        assert_eq!(exit_code(&calendar), EXIT_FAILURE);

        let config = anyhow::Error::new(SyncError::Config("bad".to_string()));
        assert_eq!(exit_code(&config), EXIT_BAD_CONFIG);
    }

    #[test]
    fn test_verify_cli() {
        Cli::command().debug_assert();
    }
}

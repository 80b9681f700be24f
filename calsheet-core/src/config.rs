//! Kimai credentials and project/activity mappings.
//!
//! The config is a flat JSON document. Keys keep the spaced spelling used by
//! existing config files (`"user id"`, `"work id"`, ...). Any key can be
//! overridden from the environment with the `CALSHEET_` prefix, underscores
//! standing in for spaces: `CALSHEET_TOKEN`, `CALSHEET_WORK_ID`.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Case, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::{SyncError, SyncResult};

/// Placeholder used when no config file is given. It will not authenticate
/// against a real server.
pub const PLACEHOLDER_CONFIG: &str = r#"{
    "url": "http://kimai2/api",
    "token": "your-kimai-api-token",
    "user": "user",
    "user id": 2,
    "work id": 4,
    "work activity": 1,
    "off id": 9,
    "off activity": 15
}"#;

static DEFAULT_CALENDAR_PATH: &str = "~/calendar";

const ENV_PREFIX: &str = "CALSHEET";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    /// Base URL of the Kimai API, e.g. `https://kimai.example.com/api`
    pub url: String,
    pub token: String,
    pub user: String,
    #[serde(rename = "user id")]
    pub user_id: u64,
    /// Project for regular appointments
    #[serde(rename = "work id")]
    pub work_project: u64,
    #[serde(rename = "work activity")]
    pub work_activity: u64,
    /// Project for appointments flagged private
    #[serde(rename = "off id")]
    pub off_project: u64,
    #[serde(rename = "off activity")]
    pub off_activity: u64,
    /// IANA timezone used to render timesheet timestamps. Host timezone if unset.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Local calendar store (an .ics file or a directory of .ics files)
    #[serde(default)]
    pub calendar: Option<PathBuf>,
}

impl Config {
    /// Load config from a JSON file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        if !path.is_file() {
            return Err(SyncError::Config(format!(
                "Couldn't load configuration file {}",
                path.display()
            )));
        }

        Self::build(File::from(path).format(FileFormat::Json))
    }

    /// Parse config from a JSON string.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        Self::build(File::from_str(json, FileFormat::Json))
    }

    /// The embedded placeholder config.
    pub fn placeholder() -> SyncResult<Self> {
        Self::from_json(PLACEHOLDER_CONFIG)
    }

    fn build<S>(source: S) -> SyncResult<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Self::build_with(source, environment())
    }

    fn build_with<S>(source: S, env: Environment) -> SyncResult<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: Config = config::Config::builder()
            .add_source(source)
            .add_source(env)
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        // Reject unknown timezones up front rather than mid-run
        config.timezone()?;

        Ok(config)
    }

    /// Timezone used for floating calendar times and timesheet offsets.
    pub fn timezone(&self) -> SyncResult<Tz> {
        match &self.timezone {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| SyncError::Config(format!("Unknown timezone '{}'", name))),
            None => Ok(host_timezone()),
        }
    }

    /// Calendar store path with `~` expanded.
    pub fn calendar_path(&self) -> PathBuf {
        let raw = self
            .calendar
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CALENDAR_PATH));

        PathBuf::from(shellexpand::tilde(&raw.to_string_lossy()).into_owned())
    }
}

/// `CALSHEET_WORK_ID` becomes `work id`.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).convert_case(Case::Lower)
}

fn host_timezone() -> Tz {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| name.parse().ok())
        .unwrap_or(Tz::UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn placeholder_parses_with_spaced_keys() {
        let config = Config::placeholder().unwrap();

        assert_eq!(config.url, "http://kimai2/api");
        assert_eq!(config.user_id, 2);
        assert_eq!(config.work_project, 4);
        assert_eq!(config.work_activity, 1);
        assert_eq!(config.off_project, 9);
        assert_eq!(config.off_activity, 15);
        assert_eq!(config.timezone, None);
    }

    #[test]
    fn load_reads_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "url": "https://kimai.example.com/api",
                "token": "kzTQ98BG",
                "user": "jane",
                "user id": 7,
                "work id": 3,
                "work activity": 11,
                "off id": 5,
                "off activity": 14,
                "timezone": "Europe/Berlin",
                "calendar": "/tmp/cal.ics"
            }}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.user, "jane");
        assert_eq!(config.off_activity, 14);
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.calendar_path(), PathBuf::from("/tmp/cal.ics"));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ \"url\": ").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn environment_overrides_spaced_keys() {
        let vars: config::Map<String, String> = [
            ("CALSHEET_TOKEN", "envtok"),
            ("CALSHEET_WORK_ID", "99"),
            ("CALSHEET_OFF_ACTIVITY", "20"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = Config::build_with(
            File::from_str(PLACEHOLDER_CONFIG, FileFormat::Json),
            environment().source(Some(vars)),
        )
        .unwrap();

        assert_eq!(config.token, "envtok");
        assert_eq!(config.work_project, 99);
        assert_eq!(config.off_activity, 20);
        assert_eq!(config.work_activity, 1);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let json = PLACEHOLDER_CONFIG.replacen('{', r#"{ "timezone": "Mars/Olympus", "#, 1);
        let err = Config::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }
}

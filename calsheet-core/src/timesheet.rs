//! Kimai timesheet records.
//!
//! Kimai writes timestamps as `2022-10-12T09:00:00+0200`. Begin times are
//! compared as instants, so the same moment written with a different offset
//! still matches.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, Serializer};

/// A timesheet as sent to Kimai on create and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetEntry {
    #[serde(with = "kimai_time")]
    pub begin: DateTime<FixedOffset>,
    #[serde(with = "kimai_time")]
    pub end: DateTime<FixedOffset>,
    pub project: u64,
    pub activity: u64,
    pub description: String,
    pub fixed_rate: f64,
    pub hourly_rate: f64,
    pub user: u64,
    pub exported: bool,
    pub billable: bool,
    /// Sent as Kimai's comma-separated tag string
    #[serde(serialize_with = "serialize_tags")]
    pub tags: Vec<String>,
}

impl TimesheetEntry {
    pub fn begin_string(&self) -> String {
        kimai_time::format(&self.begin)
    }

    pub fn end_string(&self) -> String {
        kimai_time::format(&self.end)
    }
}

/// A timesheet as returned by `GET /timesheets`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteTimesheet {
    pub id: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "kimai_time")]
    pub begin: DateTime<FixedOffset>,
    /// Running timesheets have no end
    #[serde(default, with = "kimai_time::option")]
    pub end: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub project: Option<u64>,
    #[serde(default)]
    pub activity: Option<u64>,
}

impl RemoteTimesheet {
    /// Natural key match: same description and same begin instant.
    pub fn matches(&self, entry: &TimesheetEntry) -> bool {
        self.description.as_deref() == Some(entry.description.as_str()) && self.begin == entry.begin
    }
}

fn serialize_tags<S: Serializer>(tags: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&tags.join(","))
}

pub mod kimai_time {
    //! Serde helpers for Kimai's `%Y-%m-%dT%H:%M:%S%z` timestamps.

    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

    pub fn format(dt: &DateTime<FixedOffset>) -> String {
        dt.format(FORMAT).to_string()
    }

    /// Accepts Kimai's format and RFC 3339 (`+02:00` offsets).
    pub fn parse(s: &str) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_str(s, FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(s))
            .ok()
    }

    pub fn serialize<S: Serializer>(
        dt: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", s)))
    }

    pub mod option {
        use chrono::{DateTime, FixedOffset};
        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(s) => super::parse(&s).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp '{}'", s))
                }),
                None => Ok(None),
            }
        }
    }
}

//! Kimai REST client.
//!
//! Every request carries `X-AUTH-TOKEN`/`X-AUTH-USER` and speaks JSON both
//! ways. Mutations report the raw status code; deciding what counts as success
//! is left to the reconciler.

use async_trait::async_trait;
pub use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::timesheet::{RemoteTimesheet, TimesheetEntry};
use crate::window::SyncWindow;

/// Remote timesheet operations used by the reconciler.
#[async_trait]
pub trait TimesheetApi {
    /// Timesheets whose begin lies in [window.begin 00:00:01, window.end 23:59:59].
    async fn list(&self, window: &SyncWindow) -> SyncResult<Vec<RemoteTimesheet>>;

    async fn create(&self, entry: &TimesheetEntry) -> SyncResult<StatusCode>;

    async fn update(&self, entry: &TimesheetEntry, id: u64) -> SyncResult<StatusCode>;
}

const AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");
const AUTH_USER: HeaderName = HeaderName::from_static("x-auth-user");

pub struct KimaiClient {
    http: reqwest::Client,
    base_url: String,
}

impl KimaiClient {
    pub fn new(config: &Config) -> SyncResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTH_TOKEN, header_value("token", &config.token)?);
        headers.insert(AUTH_USER, header_value("user", &config.user)?);

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(KimaiClient {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn timesheets_url(&self) -> String {
        format!("{}/timesheets", self.base_url)
    }
}

fn header_value(field: &str, value: &str) -> SyncResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| SyncError::Config(format!("'{}' contains characters not allowed in a header", field)))
}

#[async_trait]
impl TimesheetApi for KimaiClient {
    async fn list(&self, window: &SyncWindow) -> SyncResult<Vec<RemoteTimesheet>> {
        let url = self.timesheets_url();
        let (begin, end) = (window.query_begin(), window.query_end());
        debug!(url = %url, begin = %begin, end = %end, "GET timesheets");

        let response = self
            .http
            .get(&url)
            .query(&[("begin", begin.as_str()), ("end", end.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::ListRejected(status));
        }

        let body = response.text().await?;
        let timesheets: Vec<RemoteTimesheet> =
            serde_json::from_str(&body).map_err(|e| SyncError::Decode(e.to_string()))?;

        debug!(count = timesheets.len(), "Fetched timesheets");
        Ok(timesheets)
    }

    async fn create(&self, entry: &TimesheetEntry) -> SyncResult<StatusCode> {
        let url = self.timesheets_url();
        debug!(url = %url, description = %entry.description, begin = %entry.begin_string(), "POST timesheet");

        let response = self.http.post(&url).json(entry).send().await?;
        Ok(response.status())
    }

    async fn update(&self, entry: &TimesheetEntry, id: u64) -> SyncResult<StatusCode> {
        let url = format!("{}/{}", self.timesheets_url(), id);
        debug!(url = %url, description = %entry.description, begin = %entry.begin_string(), "PATCH timesheet");

        let response = self.http.patch(&url).json(entry).send().await?;
        Ok(response.status())
    }
}

//! Release metadata feed client.
//!
//! Fetches the releases of each milestone from a chromiumdash-style
//! `fetch_releases` endpoint. Every milestone is one request; a failed or
//! malformed response skips that milestone and the run goes on.

use crate::sink::{CsvWriter, WriteMode};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_FEED_URL: &str = "https://chromiumdash.appspot.com/fetch_releases";
pub const DEFAULT_CHANNEL: &str = "Stable";

/// Column headers of the releases table.
pub const RELEASE_COLUMNS: [&str; 4] = ["Milestone", "Version", "Release Date", "Platform"];

/// Errors for a single milestone request.
#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("milestone {milestone}: HTTP status {status}")]
    Status { milestone: u32, status: u16 },

    #[error("milestone {milestone}: request failed: {message}")]
    Transport { milestone: u32, message: String },

    #[error("milestone {milestone}: invalid JSON: {source}")]
    Json {
        milestone: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("milestone {milestone}: expected a JSON array")]
    Shape { milestone: u32 },

    #[error("milestone {milestone}: failed to read response: {source}")]
    Body {
        milestone: u32,
        #[source]
        source: io::Error,
    },
}

/// One release of one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub milestone: u32,
    pub version: String,
    /// UTC, `%Y-%m-%d %H:%M:%S`.
    pub release_date: String,
    pub platform: String,
}

impl Release {
    pub fn cells(&self) -> [String; 4] {
        [
            self.milestone.to_string(),
            self.version.clone(),
            self.release_date.clone(),
            self.platform.clone(),
        ]
    }
}

/// Wire shape; every field is optional so partial objects can be dropped.
#[derive(Debug, Deserialize)]
struct RawRelease {
    milestone: Option<u32>,
    version: Option<String>,
    /// Milliseconds since the epoch.
    time: Option<f64>,
    platform: Option<String>,
}

impl RawRelease {
    fn into_release(self) -> Option<Release> {
        let milestone = self.milestone.filter(|m| *m > 0)?;
        let version = self.version.filter(|v| !v.is_empty())?;
        let platform = self.platform.filter(|p| !p.is_empty())?;
        let millis = self.time.filter(|t| *t > 0.0)? as i64;
        let released = Utc.timestamp_millis_opt(millis).single()?;

        Some(Release {
            milestone,
            version,
            release_date: released.format("%Y-%m-%d %H:%M:%S").to_string(),
            platform,
        })
    }
}

/// Parse one feed response. Objects missing a field are dropped.
pub fn parse_releases(milestone: u32, body: &str) -> Result<Vec<Release>, ReleaseError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|source| ReleaseError::Json { milestone, source })?;

    let serde_json::Value::Array(items) = value else {
        return Err(ReleaseError::Shape { milestone });
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawRelease>(item).ok())
        .filter_map(RawRelease::into_release)
        .collect())
}

/// Blocking client for the release feed.
pub struct ReleaseFeed {
    agent: ureq::Agent,
    base_url: String,
    channel: String,
}

impl ReleaseFeed {
    pub fn new(base_url: impl Into<String>, channel: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            base_url: base_url.into(),
            channel: channel.into(),
        }
    }

    /// Fetch the releases of one milestone.
    pub fn fetch_milestone(&self, milestone: u32) -> Result<Vec<Release>, ReleaseError> {
        let response = self
            .agent
            .get(&self.base_url)
            .query("milestone", &milestone.to_string())
            .query("channel", &self.channel)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(status, _) => ReleaseError::Status { milestone, status },
                ureq::Error::Transport(t) => ReleaseError::Transport {
                    milestone,
                    message: t.to_string(),
                },
            })?;

        if response.status() != 200 {
            return Err(ReleaseError::Status {
                milestone,
                status: response.status(),
            });
        }

        let body = response
            .into_string()
            .map_err(|source| ReleaseError::Body { milestone, source })?;
        parse_releases(milestone, &body)
    }

    /// Fetch every milestone in `range`, skipping the ones that fail.
    pub fn collect(&self, range: RangeInclusive<u32>) -> Vec<Release> {
        let mut releases = Vec::new();

        for milestone in range {
            match self.fetch_milestone(milestone) {
                Ok(found) => {
                    tracing::debug!("Milestone {}: {} releases", milestone, found.len());
                    releases.extend(found);
                }
                Err(e) => tracing::warn!("Skipping {}", e),
            }
        }

        tracing::info!("Collected {} releases", releases.len());
        releases
    }
}

/// Write releases to a CSV table.
pub fn write_releases(path: &Path, releases: &[Release], mode: WriteMode) -> io::Result<usize> {
    let mut writer = CsvWriter::create(path, &RELEASE_COLUMNS, mode)?;
    for release in releases {
        writer.write_row(&release.cells())?;
    }
    writer.finish()
}

//! `releases`: collect release metadata for a milestone range.

use crate::config::ReleaseConfig;
use crate::error::{MinerError, MinerResult};
use crate::releases::{write_releases, ReleaseFeed};
use std::path::Path;

/// Command-line overrides for the release section.
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub channel: Option<String>,
    pub output: Option<std::path::PathBuf>,
}

impl ReleaseOptions {
    pub fn apply(&self, config: &mut ReleaseConfig) {
        if let Some(start) = self.start {
            config.start = start;
        }
        if let Some(end) = self.end {
            config.end = end;
        }
        if let Some(channel) = &self.channel {
            config.channel = channel.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
    }
}

/// Fetch and write the releases. Returns the number of rows written.
pub fn run(config: &ReleaseConfig, output_dir: &Path) -> MinerResult<usize> {
    tracing::info!(
        "Collecting {} releases for milestones {}..={}",
        config.channel,
        config.start,
        config.end
    );

    let feed = ReleaseFeed::new(config.url.as_str(), config.channel.as_str());
    let releases = feed.collect(config.start..=config.end);
    if releases.is_empty() {
        tracing::warn!("No release data available");
        return Ok(0);
    }

    let path = output_dir.join(&config.output);
    let rows = write_releases(&path, &releases, config.mode)
        .map_err(|source| MinerError::Output {
            path: path.clone(),
            source,
        })?;
    tracing::info!("Wrote {} releases to {}", rows, path.display());
    Ok(rows)
}

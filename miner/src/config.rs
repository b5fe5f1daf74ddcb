//! Run configuration.
//!
//! Loaded from an optional TOML file; every section has defaults so an
//! empty file (or none at all) mines the usual Chromium toggle sources.

use crate::releases::{DEFAULT_CHANNEL, DEFAULT_FEED_URL};
use crate::sink::WriteMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use toggle_core::{HeaderFormat, Profile, ProfileSpec, ToggleError};

/// Lookback profiles get this much hunk context unless configured.
pub const DEFAULT_LOOKBACK_CONTEXT: usize = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Toggle(#[from] ToggleError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Commit header layout requested from git.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStyle {
    #[default]
    Sentinel,
    Pretty,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Repository to mine.
    pub repo: PathBuf,
    /// Directory relative output paths are resolved against.
    pub output_dir: PathBuf,
    pub header: HeaderStyle,
    /// Marker line for [`HeaderStyle::Sentinel`].
    pub sentinel: String,
    pub mode: WriteMode,
    pub tracked: Vec<TrackedSpec>,
    pub releases: ReleaseConfig,
    pub efforts: EffortConfig,
    /// Extra profiles; a name shadows the built-in of the same name.
    pub profiles: Vec<ProfileSpec>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            repo: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            header: HeaderStyle::default(),
            sentinel: toggle_core::segment::DEFAULT_SENTINEL.to_string(),
            mode: WriteMode::default(),
            tracked: TrackedSpec::defaults(),
            releases: ReleaseConfig::default(),
            efforts: EffortConfig::default(),
            profiles: Vec::new(),
        }
    }
}

/// One tracked file (or glob of files) and how to read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `git ls-files` pathspec, e.g. `*switches*.cc`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,
    pub profile: String,
    /// Defaults to `<profile>.csv`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Overrides the profile's lookback window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookback: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_lines: Option<usize>,
}

impl TrackedSpec {
    fn new(path: Option<&str>, glob: Option<&str>, profile: &str, output: &str) -> Self {
        Self {
            path: path.map(String::from),
            glob: glob.map(String::from),
            profile: profile.to_string(),
            output: Some(PathBuf::from(output)),
            lookback: None,
            context_lines: None,
        }
    }

    fn defaults() -> Vec<TrackedSpec> {
        vec![
            TrackedSpec::new(
                Some("third_party/blink/renderer/platform/runtime_enabled_features.json5"),
                None,
                "runtime-features-json5-status",
                "toggle_status_changes.csv",
            ),
            TrackedSpec::new(
                Some("third_party/WebKit/Source/platform/RuntimeEnabledFeatures.in"),
                None,
                "runtime-features-in-status",
                "runtime_in_status_changes.csv",
            ),
            TrackedSpec::new(
                Some("chrome/browser/flag-metadata.json"),
                None,
                "flag-metadata-expiry",
                "expiry_milestone_changes.csv",
            ),
            TrackedSpec::new(
                Some("third_party/WebKit/Source/platform/RuntimeEnabledFeatures.in"),
                None,
                "runtime-features-in",
                "toggle_history.csv",
            ),
            TrackedSpec::new(None, Some("*switches*.cc"), "switches", "toggle_history.csv"),
        ]
    }

    /// Where this entry's rows go, relative to `output_dir` unless absolute.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.csv", self.profile)));
        if output.is_absolute() {
            output
        } else {
            output_dir.join(output)
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.path, &self.glob) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(ConfigError::Invalid(format!(
                "tracked entry for profile '{}' needs exactly one of `path` or `glob`",
                self.profile
            ))),
        }
    }
}

/// Release feed settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    pub start: u32,
    pub end: u32,
    pub channel: String,
    pub url: String,
    pub output: PathBuf,
    pub mode: WriteMode,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            start: 1,
            end: 140,
            channel: DEFAULT_CHANNEL.to_string(),
            url: DEFAULT_FEED_URL.to_string(),
            output: PathBuf::from("chromium_releases.csv"),
            mode: WriteMode::Overwrite,
        }
    }
}

/// Per-commit effort table settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffortConfig {
    /// Limit the statistics to commits touching these paths; empty means all.
    pub paths: Vec<String>,
    pub output: PathBuf,
    pub mode: WriteMode,
}

impl Default for EffortConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            output: PathBuf::from("commit_efforts.csv"),
            mode: WriteMode::Overwrite,
        }
    }
}

impl MinerConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content, path)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// The file at `path` when given, the defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Path::new("<inline>"))
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: MinerConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check tracked entries, custom profiles and the release range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for spec in &self.profiles {
            spec.compile()?;
        }
        for tracked in &self.tracked {
            tracked.validate()?;
            self.resolve_profile(&tracked.profile)?;
        }
        if self.releases.start > self.releases.end {
            return Err(ConfigError::Invalid(format!(
                "release range {}..={} is empty",
                self.releases.start, self.releases.end
            )));
        }
        if self.sentinel.trim().is_empty() {
            return Err(ConfigError::Invalid("sentinel must not be blank".to_string()));
        }
        Ok(())
    }

    pub fn header_format(&self) -> HeaderFormat {
        match self.header {
            HeaderStyle::Sentinel => HeaderFormat::Sentinel {
                token: self.sentinel.clone(),
            },
            HeaderStyle::Pretty => HeaderFormat::Pretty,
        }
    }

    /// Compile a profile by name, custom profiles first.
    pub fn resolve_profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.iter().find(|spec| spec.name == name) {
            Some(spec) => Ok(spec.compile()?),
            None => Ok(Profile::builtin(name)?),
        }
    }

    /// Every profile available to this config: custom ones, then the
    /// built-ins they do not shadow.
    pub fn profile_specs(&self) -> Vec<ProfileSpec> {
        let mut specs = self.profiles.clone();
        specs.extend(
            ProfileSpec::builtins()
                .into_iter()
                .filter(|builtin| !self.profiles.iter().any(|p| p.name == builtin.name)),
        );
        specs
    }

    /// Compiled profile for a tracked entry, with its lookback override.
    pub fn tracked_profile(&self, tracked: &TrackedSpec) -> Result<Profile, ConfigError> {
        let profile = self.resolve_profile(&tracked.profile)?;
        Ok(match tracked.lookback {
            Some(lookback) => profile.with_lookback(lookback),
            None => profile,
        })
    }
}

/// Hunk context for a tracked entry.
pub fn context_lines(tracked: &TrackedSpec, profile: &Profile) -> Option<usize> {
    tracked
        .context_lines
        .or_else(|| profile.uses_lookback().then_some(DEFAULT_LOOKBACK_CONTEXT))
}

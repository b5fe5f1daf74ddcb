//! Git history miner for extracting toggle events from patches.

use super::{executor::GitExecutor, GitMiningError};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use toggle_core::{extract_events, EventSink, HeaderFormat, Profile, Segmenter};

/// One file whose history is mined, with the profile that reads it.
#[derive(Debug, Clone)]
pub struct TrackedFile {
    /// Path relative to the repository root.
    pub path: PathBuf,
    pub profile: Profile,
    /// Extra hunk context (`-U<n>`); `None` keeps git's default.
    pub context_lines: Option<usize>,
}

/// Result of a mining operation.
#[derive(Debug, Default)]
pub struct MiningResult {
    /// Number of commits processed.
    pub commits_processed: usize,
    /// Number of events handed to the sink.
    pub events_emitted: usize,
    /// Events whose toggle name could not be resolved.
    pub unresolved_names: usize,
    /// Number of commits skipped because their header was malformed.
    pub commits_skipped: usize,
    /// Earlier names of the file, newest first.
    pub previous_paths: Vec<String>,
    /// Errors encountered (non-fatal).
    pub warnings: Vec<String>,
}

impl MiningResult {
    /// Fold another result into this one.
    pub fn merge(&mut self, other: MiningResult) {
        self.commits_processed += other.commits_processed;
        self.events_emitted += other.events_emitted;
        self.unresolved_names += other.unresolved_names;
        self.commits_skipped += other.commits_skipped;
        self.previous_paths.extend(other.previous_paths);
        self.warnings.extend(other.warnings);
    }
}

/// Git history miner that extracts toggle events from patch history.
pub struct ToggleMiner {
    executor: GitExecutor,
    format: HeaderFormat,
}

impl ToggleMiner {
    /// Create a new toggle miner for the given repository.
    pub fn new(repo_path: &Path, format: HeaderFormat) -> Result<Self, GitMiningError> {
        let executor = GitExecutor::new(repo_path)?;
        Ok(Self { executor, format })
    }

    pub fn executor(&self) -> &GitExecutor {
        &self.executor
    }

    /// Expand a pathspec glob into the tracked files it matches.
    pub fn discover(&self, pattern: &str) -> Result<Vec<PathBuf>, GitMiningError> {
        let files = self.executor.ls_files(pattern)?;
        tracing::info!("Found {} files matching {}", files.len(), pattern);
        Ok(files.into_iter().map(PathBuf::from).collect())
    }

    /// Mine the full history of one tracked file into `sink`.
    ///
    /// A path without any history is an error; everything below that
    /// (malformed commits, unresolved names) is reported on the result.
    pub fn mine_file<S>(
        &self,
        tracked: &TrackedFile,
        sink: &mut S,
    ) -> Result<MiningResult, GitMiningError>
    where
        S: EventSink,
        S::Error: Display,
    {
        let previous_paths = match self.executor.renamed_paths(&tracked.path) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!(
                    "Could not list renames of {}: {}",
                    tracked.path.display(),
                    e
                );
                Vec::new()
            }
        };
        for old in &previous_paths {
            tracing::debug!("{} was previously {}", tracked.path.display(), old);
        }

        let log = self.executor.log_patch(
            &tracked.path,
            &self.format.git_format(),
            tracked.context_lines,
        )?;
        if log.trim().is_empty() {
            return Err(GitMiningError::EmptyHistory(tracked.path.clone()));
        }

        let file_path = tracked.path.to_string_lossy();
        let mut result = mine_log(&log, &self.format, &tracked.profile, &file_path, sink)?;
        result.previous_paths = previous_paths;

        tracing::info!(
            "Mined {}: {} events from {} commits ({} skipped, {} unnamed)",
            file_path,
            result.events_emitted,
            result.commits_processed,
            result.commits_skipped,
            result.unresolved_names
        );

        Ok(result)
    }
}

/// Segment a buffered log and feed every extracted event to `sink`.
pub fn mine_log<S>(
    log: &str,
    format: &HeaderFormat,
    profile: &Profile,
    file_path: &str,
    sink: &mut S,
) -> Result<MiningResult, GitMiningError>
where
    S: EventSink,
    S::Error: Display,
{
    let mut result = MiningResult::default();

    for commit in Segmenter::new(log, format.clone()) {
        let commit = match commit {
            Ok(commit) => commit,
            Err(e) => {
                result.commits_skipped += 1;
                result.warnings.push(format!("Skipped commit: {}", e));
                continue;
            }
        };
        result.commits_processed += 1;

        if commit.timestamp.is_none() {
            tracing::debug!("Commit {} has no readable commit date", commit.short_id());
        }

        for event in extract_events(&commit, profile, file_path) {
            if event.toggle_name.is_none() {
                result.unresolved_names += 1;
            }
            sink.accept(&event)
                .map_err(|e| GitMiningError::SinkError(e.to_string()))?;
            result.events_emitted += 1;
        }
    }

    if result.commits_processed == 0 && result.commits_skipped == 0 {
        result.warnings.push(format!(
            "No commit headers found in the history of {}",
            file_path
        ));
    }

    for warning in &result.warnings {
        tracing::warn!("{}", warning);
    }

    Ok(result)
}

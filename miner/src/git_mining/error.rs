//! Error types for git mining operations.

use std::path::PathBuf;
use thiserror::Error;
use toggle_core::ToggleError;

/// Errors that can occur during git mining operations.
#[derive(Error, Debug)]
pub enum GitMiningError {
    #[error("Git is not available on this system")]
    GitNotAvailable,

    #[error("Path is not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("Git command failed: {0}")]
    CommandFailed(String),

    #[error("No history found for tracked path: {0}")]
    EmptyHistory(PathBuf),

    #[error("Failed to write events: {0}")]
    SinkError(String),

    #[error("Toggle extraction error: {0}")]
    ToggleError(#[from] ToggleError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GitMiningError {
    /// Whether the failure is confined to the file being mined.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            GitMiningError::CommandFailed(_) | GitMiningError::IoError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_display() {
        let err = GitMiningError::EmptyHistory(PathBuf::from("a/b.in"));
        assert_eq!(err.to_string(), "No history found for tracked path: a/b.in");
    }

    #[test]
    fn test_per_file_errors() {
        assert!(GitMiningError::CommandFailed("bad revision".into()).is_per_file());
        assert!(!GitMiningError::EmptyHistory(PathBuf::from("a.in")).is_per_file());
        assert!(!GitMiningError::SinkError("disk full".into()).is_per_file());
    }

    #[test]
    fn test_from_toggle_error() {
        let err: GitMiningError = ToggleError::UnknownProfile("x".into()).into();
        assert!(matches!(err, GitMiningError::ToggleError(_)));
    }
}

//! Error types for the toggle miner.

use crate::config::ConfigError;
use crate::git_mining::GitMiningError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum MinerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Git mining error: {0}")]
    Git(#[from] GitMiningError),

    #[error("Output {path} is shared by profiles with different columns ({first} vs {second})")]
    ColumnMismatch {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for miner operations.
pub type MinerResult<T> = Result<T, MinerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_git_errors() {
        let err: MinerError = GitMiningError::GitNotAvailable.into();
        assert_eq!(
            err.to_string(),
            "Git mining error: Git is not available on this system"
        );
    }

    #[test]
    fn test_column_mismatch_display() {
        let err = MinerError::ColumnMismatch {
            path: PathBuf::from("out.csv"),
            first: "switches".into(),
            second: "flag-metadata-expiry".into(),
        };
        assert!(err.to_string().contains("switches vs flag-metadata-expiry"));
    }
}

//! Error types for toggle-core

use thiserror::Error;

/// Errors that can occur while building profiles or segmenting a log
#[derive(Debug, Error)]
pub enum ToggleError {
    /// A rule pattern failed to compile
    #[error("Invalid pattern in profile '{profile}': {source}")]
    InvalidPattern {
        profile: String,
        #[source]
        source: regex::Error,
    },

    /// A rule references a capture group its pattern does not have
    #[error("Profile '{profile}': pattern '{pattern}' has no capture group {group}")]
    MissingGroup {
        profile: String,
        pattern: String,
        group: usize,
    },

    /// A profile name did not match any built-in or configured profile
    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    /// A commit header was found but its id could not be read
    #[error("Malformed commit header: {0}")]
    MalformedCommit(String),
}

impl ToggleError {
    /// Create a malformed commit error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedCommit(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_profile_display() {
        let err = ToggleError::UnknownProfile("yaml".to_string());
        assert_eq!(err.to_string(), "Unknown profile: yaml");
    }

    #[test]
    fn test_malformed_commit_display() {
        let err = ToggleError::malformed("missing id after sentinel");
        assert_eq!(
            err.to_string(),
            "Malformed commit header: missing id after sentinel"
        );
    }

    #[test]
    fn test_invalid_pattern_keeps_source() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = ToggleError::InvalidPattern {
            profile: "custom".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid pattern in profile 'custom'"));
        assert!(std::error::Error::source(&err).is_some());
    }
}

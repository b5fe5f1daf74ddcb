//! Commit records and the toggle events derived from them.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One commit of a segmented patch stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Full commit hash. Never empty.
    pub id: String,
    /// Commit time (not author time), if the header carried a readable one.
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Non-blank message lines, trimmed and joined by a single space.
    pub message: String,
    /// Last `Change-Id:` trailer seen in the header or message.
    pub change_id: Option<String>,
    /// Last `Reviewed-on:` trailer seen in the header or message.
    pub review_url: Option<String>,
    /// Raw patch lines, starting at the first `diff --git` line.
    pub diff_body: Vec<String>,
}

impl CommitRecord {
    /// Abbreviated hash for log output.
    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }
}

/// Which property of a toggle changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// The toggle itself was added or removed.
    Existence,
    /// The toggle's status keyword (`stable`, `experimental`, ...).
    Status,
    /// The milestone after which a flag expires.
    ExpiryMilestone,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Existence => "existence",
            Attribute::Status => "status",
            Attribute::ExpiryMilestone => "expiry_milestone",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
}

impl ChangeType {
    /// Map a diff line marker to a change type.
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '+' => Some(ChangeType::Added),
            '-' => Some(ChangeType::Removed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw payload captured from an attribute line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Text(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Integer(n) => write!(f, "{n}"),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

/// A single detected add/remove, borrowing the commit that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleEvent<'c> {
    /// Resolved toggle name; `None` when the lookback window was exhausted.
    pub toggle_name: Option<String>,
    pub attribute: Attribute,
    pub change_type: ChangeType,
    /// Absent for existence events.
    pub value: Option<AttributeValue>,
    pub source_commit: &'c CommitRecord,
    /// Tracked path the history was requested for.
    pub file_path: &'c str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_type_from_marker() {
        assert_eq!(ChangeType::from_marker('+'), Some(ChangeType::Added));
        assert_eq!(ChangeType::from_marker('-'), Some(ChangeType::Removed));
        assert_eq!(ChangeType::from_marker(' '), None);
    }

    #[test]
    fn test_attribute_serializes_snake_case() {
        let json = serde_json::to_string(&Attribute::ExpiryMilestone).unwrap();
        assert_eq!(json, "\"expiry_milestone\"");
        assert_eq!(Attribute::ExpiryMilestone.to_string(), "expiry_milestone");
    }

    #[test]
    fn test_attribute_value_display() {
        assert_eq!(AttributeValue::Integer(120).to_string(), "120");
        assert_eq!(AttributeValue::Text("stable".into()).to_string(), "stable");
    }

    #[test]
    fn test_short_id() {
        let commit = CommitRecord {
            id: "0123456789abcdef0123456789abcdef01234567".to_string(),
            timestamp: None,
            message: String::new(),
            change_id: None,
            review_url: None,
            diff_body: vec![],
        };
        assert_eq!(commit.short_id(), "0123456");

        let odd = CommitRecord {
            id: "ééééééé".to_string(),
            ..commit.clone()
        };
        assert_eq!(odd.short_id(), "ééééééé");
        let short = CommitRecord {
            id: "abc".to_string(),
            ..commit
        };
        assert_eq!(short.short_id(), "abc");
    }
}

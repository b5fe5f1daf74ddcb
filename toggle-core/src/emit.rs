//! Event emission: classified lines to [`ToggleEvent`]s to a sink.

use crate::model::{Attribute, ChangeType, CommitRecord, ToggleEvent};
use crate::profile::Profile;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Map every classified line of one commit's diff body to an event, in
/// discovery order.
///
/// Name resolution only looks at lines of the same commit. Events whose name
/// cannot be resolved are kept with `toggle_name: None`.
pub fn extract_events<'c>(
    commit: &'c CommitRecord,
    profile: &Profile,
    file_path: &'c str,
) -> Vec<ToggleEvent<'c>> {
    commit
        .diff_body
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let candidate = profile.classify(line)?;
            let toggle_name = if candidate.needs_lookback {
                profile
                    .resolver()
                    .resolve(&commit.diff_body, index, profile.lookback)
            } else {
                candidate.name
            };

            Some(ToggleEvent {
                toggle_name,
                attribute: candidate.attribute,
                change_type: candidate.change_type,
                value: candidate.value,
                source_commit: commit,
                file_path,
            })
        })
        .collect()
}

/// Receives events as they are emitted.
pub trait EventSink {
    type Error;

    fn accept(&mut self, event: &ToggleEvent<'_>) -> Result<(), Self::Error>;
}

impl EventSink for Vec<ToggleRow> {
    type Error = Infallible;

    fn accept(&mut self, event: &ToggleEvent<'_>) -> Result<(), Self::Error> {
        self.push(ToggleRow::from(event));
        Ok(())
    }
}

/// Columns a profile's output table may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    FileName,
    Toggle,
    Attribute,
    Value,
    ChangeType,
    CommitId,
    CommitDate,
    CommitMessage,
    ChangeId,
    ReviewedOn,
}

impl Column {
    pub fn header(&self) -> &'static str {
        match self {
            Column::FileName => "file_name",
            Column::Toggle => "toggle",
            Column::Attribute => "attribute",
            Column::Value => "value",
            Column::ChangeType => "change_type",
            Column::CommitId => "commit_id",
            Column::CommitDate => "commit_date",
            Column::CommitMessage => "commit_message",
            Column::ChangeId => "change_id",
            Column::ReviewedOn => "reviewed_on",
        }
    }
}

/// Owned, flat copy of an event for tabular output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleRow {
    pub file_name: String,
    pub toggle: Option<String>,
    pub attribute: Attribute,
    pub value: Option<String>,
    pub change_type: ChangeType,
    pub commit_id: String,
    pub commit_date: Option<String>,
    pub commit_message: String,
    pub change_id: Option<String>,
    pub reviewed_on: Option<String>,
}

impl ToggleRow {
    /// Text of one cell; missing values are empty.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::FileName => self.file_name.clone(),
            Column::Toggle => self.toggle.clone().unwrap_or_default(),
            Column::Attribute => self.attribute.to_string(),
            Column::Value => self.value.clone().unwrap_or_default(),
            Column::ChangeType => self.change_type.to_string(),
            Column::CommitId => self.commit_id.clone(),
            Column::CommitDate => self.commit_date.clone().unwrap_or_default(),
            Column::CommitMessage => self.commit_message.clone(),
            Column::ChangeId => self.change_id.clone().unwrap_or_default(),
            Column::ReviewedOn => self.reviewed_on.clone().unwrap_or_default(),
        }
    }
}

impl From<&ToggleEvent<'_>> for ToggleRow {
    fn from(event: &ToggleEvent<'_>) -> Self {
        let commit = event.source_commit;
        Self {
            file_name: event.file_path.to_string(),
            toggle: event.toggle_name.clone(),
            attribute: event.attribute,
            value: event.value.as_ref().map(ToString::to_string),
            change_type: event.change_type,
            commit_id: commit.id.clone(),
            commit_date: commit.timestamp.map(|ts| ts.to_rfc3339()),
            commit_message: commit.message.clone(),
            change_id: commit.change_id.clone(),
            reviewed_on: commit.review_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeValue;
    use crate::segment::{HeaderFormat, Segmenter};
    use indoc::indoc;

    const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    fn commit(body: &[&str]) -> CommitRecord {
        CommitRecord {
            id: HASH.to_string(),
            timestamp: None,
            message: "Promote FeatureX".to_string(),
            change_id: Some("Iabc".to_string()),
            review_url: None,
            diff_body: body.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn feature_x_body() -> Vec<&'static str> {
        vec![
            "diff --git a/runtime_enabled_features.json5 b/runtime_enabled_features.json5",
            "@@ -100,7 +100,13 @@",
            "     },",
            "+    {",
            "+      name: \"FeatureX\",",
            "+      origin_trial_feature_name: \"FeatureXTrial\",",
            "+      public: true,",
            "+      status: \"stable\",",
            "+    },",
        ]
    }

    #[test]
    fn test_status_resolves_name_within_window() {
        let profile = Profile::builtin("runtime-features-json5-status").unwrap();
        let commit = commit(&feature_x_body());
        let events = extract_events(&commit, &profile, "runtime_enabled_features.json5");

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.toggle_name.as_deref(), Some("FeatureX"));
        assert_eq!(event.attribute, Attribute::Status);
        assert_eq!(event.change_type, ChangeType::Added);
        assert_eq!(event.value, Some(AttributeValue::Text("stable".into())));
        assert!(std::ptr::eq(event.source_commit, &commit));
    }

    #[test]
    fn test_status_name_null_when_window_too_small() {
        let profile = Profile::builtin("runtime-features-json5-status")
            .unwrap()
            .with_lookback(2);
        let commit = commit(&feature_x_body());
        let events = extract_events(&commit, &profile, "runtime_enabled_features.json5");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].toggle_name, None);
    }

    #[test]
    fn test_replaced_status_yields_two_events() {
        let profile = Profile::builtin("runtime-features-json5-status").unwrap();
        let commit = commit(&[
            "@@ -1,4 +1,4 @@",
            "     {",
            "       name: \"FeatureY\",",
            "-      status: \"experimental\",",
            "+      status: \"stable\",",
            "     },",
        ]);
        let events = extract_events(&commit, &profile, "f.json5");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].change_type, ChangeType::Removed);
        assert_eq!(
            events[0].value,
            Some(AttributeValue::Text("experimental".into()))
        );
        assert_eq!(events[1].change_type, ChangeType::Added);
        assert_eq!(events[1].value, Some(AttributeValue::Text("stable".into())));
        assert!(events
            .iter()
            .all(|e| e.toggle_name.as_deref() == Some("FeatureY")));
    }

    #[test]
    fn test_constant_declaration_event() {
        let profile = Profile::builtin("switches").unwrap();
        let commit = commit(&[
            "diff --git a/switches.cc b/switches.cc",
            "--- a/switches.cc",
            "+++ b/switches.cc",
            "@@ -10,3 +10,4 @@",
            " const char kOther[] = \"other\";",
            "+const char kMyFeature[] = \"my-feature\";",
        ]);
        let events = extract_events(&commit, &profile, "switches.cc");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].toggle_name.as_deref(), Some("kMyFeature"));
        assert_eq!(events[0].attribute, Attribute::Existence);
        assert_eq!(events[0].change_type, ChangeType::Added);
        assert_eq!(events[0].value, None);
    }

    #[test]
    fn test_context_lines_do_not_change_event_count() {
        let profile = Profile::builtin("runtime-features-in").unwrap();
        let base = commit(&["@@ -1 +1 @@", "-OldFeature", "+NewFeature"]);
        let padded = commit(&[
            "@@ -1,5 +1,5 @@",
            " Alpha",
            "-OldFeature",
            " Beta status=stable",
            "+NewFeature",
            " Gamma",
        ]);

        let base_events = extract_events(&base, &profile, "f.in");
        let padded_events = extract_events(&padded, &profile, "f.in");
        assert_eq!(base_events.len(), 2);
        assert_eq!(padded_events.len(), base_events.len());
    }

    #[test]
    fn test_vec_sink_flattens_events() {
        let log = indoc! {"
            commit 0123456789abcdef0123456789abcdef01234567
            Author: Dev <dev@example.com>
            Date:   Tue Mar 12 10:15:00 2024 +0100

                Add expiry for FeatureZ

                Reviewed-on: https://review.example.com/c/99

            diff --git a/flag-metadata.json b/flag-metadata.json
            @@ -1,3 +1,8 @@
            +  {
            +    \"name\": \"feature-z\",
            +    \"owners\": [ \"dev@example.com\" ],
            +    \"expiry_milestone\": 130
            +  },
        "};
        let profile = Profile::builtin("flag-metadata-expiry").unwrap();
        let mut sink: Vec<ToggleRow> = Vec::new();

        for commit in Segmenter::new(log, HeaderFormat::Pretty) {
            let commit = commit.unwrap();
            for event in extract_events(&commit, &profile, "flag-metadata.json") {
                sink.accept(&event).unwrap();
            }
        }

        assert_eq!(sink.len(), 1);
        let row = &sink[0];
        assert_eq!(row.toggle.as_deref(), Some("feature-z"));
        assert_eq!(row.value.as_deref(), Some("130"));
        assert_eq!(row.commit_date.as_deref(), Some("2024-03-12T10:15:00+01:00"));
        assert_eq!(
            row.reviewed_on.as_deref(),
            Some("https://review.example.com/c/99")
        );
        assert_eq!(row.cell(Column::ChangeId), "");
        assert_eq!(row.cell(Column::Attribute), "expiry_milestone");
        assert_eq!(row.cell(Column::ChangeType), "added");
    }
}

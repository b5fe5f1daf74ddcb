//! File-format profiles: the declared pattern tables.
//!
//! A profile is pure data ([`ProfileSpec`]) compiled into a [`Profile`].
//! Built-in profiles cover the formats toggles are usually declared in;
//! more can be supplied from configuration without touching the classifier.

use crate::classify::{self, Candidate, NameSource, PatternKind, Rule, ValueSource};
use crate::emit::Column;
use crate::error::ToggleError;
use crate::model::Attribute;
use crate::resolve::NameResolver;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Names of the built-in profiles, in declaration order.
pub const BUILTIN_PROFILES: &[&str] = &[
    "runtime-features-in",
    "runtime-features-in-status",
    "runtime-features-json5",
    "runtime-features-json5-status",
    "flag-metadata-expiry",
    "switches",
];

const DEFAULT_LOOKBACK: usize = 10;

fn default_lookback() -> usize {
    DEFAULT_LOOKBACK
}

/// How a captured value is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    Text,
    Integer,
}

/// Declarative form of a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub kind: PatternKind,
    /// Defaults to `existence` for existence and constant rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<Attribute>,
    pub pattern: String,
    /// Capture group holding the toggle name; absent means look back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_group: Option<usize>,
    /// Capture group holding the attribute value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_group: Option<usize>,
    #[serde(default)]
    pub value_type: ValueType,
}

impl RuleSpec {
    fn named(kind: PatternKind, pattern: &str) -> Self {
        Self {
            kind,
            attribute: None,
            pattern: pattern.to_string(),
            name_group: Some(1),
            value_group: None,
            value_type: ValueType::Text,
        }
    }

    fn attribute(mut self, attribute: Attribute) -> Self {
        self.attribute = Some(attribute);
        self
    }

    fn name_group(mut self, group: Option<usize>) -> Self {
        self.name_group = group;
        self
    }

    fn value(mut self, group: usize, value_type: ValueType) -> Self {
        self.value_group = Some(group);
        self.value_type = value_type;
        self
    }

    /// Compile into a rule, checking that referenced groups exist.
    pub fn compile(&self, profile: &str) -> Result<Rule, ToggleError> {
        let matcher = Regex::new(&self.pattern).map_err(|source| ToggleError::InvalidPattern {
            profile: profile.to_string(),
            source,
        })?;

        let check_group = |group: usize| {
            if group < matcher.captures_len() {
                Ok(group)
            } else {
                Err(ToggleError::MissingGroup {
                    profile: profile.to_string(),
                    pattern: self.pattern.clone(),
                    group,
                })
            }
        };

        let name = match self.name_group {
            Some(group) => NameSource::Capture(check_group(group)?),
            None => NameSource::Lookback,
        };
        let value = match (self.value_group, self.value_type) {
            (None, _) => ValueSource::None,
            (Some(group), ValueType::Text) => ValueSource::Text(check_group(group)?),
            (Some(group), ValueType::Integer) => ValueSource::Integer(check_group(group)?),
        };

        Ok(Rule {
            kind: self.kind,
            attribute: self.attribute.unwrap_or(Attribute::Existence),
            matcher,
            name,
            value,
        })
    }
}

/// Declarative form of a [`Profile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Lookback window for rules without a name group.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    /// Overrides [`crate::resolve::NAME_FIELD_PATTERN`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_pattern: Option<String>,
    pub rules: Vec<RuleSpec>,
}

impl ProfileSpec {
    /// The built-in profile table.
    pub fn builtins() -> Vec<ProfileSpec> {
        vec![
            ProfileSpec {
                name: "runtime-features-in".to_string(),
                description: "Entries added to or removed from RuntimeEnabledFeatures.in"
                    .to_string(),
                lookback: DEFAULT_LOOKBACK,
                name_pattern: None,
                rules: vec![RuleSpec::named(
                    PatternKind::Existence,
                    r"^[+-]\s*([A-Za-z_][A-Za-z0-9_]*)",
                )],
            },
            ProfileSpec {
                name: "runtime-features-in-status".to_string(),
                description: "status=<value> changes in RuntimeEnabledFeatures.in".to_string(),
                lookback: DEFAULT_LOOKBACK,
                name_pattern: None,
                rules: vec![RuleSpec::named(
                    PatternKind::KeyValue,
                    r"^[+-]\s*([A-Za-z0-9_]+)\s+.*?\bstatus\s*=\s*([a-zA-Z_]+)",
                )
                .attribute(Attribute::Status)
                .value(2, ValueType::Text)],
            },
            ProfileSpec {
                name: "runtime-features-json5".to_string(),
                description: "Entries added to or removed from runtime_enabled_features.json5"
                    .to_string(),
                lookback: DEFAULT_LOOKBACK,
                name_pattern: None,
                rules: vec![RuleSpec::named(
                    PatternKind::Existence,
                    r#"^[+-]\s*"?name"?\s*:\s*"([^"\n]+)""#,
                )],
            },
            ProfileSpec {
                name: "runtime-features-json5-status".to_string(),
                description: "status changes in runtime_enabled_features.json5".to_string(),
                lookback: 10,
                name_pattern: None,
                rules: vec![RuleSpec::named(
                    PatternKind::KeyValue,
                    r#"^[+-]\s*"?status"?\s*:\s*(.*)$"#,
                )
                .attribute(Attribute::Status)
                .name_group(None)
                .value(1, ValueType::Text)],
            },
            ProfileSpec {
                name: "flag-metadata-expiry".to_string(),
                description: "expiry_milestone changes in flag-metadata.json".to_string(),
                lookback: 15,
                name_pattern: None,
                rules: vec![RuleSpec::named(
                    PatternKind::KeyValue,
                    r#"^[+-]\s*"expiry_milestone"\s*:\s*(-?\d+)"#,
                )
                .attribute(Attribute::ExpiryMilestone)
                .name_group(None)
                .value(1, ValueType::Integer)],
            },
            ProfileSpec {
                name: "switches".to_string(),
                description: "Switch constants declared in *switches*.cc".to_string(),
                lookback: DEFAULT_LOOKBACK,
                name_pattern: None,
                rules: vec![RuleSpec::named(
                    PatternKind::ConstantDeclaration,
                    r"^[+-]\s*const\s+(?:char|wchar_t|wchar|char16_t)\s+([A-Za-z_][A-Za-z0-9_]*)\[\]\s*=",
                )],
            },
        ]
    }

    pub fn compile(&self) -> Result<Profile, ToggleError> {
        let rules = self
            .rules
            .iter()
            .map(|rule| rule.compile(&self.name))
            .collect::<Result<Vec<_>, _>>()?;

        let resolver = match &self.name_pattern {
            Some(pattern) => {
                NameResolver::with_pattern(pattern).map_err(|source| {
                    ToggleError::InvalidPattern {
                        profile: self.name.clone(),
                        source,
                    }
                })?
            }
            None => NameResolver::default(),
        };

        Ok(Profile {
            name: self.name.clone(),
            description: self.description.clone(),
            lookback: self.lookback,
            rules,
            resolver,
        })
    }
}

/// A compiled file-format profile.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub description: String,
    /// Lookback window `W` used by the name resolver.
    pub lookback: usize,
    rules: Vec<Rule>,
    resolver: NameResolver,
}

impl Profile {
    /// Compile a built-in profile by name.
    pub fn builtin(name: &str) -> Result<Profile, ToggleError> {
        ProfileSpec::builtins()
            .into_iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| ToggleError::UnknownProfile(name.to_string()))?
            .compile()
    }

    /// Same profile with a different lookback window.
    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    /// Classify one diff line with this profile's rules.
    pub fn classify(&self, line: &str) -> Option<Candidate> {
        classify::classify(&self.rules, line)
    }

    /// Whether any rule resolves names by looking back.
    pub fn uses_lookback(&self) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.name == NameSource::Lookback)
    }

    /// Whether any rule reports something other than existence.
    pub fn tracks_attributes(&self) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.attribute != Attribute::Existence)
    }

    /// Column set of this profile's output table.
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = vec![Column::FileName, Column::Toggle];
        if self.tracks_attributes() {
            columns.extend([Column::Attribute, Column::Value]);
        }
        columns.extend([
            Column::ChangeType,
            Column::CommitId,
            Column::CommitDate,
            Column::CommitMessage,
            Column::ChangeId,
            Column::ReviewedOn,
        ]);
        columns
    }
}

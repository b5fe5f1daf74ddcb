//! Line classification against an ordered rule table.

use crate::model::{Attribute, AttributeValue, ChangeType};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The shape of line a rule recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// An identifier at line start, e.g. one entry of a `.in` list.
    Existence,
    /// `const <type> <NAME>[] = ...`
    ConstantDeclaration,
    /// `<key>: <value>` or `<key>=<value>` for a known attribute key.
    KeyValue,
}

/// Where a rule gets the toggle name from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    /// A capture group of the rule's own pattern.
    Capture(usize),
    /// The nearest preceding name field, see [`crate::NameResolver`].
    Lookback,
}

/// Where a rule gets the attribute value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    None,
    Text(usize),
    Integer(usize),
}

/// One row of a profile's pattern table.
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: PatternKind,
    pub attribute: Attribute,
    pub matcher: Regex,
    pub name: NameSource,
    pub value: ValueSource,
}

/// A classified diff line, before name resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub kind: PatternKind,
    pub attribute: Attribute,
    pub change_type: ChangeType,
    /// Set when the name came from the line itself.
    pub name: Option<String>,
    /// True when the name has to be found by looking back.
    pub needs_lookback: bool,
    pub value: Option<AttributeValue>,
}

impl Rule {
    /// Match one eligible diff line.
    fn apply(&self, line: &str, change_type: ChangeType) -> Option<Candidate> {
        let caps = self.matcher.captures(line)?;

        let value = match self.value {
            ValueSource::None => None,
            ValueSource::Text(group) => {
                Some(AttributeValue::Text(clean_value(caps.get(group)?.as_str())))
            }
            // A non-numeric capture is a mismatch, not an event.
            ValueSource::Integer(group) => Some(AttributeValue::Integer(
                caps.get(group)?.as_str().trim().parse().ok()?,
            )),
        };

        let (name, needs_lookback) = match self.name {
            NameSource::Capture(group) => (Some(caps.get(group)?.as_str().to_string()), false),
            NameSource::Lookback => (None, true),
        };

        Some(Candidate {
            kind: self.kind,
            attribute: self.attribute,
            change_type,
            name,
            needs_lookback,
            value,
        })
    }
}

/// Change type of an added/removed line; `None` for context lines and the
/// `+++`/`---` file headers.
pub fn eligible(line: &str) -> Option<ChangeType> {
    if line.starts_with("+++") || line.starts_with("---") {
        return None;
    }
    line.chars().next().and_then(ChangeType::from_marker)
}

/// Classify a diff line. The first matching rule wins.
pub fn classify(rules: &[Rule], line: &str) -> Option<Candidate> {
    let change_type = eligible(line)?;
    rules.iter().find_map(|rule| rule.apply(line, change_type))
}

/// Strip whitespace, trailing commas and quotes from a raw value.
fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_matches(',')
        .trim()
        .trim_matches('"')
        .to_string()
}

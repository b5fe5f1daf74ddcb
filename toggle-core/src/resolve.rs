//! Bounded backward search for the toggle an attribute line belongs to.

use regex::Regex;

/// Matches `"name": "<value>"` or `name: "<value>"`, on added, removed or
/// context lines.
pub const NAME_FIELD_PATTERN: &str = r#"^[+\-\s]*"?name"?\s*:\s*"([^"\n]+)""#;

/// Finds the nearest name field above a line of a diff body.
#[derive(Debug, Clone)]
pub struct NameResolver {
    pattern: Regex,
}

impl Default for NameResolver {
    fn default() -> Self {
        Self {
            pattern: Regex::new(NAME_FIELD_PATTERN).expect("valid regex"),
        }
    }
}

impl NameResolver {
    /// Use a custom name-field pattern. Group 1 must capture the name.
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Scan `lines[index-1]` down to `lines[index-window]`, nearest first.
    ///
    /// Returns `None` when no name field lies within the window. Lines further
    /// up are never considered, even if they hold the right name.
    pub fn resolve<S: AsRef<str>>(&self, lines: &[S], index: usize, window: usize) -> Option<String> {
        if index > lines.len() {
            return None;
        }
        let start = index.saturating_sub(window);

        lines[start..index].iter().rev().find_map(|line| {
            self.pattern
                .captures(line.as_ref())
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
    }
}

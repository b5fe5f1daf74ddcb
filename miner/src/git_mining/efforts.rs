//! Per-commit change size from `git log --numstat`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn commit_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-f]{40}$").expect("valid regex"))
}

/// Files and lines touched by one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEffort {
    pub commit: String,
    pub files_changed: usize,
    pub lines_added: u64,
    pub lines_removed: u64,
}

impl CommitEffort {
    fn new(commit: &str) -> Self {
        Self {
            commit: commit.to_string(),
            files_changed: 0,
            lines_added: 0,
            lines_removed: 0,
        }
    }

    pub fn cells(&self) -> [String; 4] {
        [
            self.commit.clone(),
            self.files_changed.to_string(),
            self.lines_added.to_string(),
            self.lines_removed.to_string(),
        ]
    }
}

/// Parse `--format=%H --numstat` output, one entry per commit hash line.
///
/// Binary files report `-` for both counts; they count as changed files
/// with no lines. Lines that are neither a hash nor a numstat entry are
/// ignored, as are entries before the first hash.
pub fn parse_numstat(output: &str) -> Vec<CommitEffort> {
    let mut efforts = Vec::new();
    let mut current: Option<CommitEffort> = None;

    for line in output.lines().map(str::trim) {
        if commit_line_re().is_match(line) {
            efforts.extend(current.replace(CommitEffort::new(line)));
            continue;
        }
        let Some(effort) = current.as_mut() else {
            continue;
        };
        if let Some((added, removed)) = numstat_counts(line) {
            effort.files_changed += 1;
            effort.lines_added += added;
            effort.lines_removed += removed;
        }
    }

    efforts.extend(current);
    efforts
}

fn numstat_counts(line: &str) -> Option<(u64, u64)> {
    let parts: Vec<&str> = line.split('\t').collect();
    let [added, removed, _path] = parts.as_slice() else {
        return None;
    };
    Some((count(added)?, count(removed)?))
}

fn count(field: &str) -> Option<u64> {
    match field {
        "-" => Some(0),
        n => n.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::formatdoc;

    const FIRST: &str = "3333333333333333333333333333333333333333";
    const SECOND: &str = "4444444444444444444444444444444444444444";

    #[test]
    fn test_parse_numstat() {
        let output = formatdoc!(
            "
            {first}

            10\t2\tchrome/browser/flag-metadata.json
            1\t0\tchrome/common/chrome_switches.cc
            -\t-\tchrome/app/theme/icon.png
            {second}

            0\t7\tthird_party/blink/renderer/platform/runtime_enabled_features.json5
            ",
            first = FIRST,
            second = SECOND
        );

        assert_eq!(
            parse_numstat(&output),
            vec![
                CommitEffort {
                    commit: FIRST.to_string(),
                    files_changed: 3,
                    lines_added: 11,
                    lines_removed: 2,
                },
                CommitEffort {
                    commit: SECOND.to_string(),
                    files_changed: 1,
                    lines_added: 0,
                    lines_removed: 7,
                },
            ]
        );
    }

    #[test]
    fn test_malformed_lines_are_ignored() {
        let output = format!(
            "5\t5\tbefore-any-commit.txt\n\
             {FIRST}\n\
             x\t1\tnot-a-number.txt\n\
             2\t1\n\
             4\t1\tok.txt\n\
             {SECOND}\n"
        );
        let efforts = parse_numstat(&output);

        assert_eq!(efforts.len(), 2);
        assert_eq!(efforts[0].files_changed, 1);
        assert_eq!((efforts[0].lines_added, efforts[0].lines_removed), (4, 1));
        // Merge commits and empty commits report nothing.
        assert_eq!(efforts[1], CommitEffort::new(SECOND));
    }

    #[test]
    fn test_cells() {
        let effort = CommitEffort {
            commit: FIRST.to_string(),
            files_changed: 2,
            lines_added: 30,
            lines_removed: 4,
        };
        assert_eq!(effort.cells(), [FIRST.to_string(), "2".into(), "30".into(), "4".into()]);
    }
}

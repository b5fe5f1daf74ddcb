//! Commit stream segmentation.
//!
//! Splits the output of `git log -p` into one [`CommitRecord`] per commit.
//! Each commit walks the regions `Header -> Message -> Diff`; a new header
//! marker always starts a new commit, whatever region the previous one was in.

use crate::error::ToggleError;
use crate::model::CommitRecord;
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::str::Lines;
use std::sync::OnceLock;

/// Token written before each commit by [`HeaderFormat::sentinel`].
pub const DEFAULT_SENTINEL: &str = "--COMMIT--";

/// Line that opens a commit's patch.
const DIFF_START: &str = "diff --git";

/// Date layout printed by `git log` in its built-in pretty formats.
const GIT_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y %z";

fn pretty_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^commit ([0-9a-f]{40})\b").expect("valid regex"))
}

fn commit_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-f]{40}$").expect("valid regex"))
}

fn change_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Change-Id:\s*([A-Za-z0-9]+)").expect("valid regex"))
}

fn reviewed_on_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Reviewed-on:\s*(https?://[^\s]+)").expect("valid regex"))
}

/// How commit boundaries are written in the log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderFormat {
    /// git's built-in layouts (`medium`, `fuller`): `commit <hash>`, header
    /// fields, blank line, indented message. `CommitDate:` wins over `Date:`.
    Pretty,
    /// A sentinel line, then the hash on its own line, then an ISO 8601
    /// commit date, then the raw message (`--format=<token>%n%H%n%cI%n%B`).
    Sentinel { token: String },
}

impl HeaderFormat {
    /// Sentinel format using [`DEFAULT_SENTINEL`].
    pub fn sentinel() -> Self {
        HeaderFormat::Sentinel {
            token: DEFAULT_SENTINEL.to_string(),
        }
    }

    /// Value for `git log --format=` that produces this layout.
    pub fn git_format(&self) -> String {
        match self {
            HeaderFormat::Pretty => "fuller".to_string(),
            HeaderFormat::Sentinel { token } => format!("{token}%n%H%n%cI%n%B"),
        }
    }

    /// Returns `Some(id)` when `line` opens a commit. The id is `None` for
    /// formats that carry it on a later line.
    fn marker<'l>(&self, line: &'l str) -> Option<Option<&'l str>> {
        match self {
            HeaderFormat::Pretty => pretty_marker_re()
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| Some(m.as_str())),
            HeaderFormat::Sentinel { token } => line.starts_with(token.as_str()).then_some(None),
        }
    }
}

/// Where the segmenter is within the current commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Header,
    Message,
    Diff,
}

/// What a line means for the region state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// A commit header marker.
    Marker,
    /// The last header field has been read.
    HeaderDone,
    /// A `diff --git` line.
    DiffStart,
    /// Anything else.
    Plain,
}

impl Region {
    /// Transition table.
    pub fn on(self, signal: Signal) -> Region {
        match (self, signal) {
            (_, Signal::Marker) => Region::Header,
            (Region::Header, Signal::HeaderDone) => Region::Message,
            (Region::Header | Region::Message, Signal::DiffStart) => Region::Diff,
            (region, _) => region,
        }
    }
}

/// Accumulates the fields of one commit between two markers.
#[derive(Debug)]
struct CommitBuilder {
    region: Region,
    id: Option<String>,
    timestamp: Option<DateTime<FixedOffset>>,
    has_commit_date: bool,
    message: Vec<String>,
    change_id: Option<String>,
    review_url: Option<String>,
    diff_body: Vec<String>,
}

impl CommitBuilder {
    fn open(id: Option<&str>) -> Self {
        Self {
            region: Region::Header,
            id: id.map(str::to_string),
            timestamp: None,
            has_commit_date: false,
            message: Vec::new(),
            change_id: None,
            review_url: None,
            diff_body: Vec::new(),
        }
    }

    fn feed(&mut self, line: &str, format: &HeaderFormat) {
        let signal = match self.region {
            Region::Header => {
                self.capture_trailers(line);
                self.read_header(line, format)
            }
            Region::Message => {
                self.capture_trailers(line);
                if line.starts_with(DIFF_START) {
                    Signal::DiffStart
                } else {
                    let text = line.trim();
                    if !text.is_empty() {
                        self.message.push(text.to_string());
                    }
                    Signal::Plain
                }
            }
            Region::Diff => Signal::Plain,
        };

        self.region = self.region.on(signal);
        if self.region == Region::Diff {
            self.diff_body.push(line.to_string());
        }
    }

    fn read_header(&mut self, line: &str, format: &HeaderFormat) -> Signal {
        if line.starts_with(DIFF_START) {
            return Signal::DiffStart;
        }

        match format {
            HeaderFormat::Pretty => {
                if line.trim().is_empty() {
                    return Signal::HeaderDone;
                }
                if let Some(rest) = line.strip_prefix("CommitDate:") {
                    self.timestamp = parse_commit_date(rest);
                    self.has_commit_date = true;
                } else if let Some(rest) = line.strip_prefix("Date:") {
                    if !self.has_commit_date {
                        self.timestamp = parse_commit_date(rest);
                    }
                }
                Signal::Plain
            }
            HeaderFormat::Sentinel { .. } => {
                let text = line.trim();
                if self.id.is_none() {
                    if text.is_empty() {
                        return Signal::HeaderDone;
                    }
                    self.id = Some(text.to_string());
                    return Signal::Plain;
                }
                if !text.is_empty() {
                    self.timestamp = parse_commit_date(text);
                }
                Signal::HeaderDone
            }
        }
    }

    fn capture_trailers(&mut self, line: &str) {
        if let Some(caps) = change_id_re().captures(line) {
            self.change_id = Some(caps[1].to_string());
        }
        if let Some(caps) = reviewed_on_re().captures(line) {
            self.review_url = Some(caps[1].to_string());
        }
    }

    fn build(self) -> Result<CommitRecord, ToggleError> {
        let id = match self.id {
            Some(id) if commit_id_re().is_match(&id) => id,
            Some(id) => {
                return Err(ToggleError::malformed(format!(
                    "commit header with invalid id '{}'",
                    id
                )))
            }
            None => return Err(ToggleError::malformed("commit header without an id")),
        };

        Ok(CommitRecord {
            id,
            timestamp: self.timestamp,
            message: self.message.join(" "),
            change_id: self.change_id,
            review_url: self.review_url,
            diff_body: self.diff_body,
        })
    }
}

/// Parse a commit date as printed by `Date:` headers or `%cI`.
pub fn parse_commit_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, GIT_DATE_FORMAT))
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .ok()
}

/// Lazy iterator over the commits of a patch stream, in stream order.
///
/// Yields one item per header marker. Lines before the first marker are
/// ignored, so a stream without markers yields nothing.
pub struct Segmenter<'a> {
    lines: Lines<'a>,
    format: HeaderFormat,
    current: Option<CommitBuilder>,
}

impl<'a> Segmenter<'a> {
    pub fn new(log: &'a str, format: HeaderFormat) -> Self {
        Self {
            lines: log.lines(),
            format,
            current: None,
        }
    }
}

impl Iterator for Segmenter<'_> {
    type Item = Result<CommitRecord, ToggleError>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            if let Some(id) = self.format.marker(line) {
                let finished = self.current.replace(CommitBuilder::open(id));
                match finished {
                    Some(builder) => return Some(builder.build()),
                    None => continue,
                }
            }
            if let Some(builder) = self.current.as_mut() {
                builder.feed(line, &self.format);
            }
        }
        self.current.take().map(CommitBuilder::build)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::formatdoc;

    const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const HASH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const HASH_C: &str = "cccccccccccccccccccccccccccccccccccccccc";

    fn records(log: &str, format: HeaderFormat) -> Vec<CommitRecord> {
        Segmenter::new(log, format)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn pretty_log() -> String {
        formatdoc!(
            "
                commit {a}
                Author: Dev One <one@example.com>
                Date:   Tue Mar 12 10:15:00 2024 +0100

                    Add FeatureX toggle

                    Change-Id: I0123abc
                    Reviewed-on: https://review.example.com/c/1234

                diff --git a/features.in b/features.in
                --- a/features.in
                +++ b/features.in
                @@ -1,2 +1,3 @@
                 Existing
                +FeatureX

                commit {b}
                Author: Dev Two <two@example.com>
                Date:   Mon Mar 11 09:00:00 2024 +0000

                    Initial import

                diff --git a/features.in b/features.in
                +Existing
            ",
            a = HASH_A,
            b = HASH_B
        )
    }

    #[test]
    fn test_pretty_format_segments_in_order() {
        let commits = records(&pretty_log(), HeaderFormat::Pretty);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].id, HASH_A);
        assert_eq!(commits[1].id, HASH_B);
    }

    #[test]
    fn test_pretty_format_reads_fields() {
        let commits = records(&pretty_log(), HeaderFormat::Pretty);
        let first = &commits[0];

        assert_eq!(
            first.timestamp.unwrap().to_rfc3339(),
            "2024-03-12T10:15:00+01:00"
        );
        assert_eq!(
            first.message,
            "Add FeatureX toggle Change-Id: I0123abc Reviewed-on: https://review.example.com/c/1234"
        );
        assert_eq!(first.change_id.as_deref(), Some("I0123abc"));
        assert_eq!(
            first.review_url.as_deref(),
            Some("https://review.example.com/c/1234")
        );
        assert_eq!(first.diff_body[0], "diff --git a/features.in b/features.in");
        assert!(first.diff_body.contains(&"+FeatureX".to_string()));
        // Trailers never leak into the next commit.
        assert_eq!(commits[1].change_id, None);
        assert_eq!(commits[1].message, "Initial import");
    }

    #[test]
    fn test_commit_date_wins_over_author_date() {
        let log = formatdoc!(
            "
                commit {a}
                Author:     Dev <dev@example.com>
                AuthorDate: Mon Jan 01 00:00:00 2024 +0000
                Commit:     Dev <dev@example.com>
                CommitDate: Fri Feb 02 12:30:00 2024 +0000

                    msg
            ",
            a = HASH_A
        );
        let commits = records(&log, HeaderFormat::Pretty);
        assert_eq!(
            commits[0].timestamp.unwrap().to_rfc3339(),
            "2024-02-02T12:30:00+00:00"
        );
    }

    #[test]
    fn test_sentinel_format() {
        let log = formatdoc!(
            "
                --COMMIT--
                {a}
                2024-05-01T08:00:00+02:00

                diff --git a/flags.json b/flags.json
                +  \"expiry_milestone\": 120,
                --COMMIT--
                {b}
                2024-04-01T08:00:00+00:00

                diff --git a/flags.json b/flags.json
                -  \"expiry_milestone\": 110,
            ",
            a = HASH_A,
            b = HASH_B
        );
        let commits = records(&log, HeaderFormat::sentinel());

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].id, HASH_A);
        assert_eq!(
            commits[0].timestamp.unwrap().to_rfc3339(),
            "2024-05-01T08:00:00+02:00"
        );
        assert_eq!(commits[0].message, "");
        assert_eq!(commits[0].diff_body.len(), 2);
        assert_eq!(commits[1].diff_body[1], "-  \"expiry_milestone\": 110,");
    }

    #[test]
    fn test_n_markers_yield_n_records() {
        let mut log = String::from("preamble that is not a commit\n");
        for hash in [HASH_A, HASH_B, HASH_C] {
            log.push_str(&format!("--COMMIT--\n{hash}\n2024-01-01T00:00:00Z\n\n"));
        }
        let commits = records(&log, HeaderFormat::sentinel());
        let ids: Vec<_> = commits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![HASH_A, HASH_B, HASH_C]);
    }

    #[test]
    fn test_no_markers_yields_nothing() {
        let log = "diff --git a/x b/x\n+Foo\n-Bar\n";
        assert_eq!(Segmenter::new(log, HeaderFormat::Pretty).count(), 0);
        assert_eq!(Segmenter::new("", HeaderFormat::sentinel()).count(), 0);
    }

    #[test]
    fn test_second_header_before_diff_starts_new_commit() {
        let log = format!(
            "commit {HASH_A}\nDate:   Tue Mar 12 10:15:00 2024 +0100\n\n    first\n\
             commit {HASH_B}\nDate:   Tue Mar 12 11:15:00 2024 +0100\n\n    second\n\
             diff --git a/x b/x\n+Foo\n"
        );
        let commits = records(&log, HeaderFormat::Pretty);

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].message, "first");
        assert!(commits[0].diff_body.is_empty());
        assert_eq!(commits[1].message, "second");
        assert_eq!(commits[1].diff_body, vec!["diff --git a/x b/x", "+Foo"]);
    }

    #[test]
    fn test_duplicate_trailers_last_wins() {
        let log = formatdoc!(
            "
                commit {a}
                Date:   Tue Mar 12 10:15:00 2024 +0100

                    Reland feature

                    Change-Id: Ifirst
                    Reviewed-on: https://review.example.com/c/1
                    Change-Id: Isecond
                    Reviewed-on: https://review.example.com/c/2

                diff --git a/x b/x
                +Change-Id: Iindiff
            ",
            a = HASH_A
        );
        let commits = records(&log, HeaderFormat::Pretty);
        assert_eq!(commits[0].change_id.as_deref(), Some("Isecond"));
        assert_eq!(
            commits[0].review_url.as_deref(),
            Some("https://review.example.com/c/2")
        );
    }

    #[test]
    fn test_unparsable_date_keeps_commit() {
        let log = format!("--COMMIT--\n{HASH_A}\nnot a date\n\ndiff --git a/x b/x\n+Foo\n");
        let commits = records(&log, HeaderFormat::sentinel());
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].timestamp, None);
        assert_eq!(commits[0].diff_body.len(), 2);
    }

    #[test]
    fn test_sentinel_without_id_is_malformed() {
        let log = format!("--COMMIT--\n\n--COMMIT--\n{HASH_B}\n2024-01-01T00:00:00Z\n");
        let items: Vec<_> = Segmenter::new(&log, HeaderFormat::sentinel()).collect();

        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Err(ToggleError::MalformedCommit(_))));
        assert_eq!(items[1].as_ref().unwrap().id, HASH_B);
    }

    #[test]
    fn test_sentinel_id_must_be_full_hash() {
        let log = format!(
            "--COMMIT--\néééééééé\n2024-01-01T00:00:00Z\n\n\
             --COMMIT--\n{}\n2024-01-01T00:00:00Z\n\n\
             --COMMIT--\n{HASH_C}\n2024-01-01T00:00:00Z\n",
            &HASH_A[..12]
        );
        let items: Vec<_> = Segmenter::new(&log, HeaderFormat::sentinel()).collect();

        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], Err(ToggleError::MalformedCommit(_))));
        assert!(matches!(items[1], Err(ToggleError::MalformedCommit(_))));
        assert_eq!(items[2].as_ref().unwrap().id, HASH_C);
    }

    #[test]
    fn test_region_transitions() {
        assert_eq!(Region::Header.on(Signal::HeaderDone), Region::Message);
        assert_eq!(Region::Message.on(Signal::DiffStart), Region::Diff);
        assert_eq!(Region::Header.on(Signal::DiffStart), Region::Diff);
        assert_eq!(Region::Diff.on(Signal::Marker), Region::Header);
        assert_eq!(Region::Message.on(Signal::Marker), Region::Header);
        assert_eq!(Region::Message.on(Signal::HeaderDone), Region::Message);
        assert_eq!(Region::Diff.on(Signal::Plain), Region::Diff);
    }

    #[test]
    fn test_git_format_strings() {
        assert_eq!(HeaderFormat::sentinel().git_format(), "--COMMIT--%n%H%n%cI%n%B");
        assert_eq!(HeaderFormat::Pretty.git_format(), "fuller");
    }
}

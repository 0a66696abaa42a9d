//! Rule-based diff summarization.
//!
//! A summary is a bag of keywords taken from added lines plus a sequence of
//! coarse frontend/backend tags. It is not a semantic analysis of the diff;
//! it only has to be stable enough to serve as a prompt fragment and as a
//! cache key.

use std::collections::BTreeSet;
use std::fmt;

/// Extension tokens that mark a line as touching frontend code.
const FRONTEND_TOKENS: [&str; 6] = ["js", "jsx", "ts", "tsx", "css", "html"];

/// Extension tokens that mark a line as touching backend code.
const BACKEND_TOKENS: [&str; 4] = ["py", "go", "rb", "php"];

/// Canonical text for a summary with neither tags nor keywords.
pub const GENERAL_UPDATES: &str = "general updates";

/// Coarse area tag attached to a diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTag {
    Frontend,
    Backend,
}

impl ChangeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeTag::Frontend => "frontend changes",
            ChangeTag::Backend => "backend updates",
        }
    }

    /// Classify a single diff line.
    ///
    /// This is a substring test, not an extension parse: any line containing
    /// the letters `go` is tagged as backend, and `+++ b/app.js` is tagged as
    /// frontend because of the header itself.
    fn classify(line: &str) -> Option<Self> {
        if FRONTEND_TOKENS.iter().any(|token| line.contains(token)) {
            Some(ChangeTag::Frontend)
        } else if BACKEND_TOKENS.iter().any(|token| line.contains(token)) {
            Some(ChangeTag::Backend)
        } else {
            None
        }
    }
}

impl fmt::Display for ChangeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single modified file and its unified diff text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub file_path: String,
    pub raw_diff: String,
}

impl Change {
    pub fn new(file_path: impl Into<String>, raw_diff: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            raw_diff: raw_diff.into(),
        }
    }

    pub fn summarize(&self) -> DiffSummary {
        summarize(&self.raw_diff)
    }
}

/// Keywords, tags, and line counts extracted from a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Whitespace-separated tokens from added lines (without the `+`), sorted.
    pub keyword_set: BTreeSet<String>,
    /// One tag per matching line, in encounter order.
    pub tags: Vec<ChangeTag>,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Merge several summaries into one.
    ///
    /// Tags keep their order across inputs, keyword sets are unioned and the
    /// line counts are summed.
    pub fn combine<'a>(summaries: impl IntoIterator<Item = &'a DiffSummary>) -> DiffSummary {
        let mut combined = DiffSummary::default();
        for summary in summaries {
            combined.tags.extend(summary.tags.iter().copied());
            combined
                .keyword_set
                .extend(summary.keyword_set.iter().cloned());
            combined.insertions += summary.insertions;
            combined.deletions += summary.deletions;
        }
        combined
    }

    /// Total number of changed lines.
    pub fn changed_lines(&self) -> usize {
        self.insertions + self.deletions
    }

    pub fn is_empty(&self) -> bool {
        self.keyword_set.is_empty() && self.tags.is_empty()
    }

    /// Render the summary as used in prompts and as the cache key.
    ///
    /// Tags are space-joined, followed by the keywords joined with `|`.
    pub fn canonical(&self) -> String {
        if self.is_empty() {
            return GENERAL_UPDATES.to_string();
        }

        let tags = self
            .tags
            .iter()
            .map(ChangeTag::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        let keywords = self
            .keyword_set
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("|");

        match (tags.is_empty(), keywords.is_empty()) {
            (false, false) => format!("{tags} {keywords}"),
            (false, true) => tags,
            _ => keywords,
        }
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

fn is_added_line(line: &str) -> bool {
    line.starts_with('+') && !line.starts_with("+++")
}

fn is_removed_line(line: &str) -> bool {
    line.starts_with('-') && !line.starts_with("---")
}

/// Summarize a unified diff.
pub fn summarize(raw_diff: &str) -> DiffSummary {
    let mut summary = DiffSummary::default();

    for line in raw_diff.lines() {
        if is_added_line(line) {
            summary.insertions += 1;
            summary
                .keyword_set
                .extend(line[1..].split_whitespace().map(str::to_string));
        } else if is_removed_line(line) {
            summary.deletions += 1;
        }

        if let Some(tag) = ChangeTag::classify(line) {
            summary.tags.push(tag);
        }
    }

    summary
}

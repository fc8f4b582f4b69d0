//! Git output parser (git log -p --pretty=raw)

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use super::dates::{from_epoch_seconds, zone_offset};
use super::{ParseError, Parser};
use crate::model::{FileAction, Modification, ModifiedFile, SourceKind};

/// Regex for the raw author header
/// Format: `author <name> <<email>> <epoch seconds> <+zzzz>`
/// Example: `author Jane Doe <jane@example.com> 1104364800 +0100`
static AUTHOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^author (.*?) <([^>]*)> (\d+) ([+-]\d{4})$").expect("Invalid git author regex")
});

/// Regex for the start of a commit
static COMMIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^commit ([0-9a-f]{7,64})\b").expect("Invalid git commit regex"));

/// Regex for a per-file diff header
/// Example: `diff --git a/src/old.rs b/src/new.rs`
static DIFF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^diff --git a/(.+) b/(.+)$").expect("Invalid git diff regex"));

/// Message lines are indented by four spaces in raw format
const MESSAGE_INDENT: &str = "    ";

impl Parser {
    /// Parse `git log -p --pretty=raw` output
    ///
    /// Format:
    /// ```text
    /// commit <sha>
    /// tree <sha>
    /// parent <sha>
    /// author Name <email> 1104364800 +0100
    /// committer Name <email> 1104364800 +0100
    ///
    ///     message
    ///
    /// diff --git a/file b/file
    /// new file mode 100644
    /// ...
    /// ```
    ///
    /// One Modification per commit with the commit sha as revision. The line
    /// after each `diff --git` header decides the file action.
    pub fn parse_git_log(output: &str) -> Result<Vec<Modification>, ParseError> {
        let mut modifications = Vec::new();
        let mut current: Option<PendingCommit> = None;
        let mut lines = output.lines().peekable();

        while let Some(line) = lines.next() {
            if let Some(caps) = COMMIT_REGEX.captures(line) {
                if let Some(done) = current.take().and_then(PendingCommit::finish) {
                    modifications.push(done);
                }
                current = Some(PendingCommit::new(&caps[1]));
                continue;
            }
            let Some(commit) = current.as_mut() else {
                continue;
            };

            if let Some(caps) = AUTHOR_REGEX.captures(line) {
                commit.author = Some(caps[1].to_string());
                commit.email = Some(caps[2].to_string()).filter(|e| !e.is_empty());
                commit.time = from_epoch_seconds(&caps[3]);
                if zone_offset(&caps[4]).is_none() {
                    warn!(commit = %commit.sha, zone = &caps[4], "Odd git author zone");
                }
            } else if let Some(text) = line.strip_prefix(MESSAGE_INDENT) {
                if commit.files.is_empty() {
                    commit.message.push(text);
                }
            } else if let Some(caps) = DIFF_REGEX.captures(line) {
                let next = lines.peek().copied().unwrap_or_default();
                let action = if next.starts_with("new file mode") {
                    FileAction::Added
                } else if next.starts_with("deleted file mode") {
                    FileAction::Deleted
                } else if next.starts_with("similarity index") || caps[1] != caps[2] {
                    FileAction::Renamed
                } else {
                    FileAction::Modified
                };
                commit
                    .files
                    .push(ModifiedFile::from_path(&caps[2], action, None));
            }
        }

        if let Some(done) = current.and_then(PendingCommit::finish) {
            modifications.push(done);
        }
        Ok(modifications)
    }
}

/// A commit being assembled from raw log lines
struct PendingCommit<'a> {
    sha: String,
    author: Option<String>,
    email: Option<String>,
    time: Option<chrono::DateTime<chrono::Utc>>,
    message: Vec<&'a str>,
    files: Vec<ModifiedFile>,
}

impl<'a> PendingCommit<'a> {
    fn new(sha: &str) -> Self {
        Self {
            sha: sha.to_string(),
            author: None,
            email: None,
            time: None,
            message: Vec::new(),
            files: Vec::new(),
        }
    }

    fn finish(self) -> Option<Modification> {
        let Some(time) = self.time else {
            warn!(commit = %self.sha, "Git commit without a readable author date, skipping");
            return None;
        };
        let mut modification = Modification::new(SourceKind::Git, time);
        modification.user_name = self.author.unwrap_or_default();
        modification.email_address = self.email;
        modification.comment = self.message.join("\n").trim_end().to_string();
        modification.revision = self.sha;
        modification.files = self.files;
        Some(modification)
    }
}

//! Modification (detected changeset) data model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Originating source of a modification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Cvs,
    Svn,
    Git,
    Mercurial,
    ClearCase,
    BuildStatus,
}

impl SourceKind {
    /// Tag used in logs and serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cvs => "cvs",
            Self::Svn => "svn",
            Self::Git => "git",
            Self::Mercurial => "mercurial",
            Self::ClearCase => "clearcase",
            Self::BuildStatus => "buildstatus",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a file in a modification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Added,
    Modified,
    Deleted,
    Renamed,
    /// Tool-specific action kept verbatim (e.g. ClearCase operation names)
    Other(String),
}

impl FileAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Renamed => "renamed",
            Self::Other(action) => action,
        }
    }

    pub fn is_deletion(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single file touched by a modification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifiedFile {
    /// File name without its folder
    pub file_name: String,

    /// Containing folder, if the tool reported one
    pub folder_name: Option<String>,

    pub action: FileAction,

    /// Per-file revision (CVS, ClearCase); None for transactional tools
    pub revision: Option<String>,
}

impl ModifiedFile {
    /// Build from a full path, splitting folder and name at the last `/`
    ///
    /// `"src/main.rs"` -> folder `Some("src")`, name `"main.rs"`.
    /// `"/trunk/a.txt"` -> folder `Some("/trunk")`, name `"a.txt"`.
    /// `"README"` -> folder `None`, name `"README"`.
    pub fn from_path(path: &str, action: FileAction, revision: Option<String>) -> Self {
        let (folder_name, file_name) = match path.rfind('/') {
            Some(0) => (Some("/".to_string()), path[1..].to_string()),
            Some(idx) => (Some(path[..idx].to_string()), path[idx + 1..].to_string()),
            None => (None, path.to_string()),
        };
        Self {
            file_name,
            folder_name,
            action,
            revision,
        }
    }

    /// Full path (folder + name)
    pub fn path(&self) -> String {
        match self.folder_name.as_deref() {
            Some("/") => format!("/{}", self.file_name),
            Some(folder) => format!("{}/{}", folder, self.file_name),
            None => self.file_name.clone(),
        }
    }
}

/// One normalized change unit reported by a source control
///
/// Equality compares every field including the file list. Chronological
/// ordering is provided by [`sort_chronologically`] rather than `Ord`, since
/// two distinct modifications may share a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modification {
    #[serde(rename = "type")]
    pub kind: SourceKind,

    pub modified_time: DateTime<Utc>,

    pub user_name: String,

    /// Resolved through the alias table or reported by the tool
    pub email_address: Option<String>,

    pub comment: String,

    /// Changeset identifier (numeric, dotted or hash, depending on the tool)
    pub revision: String,

    pub files: Vec<ModifiedFile>,
}

impl Modification {
    /// Create an empty modification of the given kind at the given time
    pub fn new(kind: SourceKind, modified_time: DateTime<Utc>) -> Self {
        Self {
            kind,
            modified_time,
            user_name: String::new(),
            email_address: None,
            comment: String::new(),
            revision: String::new(),
            files: Vec::new(),
        }
    }

    /// True if any file in this modification was deleted
    pub fn has_deletion(&self) -> bool {
        self.files.iter().any(|f| f.action.is_deletion())
    }
}

/// Stable sort by `modified_time`; equal timestamps keep their parse order
pub fn sort_chronologically(modifications: &mut [Modification]) {
    modifications.sort_by_key(|m| m.modified_time);
}

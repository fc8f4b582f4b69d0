//! Build log directory conventions
//!
//! A project's build history is a directory of XML logs named
//! `log<yyyyMMddHHmmss>[L<label>].xml`. The timestamp is local time; a log
//! carrying an `L<label>` suffix records a successful build.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use super::constants::build_log::{LABEL_MARKER, PREFIX, SUFFIX, TIME_FORMAT};

/// Length of the `yyyyMMddHHmmss` stamp
const STAMP_LEN: usize = 14;

/// One parsed log file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLogFile {
    pub path: PathBuf,
    pub file_name: String,
    pub time: DateTime<Utc>,
    /// Present only for successful builds
    pub label: Option<String>,
}

impl BuildLogFile {
    /// Parse a log file name; returns None for anything else in the directory
    ///
    /// Examples:
    /// - `log20040102030405.xml` -> failed build at 2004-01-02 03:04:05
    /// - `log20040102030405Lbuild.7.xml` -> successful build labeled "build.7"
    pub fn parse(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let body = file_name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
        let stamp = body.get(..STAMP_LEN)?;
        let rest = &body[STAMP_LEN..];

        let label = if rest.is_empty() {
            None
        } else {
            Some(rest.strip_prefix(LABEL_MARKER)?.to_string())
        };

        Some(Self {
            path: path.to_path_buf(),
            file_name: file_name.to_string(),
            time: parse_stamp(stamp)?,
            label,
        })
    }

    pub fn is_successful(&self) -> bool {
        self.label.is_some()
    }

    /// The `yyyyMMddHHmmss` stamp in local time
    pub fn stamp(&self) -> String {
        format_stamp(self.time)
    }
}

/// Format a time the way log file names do (local time)
pub fn format_stamp(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

fn parse_stamp(stamp: &str) -> Option<DateTime<Utc>> {
    if !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(stamp, TIME_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

/// All build logs in `dir`, oldest first
pub fn scan_log_dir(dir: &Path) -> io::Result<Vec<BuildLogFile>> {
    let mut logs: Vec<BuildLogFile> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| BuildLogFile::parse(&entry.path()))
        .collect();
    logs.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.file_name.cmp(&b.file_name)));
    debug!(log_dir = %dir.display(), count = logs.len(), "Scanned build log directory");
    Ok(logs)
}

/// Newest successful build in `dir`
pub fn latest_success(dir: &Path) -> io::Result<Option<BuildLogFile>> {
    Ok(scan_log_dir(dir)?
        .into_iter()
        .rev()
        .find(BuildLogFile::is_successful))
}

/// Read `<property name="projectname" value="..."/>` from a build log
pub fn read_project_name(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let doc = roxmltree::Document::parse(&text).ok()?;
    doc.descendants()
        .filter(|n| n.has_tag_name("property"))
        .find(|n| n.attribute("name") == Some("projectname"))
        .and_then(|n| n.attribute("value"))
        .map(str::to_string)
}

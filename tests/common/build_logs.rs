//! Build log directory fixtures

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use modwatch::vcs::build_log::format_stamp;

/// Write `log<stamp>[L<label>].xml` naming `project`, returning its path
pub fn write_build_log(
    dir: &Path,
    time: DateTime<Utc>,
    label: Option<&str>,
    project: &str,
) -> PathBuf {
    let name = match label {
        Some(label) => format!("log{}L{}.xml", format_stamp(time), label),
        None => format!("log{}.xml", format_stamp(time)),
    };
    let path = dir.join(name);
    let body = format!(
        "<cruisecontrol><info><property name=\"projectname\" value=\"{}\"/></info></cruisecontrol>",
        project
    );
    fs::write(&path, body).expect("Failed to write build log");
    path
}

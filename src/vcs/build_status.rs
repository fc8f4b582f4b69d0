//! Build status source
//!
//! Reports successful builds of another project, read from that project's
//! log directory, as `buildstatus` modifications. Used as the companion of
//! a veto or on its own to chain projects.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use super::build_log::{self, BuildLogFile};
use super::constants::build_log as names;
use super::{ConfigError, PollError, SourceControl, finish_poll, require_directory};
use crate::model::{FileAction, Modification, ModifiedFile, PollWindow, Properties, SourceKind};

const ADAPTER: &str = "buildstatus";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildStatusConfig {
    pub log_dir: Option<PathBuf>,
    /// Raise a veto when the newest build in the directory failed
    pub veto_if_failing: bool,
    pub property: Option<String>,
}

#[derive(Debug)]
pub struct BuildStatus {
    config: BuildStatusConfig,
    properties: Properties,
}

impl BuildStatus {
    pub fn new(config: BuildStatusConfig) -> Self {
        let properties = Properties::with_names(config.property.clone(), None);
        Self { config, properties }
    }

    fn check_newest_build(logs: &[BuildLogFile]) -> Result<(), PollError> {
        match logs.last() {
            Some(newest) if !newest.is_successful() => Err(PollError::Vetoed(format!(
                "most recent build failed: {}",
                newest.file_name
            ))),
            _ => Ok(()),
        }
    }
}

/// `buildstatus` modification for one successful build log
pub fn modification_for_log(log: &BuildLogFile, log_dir: &Path) -> Modification {
    let project = build_log::read_project_name(&log.path)
        .unwrap_or_else(|| names::UNKNOWN_PROJECT.to_string());
    let label = log.label.clone().unwrap_or_default();

    let mut modification = Modification::new(SourceKind::BuildStatus, log.time);
    modification.user_name = format!("{}{}", names::USER_PREFIX, project);
    modification.comment = log_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    modification.revision = label.clone();
    modification.files.push(ModifiedFile {
        file_name: log.file_name.clone(),
        folder_name: None,
        action: FileAction::Added,
        revision: Some(label),
    });
    modification
}

/// Record the `most.recent.*` properties for a successful build
pub fn record_most_recent(properties: &mut Properties, log: &BuildLogFile) {
    properties.put(names::MOST_RECENT_LOGFILE, log.file_name.clone());
    properties.put(names::MOST_RECENT_LOGTIME, log.stamp());
    properties.put(
        names::MOST_RECENT_LOGLABEL,
        log.label.clone().unwrap_or_default(),
    );
}

impl SourceControl for BuildStatus {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match &self.config.log_dir {
            Some(dir) => require_directory(ADAPTER, "log_dir", dir),
            None => Err(ConfigError::Missing {
                adapter: ADAPTER,
                field: "log_dir",
            }),
        }
    }

    fn get_modifications(&mut self, window: PollWindow) -> Result<Vec<Modification>, PollError> {
        self.properties.reset();
        let Some(log_dir) = self.config.log_dir.clone() else {
            return Ok(Vec::new());
        };
        self.properties
            .put(names::MOST_RECENT_LOGDIR, log_dir.display().to_string());

        let logs = match build_log::scan_log_dir(&log_dir) {
            Ok(logs) => logs,
            Err(e) => {
                warn!(log_dir = %log_dir.display(), error = %e, "Cannot read log directory");
                return Ok(Vec::new());
            }
        };
        if self.config.veto_if_failing {
            Self::check_newest_build(&logs)?;
        }

        let successes: Vec<&BuildLogFile> = logs
            .iter()
            .filter(|log| log.is_successful() && window.contains(log.time))
            .collect();
        if let Some(newest) = successes.last() {
            record_most_recent(&mut self.properties, newest);
        }

        let modifications = finish_poll(
            successes
                .into_iter()
                .map(|log| modification_for_log(log, &log_dir))
                .collect(),
            window,
        );
        self.properties.record_standard(&modifications);
        debug!(count = modifications.len(), "Build status poll finished");
        Ok(modifications)
    }

    fn take_properties(&mut self) -> BTreeMap<String, String> {
        self.properties.take()
    }
}

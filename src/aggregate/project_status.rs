//! Another project's build outcome as a pseudo-VCS

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::Sources;
use crate::model::{Modification, PollWindow, Properties, sort_chronologically};
use crate::vcs::build_log::{self, BuildLogFile};
use crate::vcs::build_status::{modification_for_log, record_most_recent};
use crate::vcs::constants::build_log::MOST_RECENT_LOGDIR;
use crate::vcs::{ConfigError, PollError, SourceControl, require, require_directory};

const ADAPTER: &str = "projectstatus";

/// What a project status source needs to know about the monitored project
pub trait ProjectQuery: Send {
    fn project_name(&self) -> &str;

    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Newest successful build, if the project ever built successfully
    fn last_success(&mut self) -> Option<BuildLogFile>;

    /// Source changes the project has not built yet
    fn pending_modifications(&mut self, now: DateTime<Utc>) -> Vec<Modification>;
}

/// A project described by its build log directory and its own sources
pub struct LogDirProject {
    name: String,
    log_dir: PathBuf,
    sources: Sources,
}

impl LogDirProject {
    pub fn new(name: impl Into<String>, log_dir: impl Into<PathBuf>, sources: Sources) -> Self {
        Self {
            name: name.into(),
            log_dir: log_dir.into(),
            sources,
        }
    }

    /// Start of the project's pending window: its newest build of any outcome
    fn last_build_time(&self) -> DateTime<Utc> {
        build_log::scan_log_dir(&self.log_dir)
            .ok()
            .and_then(|logs| logs.last().map(|log| log.time))
            .unwrap_or_default()
    }
}

impl ProjectQuery for LogDirProject {
    fn project_name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_directory(ADAPTER, "log_dir", &self.log_dir)?;
        self.sources.iter().try_for_each(|s| s.validate())
    }

    fn last_success(&mut self) -> Option<BuildLogFile> {
        match build_log::latest_success(&self.log_dir) {
            Ok(log) => log,
            Err(e) => {
                warn!(log_dir = %self.log_dir.display(), error = %e, "Cannot read log directory");
                None
            }
        }
    }

    fn pending_modifications(&mut self, now: DateTime<Utc>) -> Vec<Modification> {
        let window = PollWindow::new(self.last_build_time(), now);
        let mut pending = Vec::new();
        for source in &mut self.sources {
            match source.get_modifications(window) {
                Ok(mods) => pending.extend(mods),
                Err(e) => warn!(project = %self.name, source = source.name(), error = %e, "Pending poll failed"),
            }
            source.take_properties();
        }
        sort_chronologically(&mut pending);
        pending
    }
}

/// Project status switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectStatusConfig {
    pub project: Option<String>,
    /// Report a newer successful build at all
    pub trigger_on_success: bool,
    /// Veto when the project has unbuilt source changes
    pub veto_if_modified: bool,
    pub property: Option<String>,
}

impl Default for ProjectStatusConfig {
    fn default() -> Self {
        Self {
            project: None,
            trigger_on_success: true,
            veto_if_modified: false,
            property: None,
        }
    }
}

pub struct ProjectStatus {
    config: ProjectStatusConfig,
    query: Option<Box<dyn ProjectQuery>>,
    properties: Properties,
}

impl ProjectStatus {
    pub fn new(config: ProjectStatusConfig, query: Option<Box<dyn ProjectQuery>>) -> Self {
        let properties = Properties::with_names(config.property.clone(), None);
        Self {
            config,
            query,
            properties,
        }
    }
}

impl std::fmt::Debug for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectStatus")
            .field("config", &self.config)
            .field("query", &self.query.as_ref().map(|q| q.project_name().to_string()))
            .finish()
    }
}

impl SourceControl for ProjectStatus {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require(ADAPTER, "project", self.config.project.as_deref())?;
        let want = self.config.project.as_deref().unwrap_or_default();
        let Some(query) = &self.query else {
            return Err(ConfigError::Invalid {
                adapter: ADAPTER,
                reason: format!("project '{}' is not configured", want),
            });
        };
        if query.project_name() != want {
            return Err(ConfigError::Invalid {
                adapter: ADAPTER,
                reason: format!(
                    "Mismatch in project names, want {}, get {}",
                    want,
                    query.project_name()
                ),
            });
        }
        query.validate()
    }

    fn get_modifications(&mut self, window: PollWindow) -> Result<Vec<Modification>, PollError> {
        self.properties.reset();
        let Some(query) = self.query.as_mut() else {
            return Ok(Vec::new());
        };
        let last_success = query.last_success();

        if self.config.veto_if_modified {
            let pending = query.pending_modifications(window.now);
            if pending.iter().any(|m| m.modified_time > window.since) {
                let built = last_success
                    .as_ref()
                    .map(|log| log.time.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                return Err(PollError::Vetoed(format!(
                    "Modifications in {} found since its build on {}",
                    query.project_name(),
                    built
                )));
            }
        }

        let mut modifications = Vec::new();
        if self.config.trigger_on_success
            && let Some(log) = last_success
            && log.time > window.since
            && window.contains(log.time)
        {
            let log_dir = log.path.parent().map(PathBuf::from).unwrap_or_default();
            self.properties
                .put(MOST_RECENT_LOGDIR, log_dir.display().to_string());
            record_most_recent(&mut self.properties, &log);
            modifications.push(modification_for_log(&log, &log_dir));
        }

        self.properties.record_standard(&modifications);
        debug!(
            project = query.project_name(),
            count = modifications.len(),
            "Project status poll finished"
        );
        Ok(modifications)
    }

    fn take_properties(&mut self) -> BTreeMap<String, String> {
        self.properties.take()
    }
}

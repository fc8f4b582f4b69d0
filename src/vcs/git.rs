//! Git source control
//!
//! Polls `git log -p --pretty=raw` over a reflog time range in the working
//! copy. Each commit becomes one Modification whose revision is its sha.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::constants::{git, programs};
use super::parser::Parser;
use super::{AdapterContext, ConfigError, PollError, SourceControl, finish_poll, require_directory};
use crate::exec::CommandLine;
use crate::model::{Modification, PollWindow, Properties};

const ADAPTER: &str = "git";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    pub local_working_copy: Option<PathBuf>,
    pub property: Option<String>,
    pub property_on_delete: Option<String>,
}

#[derive(Debug)]
pub struct Git {
    config: GitConfig,
    ctx: AdapterContext,
    properties: Properties,
}

impl Git {
    pub fn new(config: GitConfig, ctx: AdapterContext) -> Self {
        let properties =
            Properties::with_names(config.property.clone(), config.property_on_delete.clone());
        Self {
            config,
            ctx,
            properties,
        }
    }

    /// `git log -p --pretty=raw @{ <since>}..@{ <now>}`
    pub fn build_history_command(&self, window: PollWindow) -> CommandLine {
        let cmd = CommandLine::new(programs::GIT)
            .args([git::LOG, git::PATCH, git::PRETTY_RAW])
            .arg(format!(
                "{}..{}",
                reflog_revision(window.since),
                reflog_revision(window.now)
            ));
        match &self.config.local_working_copy {
            Some(dir) => cmd.working_dir(dir),
            None => cmd,
        }
    }

    fn poll(&self, window: PollWindow) -> Vec<Modification> {
        let Some(output) = self.ctx.run_checked(ADAPTER, self.build_history_command(window)) else {
            return Vec::new();
        };
        Parser::parse_git_log(&output.stdout).unwrap_or_else(|e| {
            warn!(error = %e, "Unreadable git log output, reporting no modifications");
            Vec::new()
        })
    }
}

/// Reflog time selector, `@{ <epoch seconds>}`
pub fn reflog_revision(time: DateTime<Utc>) -> String {
    format!("@{{ {}}}", time.timestamp())
}

impl SourceControl for Git {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match &self.config.local_working_copy {
            Some(dir) => require_directory(ADAPTER, "local_working_copy", dir),
            None => Err(ConfigError::Missing {
                adapter: ADAPTER,
                field: "local_working_copy",
            }),
        }
    }

    fn get_modifications(&mut self, window: PollWindow) -> Result<Vec<Modification>, PollError> {
        self.properties.reset();
        let modifications = finish_poll(self.poll(window), window);
        self.properties.record_standard(&modifications);
        if let Some(newest) = modifications.last() {
            self.properties
                .put(git::COMMIT_ID_PROPERTY, newest.revision.clone());
        }
        debug!(count = modifications.len(), "Git poll finished");
        Ok(modifications)
    }

    fn take_properties(&mut self) -> BTreeMap<String, String> {
        self.properties.take()
    }
}

//! ClearCase source control (cleartool lshistory)

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::constants::{clearcase, programs};
use super::parser::Parser;
use super::{AdapterContext, ConfigError, PollError, SourceControl, finish_poll, require_directory};
use crate::exec::CommandLine;
use crate::model::{Modification, PollWindow, Properties};

const ADAPTER: &str = "clearcase";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClearCaseConfig {
    pub view_path: Option<PathBuf>,
    pub branch: Option<String>,
    /// `-r`; on unless `all` is set
    pub recursive: Option<bool>,
    /// `-all`, faster than `-r` but ignores the view's config spec
    pub all: bool,
    pub property: Option<String>,
    pub property_on_delete: Option<String>,
}

impl ClearCaseConfig {
    fn scope_flag(&self) -> Option<&'static str> {
        match (self.recursive, self.all) {
            (Some(true), _) | (None, false) => Some(clearcase::RECURSIVE),
            (_, true) => Some(clearcase::ALL),
            (Some(false), false) => None,
        }
    }
}

#[derive(Debug)]
pub struct ClearCase {
    config: ClearCaseConfig,
    ctx: AdapterContext,
    properties: Properties,
}

impl ClearCase {
    pub fn new(config: ClearCaseConfig, ctx: AdapterContext) -> Self {
        let properties =
            Properties::with_names(config.property.clone(), config.property_on_delete.clone());
        Self {
            config,
            ctx,
            properties,
        }
    }

    /// `cleartool lshistory [-branch b] [-r|-all] -nco -since <date> -fmt <format>`
    pub fn build_history_command(&self, window: PollWindow) -> CommandLine {
        let mut cmd = CommandLine::new(programs::CLEARTOOL).arg(clearcase::LSHISTORY);
        if let Some(branch) = &self.config.branch {
            cmd = cmd.arg(clearcase::BRANCH).arg(branch);
        }
        if let Some(flag) = self.config.scope_flag() {
            cmd = cmd.arg(flag);
        }
        cmd = cmd
            .arg(clearcase::NO_CHECKOUTS)
            .arg(clearcase::SINCE)
            .arg(format_local(window.since, clearcase::SINCE_DATE_FORMAT))
            .arg(clearcase::FORMAT)
            .arg(clearcase::HISTORY_FORMAT);
        match &self.config.view_path {
            Some(view) => cmd.working_dir(view),
            None => cmd,
        }
    }

    fn poll(&self, window: PollWindow) -> Vec<Modification> {
        if let Some(view) = &self.config.view_path {
            info!(view = %view.display(), "Getting ClearCase modifications");
        }
        let Some(output) = self.ctx.run(ADAPTER, self.build_history_command(window)) else {
            return Vec::new();
        };
        Parser::parse_clearcase_history(&output.stdout, &self.ctx.aliases).unwrap_or_else(|e| {
            warn!(error = %e, "Unreadable lshistory output, reporting no modifications");
            Vec::new()
        })
    }
}

fn format_local(time: DateTime<Utc>, format: &str) -> String {
    time.with_timezone(&Local).format(format).to_string()
}

impl SourceControl for ClearCase {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let Some(view) = &self.config.view_path else {
            return Err(ConfigError::Missing {
                adapter: ADAPTER,
                field: "view_path",
            });
        };
        if self.config.recursive == Some(true) && self.config.all {
            return Err(ConfigError::Conflict {
                adapter: ADAPTER,
                reason: "'recursive' and 'all' are mutually exclusive attributes for ClearCase"
                    .to_string(),
            });
        }
        require_directory(ADAPTER, "view_path", view)
    }

    fn get_modifications(&mut self, window: PollWindow) -> Result<Vec<Modification>, PollError> {
        self.properties.reset();
        self.properties.put(
            clearcase::LAST_BUILD_PROPERTY,
            format_local(window.since, clearcase::PROPERTY_DATE_FORMAT),
        );
        self.properties.put(
            clearcase::NOW_PROPERTY,
            format_local(window.now, clearcase::PROPERTY_DATE_FORMAT),
        );

        let modifications = finish_poll(self.poll(window), window);
        self.properties.record_standard(&modifications);
        debug!(count = modifications.len(), "ClearCase poll finished");
        Ok(modifications)
    }

    fn take_properties(&mut self) -> BTreeMap<String, String> {
        self.properties.take()
    }
}

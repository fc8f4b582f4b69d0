//! Subversion source control

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::constants::{programs, svn};
use super::parser::Parser;
use super::{
    AdapterContext, ConfigError, PollError, SourceControl, finish_poll, require_directory,
};
use crate::exec::CommandLine;
use crate::model::{Modification, PollWindow, Properties};

const ADAPTER: &str = "svn";

/// SVN adapter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SvnConfig {
    /// URL passed to `svn log`; optional when a working copy is given
    pub repository_location: Option<String>,
    pub local_working_copy: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub config_dir: Option<PathBuf>,
    pub property: Option<String>,
    pub property_on_delete: Option<String>,
}

#[derive(Debug)]
pub struct Svn {
    config: SvnConfig,
    ctx: AdapterContext,
    properties: Properties,
}

impl Svn {
    pub fn new(config: SvnConfig, ctx: AdapterContext) -> Self {
        let properties =
            Properties::with_names(config.property.clone(), config.property_on_delete.clone());
        Self {
            config,
            ctx,
            properties,
        }
    }

    /// `svn log --non-interactive --xml -v -r {since}:{now} [auth] [url]`
    pub fn build_history_command(&self, window: PollWindow) -> CommandLine {
        let mut cmd = self.base_command().args([
            svn::LOG,
            svn::NON_INTERACTIVE,
            svn::XML,
            svn::VERBOSE,
            svn::REVISION,
        ]);
        cmd = cmd.arg(format!(
            "{}:{}",
            format_svn_date(window.since),
            format_svn_date(window.now)
        ));

        if let Some(dir) = &self.config.config_dir {
            cmd = cmd.arg(svn::CONFIG_DIR).arg(dir.display().to_string());
        }
        if self.config.username.is_some() || self.config.password.is_some() {
            cmd = cmd.arg(svn::NO_AUTH_CACHE);
            if let Some(user) = &self.config.username {
                cmd = cmd.arg(svn::USERNAME).arg(user);
            }
            if let Some(password) = &self.config.password {
                cmd = cmd.arg(svn::PASSWORD).secret_arg(password);
            }
        }
        if let Some(url) = &self.config.repository_location {
            cmd = cmd.arg(url);
        }
        cmd
    }

    /// `svn info --xml`, run in the working copy
    pub fn build_info_command(&self) -> CommandLine {
        self.base_command().args([svn::INFO, svn::XML])
    }

    fn base_command(&self) -> CommandLine {
        let cmd = CommandLine::new(programs::SVN);
        match &self.config.local_working_copy {
            Some(dir) => cmd.working_dir(dir),
            None => cmd,
        }
    }

    fn poll(&self, window: PollWindow) -> Vec<Modification> {
        let Some(output) = self.ctx.run_checked(ADAPTER, self.build_history_command(window)) else {
            return Vec::new();
        };
        Parser::parse_svn_log(&output.stdout, &self.ctx.aliases).unwrap_or_else(|e| {
            warn!(error = %e, "Unreadable svn log output, reporting no modifications");
            Vec::new()
        })
    }

    /// Current revision from `svn info`, used when nothing changed
    fn current_revision(&self) -> Option<String> {
        let output = self.ctx.run_checked(ADAPTER, self.build_info_command())?;
        match Parser::parse_svn_info_revision(&output.stdout) {
            Ok(revision) => revision,
            Err(e) => {
                warn!(error = %e, "Unreadable svn info output");
                None
            }
        }
    }

    fn record_revision(&mut self, modifications: &[Modification]) {
        let highest = modifications
            .iter()
            .filter_map(|m| m.revision.parse::<u64>().ok())
            .max();
        let revision = match highest {
            Some(rev) => Some(rev.to_string()),
            None => self.current_revision(),
        };
        if let Some(revision) = revision {
            self.properties.put(svn::REVISION_PROPERTY, revision);
        }
    }
}

/// `{yyyy-MM-ddTHH:mm:ssZ}` in UTC
pub fn format_svn_date(time: DateTime<Utc>) -> String {
    format!("{{{}}}", time.format(svn::WINDOW_DATE_FORMAT))
}

impl SourceControl for Svn {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.config.repository_location.is_none() && self.config.local_working_copy.is_none() {
            return Err(ConfigError::Invalid {
                adapter: ADAPTER,
                reason: "at least 'repository_location' or 'local_working_copy' is required".to_string(),
            });
        }
        if let Some(dir) = &self.config.local_working_copy {
            require_directory(ADAPTER, "local_working_copy", dir)?;
        }
        Ok(())
    }

    fn get_modifications(&mut self, window: PollWindow) -> Result<Vec<Modification>, PollError> {
        self.properties.reset();
        let modifications = finish_poll(self.poll(window), window);
        self.properties.record_standard(&modifications);
        self.record_revision(&modifications);
        debug!(count = modifications.len(), "SVN poll finished");
        Ok(modifications)
    }

    fn take_properties(&mut self) -> BTreeMap<String, String> {
        self.properties.take()
    }
}

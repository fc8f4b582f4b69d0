//! Mercurial source control
//!
//! Lists changesets that `hg incoming` would pull, rendered through an XML
//! template so descriptions and file lists survive intact.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, warn};

use super::constants::{hg, programs};
use super::parser::{HG_XML_TEMPLATE, Parser};
use super::{AdapterContext, ConfigError, PollError, SourceControl, finish_poll, require_directory};
use crate::exec::CommandLine;
use crate::model::{Modification, PollWindow, Properties};

const ADAPTER: &str = "mercurial";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MercurialConfig {
    pub local_working_copy: Option<PathBuf>,
    /// Remote to compare against; the working copy's default path otherwise
    pub repository_location: Option<String>,
    pub property: Option<String>,
    pub property_on_delete: Option<String>,
}

#[derive(Debug)]
pub struct Mercurial {
    config: MercurialConfig,
    ctx: AdapterContext,
    properties: Properties,
}

impl Mercurial {
    pub fn new(config: MercurialConfig, ctx: AdapterContext) -> Self {
        let properties =
            Properties::with_names(config.property.clone(), config.property_on_delete.clone());
        Self {
            config,
            ctx,
            properties,
        }
    }

    /// `hg incoming --debug --template <xml> [repository]`
    pub fn build_history_command(&self) -> CommandLine {
        let mut cmd = CommandLine::new(programs::HG)
            .args([hg::INCOMING, hg::DEBUG, hg::TEMPLATE])
            .arg(HG_XML_TEMPLATE);
        if let Some(dir) = &self.config.local_working_copy {
            cmd = cmd.working_dir(dir);
        }
        if let Some(remote) = &self.config.repository_location {
            cmd = cmd.arg(remote);
        }
        cmd
    }

    fn poll(&self) -> Vec<Modification> {
        let Some(output) = self.ctx.run(ADAPTER, self.build_history_command()) else {
            return Vec::new();
        };
        match output.exit_code {
            Some(0) => {}
            Some(hg::NO_CHANGES_EXIT_CODE) => return Vec::new(),
            code => {
                warn!(exit_code = ?code, stderr = %output.stderr.trim(), "hg incoming failed");
                return Vec::new();
            }
        }
        Parser::parse_hg_incoming(&output.stdout, &self.ctx.aliases).unwrap_or_else(|e| {
            warn!(error = %e, "Unreadable hg incoming output, reporting no modifications");
            Vec::new()
        })
    }
}

impl SourceControl for Mercurial {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.config.local_working_copy.is_none() && self.config.repository_location.is_none() {
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
        let modifications = finish_poll(self.poll(), window);
        self.properties.record_standard(&modifications);
        debug!(count = modifications.len(), "Mercurial poll finished");
        Ok(modifications)
    }

    fn take_properties(&mut self) -> BTreeMap<String, String> {
        self.properties.take()
    }
}

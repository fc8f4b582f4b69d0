//! TOML configuration
//!
//! Every `[[source]]` entry is tagged with its adapter `type`. Aggregators
//! nest further entries of the same shape, so one enum describes the whole
//! tree.
//!
//! ```toml
//! command_timeout_secs = 600
//!
//! [aliases]
//! alden = "alden@x.org"
//!
//! [[source]]
//! type = "cvs"
//! local_working_copy = "/work/app"
//! property = "cvs.changed"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::aggregate::{Compound, LogDirProject, ProjectQuery, ProjectStatus, ProjectStatusConfig, Veto};
use crate::exec::{CommandRunner, ProcessRunner};
use crate::vcs::{
    AdapterContext, BuildStatus, BuildStatusConfig, ClearCase, ClearCaseConfig, ConfigError, Cvs,
    CvsConfig, EmailAliases, Git, GitConfig, Mercurial, MercurialConfig, SourceControl, Svn,
    SvnConfig,
};

/// Errors while loading a configuration file
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Applied to every spawned command
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,

    /// Username to email table shared by all sources
    #[serde(default)]
    pub aliases: EmailAliases,

    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

/// One configured source, selected by its `type` tag
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Cvs(CvsConfig),
    Svn(SvnConfig),
    Git(GitConfig),
    Mercurial(MercurialConfig),
    ClearCase(ClearCaseConfig),
    BuildStatus(BuildStatusConfig),
    Compound(CompoundEntry),
    Veto(VetoEntry),
    ProjectStatus(ProjectStatusEntry),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompoundEntry {
    pub include_trigger_changes: bool,
    pub triggers: Option<Vec<SourceConfig>>,
    pub targets: Option<Vec<SourceConfig>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VetoEntry {
    pub triggers: Option<Vec<SourceConfig>>,
    pub buildstatus: Option<Box<SourceConfig>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectStatusEntry {
    pub project: Option<String>,
    /// Build log directory of the monitored project
    pub log_dir: Option<PathBuf>,
    pub trigger_on_success: bool,
    pub veto_if_modified: bool,
    pub property: Option<String>,
    /// The monitored project's own sources, polled for `veto_if_modified`
    pub sources: Vec<SourceConfig>,
}

impl Default for ProjectStatusEntry {
    fn default() -> Self {
        let defaults = ProjectStatusConfig::default();
        Self {
            project: None,
            log_dir: None,
            trigger_on_success: defaults.trigger_on_success,
            veto_if_modified: defaults.veto_if_modified,
            property: None,
            sources: Vec::new(),
        }
    }
}

impl SourceConfig {
    /// Construct the adapter (and any nested adapters) this entry describes
    pub fn build(&self, ctx: &AdapterContext) -> Result<Box<dyn SourceControl>, ConfigError> {
        let source: Box<dyn SourceControl> = match self {
            Self::Cvs(c) => Box::new(Cvs::new(c.clone(), ctx.clone())),
            Self::Svn(c) => Box::new(Svn::new(c.clone(), ctx.clone())),
            Self::Git(c) => Box::new(Git::new(c.clone(), ctx.clone())),
            Self::Mercurial(c) => Box::new(Mercurial::new(c.clone(), ctx.clone())),
            Self::ClearCase(c) => Box::new(ClearCase::new(c.clone(), ctx.clone())),
            Self::BuildStatus(c) => Box::new(BuildStatus::new(c.clone())),
            Self::Compound(entry) => {
                let mut compound = Compound::new(entry.include_trigger_changes);
                if let Some(triggers) = &entry.triggers {
                    compound.set_triggers(build_all(triggers, ctx)?)?;
                }
                if let Some(targets) = &entry.targets {
                    compound.set_targets(build_all(targets, ctx)?)?;
                }
                Box::new(compound)
            }
            Self::Veto(entry) => {
                let mut veto = Veto::new();
                if let Some(triggers) = &entry.triggers {
                    veto.set_triggers(build_all(triggers, ctx)?)?;
                }
                if let Some(status) = &entry.buildstatus {
                    veto.set_build_status(status.build(ctx)?)?;
                }
                Box::new(veto)
            }
            Self::ProjectStatus(entry) => {
                let query = match &entry.log_dir {
                    Some(dir) => {
                        let name = entry.project.clone().unwrap_or_default();
                        let sources = build_all(&entry.sources, ctx)?;
                        Some(Box::new(LogDirProject::new(name, dir, sources)) as Box<dyn ProjectQuery>)
                    }
                    None => None,
                };
                let config = ProjectStatusConfig {
                    project: entry.project.clone(),
                    trigger_on_success: entry.trigger_on_success,
                    veto_if_modified: entry.veto_if_modified,
                    property: entry.property.clone(),
                };
                Box::new(ProjectStatus::new(config, query))
            }
        };
        Ok(source)
    }
}

fn build_all(
    entries: &[SourceConfig],
    ctx: &AdapterContext,
) -> Result<Vec<Box<dyn SourceControl>>, ConfigError> {
    entries.iter().map(|e| e.build(ctx)).collect()
}

impl Config {
    /// Parse configuration text
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        info!(config_path = ?path, "Loading configuration from file");
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// Build and validate every configured source
    pub fn build_sources(
        &self,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Vec<Box<dyn SourceControl>>, LoadError> {
        let ctx = AdapterContext::new(runner)
            .with_timeout(self.command_timeout())
            .with_aliases(self.aliases.clone());

        let mut sources = Vec::with_capacity(self.sources.len());
        for entry in &self.sources {
            let source = entry.build(&ctx)?;
            source.validate()?;
            debug!(source = source.name(), "Source configured");
            sources.push(source);
        }
        Ok(sources)
    }
}

/// Load a configuration file and build its sources with the real process runner
pub fn load(path: &Path) -> Result<Vec<Box<dyn SourceControl>>, LoadError> {
    Config::from_file(path)?.build_sources(Arc::new(ProcessRunner))
}

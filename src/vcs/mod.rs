//! Source control layer
//!
//! Each adapter builds a tool-specific command line, runs it through a
//! [`CommandRunner`], hands the output to [`parser::Parser`] and returns
//! normalized [`Modification`]s for a polling window.

mod aliases;
pub mod build_log;
pub mod build_status;
mod clearcase;
pub mod constants;
mod cvs;
mod git;
mod mercurial;
/// Parser module (public for integration testing)
pub mod parser;
mod svn;
mod version;

pub use aliases::EmailAliases;
pub use build_status::{BuildStatus, BuildStatusConfig};
pub use clearcase::{ClearCase, ClearCaseConfig};
pub use cvs::{Cvs, CvsConfig};
pub use git::{Git, GitConfig};
pub use mercurial::{Mercurial, MercurialConfig};
pub use svn::{Svn, SvnConfig};
pub use version::{ToolVersion, is_version_at_least, parse_version_triple};

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use crate::exec::{CommandLine, CommandOutput, CommandRunner, ProcessRunner};
use crate::model::{Modification, PollWindow, sort_chronologically};

/// Configuration problems found by `validate()` or at construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{adapter}: '{field}' is required")]
    Missing {
        adapter: &'static str,
        field: &'static str,
    },

    #[error("{adapter}: {reason}")]
    Invalid {
        adapter: &'static str,
        reason: String,
    },

    #[error("{adapter}: {reason}")]
    Conflict {
        adapter: &'static str,
        reason: String,
    },
}

/// Errors that deliberately escape a poll
///
/// Everything transient (launch failure, timeout, garbled output) is logged
/// and absorbed as an empty result instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("trigger changes with no buildstatus changes")]
    InconsistentBuildStatus,

    #[error(
        "buildstatus out of date compared to trigger changes \
         (last build {last_build}, latest trigger change {latest_trigger})"
    )]
    BuildStatusOutOfDate {
        latest_trigger: DateTime<Utc>,
        last_build: DateTime<Utc>,
    },

    #[error("build vetoed: {0}")]
    Vetoed(String),
}

/// Uniform polling contract shared by adapters and aggregators
pub trait SourceControl: Send {
    /// Short name used in diagnostics ("cvs", "compound", ...)
    fn name(&self) -> &'static str;

    /// Check configuration before any process is spawned
    fn validate(&self) -> Result<(), ConfigError>;

    /// Modifications inside `window`, sorted ascending by time
    ///
    /// Resets the properties sink before polling.
    fn get_modifications(&mut self, window: PollWindow) -> Result<Vec<Modification>, PollError>;

    /// Properties recorded by the last poll; reading resets them
    fn take_properties(&mut self) -> BTreeMap<String, String>;
}

/// Shared collaborators handed to every adapter at construction
#[derive(Clone)]
pub struct AdapterContext {
    pub runner: Arc<dyn CommandRunner>,
    /// Applied to every spawned command
    pub timeout: Option<Duration>,
    pub aliases: EmailAliases,
}

impl AdapterContext {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            timeout: None,
            aliases: EmailAliases::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_aliases(mut self, aliases: EmailAliases) -> Self {
        self.aliases = aliases;
        self
    }

    /// Run a command, absorbing launch failures and timeouts
    pub(crate) fn run(&self, adapter: &'static str, command: CommandLine) -> Option<CommandOutput> {
        let command = command.timeout(self.timeout);
        match self.runner.run(&command) {
            Ok(output) => Some(output),
            Err(e) if e.is_not_found() => {
                warn!(
                    adapter,
                    program = command.program(),
                    "Executable not found on PATH, reporting no modifications"
                );
                None
            }
            Err(e) => {
                warn!(adapter, command = %command, error = %e, "Command failed, reporting no modifications");
                None
            }
        }
    }

    /// Like [`run`](Self::run), but also treats a nonzero exit as a failure
    pub(crate) fn run_checked(
        &self,
        adapter: &'static str,
        command: CommandLine,
    ) -> Option<CommandOutput> {
        let output = self.run(adapter, command)?;
        if output.success() {
            Some(output)
        } else {
            warn!(
                adapter,
                exit_code = ?output.exit_code,
                stderr = %output.stderr.trim(),
                "Command exited unsuccessfully, reporting no modifications"
            );
            None
        }
    }
}

impl Default for AdapterContext {
    fn default() -> Self {
        Self::new(Arc::new(ProcessRunner))
    }
}

impl std::fmt::Debug for AdapterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterContext")
            .field("timeout", &self.timeout)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

/// Keep entries inside the window and sort them chronologically
///
/// Several tools over-return entries at the window edges, so every adapter
/// funnels its parse result through here.
pub(crate) fn finish_poll(mut modifications: Vec<Modification>, window: PollWindow) -> Vec<Modification> {
    modifications.retain(|m| window.contains(m.modified_time));
    sort_chronologically(&mut modifications);
    modifications
}

/// Require an optional string field to be present and non-blank
pub(crate) fn require(
    adapter: &'static str,
    field: &'static str,
    value: Option<&str>,
) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::Missing { adapter, field }),
    }
}

/// Require a configured path to be an existing directory
pub(crate) fn require_directory(
    adapter: &'static str,
    field: &'static str,
    path: &Path,
) -> Result<(), ConfigError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            adapter,
            reason: format!("'{}' {} does not exist or is not a directory", field, path.display()),
        })
    }
}

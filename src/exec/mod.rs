//! External command execution layer
//!
//! Builds command lines, spawns them and captures their output. Callers
//! decide what a nonzero exit means; only launch failures and timeouts are
//! errors here.

mod command;
mod runner;

pub use command::{CommandLine, CommandOutput};
pub use runner::{CommandRunner, ProcessRunner};

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when running an external command
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to launch {program}: {source}")]
    LaunchFailure {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} did not finish within {timeout:?} and was killed")]
    TimeoutExceeded { program: String, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ExecError {
    /// True when the executable could not be found on PATH
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::LaunchFailure { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

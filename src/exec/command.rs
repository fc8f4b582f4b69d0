//! Command line builder and captured output

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder shown instead of secret arguments in logs
const MASK: &str = "******";

/// A fully described external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    /// Indices into `args` that must not be logged
    secret_args: Vec<usize>,
    working_dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
    stdin: Option<String>,
    timeout: Option<Duration>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an argument that is masked when the command is displayed
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_args.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn env_overrides(&self) -> &[(String, String)] {
        &self.envs
    }

    pub fn stdin_data(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    pub fn timeout_value(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for (idx, arg) in self.args.iter().enumerate() {
            if self.secret_args.contains(&idx) {
                write!(f, " {}", MASK)?;
            } else if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Output captured from a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// None when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Convenience constructor for a successful run
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

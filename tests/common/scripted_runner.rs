//! ScriptedRunner: a CommandRunner that replays canned output.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use modwatch::exec::{CommandLine, CommandOutput, CommandRunner, ExecError};

enum Reply {
    Output(CommandOutput),
    LaunchFailure,
    Timeout,
}

/// Replays queued replies in order and records every command line.
///
/// An exhausted queue behaves like a missing executable.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<CommandLine>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful run printing `stdout`.
    pub fn reply(&self, stdout: &str) {
        self.push(Reply::Output(CommandOutput::from_stdout(stdout)));
    }

    /// Queue a run with an explicit exit code and stderr.
    pub fn reply_with(&self, stdout: &str, stderr: &str, exit_code: i32) {
        self.push(Reply::Output(CommandOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(exit_code),
        }));
    }

    pub fn reply_launch_failure(&self) {
        self.push(Reply::LaunchFailure);
    }

    pub fn reply_timeout(&self) {
        self.push(Reply::Timeout);
    }

    fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Command lines received so far.
    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }

    /// Program plus arguments of the nth call.
    pub fn argv(&self, index: usize) -> Vec<String> {
        let calls = self.calls();
        let call = &calls[index];
        std::iter::once(call.program().to_string())
            .chain(call.arguments().iter().cloned())
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &CommandLine) -> Result<CommandOutput, ExecError> {
        self.calls.lock().unwrap().push(command.clone());
        let program = command.program().to_string();
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::Timeout) => Err(ExecError::TimeoutExceeded {
                program,
                timeout: command.timeout_value().unwrap_or(Duration::from_secs(1)),
            }),
            Some(Reply::LaunchFailure) | None => Err(ExecError::LaunchFailure {
                program,
                source: io::Error::new(io::ErrorKind::NotFound, "scripted: no such program"),
            }),
        }
    }
}

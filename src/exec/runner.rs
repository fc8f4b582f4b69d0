//! Process runner
//!
//! stdout and stderr are drained by two background threads while the
//! calling thread blocks on the exit status, so a chatty child can never
//! fill a pipe buffer and stall. The readers hand their text back over a
//! channel, so the timeout also bounds waiting for pipes that a detached
//! grandchild keeps open.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use scopeguard::ScopeGuard;
use tracing::{debug, warn};

use super::{CommandLine, CommandOutput, ExecError};

/// Interval between exit checks while a timeout is armed
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs a [`CommandLine`] and captures its output
///
/// Source controls hold this as `Arc<dyn CommandRunner>` so tests can
/// replace process spawning with canned output.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &CommandLine) -> Result<CommandOutput, ExecError>;
}

/// Runner backed by real OS processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &CommandLine) -> Result<CommandOutput, ExecError> {
        let program = command.program().to_string();
        let mut cmd = Command::new(&program);
        cmd.args(command.arguments())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if command.stdin_data().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        if let Some(dir) = command.current_dir() {
            cmd.current_dir(dir);
        }
        for (key, value) in command.env_overrides() {
            cmd.env(key, value);
        }

        debug!(command = %command, "Spawning external command");
        let child = cmd.spawn().map_err(|source| ExecError::LaunchFailure {
            program: program.clone(),
            source,
        })?;

        // Kill and reap the child on every early return
        let mut child = scopeguard::guard(child, |mut child| {
            let _ = child.kill();
            let _ = child.wait();
        });

        // Ends on its own once the input is written or the pipe closes
        let _stdin_writer = match (child.stdin.take(), command.stdin_data()) {
            (Some(mut pipe), Some(input)) => {
                let input = input.to_string();
                Some(thread::spawn(move || {
                    let _ = pipe.write_all(input.as_bytes());
                }))
            }
            _ => None,
        };
        let stdout_reader = child.stdout.take().map(spawn_stdout_reader);
        let stderr_reader = child
            .stderr
            .take()
            .map(|pipe| spawn_stderr_reader(pipe, program.clone()));

        let timeout = command.timeout_value();
        let deadline = timeout.map(|t| Instant::now() + t);
        let timed_out = || {
            let timeout = timeout.unwrap_or_default();
            warn!(command = %command, ?timeout, "Command timed out");
            ExecError::TimeoutExceeded {
                program: program.clone(),
                timeout,
            }
        };

        let Some(status) = wait_with_deadline(&mut child, deadline)? else {
            // Readers are left detached; the guard kills the child on return
            return Err(timed_out());
        };
        let _exited = ScopeGuard::into_inner(child);

        let (Some(stdout), Some(stderr)) = (
            collect_reader(stdout_reader, deadline),
            collect_reader(stderr_reader, deadline),
        ) else {
            // Exited, but something it spawned still holds the pipes
            return Err(timed_out());
        };
        let output = CommandOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        };
        debug!(
            command = %command,
            exit_code = ?output.exit_code,
            stdout_bytes = output.stdout.len(),
            "External command finished"
        );
        Ok(output)
    }
}

/// Block until the child exits, or until `deadline` passes (returns None)
fn wait_with_deadline(
    child: &mut Child,
    deadline: Option<Instant>,
) -> Result<Option<ExitStatus>, ExecError> {
    let Some(deadline) = deadline else {
        return Ok(Some(child.wait()?));
    };

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(WAIT_POLL_INTERVAL);
    }
}

fn spawn_stdout_reader(mut pipe: ChildStdout) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Collects stderr and logs every line at warn level as it arrives
fn spawn_stderr_reader(pipe: ChildStderr, program: String) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut collected = String::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&line);
                    let trimmed = text.trim_end();
                    if !trimmed.is_empty() {
                        warn!(program = %program, "{}", trimmed);
                    }
                    collected.push_str(&text);
                }
            }
        }
        let _ = tx.send(collected);
    });
    rx
}

/// Wait for a reader to hit end of stream; None when `deadline` passes first
fn collect_reader(reader: Option<Receiver<String>>, deadline: Option<Instant>) -> Option<String> {
    let Some(reader) = reader else {
        return Some(String::new());
    };
    let Some(deadline) = deadline else {
        return Some(reader.recv().unwrap_or_default());
    };
    match reader.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(text) => Some(text),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

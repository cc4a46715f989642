//! External process execution.
//!
//! Everything that touches the host goes through a [`Runner`]: running `tc`
//! and `ip`, and enumerating interfaces. [`SystemRunner`] does it for real.
//! [`ScriptedRunner`] is a test fixture that replays canned output.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::process::Stdio;
use std::sync::Mutex;

use tokio::process::Command;

use crate::command::Verb;
use crate::device;
use crate::error::{Error, Result};

/// Result of running an external program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// The exit code of the command (0 = success, -1 = killed by a signal).
    pub exit_code: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error, trimmed.
    pub stderr: String,
}

impl ExecOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Host access used by the reconciler.
pub trait Runner {
    /// Run `program` with `args` and capture its output.
    ///
    /// A non-zero exit is not an error here; only failing to start the
    /// program is.
    fn run(&self, program: &str, args: &[String]) -> impl Future<Output = Result<ExecOutput>>;

    /// Enumerate the host's interfaces, or `None` if that is not possible
    /// and the caller should fall back to parsing `ip a`.
    fn interfaces(&self) -> Option<Vec<String>> {
        device::list_interfaces().ok()
    }
}

/// Runs programs on the host with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ExecOutput> {
        tracing::debug!(program, args = %args.join(" "), "Executing command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: program.to_string(),
                source,
            })?;

        let result = ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        if result.success() {
            tracing::trace!(program, exit_code = result.exit_code, "Command succeeded");
        } else {
            tracing::warn!(
                program,
                args = %args.join(" "),
                exit_code = result.exit_code,
                stderr = %result.stderr,
                "Command failed"
            );
        }

        Ok(result)
    }
}

/// Run a command and turn a non-zero exit into [`Error::ExternalToolFailure`].
///
/// Returns stdout on success.
pub async fn run_checked<R: Runner>(runner: &R, program: &str, args: &[String]) -> Result<String> {
    let output = runner.run(program, args).await?;
    if output.success() {
        Ok(output.stdout)
    } else {
        Err(Error::ExternalToolFailure {
            command: command_line(program, args),
            exit_code: output.exit_code,
            stderr: output.stderr,
        })
    }
}

/// Join a program and its arguments for display.
pub fn command_line(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// A [`Runner`] that replays canned output, for tests.
///
/// This is a fixture for exercising a [`Reconciler`](crate::Reconciler)
/// without root or real devices, in this crate's tests and in dependents'.
/// It never touches the host.
///
/// Responses are keyed by the first two arguments (`"qdisc show"`,
/// `"class add"`, `"a"` for `ip a`, ...). Each key holds a queue: every call
/// pops the front response until one is left, which then repeats. Keys with
/// no scripted response succeed with empty output. Every call is recorded.
///
/// # Example
///
/// ```
/// use tcsync::exec::{ExecOutput, ScriptedRunner};
///
/// let runner = ScriptedRunner::new(["eth0"])
///     .respond("qdisc show", ExecOutput::ok("qdisc pfifo_fast 0: root refcnt 2\n"));
/// assert!(runner.calls().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    interfaces: Option<Vec<String>>,
    responses: Mutex<HashMap<String, VecDeque<ExecOutput>>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    /// Create a runner that reports the given interfaces.
    pub fn new<I, S>(interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            interfaces: Some(interfaces.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Create a runner that cannot enumerate interfaces, forcing the
    /// `ip a` fallback.
    pub fn without_interface_list() -> Self {
        Self::default()
    }

    /// Queue a response for a key.
    pub fn respond(self, key: &str, output: ExecOutput) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key.to_string())
            .or_default()
            .push_back(output);
        self
    }

    /// All argument vectors seen so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Calls whose verb mutates state (`add`, `change`, `del`).
    pub fn mutating_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|args| {
                args.get(1)
                    .and_then(|verb| Verb::parse(verb))
                    .is_some_and(Verb::is_mutating)
            })
            .collect()
    }

    fn key(args: &[String]) -> String {
        args.iter().take(2).cloned().collect::<Vec<_>>().join(" ")
    }
}

impl Runner for ScriptedRunner {
    async fn run(&self, _program: &str, args: &[String]) -> Result<ExecOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(args.to_vec());

        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        let output = match responses.get_mut(&Self::key(args)) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => ExecOutput::default(),
        };
        Ok(output)
    }

    fn interfaces(&self) -> Option<Vec<String>> {
        self.interfaces.clone()
    }
}

//! Result reporting.
//!
//! Each reconciled resource produces one [`Report`]. Text output is meant
//! for people; `--json` output keeps the field names automation tooling
//! already expects (`changed`, `skipped`, `failed`, `msg`, `rc`).

use std::io::{self, Write};

use serde::Serialize;
use tcsync::{Error, Outcome, Result};

/// The parameter implicated in a failure.
#[derive(Debug, Serialize)]
pub struct Param {
    pub name: &'static str,
    pub value: String,
}

/// Outcome of one resource, ready to print.
#[derive(Debug, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub changed: bool,
    /// Check mode: nothing was run.
    pub skipped: bool,
    pub failed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    /// The command that failed, for external tool failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rc: Option<i32>,
}

impl Report {
    pub fn new(resource: Option<String>, result: &Result<Outcome>) -> Self {
        let mut report = Self {
            resource,
            changed: false,
            skipped: false,
            failed: false,
            commands: Vec::new(),
            cmd: None,
            msg: None,
            param: None,
            rc: None,
        };

        match result {
            Ok(outcome) => {
                report.commands = outcome.commands().iter().map(ToString::to_string).collect();
                match outcome {
                    Outcome::Unchanged => {}
                    Outcome::Changed { output, .. } => {
                        report.changed = true;
                        let output = output.trim();
                        if !output.is_empty() {
                            report.msg = Some(output.to_string());
                        }
                    }
                    Outcome::Planned { .. } => report.skipped = true,
                }
            }
            Err(e) => {
                report.failed = true;
                report.msg = Some(match e {
                    // stderr goes out verbatim; the exit code is in `rc`.
                    Error::ExternalToolFailure {
                        command, stderr, ..
                    } => {
                        report.cmd = Some(command.clone());
                        stderr.clone()
                    }
                    other => other.to_string(),
                });
                report.param = e.param().map(|(name, value)| Param {
                    name,
                    value: value.to_string(),
                });
                report.rc = e.exit_code();
            }
        }

        report
    }

    fn status(&self) -> &'static str {
        if self.failed {
            "failed"
        } else if self.skipped {
            "check"
        } else if self.changed {
            "changed"
        } else {
            "ok"
        }
    }

    fn print_text<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match &self.resource {
            Some(resource) => writeln!(w, "{}: {}", resource, self.status())?,
            None => writeln!(w, "{}", self.status())?,
        }

        let prefix = if self.skipped { "would run" } else { "ran" };
        for cmd in &self.commands {
            writeln!(w, "  {}: {}", prefix, cmd)?;
        }
        if self.skipped && self.commands.is_empty() {
            writeln!(w, "  no changes needed")?;
        }

        if let Some(cmd) = &self.cmd {
            writeln!(w, "  command: {}", cmd)?;
        }
        if let Some(msg) = &self.msg {
            writeln!(w, "  {}", msg)?;
        }
        if let Some(rc) = self.rc {
            writeln!(w, "  exit code: {}", rc)?;
        }
        if let Some(param) = &self.param {
            writeln!(w, "  {}: {}", param.name, param.value)?;
        }
        Ok(())
    }
}

/// Print reports to stdout.
///
/// JSON output is a single object for one report and an array otherwise.
pub fn print(reports: &[Report], json: bool) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        let text = match reports {
            [single] => serde_json::to_string_pretty(single)?,
            _ => serde_json::to_string_pretty(reports)?,
        };
        writeln!(out, "{}", text)?;
    } else {
        for report in reports {
            report.print_text(&mut out)?;
        }
    }

    Ok(())
}

//! Common test utilities for integration tests.
//!
//! Provides fixture loading for captured `tc` output and a preset
//! [`ScriptedRunner`] describing a host with `lo` and `eth0`.

use std::path::PathBuf;

use tcsync::exec::{ExecOutput, ScriptedRunner};
use tcsync::{Reconciler, Settings};

/// Read a fixture from `tests/fixtures`.
pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {}", path.display(), e))
}

/// Successful command output taken from a fixture.
pub fn output(name: &str) -> ExecOutput {
    ExecOutput::ok(fixture(name))
}

/// A runner for a host with `lo` and `eth0`.
pub fn host() -> ScriptedRunner {
    ScriptedRunner::new(["lo", "eth0"])
}

/// A reconciler with default settings over `runner`.
pub fn reconciler(runner: ScriptedRunner) -> Reconciler<ScriptedRunner> {
    Reconciler::new(runner, Settings::default())
}

/// Render recorded calls as `tc` command lines.
pub fn command_lines(calls: &[Vec<String>]) -> Vec<String> {
    calls.iter().map(|args| format!("tc {}", args.join(" "))).collect()
}

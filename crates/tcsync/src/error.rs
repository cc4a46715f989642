//! Error types for tc reconciliation.

use std::io;

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while validating, inspecting or converging tc state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error (reading a manifest, enumerating interfaces).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The external program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that was being started.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: io::Error,
    },

    /// A handle, rate, ceil or port string is malformed.
    #[error("invalid {param} '{value}': {reason}")]
    InvalidSyntax {
        /// Name of the offending parameter.
        param: &'static str,
        /// The value as supplied.
        value: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The network device does not exist on this host.
    #[error("device doesn't exist on machine: {name}")]
    DeviceNotFound {
        /// The device name that was not found.
        name: String,
    },

    /// The declared parent qdisc is not configured on the device.
    #[error("parent handle does not exist: {parent} on {device}")]
    ParentNotFound {
        /// The parent handle as supplied.
        parent: String,
        /// The device that was inspected.
        device: String,
    },

    /// A class or flow identifier does not fit under its parent.
    #[error("invalid {param} '{value}': {reason}")]
    ClassIdentifierInconsistent {
        /// Either `classid` or `flowid`.
        param: &'static str,
        /// The identifier as supplied.
        value: String,
        /// Which consistency rule was broken.
        reason: &'static str,
    },

    /// A filter points at a class that does not exist.
    #[error("cannot create a filter for a non existent class: {flowid} on {device}")]
    FilterTargetMissing {
        /// The flowid the filter would direct traffic to.
        flowid: String,
        /// The device that was inspected.
        device: String,
    },

    /// The external tool exited with a non-zero status.
    #[error("{command}: {stderr} (exit code {exit_code})")]
    ExternalToolFailure {
        /// The full command line that failed.
        command: String,
        /// Exit code of the process (-1 when killed by a signal).
        exit_code: i32,
        /// Standard error text, verbatim.
        stderr: String,
    },

    /// The external tool printed something the output parser cannot read.
    #[error("unexpected tc output: {0}")]
    Parse(String),

    /// YAML manifest decoding error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON manifest decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an `InvalidSyntax` error.
    pub fn invalid(param: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            param,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error was raised by input validation, before any
    /// mutating command was issued.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidSyntax { .. }
                | Self::DeviceNotFound { .. }
                | Self::ParentNotFound { .. }
                | Self::ClassIdentifierInconsistent { .. }
                | Self::FilterTargetMissing { .. }
        )
    }

    /// Check if this is a "not found" error (device, parent or filter target).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound { .. }
                | Self::ParentNotFound { .. }
                | Self::FilterTargetMissing { .. }
        )
    }

    /// The resource parameter implicated in the failure, with its value.
    pub fn param(&self) -> Option<(&'static str, &str)> {
        match self {
            Self::InvalidSyntax { param, value, .. }
            | Self::ClassIdentifierInconsistent { param, value, .. } => Some((*param, value.as_str())),
            Self::DeviceNotFound { name } => Some(("device", name.as_str())),
            Self::ParentNotFound { parent, .. } => Some(("parent", parent.as_str())),
            Self::FilterTargetMissing { flowid, .. } => Some(("flowid", flowid.as_str())),
            _ => None,
        }
    }

    /// Get the exit code if the external tool failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExternalToolFailure { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

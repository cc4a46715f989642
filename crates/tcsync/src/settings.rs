//! Runtime settings.
//!
//! Settings are immutable once a [`Reconciler`](crate::Reconciler) is built.
//! They can come from a manifest's `settings:` section or from CLI flags.

use serde::{Deserialize, Serialize};

use crate::listing::{KeywordParser, OutputParser, PositionalParser};

/// The qdisc the kernel attaches when nothing is configured.
pub const DEFAULT_QDISC: &str = "pfifo_fast";

/// Which `tc` output parser to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// Fixed token positions of the classic `tc` layout.
    #[default]
    Positional,
    /// Locate values by the keyword that precedes them.
    Keyword,
}

impl ParserKind {
    /// Instantiate the parser.
    pub fn build(self) -> Box<dyn OutputParser> {
        match self {
            Self::Positional => Box::new(PositionalParser),
            Self::Keyword => Box::new(KeywordParser),
        }
    }
}

fn default_tc_path() -> String {
    "tc".to_string()
}

fn default_ip_path() -> String {
    "ip".to_string()
}

fn default_qdiscs() -> Vec<String> {
    vec![DEFAULT_QDISC.to_string()]
}

/// Reconciler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Path of the `tc` binary.
    #[serde(default = "default_tc_path")]
    pub tc_path: String,
    /// Path of the `ip` binary, used when interfaces cannot be listed directly.
    #[serde(default = "default_ip_path")]
    pub ip_path: String,
    /// Output parser strategy.
    #[serde(default)]
    pub parser: ParserKind,
    /// Qdisc kinds that count as "nothing configured".
    #[serde(default = "default_qdiscs")]
    pub default_qdiscs: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tc_path: default_tc_path(),
            ip_path: default_ip_path(),
            parser: ParserKind::default(),
            default_qdiscs: default_qdiscs(),
        }
    }
}

impl Settings {
    pub fn tc_path(mut self, path: impl Into<String>) -> Self {
        self.tc_path = path.into();
        self
    }

    pub fn ip_path(mut self, path: impl Into<String>) -> Self {
        self.ip_path = path.into();
        self
    }

    pub fn parser(mut self, parser: ParserKind) -> Self {
        self.parser = parser;
        self
    }

    /// Check whether a qdisc kind is one of the kernel defaults.
    pub fn is_default_qdisc(&self, kind: &str) -> bool {
        self.default_qdiscs.iter().any(|k| k == kind)
    }
}

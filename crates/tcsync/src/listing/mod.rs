//! Parsing of `tc ... show` output.
//!
//! `tc` only offers a human-readable listing, and its column layout has
//! shifted between iproute2 releases. Parsing is therefore behind the
//! [`OutputParser`] trait so the layout assumption can be swapped without
//! touching the reconciliation logic:
//!
//! - [`PositionalParser`] reads fixed token positions of the classic layout
//!   (`class htb 1:1 root prio 0 rate 100Mbit ceil 100Mbit ...`).
//! - [`KeywordParser`] finds each value by the keyword in front of it, which
//!   also copes with the newer `parent 1:1 leaf 10:` class lines.
//!
//! Both return the same record types.

mod keyword;
mod positional;

pub use keyword::KeywordParser;
pub use positional::PositionalParser;

use std::fmt;

use crate::error::{Error, Result};
use crate::rate;

/// Parent id the kernel reports for ingress qdiscs.
pub const INGRESS_PARENT: &str = "ffff:fff1";

/// One line of `tc qdisc show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QdiscRecord {
    /// Discipline name, e.g. `htb` or `pfifo_fast`.
    pub kind: String,
    /// Handle as printed, e.g. `1:`.
    pub handle: String,
    /// `"root"` for root qdiscs, the parent id otherwise.
    pub parent: Option<String>,
}

impl QdiscRecord {
    pub fn is_root(&self) -> bool {
        self.parent.as_deref() == Some("root")
    }

    pub fn is_ingress(&self) -> bool {
        self.kind == "ingress" || self.parent.as_deref() == Some(INGRESS_PARENT)
    }
}

/// A class from `tc class show`, with rates in bits per second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    pub classid: String,
    pub rate: u64,
    pub ceil: u64,
}

/// A filter from `tc filter show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRecord {
    /// Filter priority (`pref`).
    pub priority: u32,
    /// Matched destination port, for u32 filters.
    pub port: Option<u32>,
    /// Classifier handle as printed, for cgroup filters.
    pub handle: Option<String>,
}

/// Strategy for reading `tc` listings.
pub trait OutputParser: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// All qdisc records in `tc qdisc show` output.
    fn qdiscs(&self, output: &str) -> Result<Vec<QdiscRecord>>;

    /// The class with the given id, if listed.
    fn class(&self, output: &str, classid: &str) -> Result<Option<ClassRecord>>;

    /// The u32 filter at `priority` directing traffic to `flowid`, if listed.
    ///
    /// Several filters may share a flowid; the others are skipped.
    fn u32_filter(
        &self,
        output: &str,
        flowid: &str,
        priority: u32,
    ) -> Result<Option<FilterRecord>>;

    /// The cgroup filter at `priority`, if listed.
    fn cgroup_filter(&self, output: &str, priority: u32) -> Result<Option<FilterRecord>>;

    /// Whether any class line mentions `classid`.
    fn has_class(&self, output: &str, classid: &str) -> bool {
        output
            .lines()
            .any(|line| line.split_whitespace().any(|tok| tok == classid))
    }
}

/// Parse a rate as `tc` prints it.
pub(crate) fn parse_rate(s: &str) -> Result<u64> {
    rate::normalize(s).map_err(|e| Error::Parse(format!("rate '{}': {}", s, e)))
}

/// Parse the value half of a u32 `match VALUE/MASK` key as a port.
pub(crate) fn parse_match_port(key: &str) -> Result<u32> {
    let value = key.split('/').next().unwrap_or_default();
    u32::from_str_radix(value, 16).map_err(|_| Error::Parse(format!("match key '{}'", key)))
}

pub(crate) fn parse_priority(s: &str) -> Result<u32> {
    s.parse()
        .map_err(|_| Error::Parse(format!("filter priority '{}'", s)))
}

/// Compare a listed cgroup handle (`0x8`) with a declared one (`8:`, `0x8`).
///
/// Declared handles with a `0x` prefix are hex, others decimal; a trailing
/// `:` is ignored.
pub fn cgroup_handle_matches(listed: &str, declared: &str) -> bool {
    match (parse_number(listed), parse_number(declared)) {
        (Some(a), Some(b)) => a == b,
        _ => listed == declared,
    }
}

fn parse_number(s: &str) -> Option<u32> {
    let s = s.trim_end_matches(':');
    match s.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

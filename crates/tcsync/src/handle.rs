//! tc handle syntax.
//!
//! A handle is a `major:minor` pair. Qdiscs and filter parents use an empty
//! or zero minor (`1:` or `1:0`), classes and flow targets use a non-zero
//! minor (`1:6`). Both halves are hexadecimal, the way `tc` reads them.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A textual `major:minor` handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handle {
    major: String,
    minor: String,
}

impl Handle {
    /// Split a handle on its single colon.
    ///
    /// Fails unless the string contains exactly one `:`.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(major), Some(minor), None) => Ok(Self {
                major: major.to_string(),
                minor: minor.to_string(),
            }),
            _ => Err(Error::invalid(
                "handle",
                s,
                "expected exactly one ':' separating major and minor",
            )),
        }
    }

    /// The major half, as written.
    pub fn major(&self) -> &str {
        &self.major
    }

    /// The minor half, as written (may be empty).
    pub fn minor(&self) -> &str {
        &self.minor
    }

    /// Numeric major number, if the major half is valid hex.
    pub fn major_id(&self) -> Option<u32> {
        parse_hex(&self.major)
    }

    /// Numeric minor number. An empty minor reads as 0.
    pub fn minor_id(&self) -> Option<u32> {
        if self.minor.is_empty() {
            Some(0)
        } else {
            parse_hex(&self.minor)
        }
    }

    /// True for qdisc/parent handles: the minor is empty or `"0"`.
    pub fn is_qdisc_handle(&self) -> bool {
        self.minor.is_empty() || self.minor == "0"
    }

    /// Compare major numbers, numerically when both are hex, else textually.
    pub fn same_major(&self, other: &Handle) -> bool {
        match (self.major_id(), other.major_id()) {
            (Some(a), Some(b)) => a == b,
            _ => self.major == other.major,
        }
    }
}

impl FromStr for Handle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Check a qdisc handle: exactly one colon, minor empty or `"0"`.
///
/// # Example
///
/// ```
/// use tcsync::handle::validate_handle;
///
/// assert!(validate_handle("1:0"));
/// assert!(validate_handle("1:"));
/// assert!(!validate_handle("1:1"));
/// assert!(!validate_handle("1"));
/// ```
pub fn validate_handle(h: &str) -> bool {
    Handle::parse(h).is_ok_and(|handle| handle.is_qdisc_handle())
}

fn parse_hex(s: &str) -> Option<u32> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

//! Rate strings.
//!
//! `tc` rates are written as an integer followed by a unit, e.g. `10Mbit` or
//! `500kbps`. This module validates them against the supported unit table
//! and normalizes them to bits per second so that a desired rate can be
//! compared with the one `tc` prints back.
//!
//! # Example
//!
//! ```
//! use tcsync::rate;
//!
//! assert_eq!(rate::normalize("10Mbit").unwrap(), 10_000_000);
//! assert_eq!(rate::normalize("500Kbit").unwrap(), 500_000);
//! assert_eq!(rate::normalize("1kbps").unwrap(), 8_000);
//! ```

use std::fmt;

/// Supported units and their value in bits per second.
///
/// The `*bps` units are bytes per second, as in `tc`.
pub const UNITS: &[(&str, u64)] = &[
    ("bit", 1),
    ("kbit", 1_000),
    ("mbit", 1_000_000),
    ("gbit", 1_000_000_000),
    ("bps", 8),
    ("kbps", 8_000),
    ("mbps", 8_000_000),
    ("gbps", 8_000_000_000),
];

/// Why a rate string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateError {
    #[error("incorrect syntax, expected <number><unit>")]
    Syntax,

    #[error("no number specified")]
    NoNumber,

    #[error("rate must be greater than zero")]
    Zero,

    #[error("rate too large")]
    Overflow,

    #[error("invalid unit '{0}', please use one of {units}", units = unit_names())]
    UnknownUnit(String),
}

/// A validated rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    magnitude: u64,
    unit: &'static str,
    bits: u64,
}

impl Rate {
    /// Parse a rate string such as `"10Mbit"`.
    ///
    /// The string must split into exactly one leading digit run and one
    /// trailing unit run. Units are matched case-insensitively.
    pub fn parse(s: &str) -> Result<Self, RateError> {
        let groups = split_groups(s);
        let [number, unit] = groups.as_slice() else {
            return Err(RateError::Syntax);
        };

        let magnitude: u64 = number.parse().map_err(|_| RateError::NoNumber)?;
        if magnitude == 0 {
            return Err(RateError::Zero);
        }

        let lower = unit.to_ascii_lowercase();
        let (unit, factor) = UNITS
            .iter()
            .find(|(name, _)| *name == lower)
            .copied()
            .ok_or_else(|| RateError::UnknownUnit(unit.to_string()))?;

        let bits = magnitude.checked_mul(factor).ok_or(RateError::Overflow)?;

        Ok(Self {
            magnitude,
            unit,
            bits,
        })
    }

    /// The rate in bits per second.
    pub fn bits_per_sec(&self) -> u64 {
        self.bits
    }

    /// The integer part as written.
    pub fn magnitude(&self) -> u64 {
        self.magnitude
    }

    /// The canonical (lowercase) unit name.
    pub fn unit(&self) -> &'static str {
        self.unit
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit)
    }
}

/// Normalize a rate string to bits per second.
pub fn normalize(s: &str) -> Result<u64, RateError> {
    Rate::parse(s).map(|r| r.bits_per_sec())
}

/// Split into alternating runs of ASCII digits and non-digits.
fn split_groups(s: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut start = 0;
    let mut prev: Option<bool> = None;

    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        if prev.is_some_and(|p| p != digit) {
            groups.push(&s[start..i]);
            start = i;
        }
        prev = Some(digit);
    }
    if start < s.len() {
        groups.push(&s[start..]);
    }
    groups
}

fn unit_names() -> String {
    UNITS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

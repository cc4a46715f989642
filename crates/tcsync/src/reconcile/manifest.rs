//! Manifest files.
//!
//! A manifest lists every qdisc, class and filter a host should have, plus
//! optional [`Settings`]:
//!
//! ```yaml
//! settings:
//!   tc_path: /usr/sbin/tc
//! qdiscs:
//!   - device: eth0
//!     handle: "1:0"
//! classes:
//!   - device: eth0
//!     classid: "1:6"
//!     rate: 100mbit
//! filters:
//!   - device: eth0
//!     flowid: "1:6"
//!     priority: 5
//!     port: 80
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::{ClassSpec, FilterSpec, QdiscSpec, State};
use crate::error::Result;
use crate::settings::Settings;

/// Declared traffic-control state for one or more devices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub qdiscs: Vec<QdiscSpec>,
    #[serde(default)]
    pub classes: Vec<ClassSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

/// A borrowed manifest entry.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Qdisc(&'a QdiscSpec),
    Class(&'a ClassSpec),
    Filter(&'a FilterSpec),
}

impl fmt::Display for Resource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qdisc(spec) => write!(f, "{} [{}]", spec, spec.state.as_str()),
            Self::Class(spec) => write!(f, "{} [{}]", spec, spec.state.as_str()),
            Self::Filter(spec) => write!(f, "{} [{}]", spec, spec.state.as_str()),
        }
    }
}

impl Manifest {
    /// Parse a YAML manifest.
    pub fn from_yaml(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Parse a JSON manifest.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load a manifest file. `.json` files are read as JSON, anything else
    /// as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Number of declared resources.
    pub fn len(&self) -> usize {
        self.qdiscs.len() + self.classes.len() + self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resources in application order.
    ///
    /// Present resources are created parents first (qdiscs, classes,
    /// filters); absent ones are removed children first.
    pub fn ordered(&self) -> Vec<Resource<'_>> {
        let present = State::Present;
        let absent = State::Absent;

        let mut out = Vec::with_capacity(self.len());
        out.extend(self.qdiscs.iter().filter(|s| s.state == present).map(Resource::Qdisc));
        out.extend(self.classes.iter().filter(|s| s.state == present).map(Resource::Class));
        out.extend(self.filters.iter().filter(|s| s.state == present).map(Resource::Filter));
        out.extend(self.filters.iter().filter(|s| s.state == absent).map(Resource::Filter));
        out.extend(self.classes.iter().filter(|s| s.state == absent).map(Resource::Class));
        out.extend(self.qdiscs.iter().filter(|s| s.state == absent).map(Resource::Qdisc));
        out
    }
}

//! Desired-state descriptors for qdiscs, classes and filters.
//!
//! Each descriptor carries the resource parameters plus a target [`State`].
//! Field defaults match what the CLI and manifests assume when a field is
//! omitted: device `eth0`, qdisc handle and parents `1:0`, class and flow id
//! `1:1`, discipline `htb`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a resource should exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Resource should exist with the given parameters.
    #[default]
    Present,
    /// Resource should not exist.
    Absent,
}

impl State {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

/// Where a qdisc attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QdiscKind {
    /// Egress root qdisc.
    #[default]
    Root,
    /// Ingress qdisc.
    Ingress,
}

impl QdiscKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Ingress => "ingress",
        }
    }
}

/// Filter classifier style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStyle {
    /// `u32` match on the IP destination port.
    U32Port,
    /// `cgroup` classifier keyed by a class handle; the port is ignored.
    Cgroup,
}

fn default_device() -> String {
    "eth0".to_string()
}

fn default_discipline() -> String {
    "htb".to_string()
}

fn default_qdisc_handle() -> String {
    "1:0".to_string()
}

fn default_class_handle() -> String {
    "1:1".to_string()
}

// ============================================================================
// Qdisc
// ============================================================================

/// Desired qdisc.
///
/// Only one configured qdisc per attach point is managed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QdiscSpec {
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_discipline")]
    pub discipline: String,
    #[serde(default = "default_qdisc_handle")]
    pub handle: String,
    #[serde(default, rename = "qdisc")]
    pub kind: QdiscKind,
    #[serde(default)]
    pub state: State,
}

impl Default for QdiscSpec {
    fn default() -> Self {
        Self {
            device: default_device(),
            discipline: default_discipline(),
            handle: default_qdisc_handle(),
            kind: QdiscKind::Root,
            state: State::Present,
        }
    }
}

impl QdiscSpec {
    /// A root HTB qdisc with handle `1:0` on `device`.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Self::default()
        }
    }

    pub fn handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = handle.into();
        self
    }

    pub fn discipline(mut self, discipline: impl Into<String>) -> Self {
        self.discipline = discipline.into();
        self
    }

    pub fn ingress(mut self) -> Self {
        self.kind = QdiscKind::Ingress;
        self
    }

    pub fn state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    pub fn absent(self) -> Self {
        self.state(State::Absent)
    }

    /// The kind `tc` lists for this qdisc.
    ///
    /// An ingress qdisc is always of kind `ingress`; the declared
    /// discipline only applies at the root.
    pub fn effective_discipline(&self) -> &str {
        match self.kind {
            QdiscKind::Root => &self.discipline,
            QdiscKind::Ingress => "ingress",
        }
    }
}

impl fmt::Display for QdiscSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "qdisc {} {} ({}) on {}",
            self.effective_discipline(),
            self.handle,
            self.kind.as_str(),
            self.device
        )
    }
}

// ============================================================================
// Class
// ============================================================================

/// Desired rate-limiting class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassSpec {
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_qdisc_handle")]
    pub parent: String,
    #[serde(default = "default_class_handle")]
    pub classid: String,
    #[serde(default = "default_discipline")]
    pub discipline: String,
    pub rate: String,
    /// Maximum rate; the rate itself when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceil: Option<String>,
    #[serde(default)]
    pub state: State,
}

impl ClassSpec {
    /// An HTB class `1:1` under `1:0` on `device`.
    pub fn new(device: impl Into<String>, rate: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            parent: default_qdisc_handle(),
            classid: default_class_handle(),
            discipline: default_discipline(),
            rate: rate.into(),
            ceil: None,
            state: State::Present,
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = parent.into();
        self
    }

    pub fn classid(mut self, classid: impl Into<String>) -> Self {
        self.classid = classid.into();
        self
    }

    pub fn discipline(mut self, discipline: impl Into<String>) -> Self {
        self.discipline = discipline.into();
        self
    }

    pub fn ceil(mut self, ceil: impl Into<String>) -> Self {
        self.ceil = Some(ceil.into());
        self
    }

    pub fn state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    pub fn absent(self) -> Self {
        self.state(State::Absent)
    }

    /// The ceil to apply: the declared one, or the rate.
    pub fn effective_ceil(&self) -> &str {
        self.ceil.as_deref().unwrap_or(&self.rate)
    }
}

impl fmt::Display for ClassSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class {} {} (parent {}) on {}",
            self.discipline, self.classid, self.parent, self.device
        )
    }
}

// ============================================================================
// Filter
// ============================================================================

/// Desired filter.
///
/// Filters are identified by priority: two filters with the same priority
/// on the same parent are the same filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_qdisc_handle")]
    pub parent: String,
    #[serde(default = "default_class_handle")]
    pub flowid: String,
    pub priority: u32,
    /// Destination port to match. Ignored for cgroup filters.
    #[serde(default)]
    pub port: u32,
    /// Use the cgroup classifier instead of a u32 port match.
    #[serde(default)]
    pub cgroup: bool,
    /// Class handle for the cgroup classifier, e.g. `"8:"` or `"0x8"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default)]
    pub state: State,
}

impl FilterSpec {
    /// A u32 destination-port filter under `1:0` directing to `1:1`.
    pub fn new(device: impl Into<String>, priority: u32, port: u32) -> Self {
        Self {
            device: device.into(),
            parent: default_qdisc_handle(),
            flowid: default_class_handle(),
            priority,
            port,
            cgroup: false,
            handle: None,
            state: State::Present,
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = parent.into();
        self
    }

    pub fn flowid(mut self, flowid: impl Into<String>) -> Self {
        self.flowid = flowid.into();
        self
    }

    /// Switch to the cgroup classifier with the given class handle.
    pub fn cgroup(mut self, handle: impl Into<String>) -> Self {
        self.cgroup = true;
        self.handle = Some(handle.into());
        self
    }

    pub fn state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    pub fn absent(self) -> Self {
        self.state(State::Absent)
    }

    pub fn style(&self) -> FilterStyle {
        if self.cgroup {
            FilterStyle::Cgroup
        } else {
            FilterStyle::U32Port
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.style() {
            FilterStyle::U32Port => write!(
                f,
                "filter prio {} dport {} -> {} on {}",
                self.priority, self.port, self.flowid, self.device
            ),
            FilterStyle::Cgroup => write!(
                f,
                "filter prio {} cgroup {} -> {} on {}",
                self.priority,
                self.handle.as_deref().unwrap_or("?"),
                self.flowid,
                self.device
            ),
        }
    }
}

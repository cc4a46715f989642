//! `tc` command construction.
//!
//! Each builder appends arguments in stages and stops at the stage the verb
//! needs: `show` only names the device, `del` adds the identifying fields,
//! `add`/`change` add the full parameter set.

use std::fmt;

use crate::reconcile::{ClassSpec, FilterSpec, FilterStyle, QdiscKind, QdiscSpec};

/// Object type of a `tc` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Object {
    Qdisc,
    Class,
    Filter,
}

impl Object {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qdisc => "qdisc",
            Self::Class => "class",
            Self::Filter => "filter",
        }
    }
}

/// Action of a `tc` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Show,
    Add,
    Change,
    Del,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Add => "add",
            Self::Change => "change",
            Self::Del => "del",
        }
    }

    /// Read a verb as it appears on a `tc` command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "show" => Some(Self::Show),
            "add" => Some(Self::Add),
            "change" => Some(Self::Change),
            "del" => Some(Self::Del),
            _ => None,
        }
    }

    /// True for every verb except `show`.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Self::Show)
    }
}

/// A `tc` invocation, without the program path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcCommand {
    object: Object,
    verb: Verb,
    args: Vec<String>,
}

impl TcCommand {
    /// `tc <object> <verb> dev <device>`
    pub fn new(object: Object, verb: Verb, device: &str) -> Self {
        Self {
            object,
            verb,
            args: vec![
                object.as_str().to_string(),
                verb.as_str().to_string(),
                "dev".to_string(),
                device.to_string(),
            ],
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn pair(self, key: &str, value: impl Into<String>) -> Self {
        self.arg(key).arg(value)
    }

    pub fn object(&self) -> Object {
        self.object
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Arguments to pass to the `tc` binary.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for TcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tc {}", self.args.join(" "))
    }
}

/// Build a qdisc command.
///
/// Root: `tc qdisc <verb> dev D` | `root` | `handle H <discipline>`
///
/// Ingress: `tc qdisc <verb> dev D` | `ingress` on delete, `handle H ingress`
/// otherwise. tc reads `ingress` as the qdisc kind, so it has to come last.
pub fn qdisc(spec: &QdiscSpec, verb: Verb) -> TcCommand {
    let cmd = TcCommand::new(Object::Qdisc, verb, &spec.device);
    match (verb, spec.kind) {
        (Verb::Show, _) => cmd,
        (Verb::Del, kind) => cmd.arg(kind.as_str()),
        (_, QdiscKind::Root) => cmd
            .arg(QdiscKind::Root.as_str())
            .pair("handle", &spec.handle)
            .arg(&spec.discipline),
        (_, QdiscKind::Ingress) => cmd
            .pair("handle", &spec.handle)
            .arg(spec.effective_discipline()),
    }
}

/// Build a class command.
///
/// `tc class <verb> dev D` | `parent P classid C` | `<discipline> rate R ceil C`
pub fn class(spec: &ClassSpec, verb: Verb) -> TcCommand {
    let cmd = TcCommand::new(Object::Class, verb, &spec.device);
    if verb == Verb::Show {
        return cmd;
    }

    let cmd = cmd
        .pair("parent", &spec.parent)
        .pair("classid", &spec.classid);
    if verb == Verb::Del {
        return cmd;
    }

    cmd.arg(&spec.discipline)
        .pair("rate", &spec.rate)
        .pair("ceil", spec.effective_ceil())
}

/// Build a u32 or cgroup filter command, whichever the filter declares.
pub fn filter(spec: &FilterSpec, verb: Verb) -> TcCommand {
    match spec.style() {
        FilterStyle::U32Port => u32_filter(spec, verb),
        FilterStyle::Cgroup => cgroup_filter(spec, verb),
    }
}

/// `tc filter <verb> dev D` | `parent P protocol ip prio N u32` |
/// `match ip dport PORT 0xffff flowid F`
fn u32_filter(spec: &FilterSpec, verb: Verb) -> TcCommand {
    let cmd = TcCommand::new(Object::Filter, verb, &spec.device);
    if verb == Verb::Show {
        return cmd;
    }

    let cmd = cmd
        .pair("parent", &spec.parent)
        .pair("protocol", "ip")
        .pair("prio", spec.priority.to_string())
        .arg("u32");
    if verb == Verb::Del {
        return cmd;
    }

    cmd.arg("match")
        .arg("ip")
        .pair("dport", spec.port.to_string())
        .arg("0xffff")
        .pair("flowid", &spec.flowid)
}

/// `tc filter <verb> dev D` | `parent P prio N` | `handle H cgroup`
fn cgroup_filter(spec: &FilterSpec, verb: Verb) -> TcCommand {
    let cmd = TcCommand::new(Object::Filter, verb, &spec.device);
    if verb == Verb::Show {
        return cmd;
    }

    let cmd = cmd
        .pair("parent", &spec.parent)
        .pair("prio", spec.priority.to_string());
    if verb == Verb::Del {
        return cmd;
    }

    cmd.pair("handle", spec.handle.as_deref().unwrap_or_default())
        .arg("cgroup")
}

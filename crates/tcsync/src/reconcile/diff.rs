//! State comparison and planning.
//!
//! Comparison is a pure function of the desired descriptor and the observed
//! record (or its absence). Planning turns the verdict plus the target
//! [`State`] into the ordered list of `tc` commands that converges it.

use super::types::{ClassSpec, FilterSpec, FilterStyle, QdiscKind, QdiscSpec, State};
use super::validate::validate_rate;
use crate::command::{self, TcCommand, Verb};
use crate::error::Result;
use crate::handle::Handle;
use crate::listing::{ClassRecord, FilterRecord, QdiscRecord, cgroup_handle_matches};
use crate::settings::Settings;

/// Observed qdisc relative to the desired one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QdiscState {
    /// Only the kernel default is attached.
    Default,
    /// The configured discipline and handle major equal the desired ones.
    Match,
    /// Something else is configured.
    Change,
}

/// Observed class relative to the desired one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassState {
    /// No class with the target id.
    None,
    /// Rate and ceil both equal the desired values.
    Match,
    /// The class exists with a different rate or ceil.
    Change,
}

/// Observed filter relative to the desired one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    /// No filter at the target priority.
    None,
    /// Priority and match equal the desired ones.
    Match,
    /// A filter with the target priority matches something else.
    Change,
}

/// Whether a qdisc record was configured rather than attached by the kernel.
///
/// Kernel defaults either have a kind listed in the settings or a zero
/// handle major (`0:`).
pub fn is_configured(record: &QdiscRecord, settings: &Settings) -> bool {
    if settings.is_default_qdisc(&record.kind) {
        return false;
    }
    Handle::parse(&record.handle)
        .ok()
        .and_then(|h| h.major_id())
        .is_none_or(|major| major != 0)
}

/// Pick the record at the desired attach point.
pub fn select_qdisc(records: &[QdiscRecord], kind: QdiscKind) -> Option<&QdiscRecord> {
    records.iter().find(|r| match kind {
        QdiscKind::Root => r.is_root(),
        QdiscKind::Ingress => r.is_ingress(),
    })
}

pub fn compare_qdisc(
    desired: &QdiscSpec,
    observed: Option<&QdiscRecord>,
    settings: &Settings,
) -> QdiscState {
    let Some(record) = observed.filter(|r| is_configured(r, settings)) else {
        return QdiscState::Default;
    };

    // The kernel lists every ingress qdisc as `ffff:`.
    let same_handle = desired.kind == QdiscKind::Ingress
        || match (Handle::parse(&record.handle), Handle::parse(&desired.handle)) {
            (Ok(a), Ok(b)) => a.same_major(&b),
            _ => false,
        };

    if record.kind == desired.effective_discipline() && same_handle {
        QdiscState::Match
    } else {
        QdiscState::Change
    }
}

/// Compare normalized rates. Fails only if the desired rate is malformed.
pub fn compare_class(desired: &ClassSpec, observed: Option<&ClassRecord>) -> Result<ClassState> {
    let Some(record) = observed else {
        return Ok(ClassState::None);
    };

    let rate = validate_rate("rate", &desired.rate)?.bits_per_sec();
    let ceil = validate_rate("ceil", desired.effective_ceil())?.bits_per_sec();

    if record.rate == rate && record.ceil == ceil {
        Ok(ClassState::Match)
    } else {
        Ok(ClassState::Change)
    }
}

pub fn compare_filter(desired: &FilterSpec, observed: Option<&FilterRecord>) -> FilterState {
    let Some(record) = observed else {
        return FilterState::None;
    };
    if record.priority != desired.priority {
        // A different filter, not a variant of this one.
        return FilterState::None;
    }

    let same = match desired.style() {
        FilterStyle::U32Port => record.port == Some(desired.port),
        FilterStyle::Cgroup => match (&record.handle, &desired.handle) {
            (Some(listed), Some(declared)) => cgroup_handle_matches(listed, declared),
            _ => false,
        },
    };

    if same {
        FilterState::Match
    } else {
        FilterState::Change
    }
}

pub fn plan_qdisc(spec: &QdiscSpec, observed: QdiscState) -> Vec<TcCommand> {
    match (spec.state, observed) {
        (State::Present, QdiscState::Match) => vec![],
        (State::Present, QdiscState::Change) => vec![
            command::qdisc(spec, Verb::Del),
            command::qdisc(spec, Verb::Add),
        ],
        (State::Present, QdiscState::Default) => vec![command::qdisc(spec, Verb::Add)],
        (State::Absent, QdiscState::Default) => vec![],
        (State::Absent, _) => vec![command::qdisc(spec, Verb::Del)],
    }
}

/// Classes are changed in place.
pub fn plan_class(spec: &ClassSpec, observed: ClassState) -> Vec<TcCommand> {
    match (spec.state, observed) {
        (State::Present, ClassState::Match) => vec![],
        (State::Present, ClassState::Change) => vec![command::class(spec, Verb::Change)],
        (State::Present, ClassState::None) => vec![command::class(spec, Verb::Add)],
        (State::Absent, ClassState::None) => vec![],
        (State::Absent, _) => vec![command::class(spec, Verb::Del)],
    }
}

pub fn plan_filter(spec: &FilterSpec, observed: FilterState) -> Vec<TcCommand> {
    match (spec.state, observed) {
        (State::Present, FilterState::Match) => vec![],
        (State::Present, FilterState::Change) => vec![
            command::filter(spec, Verb::Del),
            command::filter(spec, Verb::Add),
        ],
        (State::Present, FilterState::None) => vec![command::filter(spec, Verb::Add)],
        (State::Absent, FilterState::None) => vec![],
        (State::Absent, _) => vec![command::filter(spec, Verb::Del)],
    }
}

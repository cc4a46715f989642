//! Reconciliation driver.
//!
//! [`Reconciler`] runs validate → inspect → compare → execute for one
//! resource at a time, and applies whole [`Manifest`]s in dependency order.

use std::fmt;

use super::diff::{
    ClassState, FilterState, QdiscState, compare_class, compare_filter, compare_qdisc,
    plan_class, plan_filter, plan_qdisc, select_qdisc,
};
use super::manifest::{Manifest, Resource};
use super::types::{ClassSpec, FilterSpec, FilterStyle, QdiscSpec, State};
use super::validate::{validate_classid, validate_handle, validate_port, validate_rate};
use crate::command::{Object, TcCommand, Verb};
use crate::error::{Error, Result};
use crate::exec::{Runner, SystemRunner, run_checked};
use crate::listing::OutputParser;
use crate::settings::Settings;

/// Options for applying desired state.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Inspect and plan, but don't run any mutating command.
    pub check_only: bool,
    /// Keep applying manifest resources after one fails.
    pub continue_on_error: bool,
}

impl ApplyOptions {
    pub fn check_only(mut self, check_only: bool) -> Self {
        self.check_only = check_only;
        self
    }

    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }
}

/// Result of reconciling one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The resource already is in the desired state.
    Unchanged,
    /// Commands were run.
    Changed {
        commands: Vec<TcCommand>,
        /// Concatenated stdout of the commands.
        output: String,
    },
    /// Check-only mode: the commands that would have run.
    Planned { commands: Vec<TcCommand> },
}

impl Outcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }

    pub fn is_planned(&self) -> bool {
        matches!(self, Self::Planned { .. })
    }

    /// Commands run or planned.
    pub fn commands(&self) -> &[TcCommand] {
        match self {
            Self::Unchanged => &[],
            Self::Changed { commands, .. } | Self::Planned { commands } => commands,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Changed { commands, .. } => write!(f, "changed ({} commands)", commands.len()),
            Self::Planned { commands } if commands.is_empty() => write!(f, "no changes planned"),
            Self::Planned { commands } => write!(f, "would run {} commands", commands.len()),
        }
    }
}

/// Outcome of one manifest resource.
#[derive(Debug)]
pub struct ManifestEntry {
    /// Description of the resource.
    pub resource: String,
    pub result: Result<Outcome>,
}

/// Result of applying a manifest.
#[derive(Debug, Default)]
pub struct ManifestReport {
    /// Entries in application order.
    pub entries: Vec<ManifestEntry>,
}

impl ManifestReport {
    /// Check if every resource converged (or was planned).
    pub fn is_success(&self) -> bool {
        self.entries.iter().all(|e| e.result.is_ok())
    }

    /// Check if any command was run.
    pub fn changed(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.result.as_ref().is_ok_and(Outcome::is_changed))
    }

    /// Failed entries.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.entries
            .iter()
            .filter_map(|e| e.result.as_ref().err().map(|err| (e.resource.as_str(), err)))
    }

    /// Get a human-readable summary.
    pub fn summary_text(&self) -> String {
        if self.entries.is_empty() {
            return "No resources declared".to_string();
        }
        self.entries
            .iter()
            .map(|e| match &e.result {
                Ok(outcome) => format!("{}: {}", e.resource, outcome),
                Err(err) => format!("{}: FAILED: {}", e.resource, err),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Converges qdiscs, classes and filters through the `tc` binary.
pub struct Reconciler<R = SystemRunner> {
    pub(super) runner: R,
    pub(super) settings: Settings,
    pub(super) parser: Box<dyn OutputParser>,
}

impl<R: fmt::Debug> fmt::Debug for Reconciler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("runner", &self.runner)
            .field("settings", &self.settings)
            .field("parser", &self.parser.name())
            .finish()
    }
}

impl Reconciler<SystemRunner> {
    /// A reconciler that runs commands on this host.
    pub fn system(settings: Settings) -> Self {
        Self::new(SystemRunner, settings)
    }
}

impl<R: Runner> Reconciler<R> {
    /// Create a reconciler using the parser selected in `settings`.
    pub fn new(runner: R, settings: Settings) -> Self {
        let parser = settings.parser.build();
        Self {
            runner,
            settings,
            parser,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    async fn show(&self, object: Object, device: &str) -> Result<String> {
        let cmd = TcCommand::new(object, Verb::Show, device);
        run_checked(&self.runner, &self.settings.tc_path, cmd.args()).await
    }

    pub(super) async fn show_qdiscs(&self, device: &str) -> Result<String> {
        self.show(Object::Qdisc, device).await
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Compare the qdisc at the spec's attach point with the spec.
    pub async fn inspect_qdisc(&self, spec: &QdiscSpec) -> Result<QdiscState> {
        let output = self.show_qdiscs(&spec.device).await?;
        let records = self.parser.qdiscs(&output)?;
        let observed = select_qdisc(&records, spec.kind);
        tracing::debug!(device = %spec.device, ?observed, "Inspected qdisc");
        Ok(compare_qdisc(spec, observed, &self.settings))
    }

    /// Compare the listed class with the spec.
    pub async fn inspect_class(&self, spec: &ClassSpec) -> Result<ClassState> {
        let output = self.show(Object::Class, &spec.device).await?;
        let observed = self.parser.class(&output, &spec.classid)?;
        tracing::debug!(device = %spec.device, ?observed, "Inspected class");
        compare_class(spec, observed.as_ref())
    }

    /// Compare the listed filter with the spec.
    pub async fn inspect_filter(&self, spec: &FilterSpec) -> Result<FilterState> {
        let output = self.show(Object::Filter, &spec.device).await?;
        let observed = match spec.style() {
            FilterStyle::U32Port => {
                self.parser
                    .u32_filter(&output, &spec.flowid, spec.priority)?
            }
            FilterStyle::Cgroup => self.parser.cgroup_filter(&output, spec.priority)?,
        };
        tracing::debug!(device = %spec.device, ?observed, "Inspected filter");
        Ok(compare_filter(spec, observed.as_ref()))
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Converge a qdisc.
    ///
    /// Syntax checks run first, then the host checks; nothing is changed
    /// unless all of them pass.
    ///
    /// A differing qdisc is deleted and re-added. If the add fails after the
    /// delete succeeded, the device is left with the kernel default.
    pub async fn qdisc(&self, spec: &QdiscSpec, options: &ApplyOptions) -> Result<Outcome> {
        validate_handle("handle", &spec.handle)?;
        self.validate_device(&spec.device).await?;

        let state = self.inspect_qdisc(spec).await?;
        self.execute(plan_qdisc(spec, state), options).await
    }

    /// Converge a class. Rate or ceil drift is fixed with `tc class change`.
    ///
    /// An absent class whose parent qdisc is gone needs nothing.
    pub async fn class(&self, spec: &ClassSpec, options: &ApplyOptions) -> Result<Outcome> {
        validate_handle("parent", &spec.parent)?;
        validate_classid("classid", &spec.classid, &spec.parent)?;
        validate_rate("rate", &spec.rate)?;
        if let Some(ceil) = &spec.ceil {
            validate_rate("ceil", ceil)?;
        }
        self.validate_device(&spec.device).await?;
        if let Err(e) = self.validate_parent(&spec.device, &spec.parent).await {
            return self.already_gone(spec.state, e, options).await;
        }

        let state = self.inspect_class(spec).await?;
        self.execute(plan_class(spec, state), options).await
    }

    /// Converge a filter.
    ///
    /// A present filter needs its target class. For an absent filter a
    /// missing class means the filter is gone as well.
    pub async fn filter(&self, spec: &FilterSpec, options: &ApplyOptions) -> Result<Outcome> {
        validate_handle("parent", &spec.parent)?;
        validate_classid("flowid", &spec.flowid, &spec.parent)?;
        match spec.style() {
            FilterStyle::U32Port => validate_port(spec.port)?,
            FilterStyle::Cgroup => {
                if spec.handle.as_deref().is_none_or(str::is_empty) {
                    return Err(Error::invalid(
                        "handle",
                        "",
                        "a class handle is required for cgroup filters",
                    ));
                }
            }
        }
        self.validate_device(&spec.device).await?;
        if let Err(e) = self.validate_parent(&spec.device, &spec.parent).await {
            return self.already_gone(spec.state, e, options).await;
        }

        let classes = self.show(Object::Class, &spec.device).await?;
        if !self.parser.has_class(&classes, &spec.flowid) {
            let e = Error::FilterTargetMissing {
                flowid: spec.flowid.clone(),
                device: spec.device.clone(),
            };
            return self.already_gone(spec.state, e, options).await;
        }

        let state = self.inspect_filter(spec).await?;
        self.execute(plan_filter(spec, state), options).await
    }

    /// Converge one manifest resource.
    pub async fn resource(&self, resource: Resource<'_>, options: &ApplyOptions) -> Result<Outcome> {
        match resource {
            Resource::Qdisc(spec) => self.qdisc(spec, options).await,
            Resource::Class(spec) => self.class(spec, options).await,
            Resource::Filter(spec) => self.filter(spec, options).await,
        }
    }

    /// Apply every resource of a manifest.
    ///
    /// Present resources go qdiscs → classes → filters, then absent ones in
    /// the reverse order. Stops at the first failure unless
    /// `continue_on_error` is set.
    pub async fn apply_manifest(&self, manifest: &Manifest, options: &ApplyOptions) -> ManifestReport {
        let mut report = ManifestReport::default();

        for resource in manifest.ordered() {
            let description = resource.to_string();
            tracing::info!(resource = %description, "Reconciling");

            let result = self.resource(resource, options).await;
            let failed = result.is_err();
            if let Err(e) = &result {
                tracing::warn!(resource = %description, error = %e, "Reconciliation failed");
            }
            report.entries.push(ManifestEntry {
                resource: description,
                result,
            });

            if failed && !options.continue_on_error {
                break;
            }
        }

        report
    }

    /// A missing parent or target fails a present resource. An absent one
    /// went away with it, so there is nothing to do.
    async fn already_gone(
        &self,
        state: State,
        err: Error,
        options: &ApplyOptions,
    ) -> Result<Outcome> {
        match (state, &err) {
            (State::Absent, Error::ParentNotFound { .. } | Error::FilterTargetMissing { .. }) => {
                tracing::debug!(error = %err, "Absent resource already removed");
                self.execute(Vec::new(), options).await
            }
            _ => Err(err),
        }
    }

    async fn execute(&self, commands: Vec<TcCommand>, options: &ApplyOptions) -> Result<Outcome> {
        if options.check_only {
            for cmd in &commands {
                tracing::info!(command = %cmd, "Check mode, would run");
            }
            return Ok(Outcome::Planned { commands });
        }

        if commands.is_empty() {
            return Ok(Outcome::Unchanged);
        }

        let mut output = String::new();
        for cmd in &commands {
            tracing::info!(command = %cmd, "Running");
            output.push_str(&run_checked(&self.runner, &self.settings.tc_path, cmd.args()).await?);
        }

        Ok(Outcome::Changed { commands, output })
    }
}

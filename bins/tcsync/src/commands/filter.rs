//! tcsync filter command.
//!
//! Filters are identified by priority: applying a filter with the priority
//! of an existing one replaces it.

use clap::Args;
use tcsync::exec::Runner;
use tcsync::{ApplyOptions, FilterSpec, Reconciler};

use super::StateArg;
use crate::output::Report;

#[derive(Args)]
pub struct FilterCmd {
    /// Network device.
    #[arg(short, long, default_value = "eth0")]
    device: String,

    /// Parent qdisc handle; must already be configured.
    #[arg(long, default_value = "1:0")]
    parent: String,

    /// Class receiving the matched traffic; must already exist.
    #[arg(long, default_value = "1:1")]
    flowid: String,

    /// Filter priority; lower numbers match first.
    #[arg(long)]
    priority: u32,

    /// Destination port to match.
    #[arg(long, required_unless_present = "cgroup")]
    port: Option<u32>,

    /// Classify by cgroup net_cls.classid instead of port.
    #[arg(long, requires = "handle")]
    cgroup: bool,

    /// Class handle for the cgroup classifier, decimal or hex ("8:", "0x8").
    #[arg(long)]
    handle: Option<String>,

    /// Whether the filter should exist.
    #[arg(short, long, value_enum, default_value = "present")]
    state: StateArg,
}

impl FilterCmd {
    fn spec(&self) -> FilterSpec {
        let spec = FilterSpec::new(&self.device, self.priority, self.port.unwrap_or_default())
            .parent(&self.parent)
            .flowid(&self.flowid)
            .state(self.state.into());
        match (&self.handle, self.cgroup) {
            (Some(handle), true) => spec.cgroup(handle),
            _ => spec,
        }
    }

    pub async fn run<R: Runner>(&self, reconciler: &Reconciler<R>, options: &ApplyOptions) -> Report {
        let result = reconciler.filter(&self.spec(), options).await;
        Report::new(None, &result)
    }
}

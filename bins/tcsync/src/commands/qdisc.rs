//! tcsync qdisc command.

use clap::{Args, ValueEnum};
use tcsync::exec::Runner;
use tcsync::{ApplyOptions, QdiscSpec, Reconciler};

use super::StateArg;
use crate::output::Report;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AttachArg {
    Root,
    Ingress,
}

#[derive(Args)]
pub struct QdiscCmd {
    /// Network device.
    #[arg(short, long, default_value = "eth0")]
    device: String,

    /// Qdisc handle; the minor number must be empty or 0.
    #[arg(long, default_value = "1:0")]
    handle: String,

    /// Attach point.
    #[arg(long = "qdisc", value_enum, default_value = "root")]
    attach: AttachArg,

    /// Queueing discipline.
    #[arg(long, default_value = "htb")]
    discipline: String,

    /// Whether the qdisc should exist.
    #[arg(short, long, value_enum, default_value = "present")]
    state: StateArg,
}

impl QdiscCmd {
    fn spec(&self) -> QdiscSpec {
        let spec = QdiscSpec::new(&self.device)
            .handle(&self.handle)
            .discipline(&self.discipline)
            .state(self.state.into());
        match self.attach {
            AttachArg::Root => spec,
            AttachArg::Ingress => spec.ingress(),
        }
    }

    pub async fn run<R: Runner>(&self, reconciler: &Reconciler<R>, options: &ApplyOptions) -> Report {
        let result = reconciler.qdisc(&self.spec(), options).await;
        Report::new(None, &result)
    }
}

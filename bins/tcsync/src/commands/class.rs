//! tcsync class command.

use clap::Args;
use tcsync::exec::Runner;
use tcsync::{ApplyOptions, ClassSpec, Reconciler};

use super::StateArg;
use crate::output::Report;

#[derive(Args)]
pub struct ClassCmd {
    /// Network device.
    #[arg(short, long, default_value = "eth0")]
    device: String,

    /// Parent qdisc handle; must already be configured.
    #[arg(long, default_value = "1:0")]
    parent: String,

    /// Class id; same major as the parent, non-zero minor.
    #[arg(long, default_value = "1:1")]
    classid: String,

    /// Queueing discipline.
    #[arg(long, default_value = "htb")]
    discipline: String,

    /// Guaranteed rate, e.g. 100mbit.
    #[arg(long)]
    rate: String,

    /// Maximum rate (default: the rate).
    #[arg(long)]
    ceil: Option<String>,

    /// Whether the class should exist.
    #[arg(short, long, value_enum, default_value = "present")]
    state: StateArg,
}

impl ClassCmd {
    fn spec(&self) -> ClassSpec {
        let spec = ClassSpec::new(&self.device, &self.rate)
            .parent(&self.parent)
            .classid(&self.classid)
            .discipline(&self.discipline)
            .state(self.state.into());
        match &self.ceil {
            Some(ceil) => spec.ceil(ceil),
            None => spec,
        }
    }

    pub async fn run<R: Runner>(&self, reconciler: &Reconciler<R>, options: &ApplyOptions) -> Report {
        let result = reconciler.class(&self.spec(), options).await;
        Report::new(None, &result)
    }
}

//! Example command - print example manifests.

use clap::{Args, ValueEnum};

#[derive(Args)]
pub struct ExampleArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: OutputFormat,

    /// Example to print
    #[arg(short, long, value_enum, default_value = "basic")]
    pub example: ExampleType,
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExampleType {
    /// HTB root with two shaped ports
    Basic,
    /// Shaping by cgroup net_cls class id
    Cgroup,
    /// Removing a previously applied setup
    Teardown,
}

impl ExampleType {
    fn manifest(self) -> &'static str {
        match self {
            ExampleType::Basic => BASIC_EXAMPLE,
            ExampleType::Cgroup => CGROUP_EXAMPLE,
            ExampleType::Teardown => TEARDOWN_EXAMPLE,
        }
    }
}

pub fn run(args: ExampleArgs) -> anyhow::Result<()> {
    let example = args.example.manifest();

    match args.format {
        OutputFormat::Yaml => {
            println!("{}", example);
        }
        OutputFormat::Json => {
            // Convert YAML to JSON
            let value: serde_yaml::Value = serde_yaml::from_str(example)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

const BASIC_EXAMPLE: &str = r#"# HTB shaping on eth0
# Web traffic gets 450mbit (bursting to 900mbit), SSH gets 10mbit.

qdiscs:
  - device: eth0
    handle: "1:0"
    discipline: htb

classes:
  - device: eth0
    parent: "1:0"
    classid: "1:6"
    rate: 450mbit
    ceil: 900mbit

  # ceil defaults to the rate
  - device: eth0
    parent: "1:0"
    classid: "1:7"
    rate: 10mbit

filters:
  # Filters are identified by priority; use a different one per filter.
  - device: eth0
    parent: "1:0"
    flowid: "1:6"
    priority: 5
    port: 80

  - device: eth0
    parent: "1:0"
    flowid: "1:7"
    priority: 6
    port: 22
"#;

const CGROUP_EXAMPLE: &str = r#"# Shaping by cgroup
# Processes in a net_cls cgroup with classid 0x10008 land in class 1:8.

settings:
  tc_path: /usr/sbin/tc

qdiscs:
  - device: eth0
    handle: "1:0"

classes:
  - device: eth0
    classid: "1:8"
    rate: 100mbit

filters:
  - device: eth0
    flowid: "1:8"
    priority: 8
    cgroup: true
    handle: "8:"
"#;

const TEARDOWN_EXAMPLE: &str = r#"# Teardown
# Absent resources are removed filters first, qdiscs last.

qdiscs:
  - device: eth0
    handle: "1:0"
    state: absent

classes:
  - device: eth0
    classid: "1:6"
    rate: 450mbit
    state: absent

filters:
  - device: eth0
    flowid: "1:6"
    priority: 5
    port: 80
    state: absent
"#;

//! tcsync - declarative traffic control.
//!
//! Converges qdiscs, HTB classes and u32/cgroup filters to a declared state,
//! either one resource at a time or from a manifest.

mod commands;
mod output;

use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tcsync::settings::ParserKind;
use tcsync::{ApplyOptions, Reconciler, Settings};

#[derive(Parser)]
#[command(name = "tcsync", version, about = "Declarative traffic control tool")]
struct Cli {
    /// Inspect and print the commands that would run, without running them.
    #[arg(short = 'C', long, global = true)]
    check: bool,

    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Path of the tc binary.
    #[arg(long, global = true, value_name = "PATH")]
    tc_path: Option<String>,

    /// Path of the ip binary.
    #[arg(long, global = true, value_name = "PATH")]
    ip_path: Option<String>,

    /// How to read tc listings.
    #[arg(long, global = true, value_enum)]
    parser: Option<ParserArg>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ParserArg {
    /// Fixed token positions (classic tc output).
    Positional,
    /// Values located by keyword (newer tc output).
    Keyword,
}

impl From<ParserArg> for ParserKind {
    fn from(arg: ParserArg) -> Self {
        match arg {
            ParserArg::Positional => ParserKind::Positional,
            ParserArg::Keyword => ParserKind::Keyword,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Manage the root or ingress qdisc.
    #[command(visible_alias = "q")]
    Qdisc(commands::qdisc::QdiscCmd),

    /// Manage a rate-limiting class.
    #[command(visible_alias = "c")]
    Class(commands::class::ClassCmd),

    /// Manage a u32 port or cgroup filter.
    #[command(visible_alias = "f")]
    Filter(commands::filter::FilterCmd),

    /// Apply a manifest of qdiscs, classes and filters.
    Apply(commands::apply::ApplyCmd),

    /// Print an example manifest.
    Example(commands::example::ExampleArgs),
}

/// Settings given as global flags.
pub struct Overrides {
    tc_path: Option<String>,
    ip_path: Option<String>,
    parser: Option<ParserArg>,
}

impl Overrides {
    /// Apply the flags that were given on top of `base`.
    pub fn merge(&self, mut base: Settings) -> Settings {
        if let Some(path) = &self.tc_path {
            base = base.tc_path(path);
        }
        if let Some(path) = &self.ip_path {
            base = base.ip_path(path);
        }
        if let Some(parser) = self.parser {
            base = base.parser(parser.into());
        }
        base
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let overrides = Overrides {
        tc_path: cli.tc_path,
        ip_path: cli.ip_path,
        parser: cli.parser,
    };
    let options = ApplyOptions::default().check_only(cli.check);

    let reports = match cli.command {
        Command::Example(args) => {
            commands::example::run(args)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Apply(cmd) => cmd.run(&overrides, options).await?,
        Command::Qdisc(cmd) => {
            let reconciler = Reconciler::system(overrides.merge(Settings::default()));
            vec![cmd.run(&reconciler, &options).await]
        }
        Command::Class(cmd) => {
            let reconciler = Reconciler::system(overrides.merge(Settings::default()));
            vec![cmd.run(&reconciler, &options).await]
        }
        Command::Filter(cmd) => {
            let reconciler = Reconciler::system(overrides.merge(Settings::default()));
            vec![cmd.run(&reconciler, &options).await]
        }
    };

    output::print(&reports, cli.json)?;

    if reports.iter().any(|r| r.failed) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

//! tcsync command implementations.

pub mod apply;
pub mod class;
pub mod example;
pub mod filter;
pub mod qdisc;

use clap::ValueEnum;
use tcsync::State;

/// Desired resource state.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StateArg {
    Present,
    Absent,
}

impl From<StateArg> for State {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Present => State::Present,
            StateArg::Absent => State::Absent,
        }
    }
}

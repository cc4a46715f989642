//! Declarative management of Linux traffic control.
//!
//! This crate converges the qdiscs, HTB classes and u32/cgroup filters of a
//! network device to a declared state by driving the `tc` binary: it
//! validates the declaration, reads the current state from `tc ... show`,
//! and runs only the `add`, `change` or `del` commands needed.
//!
//! # Example
//!
//! ```no_run
//! use tcsync::{ApplyOptions, FilterSpec, Reconciler, Settings};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> tcsync::Result<()> {
//!     let reconciler = Reconciler::system(Settings::default());
//!
//!     let filter = FilterSpec::new("eth0", 5, 80).flowid("1:6");
//!     let outcome = reconciler.filter(&filter, &ApplyOptions::default()).await?;
//!     if outcome.is_changed() {
//!         for cmd in outcome.commands() {
//!             println!("ran: {}", cmd);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`reconcile`] - Desired-state descriptors, comparison and the [`Reconciler`]
//! - [`listing`] - Parsers for `tc` listings
//! - [`command`] - `tc` command construction
//! - [`exec`] - Process execution behind the [`Runner`](exec::Runner) trait
//! - [`handle`], [`rate`], [`device`] - Syntax of handles, rates and device names

pub mod command;
pub mod device;
pub mod error;
pub mod exec;
pub mod handle;
pub mod listing;
pub mod rate;
pub mod reconcile;
pub mod settings;

// Re-export common types at crate root for convenience
pub use error::{Error, Result};
pub use reconcile::{
    ApplyOptions, ClassSpec, FilterSpec, Manifest, ManifestReport, Outcome, QdiscSpec, Reconciler,
    State,
};
pub use settings::Settings;

//! Declarative traffic-control state.
//!
//! Describe the qdisc, class or filter a device should have and let the
//! [`Reconciler`] work out which `tc` commands get it there:
//!
//! ```no_run
//! use tcsync::reconcile::{ApplyOptions, ClassSpec, QdiscSpec, Reconciler};
//! use tcsync::Settings;
//!
//! # async fn example() -> tcsync::Result<()> {
//! let reconciler = Reconciler::system(Settings::default());
//! let options = ApplyOptions::default();
//!
//! reconciler.qdisc(&QdiscSpec::new("eth0"), &options).await?;
//! let outcome = reconciler
//!     .class(&ClassSpec::new("eth0", "450mbit").classid("1:6"), &options)
//!     .await?;
//! println!("{}", outcome);
//! # Ok(())
//! # }
//! ```
//!
//! Each call validates its input, lists the current state with
//! `tc ... show`, compares, and runs only what differs:
//!
//! | resource | differs        | action          |
//! |----------|----------------|-----------------|
//! | qdisc    | kind or handle | delete, add     |
//! | class    | rate or ceil   | change in place |
//! | filter   | port or handle | delete, add     |
//!
//! With [`ApplyOptions::check_only`] the commands are returned as
//! [`Outcome::Planned`] instead of being run.

mod apply;
mod diff;
mod manifest;
mod types;
mod validate;

pub use apply::{ApplyOptions, ManifestEntry, ManifestReport, Outcome, Reconciler};
pub use diff::{
    ClassState, FilterState, QdiscState, compare_class, compare_filter, compare_qdisc,
    is_configured, plan_class, plan_filter, plan_qdisc, select_qdisc,
};
pub use manifest::{Manifest, Resource};
pub use types::*;
pub use validate::{MAX_PORT, validate_classid, validate_handle, validate_port, validate_rate};

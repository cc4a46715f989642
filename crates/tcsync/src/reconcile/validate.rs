//! Input validation.
//!
//! Everything here runs before any mutating `tc` call. The pure checks only
//! look at the descriptor; [`Reconciler::validate_device`] and
//! [`Reconciler::validate_parent`] query the host with read-only commands.

use super::apply::Reconciler;
use super::diff::is_configured;
use crate::device;
use crate::error::{Error, Result};
use crate::exec::{Runner, run_checked};
use crate::handle::{Handle, validate_handle as handle_syntax_ok};
use crate::rate::Rate;

/// Highest port a u32 `dport` match accepts.
pub const MAX_PORT: u32 = 65535;

/// Check a qdisc or parent handle.
pub fn validate_handle(param: &'static str, value: &str) -> Result<()> {
    if handle_syntax_ok(value) {
        Ok(())
    } else {
        Err(Error::invalid(
            param,
            value,
            "expected 'major:' or 'major:0' (see tc(8), HANDLES)",
        ))
    }
}

/// Check a class or flow id against its parent.
///
/// The major number must equal the parent's and the minor must be present
/// and non-zero.
pub fn validate_classid(param: &'static str, value: &str, parent: &str) -> Result<()> {
    let inconsistent = |reason| Error::ClassIdentifierInconsistent {
        param,
        value: value.to_string(),
        reason,
    };

    let parent = Handle::parse(parent)?;
    let id = Handle::parse(value).map_err(|_| inconsistent("expected 'major:minor'"))?;

    if !id.same_major(&parent) {
        return Err(inconsistent("major number does not match the parent"));
    }
    match id.minor_id() {
        _ if id.minor().is_empty() => Err(inconsistent("minor number is missing")),
        Some(0) => Err(inconsistent("minor number must not be 0")),
        Some(_) => Ok(()),
        None => Err(inconsistent("minor number is not hexadecimal")),
    }
}

/// Check a rate or ceil string.
pub fn validate_rate(param: &'static str, value: &str) -> Result<Rate> {
    Rate::parse(value).map_err(|e| Error::invalid(param, value, e.to_string()))
}

/// Check a u32 match port.
pub fn validate_port(port: u32) -> Result<()> {
    if port > MAX_PORT {
        return Err(Error::invalid(
            "port",
            port.to_string(),
            format!("must be at most {} for a u32 port filter", MAX_PORT),
        ));
    }
    Ok(())
}

impl<R: Runner> Reconciler<R> {
    /// Fail unless `name` is an interface on this host.
    ///
    /// Uses the runner's interface list, or a substring search of `ip a`
    /// output when the list is unavailable.
    pub async fn validate_device(&self, name: &str) -> Result<()> {
        device::validate_name(name)?;

        let found = match self.runner.interfaces() {
            Some(interfaces) => interfaces.iter().any(|i| i == name),
            None => {
                tracing::debug!(device = name, "Interface list unavailable, falling back to ip a");
                let output =
                    run_checked(&self.runner, &self.settings.ip_path, &["a".to_string()]).await?;
                device::appears_in_ip_output(&output, name)
            }
        };

        if found {
            Ok(())
        } else {
            Err(Error::DeviceNotFound {
                name: name.to_string(),
            })
        }
    }

    /// Fail unless a configured qdisc on `device` has the parent's major.
    pub async fn validate_parent(&self, device: &str, parent: &str) -> Result<()> {
        let wanted = Handle::parse(parent)?;
        let output = self.show_qdiscs(device).await?;
        let records = self.parser.qdiscs(&output)?;

        let found = records
            .iter()
            .filter(|r| is_configured(r, &self.settings))
            .filter_map(|r| Handle::parse(&r.handle).ok())
            .any(|h| h.same_major(&wanted));

        if found {
            Ok(())
        } else {
            Err(Error::ParentNotFound {
                parent: parent.to_string(),
                device: device.to_string(),
            })
        }
    }
}

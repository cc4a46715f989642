//! Network device name checks and enumeration.

use crate::error::{Error, Result};

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

/// Where the kernel lists network devices.
pub const SYSFS_NET: &str = "/sys/class/net";

/// Validate an interface name before it is placed on a `tc` command line.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid("device", name, "empty name"));
    }

    if name.len() >= IFNAMSIZ {
        return Err(Error::invalid(
            "device",
            name,
            format!("name too long (max {} chars)", IFNAMSIZ - 1),
        ));
    }

    if name.contains('/') || name.contains('\0') {
        return Err(Error::invalid(
            "device",
            name,
            "name contains invalid characters",
        ));
    }

    if name.chars().any(|c| c.is_whitespace()) {
        return Err(Error::invalid("device", name, "name contains whitespace"));
    }

    Ok(())
}

/// Get all interface names known to the kernel.
pub fn list_interfaces() -> Result<Vec<String>> {
    let entries = std::fs::read_dir(SYSFS_NET)?;

    let mut names = Vec::new();
    for entry in entries.flatten() {
        names.push(entry.file_name().to_string_lossy().to_string());
    }

    names.sort();
    Ok(names)
}

/// Check `ip a` output for a device name.
///
/// This is a plain substring search; it is only used when the interface
/// list itself cannot be read.
pub fn appears_in_ip_output(output: &str, name: &str) -> bool {
    output.contains(name)
}

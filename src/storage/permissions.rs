//! File permissions
//!
//! Renders permission bits the way `ls` users expect: three octal digits.

use std::fs::Metadata;

/// Permission bits as a three-digit octal string, e.g. `"644"`
#[cfg(unix)]
pub fn permission_string(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", metadata.permissions().mode() & 0o777)
}

/// Approximation from the read-only flag where Unix modes do not exist
#[cfg(not(unix))]
pub fn permission_string(metadata: &Metadata) -> String {
    let readonly = metadata.permissions().readonly();
    let mode = match (metadata.is_dir(), readonly) {
        (true, false) => "755",
        (true, true) => "555",
        (false, false) => "644",
        (false, true) => "444",
    };
    mode.to_string()
}

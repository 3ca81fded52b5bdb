//! Vendored JDK resolution for the child process environment.

use anyhow::Result;
use std::path::PathBuf;

use crate::error::LaunchError;
use crate::layout::VendorLayout;

/// Environment variable the child process reads its runtime home from.
pub const JAVA_HOME: &str = "JAVA_HOME";

/// JAVA_HOME for the vendored JDK, failing when the home directory does not
/// exist (a runtime that was never provisioned, or a broken unpack).
pub fn require_home(layout: &VendorLayout) -> Result<PathBuf> {
    let home = layout.jdk_home();
    if !home.is_dir() {
        return Err(LaunchError::MissingJdk(home).into());
    }
    Ok(home)
}

//! Per-project launcher configuration.
//!
//! Unlike user-level tools this config is pinned in the project tree
//! (`glaunch.toml` at the project root) so every checkout resolves the same
//! dependency store. It is therefore never auto-created; absence means
//! defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the optional config file at the project root.
pub const CONFIG_FILE: &str = "glaunch.toml";

/// HTTP knobs for dependency fetches (optional `[http]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout in seconds. Archives are large; keep generous.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 3600,
        }
    }
}

/// Configuration loaded from `<project_root>/glaunch.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Base URL of the content-addressed dependency store. Archives are
    /// fetched from `<dep_base_url>/<sha256 digest>`.
    pub dep_base_url: String,
    /// Vendor directory relative to the project root.
    pub vendor_dir: String,
    /// HTTP fetch knobs.
    pub http: HttpConfig,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            dep_base_url: "https://storage.googleapis.com/glaunch-deps".to_string(),
            vendor_dir: "third_party".to_string(),
            http: HttpConfig::default(),
        }
    }
}

/// Load configuration from the project root, falling back to defaults when
/// no config file exists.
pub fn load_or_default(project_root: &Path) -> Result<LauncherConfig> {
    let path = project_root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(LauncherConfig::default());
    }
    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LauncherConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

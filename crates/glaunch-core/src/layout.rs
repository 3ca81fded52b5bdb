//! Vendored dependency tree layout and project-root discovery.
//!
//! Everything lives under `<project_root>/<vendor_dir>`:
//!
//! ```text
//! third_party/gradle/gradle.zip          archive
//! third_party/gradle/gradle.zip.sha256   checksum sidecar
//! third_party/gradle/gradle/             installation (top-level dir in the zip)
//! third_party/jdk/jdk.zip
//! third_party/jdk/jdk.zip.sha256
//! third_party/jdk/jdk/
//! ```

use std::path::{Path, PathBuf};

/// Files that mark a project root when discovering it from a subdirectory.
const ROOT_MARKERS: &[&str] = &["glaunch.toml", "settings.gradle", "settings.gradle.kts"];

/// Resolves all vendored paths for one project.
#[derive(Debug, Clone)]
pub struct VendorLayout {
    root: PathBuf,
    vendor: PathBuf,
}

impl VendorLayout {
    pub fn new(root: impl Into<PathBuf>, vendor_dir: &str) -> Self {
        let root = root.into();
        let vendor = root.join(vendor_dir);
        Self { root, vendor }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn gradle_dir(&self) -> PathBuf {
        self.vendor.join("gradle")
    }

    pub fn gradle_archive(&self) -> PathBuf {
        self.gradle_dir().join("gradle.zip")
    }

    pub fn gradle_sidecar(&self) -> PathBuf {
        self.gradle_dir().join("gradle.zip.sha256")
    }

    /// Directory the archive's top-level `gradle/` entry unpacks to.
    pub fn gradle_install_dir(&self) -> PathBuf {
        self.gradle_dir().join("gradle")
    }

    /// Platform-conditional launcher script inside the installation.
    pub fn gradle_executable(&self) -> PathBuf {
        let script = if cfg!(windows) { "gradle.bat" } else { "gradle" };
        self.gradle_install_dir().join("bin").join(script)
    }

    pub fn jdk_dir(&self) -> PathBuf {
        self.vendor.join("jdk")
    }

    pub fn jdk_archive(&self) -> PathBuf {
        self.jdk_dir().join("jdk.zip")
    }

    pub fn jdk_sidecar(&self) -> PathBuf {
        self.jdk_dir().join("jdk.zip.sha256")
    }

    pub fn jdk_install_dir(&self) -> PathBuf {
        self.jdk_dir().join("jdk")
    }

    /// JAVA_HOME for the vendored JDK. macOS bundles nest the actual home.
    pub fn jdk_home(&self) -> PathBuf {
        let install = self.jdk_install_dir();
        if cfg!(target_os = "macos") {
            install.join("Contents").join("Home")
        } else {
            install
        }
    }
}

/// Walk upward from `start` looking for a project-root marker file.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        for marker in ROOT_MARKERS {
            if dir.join(marker).is_file() {
                return Some(dir.to_path_buf());
            }
        }
        dir = dir.parent()?;
    }
}

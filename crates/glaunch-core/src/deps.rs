//! Ensure-present logic for vendored dependencies.
//!
//! A dependency is a zip archive plus its checksum sidecar plus the unpacked
//! installation. The archive is refetched only when missing or failing
//! verification; a valid archive with a missing installation is just
//! unpacked again.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::checksum;
use crate::config::LauncherConfig;
use crate::fetch::{self, HttpOptions};
use crate::layout::VendorLayout;

/// One vendored dependency: where its pieces live and what proves it is
/// installed.
#[derive(Debug, Clone)]
pub struct DepSpec {
    /// Human-readable name for log and error messages.
    pub name: &'static str,
    /// Path whose existence marks a complete installation.
    pub probe: PathBuf,
    pub archive: PathBuf,
    pub sidecar: PathBuf,
    /// Installation directory, removed when stale before unpacking.
    pub install_dir: PathBuf,
}

impl DepSpec {
    pub fn gradle(layout: &VendorLayout) -> Self {
        Self {
            name: "Gradle distribution",
            probe: layout.gradle_executable(),
            archive: layout.gradle_archive(),
            sidecar: layout.gradle_sidecar(),
            install_dir: layout.gradle_install_dir(),
        }
    }

    pub fn jdk(layout: &VendorLayout) -> Self {
        Self {
            name: "JDK",
            probe: layout.jdk_home(),
            archive: layout.jdk_archive(),
            sidecar: layout.jdk_sidecar(),
            install_dir: layout.jdk_install_dir(),
        }
    }
}

/// True when the archive exists and matches its sidecar.
/// A missing sidecar is an error: it names the object to fetch, so without it
/// the dependency cannot be provisioned at all.
pub fn archive_is_valid(spec: &DepSpec) -> Result<bool> {
    anyhow::ensure!(
        spec.sidecar.is_file(),
        "missing checksum sidecar {} for {}",
        spec.sidecar.display(),
        spec.name
    );
    if !spec.archive.is_file() {
        return Ok(false);
    }
    checksum::verify_archive(&spec.archive, &spec.sidecar)
}

/// Make one dependency present: fetch the archive if missing or invalid,
/// verify it against the sidecar, and unpack when the installation is absent
/// or the archive changed.
pub fn ensure(spec: &DepSpec, cfg: &LauncherConfig) -> Result<()> {
    let archive_ok = archive_is_valid(spec)?;
    if archive_ok && spec.probe.exists() {
        tracing::debug!("{} up to date at {}", spec.name, spec.install_dir.display());
        return Ok(());
    }

    if !archive_ok {
        let digest = checksum::read_sidecar(&spec.sidecar)?;
        let url = fetch::object_url(&cfg.dep_base_url, &digest)?;
        tracing::info!("fetching {} from {}", spec.name, url);
        fetch::download_to(&url, &spec.archive, &HttpOptions::from(&cfg.http))
            .with_context(|| format!("fetch {}", spec.name))?;
        if !checksum::verify_archive(&spec.archive, &spec.sidecar)? {
            let _ = fs::remove_file(&spec.archive);
            anyhow::bail!(
                "checksum mismatch for {} archive {}",
                spec.name,
                spec.archive.display()
            );
        }
    }

    if spec.install_dir.exists() {
        fs::remove_dir_all(&spec.install_dir)
            .with_context(|| format!("remove stale {}", spec.install_dir.display()))?;
    }
    let unpack_root = spec
        .install_dir
        .parent()
        .with_context(|| format!("{} has no parent", spec.install_dir.display()))?;
    unpack_zip(&spec.archive, unpack_root)?;
    tracing::info!("{} installed at {}", spec.name, spec.install_dir.display());
    Ok(())
}

pub fn ensure_gradle(layout: &VendorLayout, cfg: &LauncherConfig) -> Result<()> {
    ensure(&DepSpec::gradle(layout), cfg)
}

pub fn ensure_jdk(layout: &VendorLayout, cfg: &LauncherConfig) -> Result<()> {
    ensure(&DepSpec::jdk(layout), cfg)
}

pub fn ensure_all(layout: &VendorLayout, cfg: &LauncherConfig) -> Result<()> {
    ensure_gradle(layout, cfg)?;
    ensure_jdk(layout, cfg)
}

/// Extract a zip archive into `dest`. Entries escaping the destination
/// (absolute paths or `..` components) are skipped. Unix mode bits are
/// restored so launcher scripts stay executable.
pub fn unpack_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("invalid zip archive {}", archive.display()))?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).context("read zip entry")?;
        let name = entry.name().to_string();
        if name.contains("..") || name.starts_with('/') {
            tracing::warn!("skipping suspicious zip entry {:?}", name);
            continue;
        }
        let out_path = dest.join(&name);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("create {}", out_path.display()))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let mut out =
            fs::File::create(&out_path).with_context(|| format!("create {}", out_path.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("extract {} from {}", name, archive.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))
                .with_context(|| format!("set mode on {}", out_path.display()))?;
        }
    }
    Ok(())
}

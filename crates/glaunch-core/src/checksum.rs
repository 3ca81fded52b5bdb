//! Checksum sidecar verification for vendored archives.
//!
//! A sidecar file next to each archive holds its expected SHA-256. The digest
//! doubles as the object name in the remote dependency store, so a missing or
//! malformed sidecar means there is nothing to verify against and nothing to
//! fetch.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Compute SHA-256 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for large archives.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let digest = hasher.finalize();
    Ok(hex::encode(digest))
}

/// Read the expected digest from a sidecar file.
///
/// Accepts `sha256sum` output (digest optionally followed by a filename); the
/// first token must be 64 hex characters. Returned lowercased.
pub fn read_sidecar(path: &Path) -> Result<String> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("read checksum sidecar {}", path.display()))?;
    let token = data
        .split_whitespace()
        .next()
        .with_context(|| format!("empty checksum sidecar {}", path.display()))?;
    anyhow::ensure!(
        token.len() == 64 && token.chars().all(|c| c.is_ascii_hexdigit()),
        "malformed checksum sidecar {}: expected 64 hex chars, got {:?}",
        path.display(),
        token
    );
    Ok(token.to_ascii_lowercase())
}

/// True when the archive's digest equals the sidecar's expected digest.
pub fn verify_archive(archive: &Path, sidecar: &Path) -> Result<bool> {
    let expected = read_sidecar(sidecar)?;
    let actual = sha256_path(archive)?;
    Ok(actual == expected)
}

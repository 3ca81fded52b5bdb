//! Blocking fetch from the content-addressed dependency store.
//!
//! Archives are stored under their own SHA-256, so the sidecar digest is both
//! the object name and the verification key. Uses the curl crate (libcurl)
//! with a single sequential GET; no ranges, no retries.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::config::HttpConfig;

/// Timeouts applied to a single archive fetch.
#[derive(Debug, Clone, Copy)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl From<&HttpConfig> for HttpOptions {
    fn from(cfg: &HttpConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

/// Build the store URL for an object named by its digest.
pub fn object_url(base: &str, digest: &str) -> Result<String> {
    let parsed = Url::parse(base).with_context(|| format!("invalid dep_base_url {:?}", base))?;
    anyhow::ensure!(
        matches!(parsed.scheme(), "http" | "https"),
        "dep_base_url {:?} must be http(s)",
        base
    );
    Ok(format!("{}/{}", base.trim_end_matches('/'), digest))
}

/// Download `url` to `dest`, creating parent directories as needed.
/// Returns the number of bytes written. A non-2xx response or a short write
/// removes the partial file and fails.
pub fn download_to(url: &str, dest: &Path, http: &HttpOptions) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut file =
        fs::File::create(dest).with_context(|| format!("create {}", dest.display()))?;
    let mut written: u64 = 0;

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(http.connect_timeout)?;
    easy.timeout(http.timeout)?;

    let perform_result = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    tracing::warn!("archive write failed: {}", e);
                    Ok(0) // abort transfer
                }
            }
        })?;
        transfer.perform()
    };

    if let Err(e) = perform_result {
        let _ = fs::remove_file(dest);
        return Err(e).with_context(|| format!("GET {} failed", url));
    }

    let code = easy.response_code().context("no response code")?;
    if code < 200 || code >= 300 {
        let _ = fs::remove_file(dest);
        anyhow::bail!("GET {} returned HTTP {}", url, code);
    }

    file.flush().with_context(|| format!("flush {}", dest.display()))?;
    Ok(written)
}

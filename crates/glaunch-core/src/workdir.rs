//! Scoped working-directory change with guaranteed restoration.
//!
//! The process working directory is the one piece of global state this tool
//! mutates: `./gradlew` must resolve against the entered directory. The guard
//! restores the previous directory on drop, which covers early returns and
//! panics alike.

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// RAII guard: enters a directory on construction, restores the previous one
/// on drop.
#[derive(Debug)]
pub struct ScopedCwd {
    previous: PathBuf,
}

impl ScopedCwd {
    pub fn enter(dir: &Path) -> Result<Self> {
        let previous = env::current_dir().context("read current directory")?;
        env::set_current_dir(dir).with_context(|| format!("enter {}", dir.display()))?;
        Ok(Self { previous })
    }
}

impl Drop for ScopedCwd {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.previous) {
            tracing::warn!(
                "failed to restore working directory {}: {}",
                self.previous.display(),
                e
            );
        }
    }
}

/// Serializes tests that mutate the process working directory. The cwd is
/// process-global while the test harness is multi-threaded.
#[cfg(test)]
pub(crate) static CWD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) fn cwd_guard() -> std::sync::MutexGuard<'static, ()> {
    CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//! Typed launcher failures, converted to anyhow at operation boundaries.

use std::path::PathBuf;
use thiserror::Error;

/// Failure modes of a Gradle invocation that callers may want to match on
/// (e.g. to suppress nonzero-exit errors and read the code instead).
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Gradle ran and exited with a nonzero status.
    #[error("gradle exited with status {0}")]
    ExitStatus(i32),
    /// Gradle was terminated by a signal, so no exit code exists.
    #[error("gradle was terminated by a signal")]
    Terminated,
    /// The vendored JDK home does not exist after the ensure step.
    #[error("vendored JDK missing at {}", .0.display())]
    MissingJdk(PathBuf),
}

//! CLI for the glaunch pinned Gradle launcher.
//!
//! All trailing arguments are forwarded to Gradle verbatim; only the options
//! below are consumed locally.

use anyhow::Result;
use clap::Parser;
use glaunch_core::launcher::{self, Launcher, RunOptions};
use glaunch_core::layout;
use std::ffi::OsString;
use std::path::PathBuf;

/// Top-level CLI for the pinned Gradle launcher.
#[derive(Debug, Parser)]
#[command(name = "glaunch")]
#[command(
    about = "Ensures the vendored Gradle and matching JDK are present, then runs Gradle",
    long_about = None
)]
pub struct Cli {
    /// Run Gradle on a custom JDK (translated to -Dorg.gradle.java.home).
    #[arg(long, alias = "java_home", value_name = "PATH")]
    pub java_home: Option<PathBuf>,

    /// Project root holding the vendored toolchain (default: discovered
    /// upward from the current directory).
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Append -Pexclude_deps to the invocation.
    #[arg(long)]
    pub exclude_deps: bool,

    /// Arguments forwarded to Gradle verbatim.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Cli {
    pub fn run_from_args() -> Result<i32> {
        Cli::parse().execute()
    }

    /// Forwarded argument list after local option translation.
    fn forwarded_args(&self) -> Vec<OsString> {
        launcher::gradle_args(&self.args, self.java_home.as_deref(), self.exclude_deps)
    }

    fn execute(self) -> Result<i32> {
        let root = match &self.project_root {
            Some(r) => r.clone(),
            None => {
                let cwd = std::env::current_dir()?;
                layout::find_project_root(&cwd).unwrap_or(cwd)
            }
        };
        tracing::debug!("project root: {}", root.display());

        let launcher = Launcher::new(root)?;
        let args = self.forwarded_args();
        // check = false: nonzero exits are forwarded as our own exit code
        // rather than raised.
        let opts = RunOptions {
            check: false,
            ..RunOptions::default()
        };
        launcher.run(&args, &opts)
    }
}

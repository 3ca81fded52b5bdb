//! Gradle invocation: argument assembly, dependency ensure, subprocess call.
//!
//! Every run operation first makes the vendored Gradle and JDK present, logs
//! the full command line, enters the target working directory for the
//! duration of the call, and hands the child a `JAVA_HOME` pointing at the
//! vendored (or overridden) JDK.

use anyhow::{Context, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{self, LauncherConfig};
use crate::deps;
use crate::error::LaunchError;
use crate::jdk;
use crate::layout::VendorLayout;
use crate::workdir::ScopedCwd;

/// Gradle property flag the exclude-deps convenience variant appends.
pub const EXCLUDE_DEPS_FLAG: &str = "-Pexclude_deps";

/// Gradle system property selecting the JDK Gradle itself runs on.
pub const JAVA_HOME_PROPERTY: &str = "-Dorg.gradle.java.home";

/// Per-invocation options.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Treat a nonzero exit as an error (`run_*` only; capture variants
    /// always do).
    pub check: bool,
    /// JAVA_HOME for the child, overriding the vendored JDK.
    pub java_home: Option<PathBuf>,
    /// Extra environment for the child.
    pub extra_env: Vec<(OsString, OsString)>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            check: true,
            java_home: None,
            extra_env: Vec::new(),
        }
    }
}

/// Assemble the forwarded argument list: user args, then the JDK override
/// property, then the exclude-deps flag.
pub fn gradle_args(
    forwarded: &[String],
    java_home: Option<&Path>,
    exclude_deps: bool,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = forwarded.iter().map(OsString::from).collect();
    if let Some(home) = java_home {
        let mut flag = OsString::from(format!("{}=", JAVA_HOME_PROPERTY));
        flag.push(home.as_os_str());
        args.push(flag);
    }
    if exclude_deps {
        args.push(OsString::from(EXCLUDE_DEPS_FLAG));
    }
    args
}

/// Render a command line for logging.
fn format_command(program: &OsStr, args: &[OsString]) -> String {
    let mut parts = vec![program.to_string_lossy().into_owned()];
    parts.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Name of the per-project wrapper script, resolved against the working
/// directory it is invoked from.
pub fn wrapper_script() -> &'static str {
    if cfg!(windows) {
        "gradlew.bat"
    } else {
        "./gradlew"
    }
}

/// Invokes the vendored Gradle for one project.
#[derive(Debug)]
pub struct Launcher {
    layout: VendorLayout,
    config: LauncherConfig,
}

impl Launcher {
    /// Build a launcher for a project root, reading `glaunch.toml` if present.
    ///
    /// The root is canonicalized up front: vendored paths derived from it are
    /// spawned from inside other working directories, so they must stay
    /// absolute.
    pub fn new(project_root: impl Into<PathBuf>) -> Result<Self> {
        let root = project_root.into();
        let root = root
            .canonicalize()
            .with_context(|| format!("resolve project root {}", root.display()))?;
        let config = config::load_or_default(&root)?;
        let layout = VendorLayout::new(&root, &config.vendor_dir);
        Ok(Self { layout, config })
    }

    pub fn layout(&self) -> &VendorLayout {
        &self.layout
    }

    /// Make the vendored Gradle and JDK present, fetching if missing.
    pub fn ensure_deps(&self) -> Result<()> {
        deps::ensure_all(&self.layout, &self.config)
    }

    fn command(&self, program: &OsStr, args: &[OsString], opts: &RunOptions) -> Result<Command> {
        let home = match &opts.java_home {
            Some(p) => p.clone(),
            None => jdk::require_home(&self.layout)?,
        };
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.env(jdk::JAVA_HOME, &home);
        for (k, v) in &opts.extra_env {
            cmd.env(k, v);
        }
        Ok(cmd)
    }

    /// Run `program` with `args` from inside `cwd`, streaming stdio, and
    /// return the exit code. With `opts.check`, a nonzero exit becomes
    /// `LaunchError::ExitStatus`.
    pub fn run_in(
        &self,
        program: &OsStr,
        args: &[OsString],
        cwd: &Path,
        opts: &RunOptions,
    ) -> Result<i32> {
        self.ensure_deps()?;
        tracing::info!("running: {}", format_command(program, args));
        let mut cmd = self.command(program, args, opts)?;
        let status = {
            let _cwd = ScopedCwd::enter(cwd)?;
            cmd.status()
                .with_context(|| format!("spawn {}", program.to_string_lossy()))?
        };
        let code = status.code().ok_or(LaunchError::Terminated)?;
        if opts.check && code != 0 {
            return Err(LaunchError::ExitStatus(code).into());
        }
        Ok(code)
    }

    /// Run the vendored Gradle from the project root.
    pub fn run(&self, args: &[OsString], opts: &RunOptions) -> Result<i32> {
        let exe = self.layout.gradle_executable();
        self.run_in(exe.as_os_str(), args, self.layout.root(), opts)
    }

    /// Run a project's own `./gradlew` from inside `cwd`.
    pub fn run_wrapper_in(&self, args: &[OsString], cwd: &Path, opts: &RunOptions) -> Result<i32> {
        self.run_in(OsStr::new(wrapper_script()), args, cwd, opts)
    }

    /// Run the vendored Gradle with `-Pexclude_deps` appended.
    pub fn run_exclude_deps(&self, args: &[OsString], opts: &RunOptions) -> Result<i32> {
        let mut args = args.to_vec();
        args.push(OsString::from(EXCLUDE_DEPS_FLAG));
        self.run(&args, opts)
    }

    /// Run `program` from inside `cwd` and capture stdout instead of
    /// streaming. A nonzero exit is always an error here; there is no code to
    /// return alongside the output.
    pub fn output_in(
        &self,
        program: &OsStr,
        args: &[OsString],
        cwd: &Path,
        opts: &RunOptions,
    ) -> Result<String> {
        self.ensure_deps()?;
        tracing::info!("running (capture): {}", format_command(program, args));
        let mut cmd = self.command(program, args, opts)?;
        let output = {
            let _cwd = ScopedCwd::enter(cwd)?;
            cmd.output()
                .with_context(|| format!("spawn {}", program.to_string_lossy()))?
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().ok_or(LaunchError::Terminated)?;
            return Err(LaunchError::ExitStatus(code))
                .with_context(|| format!("stderr: {}", stderr.trim()));
        }
        String::from_utf8(output.stdout).context("gradle output was not valid UTF-8")
    }

    /// Capture variant of [`Launcher::run`].
    pub fn output(&self, args: &[OsString], opts: &RunOptions) -> Result<String> {
        let exe = self.layout.gradle_executable();
        self.output_in(exe.as_os_str(), args, self.layout.root(), opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;
    use crate::workdir::cwd_guard;
    use std::fs;

    #[test]
    fn gradle_args_forwards_verbatim() {
        let forwarded = vec!["build".to_string(), "--stacktrace".to_string()];
        let args = gradle_args(&forwarded, None, false);
        assert_eq!(args, vec![OsString::from("build"), OsString::from("--stacktrace")]);
    }

    #[test]
    fn gradle_args_appends_java_home_property() {
        let args = gradle_args(&["tasks".to_string()], Some(Path::new("/opt/jdk17")), false);
        assert_eq!(
            args,
            vec![
                OsString::from("tasks"),
                OsString::from("-Dorg.gradle.java.home=/opt/jdk17"),
            ]
        );
    }

    #[test]
    fn gradle_args_appends_exclude_deps_last() {
        let args = gradle_args(&["assemble".to_string()], Some(Path::new("/j")), true);
        assert_eq!(args.last().unwrap(), &OsString::from("-Pexclude_deps"));
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn format_command_joins_parts() {
        let args = [OsString::from("clean"), OsString::from("build")];
        let s = format_command(OsStr::new("/g/bin/gradle"), &args);
        assert_eq!(s, "/g/bin/gradle clean build");
    }

    /// Fabricate an up-to-date vendored tree: fake Gradle script, matching
    /// archive/sidecar pairs, and an empty JDK home. Nothing needs fetching.
    #[cfg(unix)]
    fn fake_project(root: &Path) -> Launcher {
        use std::os::unix::fs::PermissionsExt;

        fs::write(
            root.join(config::CONFIG_FILE),
            "dep_base_url = \"http://127.0.0.1:1/deps\"\n",
        )
        .unwrap();

        let layout = VendorLayout::new(root, "third_party");

        let script = "#!/bin/sh\necho \"JAVA_HOME=$JAVA_HOME\"\necho \"args: $@\"\nexit \"${FAKE_EXIT:-0}\"\n";
        let exe = layout.gradle_executable();
        fs::create_dir_all(exe.parent().unwrap()).unwrap();
        fs::write(&exe, script).unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();

        for (archive, sidecar) in [
            (layout.gradle_archive(), layout.gradle_sidecar()),
            (layout.jdk_archive(), layout.jdk_sidecar()),
        ] {
            fs::create_dir_all(archive.parent().unwrap()).unwrap();
            fs::write(&archive, b"placeholder archive").unwrap();
            let digest = checksum::sha256_path(&archive).unwrap();
            fs::write(&sidecar, format!("{}\n", digest)).unwrap();
        }
        fs::create_dir_all(layout.jdk_home()).unwrap();

        Launcher::new(root).unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn run_returns_zero_on_success() {
        let _lock = cwd_guard();
        let dir = tempfile::tempdir().unwrap();
        let launcher = fake_project(dir.path());
        let code = launcher.run(&[], &RunOptions::default()).unwrap();
        assert_eq!(code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn run_returns_code_when_check_disabled() {
        let _lock = cwd_guard();
        let dir = tempfile::tempdir().unwrap();
        let launcher = fake_project(dir.path());
        let opts = RunOptions {
            check: false,
            extra_env: vec![(OsString::from("FAKE_EXIT"), OsString::from("7"))],
            ..RunOptions::default()
        };
        assert_eq!(launcher.run(&[], &opts).unwrap(), 7);
    }

    #[cfg(unix)]
    #[test]
    fn run_raises_on_nonzero_when_checked() {
        let _lock = cwd_guard();
        let dir = tempfile::tempdir().unwrap();
        let launcher = fake_project(dir.path());
        let opts = RunOptions {
            extra_env: vec![(OsString::from("FAKE_EXIT"), OsString::from("3"))],
            ..RunOptions::default()
        };
        let err = launcher.run(&[], &opts).unwrap_err();
        match err.downcast_ref::<LaunchError>() {
            Some(LaunchError::ExitStatus(code)) => assert_eq!(*code, 3),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn output_captures_stdout_and_child_env() {
        let _lock = cwd_guard();
        let dir = tempfile::tempdir().unwrap();
        let launcher = fake_project(dir.path());
        let out = launcher
            .output(&[OsString::from("tasks")], &RunOptions::default())
            .unwrap();
        let home = launcher.layout().jdk_home();
        assert!(out.contains(&format!("JAVA_HOME={}", home.display())));
        assert!(out.contains("args: tasks"));
    }

    #[cfg(unix)]
    #[test]
    fn output_respects_java_home_override() {
        let _lock = cwd_guard();
        let dir = tempfile::tempdir().unwrap();
        let launcher = fake_project(dir.path());
        let opts = RunOptions {
            java_home: Some(PathBuf::from("/opt/custom-jdk")),
            ..RunOptions::default()
        };
        let out = launcher.output(&[], &opts).unwrap();
        assert!(out.contains("JAVA_HOME=/opt/custom-jdk"));
    }

    #[cfg(unix)]
    #[test]
    fn output_errors_on_nonzero_exit() {
        let _lock = cwd_guard();
        let dir = tempfile::tempdir().unwrap();
        let launcher = fake_project(dir.path());
        let opts = RunOptions {
            check: false, // capture variant must still fail
            extra_env: vec![(OsString::from("FAKE_EXIT"), OsString::from("2"))],
            ..RunOptions::default()
        };
        let err = launcher.output(&[], &opts).unwrap_err();
        match err.downcast_ref::<LaunchError>() {
            Some(LaunchError::ExitStatus(code)) => assert_eq!(*code, 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn run_wrapper_resolves_against_cwd() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = cwd_guard();
        let dir = tempfile::tempdir().unwrap();
        let launcher = fake_project(dir.path());

        let module = dir.path().join("module");
        fs::create_dir_all(&module).unwrap();
        let gradlew = module.join("gradlew");
        fs::write(&gradlew, "#!/bin/sh\nexit 5\n").unwrap();
        fs::set_permissions(&gradlew, fs::Permissions::from_mode(0o755)).unwrap();

        let opts = RunOptions {
            check: false,
            ..RunOptions::default()
        };
        assert_eq!(launcher.run_wrapper_in(&[], &module, &opts).unwrap(), 5);
    }

    #[cfg(unix)]
    #[test]
    fn run_resolves_relative_project_root() {
        let _lock = cwd_guard();
        let dir = tempfile::tempdir().unwrap();
        let proj = dir.path().join("proj");
        fs::create_dir_all(&proj).unwrap();
        fake_project(&proj);

        // Construct from a root relative to the current directory. The
        // vendored executable must still resolve after run() re-enters the
        // root, so the layout has to be rooted at an absolute path.
        let _cwd = ScopedCwd::enter(dir.path()).unwrap();
        let launcher = Launcher::new(Path::new("proj")).unwrap();
        assert!(launcher.layout().root().is_absolute());
        let code = launcher.run(&[], &RunOptions::default()).unwrap();
        assert_eq!(code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn run_fails_when_jdk_home_is_not_a_directory() {
        let _lock = cwd_guard();
        let dir = tempfile::tempdir().unwrap();
        let launcher = fake_project(dir.path());
        // A file where the home directory should be: the ensure step's probe
        // passes, but the runtime is unusable.
        let home = launcher.layout().jdk_home();
        fs::remove_dir_all(&home).unwrap();
        fs::write(&home, b"not a jdk").unwrap();
        let err = launcher.run(&[], &RunOptions::default()).unwrap_err();
        assert!(err.to_string().contains("vendored JDK missing"));
    }
}

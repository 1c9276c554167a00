//! Emulator invocation
//!
//! The emulator is an opaque program: it gets `<firmware> <test>` after any
//! configured leading arguments, its output is thrown away, and only its
//! exit status is kept.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};

/// How a child process ended, as seen by the runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Process exited on its own with this code
    Exited(i32),
    /// Process was killed by a signal (Unix only)
    Signaled(i32),
    /// Process could not be started at all
    LaunchFailed(String),
    /// Process started but waiting on it failed
    WaitFailed(String),
    /// Process outlived the configured timeout and was killed
    TimedOut(Duration),
}

impl ExitOutcome {
    fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Exited(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signaled(signal);
            }
        }

        ExitOutcome::WaitFailed(format!("process ended without an exit code ({})", status))
    }
}

/// Capability to run an external program to completion
///
/// Implementations must not forward the child's stdout/stderr.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, program: &Path, args: &[OsString]) -> ExitOutcome;
}

/// Runs real child processes with tokio
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    /// Runner that waits for each child indefinitely
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill and report any child still running after `timeout`
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

/// SIGKILLs the child's whole process group when dropped
///
/// Wrappers such as `cargo run` leave the real emulator as a grandchild,
/// which `kill_on_drop` alone would orphan.
#[cfg(unix)]
struct GroupKill {
    pgid: Option<libc::pid_t>,
}

#[cfg(unix)]
impl GroupKill {
    fn new(child: &Child) -> Self {
        Self {
            pgid: child.id().map(|pid| pid as libc::pid_t),
        }
    }

    /// The child exited on its own; leave the group alone
    fn disarm(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };
        // SAFETY: killpg only sends a signal and touches no memory
        let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
        if rc != 0 {
            let error = std::io::Error::last_os_error();
            tracing::debug!(pgid, %error, "Could not kill emulator process group");
        }
    }
}

#[cfg(unix)]
impl Drop for GroupKill {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(not(unix))]
struct GroupKill;

#[cfg(not(unix))]
impl GroupKill {
    fn new(_child: &Child) -> Self {
        Self
    }

    fn disarm(&mut self) {}

    fn kill(&mut self) {}
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, program: &Path, args: &[OsString]) -> ExitOutcome {
        tracing::debug!(program = %program.display(), ?args, "Spawning emulator");

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            // Dropping this future (operator interrupt) kills the child
            .kill_on_drop(true);

        // Own process group: a terminal Ctrl-C reaches only the harness,
        // which then kills the group, grandchildren included
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return ExitOutcome::LaunchFailed(e.to_string()),
        };
        let mut group = GroupKill::new(&child);

        let waited = match self.timeout {
            None => child.wait().await,
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    let program = program.display();
                    tracing::warn!(%program, ?limit, "Emulator timed out, killing it");
                    group.kill();
                    if let Err(e) = child.kill().await {
                        tracing::warn!(error = %e, "Failed to kill timed out emulator");
                    }
                    return ExitOutcome::TimedOut(limit);
                }
            },
        };
        group.disarm();

        match waited {
            Ok(status) => ExitOutcome::from_status(status),
            Err(e) => ExitOutcome::WaitFailed(e.to_string()),
        }
    }
}

/// The emulator command line, minus the per-test arguments
#[derive(Debug, Clone)]
pub struct EmulatorCommand {
    pub program: PathBuf,
    pub leading_args: Vec<OsString>,
}

impl EmulatorCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Full argument list for one test: leading args, firmware, then test
    pub fn args_for(&self, firmware: &Path, test: &Path) -> Vec<OsString> {
        let mut args = self.leading_args.clone();
        args.push(firmware.as_os_str().to_owned());
        args.push(test.as_os_str().to_owned());
        args
    }

    /// Run the emulator once against one test
    pub async fn invoke<R: ProcessRunner + ?Sized>(
        &self,
        runner: &R,
        firmware: &Path,
        test: &Path,
    ) -> ExitOutcome {
        runner.run(&self.program, &self.args_for(firmware, test)).await
    }
}

//! Worker processes backed by real OS processes.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};

use super::{WorkerLauncher, WorkerProcess, WorkerRequest};
use crate::config::WorkerConfig;

/// Launches the configured worker executable with `tokio::process`.
///
/// The command line is `program [args...] <request args>`, where the request
/// args are [`WorkerRequest::to_args`].
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessLauncher {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    /// Launcher for an explicit program and prefix arguments.
    pub fn with_program(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait::async_trait]
impl WorkerLauncher for ProcessLauncher {
    async fn launch(&self, request: &WorkerRequest) -> io::Result<Box<dyn WorkerProcess>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .args(request.to_args())
            .stdin(Stdio::null());

        let child = cmd.spawn()?;
        tracing::debug!(pid = ?child.id(), "Spawned {}", self.describe(request));

        Ok(Box::new(ChildProcess { child }))
    }

    fn describe(&self, request: &WorkerRequest) -> String {
        let mut parts = vec![self.program.to_string_lossy().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.push(request.to_string());
        parts.join(" ")
    }
}

/// A spawned worker process.
///
/// Dropping it does not kill the process; the supervisor interrupts it
/// explicitly and tokio reaps it in the background once it exits.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
}

#[async_trait::async_trait]
impl WorkerProcess for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> io::Result<Option<i32>> {
        let status = self.child.wait().await?;
        Ok(status.code())
    }

    #[cfg(unix)]
    fn interrupt(&mut self) -> io::Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        // Already reaped.
        let Some(pid) = self.child.id() else {
            return Ok(());
        };

        match kill(Pid::from_raw(pid as i32), Signal::SIGINT) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(io::Error::from(e)),
        }
    }

    #[cfg(not(unix))]
    fn interrupt(&mut self) -> io::Result<()> {
        match self.child.start_kill() {
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            other => other,
        }
    }
}

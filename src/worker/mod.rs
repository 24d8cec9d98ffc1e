//! Worker process supervision.
//!
//! A worker is the external program that tunes a recorded program and sends
//! it as UDP datagrams to a local port. The gateway only needs three things
//! from it: launch it, notice if it dies straight away, and interrupt it when
//! the stream ends. Those are the [`WorkerLauncher`] and [`WorkerProcess`]
//! traits; [`ProcessLauncher`] is the real implementation.
//!
//! # Lifecycle
//!
//! ```text
//! Spawned -> Failed                      (exited inside the readiness window)
//! Spawned -> Started -> Terminating -> Terminated   (WorkerGuard dropped)
//! ```

mod process;
mod supervisor;

pub use process::{ChildProcess, ProcessLauncher};
pub use supervisor::{WorkerGuard, WorkerSupervisor};

use std::fmt;
use std::io;

/// Parameters of a single worker launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRequest {
    pub channel_id: String,
    pub program_id: String,
    pub offset: String,
    pub client_port: u16,
    pub client_ip: String,
}

impl WorkerRequest {
    /// Per-request command line arguments.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            self.channel_id.clone(),
            self.program_id.clone(),
            "-s".to_string(),
            self.offset.clone(),
            "-p".to_string(),
            self.client_port.to_string(),
            "-i".to_string(),
            self.client_ip.clone(),
        ]
    }
}

impl fmt::Display for WorkerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -s {} -p {} [{}]",
            self.channel_id, self.program_id, self.offset, self.client_port, self.client_ip
        )
    }
}

/// Starts worker processes.
#[async_trait::async_trait]
pub trait WorkerLauncher: Send + Sync {
    /// Spawn a worker for `request`. Returns once the process exists.
    async fn launch(&self, request: &WorkerRequest) -> io::Result<Box<dyn WorkerProcess>>;

    /// Human readable command line, used in logs and error bodies.
    fn describe(&self, request: &WorkerRequest) -> String {
        request.to_string()
    }
}

/// A running worker.
#[async_trait::async_trait]
pub trait WorkerProcess: Send {
    /// OS process id, if the process has not been reaped yet.
    fn id(&self) -> Option<u32>;

    /// Wait for the process to exit, returning its exit code.
    ///
    /// Must be cancel safe: the readiness probe drops this future when the
    /// window elapses.
    async fn wait(&mut self) -> io::Result<Option<i32>>;

    /// Ask the process to stop. A process that is already gone is not an
    /// error.
    fn interrupt(&mut self) -> io::Result<()>;
}

//! Worker startup probing and guaranteed teardown.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use u7d_common::{Error, Result};

use super::{WorkerLauncher, WorkerProcess, WorkerRequest};

/// Starts workers and decides whether they came up.
pub struct WorkerSupervisor {
    launcher: Arc<dyn WorkerLauncher>,
    readiness_window: Duration,
}

impl WorkerSupervisor {
    pub fn new(launcher: Arc<dyn WorkerLauncher>, readiness_window: Duration) -> Self {
        Self {
            launcher,
            readiness_window,
        }
    }

    /// Launch a worker and run the readiness probe.
    ///
    /// A worker that exits inside the readiness window never produced a
    /// stream, so it is reported as [`Error::WorkerUnavailable`] and not
    /// signalled. A worker still alive after the window is handed back inside
    /// a [`WorkerGuard`].
    pub async fn start(&self, request: &WorkerRequest) -> Result<WorkerGuard> {
        let command = self.launcher.describe(request);
        info!("Starting: {}", command);

        let mut process = self.launcher.launch(request).await.map_err(|e| {
            warn!("Failed to spawn {}: {}", command, e);
            Error::worker_unavailable(command.clone())
        })?;

        match tokio::time::timeout(self.readiness_window, process.wait()).await {
            Ok(Ok(code)) => {
                info!(exit_code = ?code, "NOT AVAILABLE: {}", command);
                Err(Error::worker_unavailable(command))
            }
            Ok(Err(e)) => {
                // Exit state unknown, so it still gets its interrupt.
                warn!("Failed to wait on {}: {}", command, e);
                drop(WorkerGuard::new(process, command.clone()));
                Err(Error::worker_unavailable(command))
            }
            Err(_elapsed) => {
                debug!(pid = ?process.id(), "Worker started: {}", command);
                Ok(WorkerGuard::new(process, command))
            }
        }
    }
}

/// Owns a started worker and interrupts it exactly once.
///
/// The interrupt is sent by [`WorkerGuard::terminate`] or, at the latest,
/// when the guard is dropped. Whatever ends the stream (client gone, socket
/// error, server shutdown), dropping the guard tears the worker down.
pub struct WorkerGuard {
    process: Option<Box<dyn WorkerProcess>>,
    command: String,
}

impl WorkerGuard {
    pub fn new(process: Box<dyn WorkerProcess>, command: String) -> Self {
        Self {
            process: Some(process),
            command,
        }
    }

    /// OS process id of the worker, while it is owned.
    pub fn id(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.id())
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn is_terminated(&self) -> bool {
        self.process.is_none()
    }

    /// Interrupt the worker. Later calls do nothing.
    ///
    /// Signal failures are logged and swallowed; the worker is not waited for.
    pub fn terminate(&mut self) {
        let Some(mut process) = self.process.take() else {
            return;
        };

        debug!("Finally {}", self.command);
        if let Err(e) = process.interrupt() {
            debug!(error = %e, "Failed to interrupt {}", self.command);
        }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

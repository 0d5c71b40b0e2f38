//! Seams between the supervisor and the operating system process.

use crate::{ServerSettings, SupervisorResult};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Something observed about a running server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Stdout(String),
    Stderr(String),
    /// The process is gone; `code` is `None` when killed by a signal.
    Exited { code: Option<i32> },
    /// The process could not be waited on or signalled.
    Error(String),
}

/// Control handle for a spawned server.
pub trait ServerProcess: Send + Sync {
    fn pid(&self) -> Option<u32>;

    /// Ask the process to exit (SIGTERM).
    fn terminate(&self) -> SupervisorResult<()>;

    /// Force the process to exit (SIGKILL).
    fn kill(&self) -> SupervisorResult<()>;
}

pub struct SpawnedProcess {
    pub handle: Box<dyn ServerProcess>,
    /// Output and lifecycle events, closed once the process is gone.
    pub events: mpsc::Receiver<ProcessEvent>,
}

/// Runs the server tool.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Run the version command and return its output.
    async fn detect_version(&self) -> SupervisorResult<String>;

    async fn spawn(&self, settings: &ServerSettings) -> SupervisorResult<SpawnedProcess>;
}

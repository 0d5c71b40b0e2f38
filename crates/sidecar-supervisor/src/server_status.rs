use crate::{ServerState, SupervisorError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot of the supervised server.
///
/// `pid`, `port` and `started_at` are set exactly while `state` is
/// [`ServerState::Running`]. `uptime_ms` is derived when the snapshot is read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub state: ServerState,
    pub pid: Option<u32>,
    pub port: Option<u16>,
    pub started_at: Option<DateTime<Utc>>,
    pub uptime_ms: Option<u64>,
    pub last_health_check_at: Option<DateTime<Utc>>,
    pub is_healthy: bool,
    pub health_check_failure_count: u32,
    pub error: Option<StatusError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusError {
    pub message: String,
    pub code: Option<String>,
}

impl From<&SupervisorError> for StatusError {
    fn from(error: &SupervisorError) -> Self {
        Self {
            message: error.root_cause().to_string(),
            code: Some(error.code().to_string()),
        }
    }
}

impl ServerStatus {
    pub(crate) fn mark_running(&mut self, pid: Option<u32>, port: u16, now: DateTime<Utc>) {
        self.state = ServerState::Running;
        self.pid = pid;
        self.port = Some(port);
        self.started_at = Some(now);
        self.last_health_check_at = Some(now);
        self.is_healthy = true;
        self.health_check_failure_count = 0;
        self.error = None;
    }

    pub(crate) fn mark_stopped(&mut self) {
        self.state = ServerState::Stopped;
        self.clear_process_fields();
    }

    pub(crate) fn mark_error(&mut self, error: StatusError) {
        self.state = ServerState::Error;
        self.error = Some(error);
        self.clear_process_fields();
    }

    /// Fill in the derived fields for a read.
    pub(crate) fn with_uptime(mut self, now: DateTime<Utc>) -> Self {
        self.uptime_ms = self
            .started_at
            .map(|started| (now - started).num_milliseconds().max(0) as u64);
        self
    }

    fn clear_process_fields(&mut self) {
        self.pid = None;
        self.port = None;
        self.started_at = None;
        self.uptime_ms = None;
        self.is_healthy = false;
    }
}

use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running heartbeat loop.
///
/// Stopping cancels the loop's token instead of aborting the task, so the loop
/// can stop itself from inside (it does so before handing over to reconnect).
#[derive(Debug)]
pub struct HeartbeatHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
    started_at: DateTime<Utc>,
}

impl HeartbeatHandle {
    pub(crate) fn spawn<F>(token: CancellationToken, heartbeat: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            token,
            task: tokio::spawn(heartbeat),
            started_at: Utc::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn stop(self) {
        self.token.cancel();
    }
}

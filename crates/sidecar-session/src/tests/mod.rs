mod active_request_registry;
mod connection_error;
mod heartbeat;

use crate::{
    ClientError, ClientResult, ConnectionCheckpoint, ProtocolClient, ResilienceConfig,
    ResilientSession, SessionId, SessionStateStore, SessionStatus, StoreError, StoreResult,
};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use sidecar_core::{MemoryLogSink, SharedLogSink};

pub(crate) const TEST_SESSION: &str = "session-under-test";
pub(crate) const REFUSED: &str = "connect ECONNREFUSED 127.0.0.1:8765";

/// Let spawned tasks run without moving the paused clock far.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// "Reconnection attempt i/N" lines, excluding the per-attempt failure lines.
pub(crate) fn attempt_lines(log: &MemoryLogSink) -> usize {
    log.lines()
        .iter()
        .filter(|line| line.starts_with("Reconnection attempt") && !line.contains("failed"))
        .count()
}

// =========================================================================
// Fake client
// =========================================================================

pub(crate) struct FakeClient {
    heartbeat_tool: String,
    connected: AtomicBool,
    refuse_all: AtomicBool,
    connect_failures: Mutex<VecDeque<String>>,
    heartbeat_error: Mutex<Option<String>>,
    tool_responses: Mutex<VecDeque<Result<Value, String>>>,
    tool_delay: Mutex<Duration>,
    pub(crate) connect_count: AtomicUsize,
    pub(crate) disconnect_count: AtomicUsize,
    pub(crate) heartbeat_count: AtomicUsize,
}

impl FakeClient {
    fn new(heartbeat_tool: &str) -> Self {
        Self {
            heartbeat_tool: heartbeat_tool.to_string(),
            connected: AtomicBool::new(false),
            refuse_all: AtomicBool::new(false),
            connect_failures: Mutex::new(VecDeque::new()),
            heartbeat_error: Mutex::new(None),
            tool_responses: Mutex::new(VecDeque::new()),
            tool_delay: Mutex::new(Duration::ZERO),
            connect_count: AtomicUsize::new(0),
            disconnect_count: AtomicUsize::new(0),
            heartbeat_count: AtomicUsize::new(0),
        }
    }

    /// The next `count` connects fail with a refused connection.
    pub(crate) fn fail_next_connects(&self, count: usize) {
        let mut failures = self.connect_failures.lock().unwrap();
        for _ in 0..count {
            failures.push_back(REFUSED.to_string());
        }
    }

    pub(crate) fn refuse_all_connects(&self, refuse: bool) {
        self.refuse_all.store(refuse, Ordering::SeqCst);
    }

    pub(crate) fn set_heartbeat_error(&self, error: Option<&str>) {
        *self.heartbeat_error.lock().unwrap() = error.map(String::from);
    }

    pub(crate) fn push_response(&self, response: Result<Value, &str>) {
        self.tool_responses
            .lock()
            .unwrap()
            .push_back(response.map_err(String::from));
    }

    pub(crate) fn set_tool_delay(&self, delay: Duration) {
        *self.tool_delay.lock().unwrap() = delay;
    }

    pub(crate) fn connects(&self) -> usize {
        self.connect_count.load(Ordering::SeqCst)
    }

    pub(crate) fn disconnects(&self) -> usize {
        self.disconnect_count.load(Ordering::SeqCst)
    }

    pub(crate) fn heartbeats(&self) -> usize {
        self.heartbeat_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProtocolClient for FakeClient {
    async fn connect(&self) -> ClientResult<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if self.refuse_all.load(Ordering::SeqCst) {
            return Err(ClientError::new(REFUSED));
        }
        if let Some(failure) = self.connect_failures.lock().unwrap().pop_front() {
            return Err(ClientError::new(failure));
        }

        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> ClientResult<()> {
        self.disconnect_count.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn call_tool(&self, name: &str, _args: Value) -> ClientResult<Value> {
        if name == self.heartbeat_tool {
            self.heartbeat_count.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = self.heartbeat_error.lock().unwrap().clone() {
                return Err(ClientError::new(error));
            }
            return Ok(json!({ "status": "ok" }));
        }

        let delay = *self.tool_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if !self.is_connected() {
            return Err(ClientError::not_connected());
        }

        let response = self.tool_responses.lock().unwrap().pop_front();
        match response {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(ClientError::new(message)),
            None => Ok(json!({ "tool": name })),
        }
    }
}

// =========================================================================
// Recording store
// =========================================================================

#[derive(Default)]
pub(crate) struct RecordingStore {
    pub(crate) fail: AtomicBool,
    checkpoints: Mutex<Vec<(SessionId, ConnectionCheckpoint, String)>>,
    statuses: Mutex<Vec<(SessionId, SessionStatus)>>,
}

impl RecordingStore {
    pub(crate) fn checkpoints(&self) -> Vec<(SessionId, ConnectionCheckpoint, String)> {
        self.checkpoints.lock().unwrap().clone()
    }

    pub(crate) fn statuses(&self) -> Vec<(SessionId, SessionStatus)> {
        self.statuses.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionStateStore for RecordingStore {
    async fn save_checkpoint(
        &self,
        session_id: &SessionId,
        checkpoint: &ConnectionCheckpoint,
        description: &str,
    ) -> StoreResult<()> {
        self.checkpoints.lock().unwrap().push((
            session_id.clone(),
            checkpoint.clone(),
            description.to_string(),
        ));
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::new("disk full"));
        }
        Ok(())
    }

    async fn update_session_status(
        &self,
        session_id: &SessionId,
        status: SessionStatus,
    ) -> StoreResult<()> {
        self.statuses
            .lock()
            .unwrap()
            .push((session_id.clone(), status));
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::new("disk full"));
        }
        Ok(())
    }
}

// =========================================================================
// Harness
// =========================================================================

pub(crate) struct Harness {
    pub(crate) session: Arc<ResilientSession>,
    pub(crate) client: Arc<FakeClient>,
    pub(crate) store: Arc<RecordingStore>,
    pub(crate) log: Arc<MemoryLogSink>,
    pub(crate) config: ResilienceConfig,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let config = ResilienceConfig::default();
        let client = Arc::new(FakeClient::new(&config.heartbeat_tool));
        let store = Arc::new(RecordingStore::default());
        let log = Arc::new(MemoryLogSink::new());

        let session = Arc::new(ResilientSession::new(
            SessionId::from(TEST_SESSION),
            Arc::clone(&client) as Arc<dyn ProtocolClient>,
            Arc::clone(&store) as Arc<dyn SessionStateStore>,
            Arc::clone(&log) as SharedLogSink,
            config.clone(),
        ));

        Self {
            session,
            client,
            store,
            log,
            config,
        }
    }

    pub(crate) async fn started() -> Self {
        let harness = Self::new();
        harness.session.start().await.unwrap();
        harness
    }
}

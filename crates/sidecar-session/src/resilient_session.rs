//! Heartbeat, reconnection and checkpointing around a protocol client.

use crate::{
    ActiveRequestRegistry, ClientResult, ConnectionCheckpoint, HeartbeatHandle, ProtocolClient,
    ReconnectOutcome, ReconnectState, RequestId, ResilienceConfig, SessionError, SessionId,
    SessionResult, SessionStateStore, SessionStatus,
};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use sidecar_core::SharedLogSink;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const UNKNOWN_CONNECTION_ERROR: &str = "Connection lost";

/// A logical session that survives transient connection loss.
///
/// While active, a heartbeat calls the configured tool every interval. A
/// failed heartbeat or a call failing with a connection error starts one
/// reconnection sequence: up to `reconnect_max_attempts` attempts spaced by
/// `reconnect_interval`. When all of them fail, the session is checkpointed,
/// marked failed and rejects further calls.
///
/// Heartbeat and reconnection never run at the same time.
pub struct ResilientSession {
    core: Arc<SessionCore>,
}

impl ResilientSession {
    pub fn new(
        session_id: SessionId,
        client: Arc<dyn ProtocolClient>,
        store: Arc<dyn SessionStateStore>,
        log_sink: SharedLogSink,
        config: ResilienceConfig,
    ) -> Self {
        let reconnect = ReconnectState::new(config.reconnect_max_attempts, config.reconnect_interval);

        Self {
            core: Arc::new(SessionCore {
                session_id,
                client,
                store,
                log_sink,
                config,
                status: Mutex::new(SessionStatus::Idle),
                reconnect: Mutex::new(reconnect),
                heartbeat: Mutex::new(None),
                requests: ActiveRequestRegistry::new(),
                disposed: CancellationToken::new(),
            }),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.core.session_id
    }

    pub fn status(&self) -> SessionStatus {
        *lock(&self.core.status)
    }

    pub fn reconnect_state(&self) -> ReconnectState {
        lock(&self.core.reconnect).clone()
    }

    pub fn has_heartbeat(&self) -> bool {
        lock(&self.core.heartbeat).is_some()
    }

    pub fn active_requests(&self) -> Vec<RequestId> {
        self.core.requests.ids()
    }

    pub fn is_disposed(&self) -> bool {
        self.core.disposed.is_cancelled()
    }

    /// Connect if needed, reset the attempt counter and start the heartbeat.
    ///
    /// Fails with [`SessionError::Reconnecting`] while a reconnection
    /// sequence is running; that sequence restarts the heartbeat itself.
    pub async fn start(&self) -> SessionResult<()> {
        let core = &self.core;
        if core.disposed.is_cancelled() {
            return Err(SessionError::session_closed(core.session_id.clone()));
        }

        {
            let mut reconnect = lock(&core.reconnect);
            if reconnect.is_reconnecting {
                return Err(SessionError::reconnecting(core.session_id.clone()));
            }
            reconnect.attempts = 0;
        }

        if !core.client.is_connected() {
            core.client
                .connect()
                .await
                .map_err(|e| SessionError::connect_failed(e))?;
        }

        // A connection loss during the connect above owns the session now.
        if lock(&core.reconnect).is_reconnecting {
            return Err(SessionError::reconnecting(core.session_id.clone()));
        }

        core.set_status(SessionStatus::Active);
        info!("Session {} started", core.session_id);
        core.narrate(&format!("Session {} started", core.session_id));

        core.start_heartbeat();
        Ok(())
    }

    /// Start the heartbeat, replacing a running one.
    pub fn start_heartbeat(&self) {
        self.core.start_heartbeat();
    }

    /// Stop the heartbeat. Safe when none is running.
    pub fn stop_heartbeat(&self) {
        self.core.stop_heartbeat();
    }

    /// Run one reconnection sequence for a lost connection.
    ///
    /// Returns immediately with [`ReconnectOutcome::AlreadyReconnecting`] when
    /// a sequence is already in progress.
    pub async fn handle_connection_loss(&self, error: &str) -> ReconnectOutcome {
        self.core.handle_connection_loss(error).await
    }

    pub async fn call_tool(&self, name: &str, args: Value) -> SessionResult<Value> {
        self.call_tool_as(RequestId::new(), name, args).await
    }

    /// Call a tool under a caller-chosen id, so it can be cancelled with
    /// [`ResilientSession::cancel_request`]. The id must not belong to a
    /// call still in flight ([`SessionError::DuplicateRequest`]).
    ///
    /// Logical failures are returned as-is. Connection failures trigger
    /// reconnection; the call itself is not retried.
    pub async fn call_tool_as(
        &self,
        request_id: RequestId,
        name: &str,
        args: Value,
    ) -> SessionResult<Value> {
        let core = &self.core;
        core.ensure_open()?;

        let Some(request) = core.requests.register(request_id, name, &core.disposed) else {
            return Err(SessionError::duplicate_request(request_id));
        };
        let outcome = tokio::select! {
            biased;
            _ = request.token().cancelled() => {
                if core.disposed.is_cancelled() {
                    return Err(SessionError::session_closed(core.session_id.clone()));
                }
                debug!("Request {request_id} ({name}) cancelled");
                return Err(SessionError::cancelled(request_id));
            }
            outcome = timeout(core.config.call_timeout, core.client.call_tool(name, args)) => outcome,
        };

        let failure = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(failure)) => failure,
            Err(_) => {
                warn!("Tool '{name}' timed out after {:?}", core.config.call_timeout);
                return Err(SessionError::call_timeout(
                    name,
                    core.config.call_timeout.as_secs(),
                ));
            }
        };

        if !failure.is_connection_error() {
            return Err(SessionError::tool(failure));
        }

        warn!("Tool '{name}' failed with a connection error: {failure}");
        // The request stays registered so it is recorded if reconnection fails.
        let reconnect = core.handle_connection_loss(&failure.to_string()).await;
        drop(request);

        match reconnect {
            ReconnectOutcome::Reconnected { .. } | ReconnectOutcome::AlreadyReconnecting => {
                Err(SessionError::connection_lost(failure))
            }
            ReconnectOutcome::Exhausted => Err(SessionError::reconnect_exhausted(
                core.config.reconnect_max_attempts,
            )),
            ReconnectOutcome::Disposed => {
                Err(SessionError::session_closed(core.session_id.clone()))
            }
        }
    }

    /// Cancel one in-flight request. Returns false when it is not in flight.
    pub fn cancel_request(&self, request_id: RequestId) -> bool {
        let cancelled = self.core.requests.cancel(request_id);
        if cancelled {
            debug!("Cancelled request {request_id}");
        }
        cancelled
    }

    /// Stop the heartbeat, abort in-flight requests and disconnect.
    ///
    /// A running reconnection sequence stops at its next step. Idempotent.
    pub async fn dispose(&self) {
        let core = &self.core;
        if core.disposed.is_cancelled() {
            return;
        }

        core.disposed.cancel();
        core.stop_heartbeat();
        let aborted = core.requests.cancel_all();

        if let Err(e) = core.client.disconnect().await {
            debug!("Disconnect while disposing session {} failed: {e}", core.session_id);
        }

        *lock(&core.status) = SessionStatus::Closed;
        info!(
            "Session {} closed ({aborted} in-flight requests aborted)",
            core.session_id
        );
        core.narrate(&format!("Session {} closed", core.session_id));
    }
}

impl Drop for ResilientSession {
    fn drop(&mut self) {
        self.core.disposed.cancel();
        self.core.stop_heartbeat();
        self.core.requests.cancel_all();
    }
}

struct SessionCore {
    session_id: SessionId,
    client: Arc<dyn ProtocolClient>,
    store: Arc<dyn SessionStateStore>,
    log_sink: SharedLogSink,
    config: ResilienceConfig,
    status: Mutex<SessionStatus>,
    reconnect: Mutex<ReconnectState>,
    heartbeat: Mutex<Option<HeartbeatHandle>>,
    requests: ActiveRequestRegistry,
    disposed: CancellationToken,
}

impl SessionCore {
    fn narrate(&self, line: &str) {
        self.log_sink.append_line(line);
    }

    /// Closed is final.
    fn set_status(&self, status: SessionStatus) {
        let mut current = lock(&self.status);
        if *current != SessionStatus::Closed {
            *current = status;
        }
    }

    fn ensure_open(&self) -> SessionResult<()> {
        if self.disposed.is_cancelled() || lock(&self.status).is_terminal() {
            return Err(SessionError::session_closed(self.session_id.clone()));
        }
        Ok(())
    }

    fn start_heartbeat(self: &Arc<Self>) {
        let mut slot = lock(&self.heartbeat);
        // Checked under the slot lock so dispose cannot miss a new heartbeat.
        if self.disposed.is_cancelled() {
            return;
        }

        if let Some(previous) = slot.take() {
            previous.stop();
        }

        let token = self.disposed.child_token();
        let heartbeat = run_heartbeat(
            Arc::downgrade(self),
            token.clone(),
            self.config.heartbeat_interval,
        );
        *slot = Some(HeartbeatHandle::spawn(token, heartbeat));
        debug!(
            "Heartbeat started for session {} every {:?}",
            self.session_id, self.config.heartbeat_interval
        );
    }

    fn stop_heartbeat(&self) {
        if let Some(heartbeat) = lock(&self.heartbeat).take() {
            heartbeat.stop();
            debug!("Heartbeat stopped for session {}", self.session_id);
        }
    }

    async fn beat(&self) -> Result<(), String> {
        let call = self
            .client
            .call_tool(&self.config.heartbeat_tool, json!({}));

        match timeout(self.config.call_timeout, call).await {
            Ok(Ok(_)) => {
                debug!("Heartbeat ok for session {}", self.session_id);
                Ok(())
            }
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "Heartbeat timed out after {}s",
                self.config.call_timeout.as_secs()
            )),
        }
    }

    async fn handle_connection_loss(self: &Arc<Self>, error: &str) -> ReconnectOutcome {
        if self.disposed.is_cancelled() {
            return ReconnectOutcome::Disposed;
        }
        // Already checkpointed; only a new start() re-arms reconnection.
        if *lock(&self.status) == SessionStatus::Failed {
            return ReconnectOutcome::Exhausted;
        }

        let (max_attempts, interval) = {
            let mut state = lock(&self.reconnect);
            if state.is_reconnecting {
                debug!(
                    "Reconnection already in progress for session {}",
                    self.session_id
                );
                return ReconnectOutcome::AlreadyReconnecting;
            }
            state.is_reconnecting = true;
            state.attempts = 0;
            (state.max_attempts, state.interval)
        };

        let error = if error.trim().is_empty() {
            UNKNOWN_CONNECTION_ERROR
        } else {
            error
        };
        let disconnected_at = Utc::now();

        self.stop_heartbeat();
        self.set_status(SessionStatus::Reconnecting);
        warn!("Session {} lost its connection: {error}", self.session_id);
        self.narrate(&format!("Connection lost: {error}"));

        for attempt in 1..=max_attempts {
            lock(&self.reconnect).attempts = attempt;
            info!(
                "Reconnecting session {} ({attempt}/{max_attempts})",
                self.session_id
            );
            self.narrate(&format!("Reconnection attempt {attempt}/{max_attempts}"));

            let result = tokio::select! {
                biased;
                _ = self.disposed.cancelled() => return self.abandon_reconnect(),
                result = self.reconnect_once() => result,
            };

            match result {
                Ok(()) => return self.finish_reconnect(attempt),
                Err(e) => {
                    warn!(
                        "Reconnection attempt {attempt} for session {} failed: {e}",
                        self.session_id
                    );
                    self.narrate(&format!("Reconnection attempt {attempt} failed: {e}"));
                }
            }

            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    _ = self.disposed.cancelled() => return self.abandon_reconnect(),
                    _ = sleep(interval) => {}
                }
            }
        }

        error!(
            "All reconnection attempts failed for session {}",
            self.session_id
        );
        self.narrate("All reconnection attempts failed");
        self.checkpoint(disconnected_at, error, max_attempts).await;

        lock(&self.reconnect).is_reconnecting = false;
        ReconnectOutcome::Exhausted
    }

    async fn reconnect_once(&self) -> ClientResult<()> {
        if self.client.is_connected()
            && let Err(e) = self.client.disconnect().await
        {
            debug!("Ignoring disconnect failure before reconnecting: {e}");
        }
        self.client.connect().await
    }

    fn finish_reconnect(self: &Arc<Self>, attempt: u32) -> ReconnectOutcome {
        lock(&self.reconnect).attempts = 0;
        self.set_status(SessionStatus::Active);
        info!(
            "Session {} reconnected on attempt {attempt}",
            self.session_id
        );
        self.narrate(&format!("Reconnected on attempt {attempt}"));

        self.start_heartbeat();
        lock(&self.reconnect).is_reconnecting = false;
        ReconnectOutcome::Reconnected { attempt }
    }

    fn abandon_reconnect(&self) -> ReconnectOutcome {
        let mut state = lock(&self.reconnect);
        state.is_reconnecting = false;
        state.attempts = 0;
        debug!(
            "Reconnection abandoned, session {} disposed",
            self.session_id
        );
        ReconnectOutcome::Disposed
    }

    async fn checkpoint(&self, disconnected_at: DateTime<Utc>, error: &str, attempts: u32) {
        self.set_status(SessionStatus::Failed);

        let checkpoint = ConnectionCheckpoint {
            disconnected_at,
            error: error.to_string(),
            reconnect_attempts: attempts,
            active_requests: self.requests.ids(),
        };
        let description =
            format!("Connection lost after {attempts} failed reconnection attempts: {error}");

        if let Err(e) = self
            .store
            .save_checkpoint(&self.session_id, &checkpoint, &description)
            .await
        {
            error!(
                "Failed to save connection checkpoint for session {}: {e}",
                self.session_id
            );
        }

        if let Err(e) = self
            .store
            .update_session_status(&self.session_id, SessionStatus::Failed)
            .await
        {
            error!(
                "Failed to mark session {} as failed: {e}",
                self.session_id
            );
        }
    }
}

async fn run_heartbeat(session: Weak<SessionCore>, token: CancellationToken, interval: Duration) {
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = sleep(interval) => {}
        }

        let Some(core) = session.upgrade() else {
            return;
        };

        let beat = tokio::select! {
            _ = token.cancelled() => return,
            beat = core.beat() => beat,
        };

        if let Err(message) = beat {
            warn!("Heartbeat failed for session {}: {message}", core.session_id);
            core.narrate(&format!("Heartbeat failed: {message}"));

            // Reconnection stops this heartbeat first, so it runs on its own task.
            tokio::spawn(async move {
                core.handle_connection_loss(&message).await;
            });
            return;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

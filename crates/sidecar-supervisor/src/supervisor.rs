//! Server process lifecycle with health-driven restart.

use crate::{
    COMMAND_BUFFER, GuidanceNotifier, HealthProbe, ProcessEvent, ProcessLauncher, ServerProcess,
    ServerState, ServerStatus, SettingsProvider, SetupGuidance, SpawnedProcess, StatusError,
    SupervisorBuilder, SupervisorCommand, SupervisorError, SupervisorResult, SupervisorTiming,
    ToolVersion,
};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use sidecar_core::SharedLogSink;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type StartFlight = Shared<BoxFuture<'static, Result<ServerStatus, Arc<SupervisorError>>>>;

/// Supervises one reasoning server process.
///
/// Responsibilities:
/// - Verify the server tool and spawn it (single-flight under concurrent callers)
/// - Wait until the server accepts connections
/// - Probe health periodically and restart after repeated failures
/// - Stop gracefully, escalating to a forced kill
///
/// Dropping the supervisor without [`ProcessSupervisor::dispose`] kills the
/// tracked process and cancels background tasks.
pub struct ProcessSupervisor {
    core: Arc<SupervisorCore>,
}

impl ProcessSupervisor {
    pub fn builder(
        launcher: Arc<dyn ProcessLauncher>,
        settings: Arc<dyn SettingsProvider>,
    ) -> SupervisorBuilder {
        SupervisorBuilder::new(launcher, settings)
    }

    pub(crate) fn from_builder(builder: SupervisorBuilder) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (status, _) = watch::channel(ServerStatus::default());

        Self {
            core: Arc::new(SupervisorCore {
                launcher: builder.launcher,
                probe: builder.probe,
                settings: builder.settings,
                log_sink: builder.log_sink,
                notifier: builder.notifier,
                timing: builder.timing,
                min_version: builder.min_version,
                status,
                process: Mutex::new(None),
                start_flight: Mutex::new(None),
                timers: Mutex::new(Timers::default()),
                stop_lock: tokio::sync::Mutex::new(()),
                generation: AtomicU64::new(0),
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Start the server unless it is already running.
    ///
    /// Concurrent callers share a single start attempt and receive the same
    /// status or the same failure.
    pub async fn ensure_started(&self) -> SupervisorResult<ServerStatus> {
        self.core.ensure_started().await
    }

    /// Stop the server. Safe to call repeatedly and concurrently.
    pub async fn stop(&self) {
        self.core.stop().await;
    }

    /// Probe the tracked process once.
    pub async fn health_check(&self) -> bool {
        self.core.health_check().await
    }

    /// Current status snapshot.
    pub fn status(&self) -> ServerStatus {
        self.core.snapshot()
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<ServerStatus> {
        self.core.status.subscribe()
    }

    /// Stop the server and cancel every background task.
    ///
    /// Later calls to [`ProcessSupervisor::ensure_started`] fail with
    /// [`SupervisorError::Disposed`].
    pub async fn dispose(&self) {
        self.core.dispose().await;
    }

    pub fn is_disposed(&self) -> bool {
        self.core.shutdown.is_cancelled()
    }

    pub(crate) fn tracks_process(&self) -> bool {
        lock(&self.core.process).is_some()
    }

    pub(crate) fn has_health_monitor(&self) -> bool {
        lock(&self.core.timers).health_monitor.is_some()
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.core.shutdown.cancel();
        self.core.clear_timers();

        if let Some(tracked) = lock(&self.core.process).take()
            && let Err(e) = tracked.handle.kill()
        {
            warn!("Failed to kill MCP server on drop: {e}");
        }
    }
}

/// A spawned process plus what is needed to watch it.
#[derive(Clone)]
struct TrackedProcess {
    generation: u64,
    port: u16,
    handle: Arc<dyn ServerProcess>,
    exited: watch::Receiver<bool>,
}

#[derive(Default)]
struct Timers {
    health_monitor: Option<CancellationToken>,
    readiness: Option<CancellationToken>,
}

struct SupervisorCore {
    launcher: Arc<dyn ProcessLauncher>,
    probe: Arc<dyn HealthProbe>,
    settings: Arc<dyn SettingsProvider>,
    log_sink: SharedLogSink,
    notifier: Arc<dyn GuidanceNotifier>,
    timing: SupervisorTiming,
    min_version: Option<ToolVersion>,
    status: watch::Sender<ServerStatus>,
    process: Mutex<Option<TrackedProcess>>,
    start_flight: Mutex<Option<StartFlight>>,
    timers: Mutex<Timers>,
    stop_lock: tokio::sync::Mutex<()>,
    generation: AtomicU64,
    command_tx: mpsc::Sender<SupervisorCommand>,
    command_rx: Mutex<Option<mpsc::Receiver<SupervisorCommand>>>,
    shutdown: CancellationToken,
}

impl SupervisorCore {
    fn snapshot(&self) -> ServerStatus {
        self.status.borrow().clone().with_uptime(Utc::now())
    }

    fn narrate(&self, line: &str) {
        self.log_sink.append_line(line);
    }

    async fn ensure_started(self: &Arc<Self>) -> SupervisorResult<ServerStatus> {
        if self.shutdown.is_cancelled() {
            return Err(SupervisorError::disposed());
        }

        self.spawn_command_handler();

        // A stop in progress still reports Running until its process is gone.
        let stopping = self.stop_lock.lock().await;
        if self.shutdown.is_cancelled() {
            return Err(SupervisorError::disposed());
        }

        let flight = {
            let mut slot = lock(&self.start_flight);
            match slot.as_ref() {
                Some(flight) => flight.clone(),
                None => {
                    if self.status.borrow().state == ServerState::Running
                        && lock(&self.process).is_some()
                    {
                        return Ok(self.snapshot());
                    }

                    // Assigned while the slot is locked so the start task
                    // cannot clear it before it is set.
                    let flight = self.begin_start();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };
        drop(stopping);

        flight.await.map_err(SupervisorError::start_failed)
    }

    fn begin_start(self: &Arc<Self>) -> StartFlight {
        let token = CancellationToken::new();
        if let Some(previous) = lock(&self.timers).readiness.replace(token.clone()) {
            previous.cancel();
        }

        self.status.send_modify(|status| {
            status.state = ServerState::Starting;
            status.error = None;
        });

        let core = Arc::clone(self);
        let task = tokio::spawn(async move {
            let result = core.run_start(&token).await;
            lock(&core.timers).readiness = None;
            *lock(&core.start_flight) = None;
            result.map_err(Arc::new)
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(Arc::new(SupervisorError::process_error(format!(
                    "start task failed: {e}"
                )))),
            }
        }
        .boxed()
        .shared()
    }

    async fn run_start(self: &Arc<Self>, token: &CancellationToken) -> SupervisorResult<ServerStatus> {
        let result = self.start_process(token).await;

        match &result {
            Err(SupervisorError::StartupCancelled { .. }) => {
                info!("MCP server startup cancelled");
            }
            Err(e) => {
                error!("MCP server failed to start: {e}");
                self.narrate(&format!("MCP server failed to start: {e}"));
                self.status
                    .send_modify(|status| status.mark_error(StatusError::from(e)));
            }
            Ok(_) => {}
        }

        result
    }

    async fn start_process(
        self: &Arc<Self>,
        token: &CancellationToken,
    ) -> SupervisorResult<ServerStatus> {
        info!("Starting MCP server");
        self.narrate("Starting MCP server");

        let settings = self.settings.settings()?;
        self.verify_tool().await?;

        if token.is_cancelled() {
            return Err(SupervisorError::startup_cancelled());
        }

        let spawned = self.launcher.spawn(&settings).await?;
        let tracked = self.track(spawned, settings.port);

        // A stop that ran while we were spawning found nothing to stop.
        if token.is_cancelled() {
            self.abandon(&tracked);
            return Err(SupervisorError::startup_cancelled());
        }

        if let Err(e) = self.wait_until_ready(&tracked, token).await {
            if !matches!(e, SupervisorError::StartupCancelled { .. }) {
                self.abandon(&tracked);
            }
            return Err(e);
        }

        let pid = tracked.handle.pid();
        {
            // Held across the transition so a stop sees either no process or
            // a running one with its health monitor.
            let slot = lock(&self.process);
            if token.is_cancelled() {
                return Err(SupervisorError::startup_cancelled());
            }
            if *tracked.exited.borrow()
                || !slot
                    .as_ref()
                    .is_some_and(|current| current.generation == tracked.generation)
            {
                return Err(SupervisorError::exited_during_startup());
            }

            let now = Utc::now();
            self.status
                .send_modify(|status| status.mark_running(pid, settings.port, now));
            self.start_health_monitor();
        }

        let line = match pid {
            Some(pid) => format!("MCP server started (pid {pid}, port {})", settings.port),
            None => format!("MCP server started (port {})", settings.port),
        };
        info!("{line}");
        self.narrate(&line);

        Ok(self.snapshot())
    }

    /// Run the version command. Only a failure to run it is fatal.
    async fn verify_tool(&self) -> SupervisorResult<()> {
        let output = match timeout(self.timing.version_timeout, self.launcher.detect_version()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(self.tool_missing(e.to_string())),
            Err(_) => {
                return Err(self.tool_missing(format!(
                    "version check timed out after {}s",
                    self.timing.version_timeout.as_secs()
                )));
            }
        };

        match ToolVersion::extract(&output) {
            Some(version) => match self.min_version {
                Some(minimum) if version < minimum => {
                    let line = format!(
                        "MCP server version {version} is below the minimum supported version {minimum}; continuing"
                    );
                    warn!("{line}");
                    self.narrate(&line);
                }
                _ => info!("Detected MCP server version {version}"),
            },
            None => warn!("Could not determine MCP server version from {output:?}; continuing"),
        }

        Ok(())
    }

    fn tool_missing(&self, reason: String) -> SupervisorError {
        self.notifier.present(&SetupGuidance::tool_missing(&reason));
        SupervisorError::tool_missing(reason)
    }

    fn track(self: &Arc<Self>, spawned: SpawnedProcess, port: u16) -> TrackedProcess {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (exit_tx, exit_rx) = watch::channel(false);

        let tracked = TrackedProcess {
            generation,
            port,
            handle: Arc::from(spawned.handle),
            exited: exit_rx,
        };

        if let Some(previous) = lock(&self.process).replace(tracked.clone()) {
            warn!(
                "Replacing still-tracked MCP server process {:?}",
                previous.handle.pid()
            );
            if let Err(e) = previous.handle.kill() {
                let line = format!("Failed to kill replaced MCP server process: {e}");
                warn!("{line}");
                self.narrate(&line);
            }
        }

        tokio::spawn(pump_events(
            Arc::downgrade(self),
            generation,
            spawned.events,
            exit_tx,
        ));

        tracked
    }

    /// Kill a process whose start failed, unless someone else already took it.
    fn abandon(&self, tracked: &TrackedProcess) {
        if !self.release_process(tracked.generation) {
            return;
        }
        if let Err(e) = tracked.handle.kill() {
            warn!("Failed to kill MCP server after failed start: {e}");
        }
    }

    /// Untrack `generation` if it is the current process.
    fn release_process(&self, generation: u64) -> bool {
        let mut slot = lock(&self.process);
        if slot
            .as_ref()
            .is_some_and(|tracked| tracked.generation == generation)
        {
            *slot = None;
            true
        } else {
            false
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        lock(&self.process)
            .as_ref()
            .is_some_and(|tracked| tracked.generation == generation)
    }

    /// Single transition point for everything the process reports, during
    /// startup and afterwards.
    fn handle_process_event(&self, generation: u64, event: ProcessEvent) {
        match event {
            ProcessEvent::Stdout(line) | ProcessEvent::Stderr(line) => self.narrate(&line),
            ProcessEvent::Exited { code } => {
                if !self.release_process(generation) {
                    debug!("Ignoring exit of superseded MCP server process (generation {generation})");
                    return;
                }

                let code = code.map_or_else(|| "signal".to_string(), |code| code.to_string());
                let line = format!("MCP server stopped unexpectedly (exit code {code})");
                warn!("{line}");
                self.narrate(&line);
                self.status.send_modify(ServerStatus::mark_stopped);
            }
            ProcessEvent::Error(message) => {
                if !self.is_current(generation) {
                    return;
                }

                self.stop_health_monitor();

                let error = SupervisorError::process_error(message);
                error!("{error}");
                self.narrate(&error.to_string());
                self.status
                    .send_modify(|status| status.mark_error(StatusError::from(&error)));
            }
        }
    }

    async fn wait_until_ready(
        &self,
        tracked: &TrackedProcess,
        token: &CancellationToken,
    ) -> SupervisorResult<()> {
        let deadline = Instant::now() + self.timing.startup_timeout;
        let mut exited = tracked.exited.clone();

        loop {
            if *exited.borrow() {
                return Err(SupervisorError::exited_during_startup());
            }

            if self.probe.probe(tracked.port).await {
                info!("MCP server is accepting connections on port {}", tracked.port);
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(SupervisorError::readiness_timeout(
                    self.timing.startup_timeout.as_secs(),
                ));
            }

            let pause = self.timing.readiness_poll_interval.min(deadline - now);
            // A stop terminates the process; report that as a cancellation.
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(SupervisorError::startup_cancelled()),
                _ = wait_for_exit(&mut exited) => return Err(SupervisorError::exited_during_startup()),
                _ = sleep(pause) => {}
            }
        }
    }

    async fn health_check(&self) -> bool {
        let port = lock(&self.process).as_ref().map(|tracked| tracked.port);

        let Some(port) = port else {
            self.status.send_modify(|status| {
                status.last_health_check_at = Some(Utc::now());
                status.is_healthy = false;
            });
            return false;
        };

        let healthy = self.probe.probe(port).await;

        self.status.send_modify(|status| {
            status.last_health_check_at = Some(Utc::now());
            status.is_healthy = healthy && status.state != ServerState::Error;
            if healthy {
                status.health_check_failure_count = 0;
            }
        });

        healthy
    }

    fn start_health_monitor(self: &Arc<Self>) {
        let token = CancellationToken::new();
        if let Some(previous) = lock(&self.timers).health_monitor.replace(token.clone()) {
            previous.cancel();
        }

        let core = Arc::clone(self);
        tokio::spawn(async move { core.monitor_health(token).await });
    }

    async fn monitor_health(&self, token: CancellationToken) {
        let interval = self.timing.health_check_interval;
        let threshold = self.timing.health_failure_threshold;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = sleep(interval) => {}
            }

            let healthy = tokio::select! {
                _ = token.cancelled() => break,
                healthy = self.health_check() => healthy,
            };

            if healthy {
                continue;
            }

            let mut failures = 0;
            self.status.send_modify(|status| {
                status.health_check_failure_count += 1;
                failures = status.health_check_failure_count;
            });

            let line = format!("Health check failed ({failures}/{threshold})");
            warn!("{line}");
            self.narrate(&line);

            if failures >= threshold {
                error!("Max health check failures reached, requesting restart");
                self.narrate("Max health check failures reached");

                if self
                    .command_tx
                    .send(SupervisorCommand::Restart { failures })
                    .await
                    .is_err()
                {
                    warn!("Restart request dropped: command handler is not running");
                }
                break;
            }
        }

        debug!("Health monitor stopped");
    }

    /// Start the task that executes restart requests from the health monitor.
    fn spawn_command_handler(self: &Arc<Self>) {
        let Some(mut commands) = lock(&self.command_rx).take() else {
            return;
        };

        let core = Arc::downgrade(self);
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                let command = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    command = commands.recv() => command,
                };

                let Some(command) = command else { break };
                let Some(core) = core.upgrade() else { break };

                match command {
                    SupervisorCommand::Restart { failures } => core.auto_restart(failures).await,
                }
            }

            debug!("Supervisor command handler stopped");
        });
    }

    async fn auto_restart(self: &Arc<Self>, failures: u32) {
        info!("Restarting MCP server after {failures} failed health checks");

        self.stop().await;

        if self.shutdown.is_cancelled() {
            return;
        }

        match self.ensure_started().await {
            Ok(status) => {
                let line = format!("MCP server restarted (pid {:?})", status.pid);
                info!("{line}");
                self.narrate(&line);
            }
            Err(e) => {
                let error = SupervisorError::auto_restart_failed(e.root_cause().to_string());
                error!("{error}");
                self.narrate(&error.to_string());
                self.status
                    .send_modify(|status| status.mark_error(StatusError::from(&error)));
            }
        }
    }

    async fn stop(&self) {
        let _guard = self.stop_lock.lock().await;

        let tracked = {
            let mut slot = lock(&self.process);
            self.clear_timers();
            slot.take()
        };

        let Some(tracked) = tracked else {
            // A failed or cancelled start leaves no process behind.
            if self.status.borrow().state != ServerState::Stopped {
                self.status.send_modify(ServerStatus::mark_stopped);
                info!("MCP server stopped");
                self.narrate("MCP server stopped");
            }
            return;
        };

        let pid = tracked.handle.pid();
        info!("Stopping MCP server (pid {pid:?})");

        if let Err(e) = tracked.handle.terminate() {
            warn!("Failed to send termination signal: {e}");
        }

        let mut exited = tracked.exited.clone();
        let graceful = timeout(self.timing.shutdown_timeout, wait_for_exit(&mut exited))
            .await
            .is_ok();

        if !graceful {
            let line = format!(
                "MCP server did not exit within {}ms, forcing termination",
                self.timing.shutdown_timeout.as_millis()
            );
            warn!("{line}");
            self.narrate(&line);

            if let Err(e) = tracked.handle.kill() {
                warn!("Failed to force termination: {e}");
            }
        }

        self.status.send_modify(ServerStatus::mark_stopped);
        info!("MCP server stopped");
        self.narrate("MCP server stopped");
    }

    fn stop_health_monitor(&self) {
        if let Some(token) = lock(&self.timers).health_monitor.take() {
            token.cancel();
        }
    }

    fn clear_timers(&self) {
        let mut timers = lock(&self.timers);
        if let Some(token) = timers.health_monitor.take() {
            token.cancel();
        }
        if let Some(token) = timers.readiness.take() {
            token.cancel();
        }
    }

    async fn dispose(&self) {
        self.shutdown.cancel();
        self.clear_timers();
        self.stop().await;
        info!("Process supervisor disposed");
    }
}

/// Feed process events into the supervisor and flag the exit.
async fn pump_events(
    core: Weak<SupervisorCore>,
    generation: u64,
    mut events: mpsc::Receiver<ProcessEvent>,
    exited: watch::Sender<bool>,
) {
    while let Some(event) = events.recv().await {
        let is_exit = matches!(event, ProcessEvent::Exited { .. });

        let Some(core) = core.upgrade() else { break };
        core.handle_process_event(generation, event);

        if is_exit {
            break;
        }
    }

    exited.send_replace(true);
}

async fn wait_for_exit(exited: &mut watch::Receiver<bool>) {
    let _ = exited.wait_for(|exited| *exited).await;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

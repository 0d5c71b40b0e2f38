mod tool_version;

use crate::{
    GuidanceNotifier, HealthProbe, ProcessEvent, ProcessLauncher, ProcessSupervisor,
    ServerProcess, ServerSettings, SetupGuidance, SpawnedProcess, SupervisorError,
    SupervisorResult, SupervisorTiming, ToolVersion,
};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sidecar_core::MemoryLogSink;
use tokio::sync::mpsc;

pub(crate) const TEST_PORT: u16 = 8765;
pub(crate) const FIRST_PID: u32 = 4001;

pub(crate) fn test_settings() -> ServerSettings {
    ServerSettings {
        port: TEST_PORT,
        timeout_ms: 30000,
        log_level: "info".to_string(),
    }
}

/// Let spawned tasks run without moving the paused clock far.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

// =========================================================================
// Fake process
// =========================================================================

pub(crate) struct FakeProcessState {
    pub(crate) pid: u32,
    events: mpsc::Sender<ProcessEvent>,
    exits_on_terminate: bool,
    pub(crate) terminate_count: AtomicUsize,
    pub(crate) kill_count: AtomicUsize,
    pub(crate) kill_fails: AtomicBool,
}

impl FakeProcessState {
    pub(crate) fn emit(&self, event: ProcessEvent) {
        self.events.try_send(event).unwrap();
    }

    pub(crate) fn terminates(&self) -> usize {
        self.terminate_count.load(Ordering::SeqCst)
    }

    pub(crate) fn kills(&self) -> usize {
        self.kill_count.load(Ordering::SeqCst)
    }
}

struct FakeProcess(Arc<FakeProcessState>);

impl ServerProcess for FakeProcess {
    fn pid(&self) -> Option<u32> {
        Some(self.0.pid)
    }

    fn terminate(&self) -> SupervisorResult<()> {
        self.0.terminate_count.fetch_add(1, Ordering::SeqCst);
        if self.0.exits_on_terminate {
            let _ = self.0.events.try_send(ProcessEvent::Exited { code: Some(0) });
        }
        Ok(())
    }

    fn kill(&self) -> SupervisorResult<()> {
        self.0.kill_count.fetch_add(1, Ordering::SeqCst);
        if self.0.kill_fails.load(Ordering::SeqCst) {
            return Err(SupervisorError::process_error("fake process refused to die"));
        }
        let _ = self.0.events.try_send(ProcessEvent::Exited { code: None });
        Ok(())
    }
}

// =========================================================================
// Fake probe
// =========================================================================

#[derive(Default)]
pub(crate) struct FakeProbe {
    healthy: AtomicBool,
    delay: Mutex<Duration>,
    pub(crate) probe_count: AtomicUsize,
}

impl FakeProbe {
    pub(crate) fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub(crate) fn probes(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for FakeProbe {
    async fn probe(&self, _port: u16) -> bool {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.healthy.load(Ordering::SeqCst)
    }
}

// =========================================================================
// Fake launcher
// =========================================================================

pub(crate) struct FakeLauncher {
    probe: Arc<FakeProbe>,
    version_output: Mutex<Result<String, String>>,
    pub(crate) fail_spawn: AtomicBool,
    pub(crate) exit_on_spawn: AtomicBool,
    pub(crate) healthy_on_spawn: AtomicBool,
    pub(crate) exits_on_terminate: AtomicBool,
    pub(crate) version_checks: AtomicUsize,
    processes: Mutex<Vec<Arc<FakeProcessState>>>,
}

impl FakeLauncher {
    fn new(probe: Arc<FakeProbe>) -> Self {
        Self {
            probe,
            version_output: Mutex::new(Ok("reasoning-server 1.2.3".to_string())),
            fail_spawn: AtomicBool::new(false),
            exit_on_spawn: AtomicBool::new(false),
            healthy_on_spawn: AtomicBool::new(true),
            exits_on_terminate: AtomicBool::new(true),
            version_checks: AtomicUsize::new(0),
            processes: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_version_output(&self, output: Result<&str, &str>) {
        *self.version_output.lock().unwrap() = output.map(String::from).map_err(String::from);
    }

    pub(crate) fn spawn_count(&self) -> usize {
        self.processes.lock().unwrap().len()
    }

    pub(crate) fn process(&self, index: usize) -> Arc<FakeProcessState> {
        Arc::clone(&self.processes.lock().unwrap()[index])
    }

    pub(crate) fn last_process(&self) -> Arc<FakeProcessState> {
        Arc::clone(self.processes.lock().unwrap().last().unwrap())
    }
}

#[async_trait]
impl ProcessLauncher for FakeLauncher {
    async fn detect_version(&self) -> SupervisorResult<String> {
        self.version_checks.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.version_output
            .lock()
            .unwrap()
            .clone()
            .map_err(SupervisorError::command_failed)
    }

    async fn spawn(&self, _settings: &ServerSettings) -> SupervisorResult<SpawnedProcess> {
        tokio::task::yield_now().await;
        if self.fail_spawn.load(Ordering::SeqCst) {
            return Err(SupervisorError::spawn_failed("fake launcher refused to spawn"));
        }

        let (tx, rx) = mpsc::channel(64);
        let mut processes = self.processes.lock().unwrap();
        let state = Arc::new(FakeProcessState {
            pid: FIRST_PID + processes.len() as u32,
            events: tx,
            exits_on_terminate: self.exits_on_terminate.load(Ordering::SeqCst),
            terminate_count: AtomicUsize::new(0),
            kill_count: AtomicUsize::new(0),
            kill_fails: AtomicBool::new(false),
        });
        processes.push(Arc::clone(&state));

        if self.exit_on_spawn.load(Ordering::SeqCst) {
            state.emit(ProcessEvent::Exited { code: Some(2) });
        }
        if self.healthy_on_spawn.load(Ordering::SeqCst) {
            self.probe.set_healthy(true);
        }

        Ok(SpawnedProcess {
            handle: Box::new(FakeProcess(state)),
            events: rx,
        })
    }
}

// =========================================================================
// Recording notifier
// =========================================================================

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    presented: Mutex<Vec<SetupGuidance>>,
}

impl RecordingNotifier {
    pub(crate) fn presented(&self) -> Vec<SetupGuidance> {
        self.presented.lock().unwrap().clone()
    }
}

impl GuidanceNotifier for RecordingNotifier {
    fn present(&self, guidance: &SetupGuidance) {
        self.presented.lock().unwrap().push(guidance.clone());
    }
}

// =========================================================================
// Harness
// =========================================================================

pub(crate) struct Harness {
    pub(crate) supervisor: Arc<ProcessSupervisor>,
    pub(crate) launcher: Arc<FakeLauncher>,
    pub(crate) probe: Arc<FakeProbe>,
    pub(crate) log: Arc<MemoryLogSink>,
    pub(crate) notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::build(None)
    }

    pub(crate) fn with_min_version(min_version: ToolVersion) -> Self {
        Self::build(Some(min_version))
    }

    fn build(min_version: Option<ToolVersion>) -> Self {
        let probe = Arc::new(FakeProbe::default());
        let launcher = Arc::new(FakeLauncher::new(Arc::clone(&probe)));
        let log = Arc::new(MemoryLogSink::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let mut builder = ProcessSupervisor::builder(launcher.clone(), Arc::new(test_settings()))
            .probe(probe.clone())
            .log_sink(log.clone())
            .notifier(notifier.clone())
            .timing(SupervisorTiming::default());
        if let Some(min_version) = min_version {
            builder = builder.min_version(min_version);
        }

        Self {
            supervisor: Arc::new(builder.build()),
            launcher,
            probe,
            log,
            notifier,
        }
    }
}

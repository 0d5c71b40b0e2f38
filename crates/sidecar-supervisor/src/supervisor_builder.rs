use crate::{
    GuidanceNotifier, HealthProbe, LogGuidanceNotifier, ProcessLauncher, ProcessSupervisor,
    SettingsProvider, SupervisorTiming, TcpHealthProbe, ToolVersion,
};

use std::sync::Arc;

use sidecar_core::{SharedLogSink, TracingLogSink};

/// Assembles a [`ProcessSupervisor`].
///
/// Defaults: TCP health probe, `tracing` log sink, logged guidance and
/// default timing.
pub struct SupervisorBuilder {
    pub(crate) launcher: Arc<dyn ProcessLauncher>,
    pub(crate) settings: Arc<dyn SettingsProvider>,
    pub(crate) probe: Arc<dyn HealthProbe>,
    pub(crate) log_sink: SharedLogSink,
    pub(crate) notifier: Arc<dyn GuidanceNotifier>,
    pub(crate) timing: SupervisorTiming,
    pub(crate) min_version: Option<ToolVersion>,
}

impl SupervisorBuilder {
    pub fn new(launcher: Arc<dyn ProcessLauncher>, settings: Arc<dyn SettingsProvider>) -> Self {
        Self {
            launcher,
            settings,
            probe: Arc::new(TcpHealthProbe::default()),
            log_sink: Arc::new(TracingLogSink),
            notifier: Arc::new(LogGuidanceNotifier),
            timing: SupervisorTiming::default(),
            min_version: None,
        }
    }

    pub fn probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn log_sink(mut self, log_sink: SharedLogSink) -> Self {
        self.log_sink = log_sink;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn GuidanceNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn timing(mut self, timing: SupervisorTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Versions below this only produce a warning.
    pub fn min_version(mut self, min_version: ToolVersion) -> Self {
        self.min_version = Some(min_version);
        self
    }

    pub fn build(self) -> ProcessSupervisor {
        ProcessSupervisor::from_builder(self)
    }
}

use sidecar_config::SupervisorConfig;

use std::time::Duration;

/// Intervals and bounds used by [`crate::ProcessSupervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorTiming {
    pub health_check_interval: Duration,
    pub health_failure_threshold: u32,
    pub startup_timeout: Duration,
    pub readiness_poll_interval: Duration,
    pub shutdown_timeout: Duration,
    pub version_timeout: Duration,
}

impl Default for SupervisorTiming {
    fn default() -> Self {
        Self::from(&SupervisorConfig::default())
    }
}

impl From<&SupervisorConfig> for SupervisorTiming {
    fn from(config: &SupervisorConfig) -> Self {
        Self {
            health_check_interval: Duration::from_secs(config.health_check_interval_secs),
            health_failure_threshold: config.health_failure_threshold,
            startup_timeout: Duration::from_secs(config.startup_timeout_secs),
            readiness_poll_interval: Duration::from_millis(config.readiness_poll_interval_ms),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
            version_timeout: Duration::from_secs(config.version_timeout_secs),
        }
    }
}

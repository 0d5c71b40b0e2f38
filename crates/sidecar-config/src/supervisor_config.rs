use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

// Health check interval constraints (seconds)
pub const MIN_HEALTH_CHECK_INTERVAL_SECS: u64 = 1;
pub const MAX_HEALTH_CHECK_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 30;

// Consecutive failures before an automatic restart
pub const MIN_HEALTH_FAILURE_THRESHOLD: u32 = 1;
pub const MAX_HEALTH_FAILURE_THRESHOLD: u32 = 20;
pub const DEFAULT_HEALTH_FAILURE_THRESHOLD: u32 = 3;

// Readiness wait after spawn (seconds)
pub const MIN_STARTUP_TIMEOUT_SECS: u64 = 1;
pub const MAX_STARTUP_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 30;

pub const MIN_READINESS_POLL_INTERVAL_MS: u64 = 50;
pub const MAX_READINESS_POLL_INTERVAL_MS: u64 = 10000;
pub const DEFAULT_READINESS_POLL_INTERVAL_MS: u64 = 500;

// Graceful exit wait before SIGKILL (milliseconds)
pub const MIN_SHUTDOWN_TIMEOUT_MS: u64 = 100;
pub const MAX_SHUTDOWN_TIMEOUT_MS: u64 = 60000;
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5000;

// Bound on `program --version`
pub const MIN_VERSION_TIMEOUT_SECS: u64 = 1;
pub const MAX_VERSION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_VERSION_TIMEOUT_SECS: u64 = 5;

/// Process supervision timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub health_check_interval_secs: u64,
    pub health_failure_threshold: u32,
    pub startup_timeout_secs: u64,
    pub readiness_poll_interval_ms: u64,
    pub shutdown_timeout_ms: u64,
    pub version_timeout_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            health_check_interval_secs: DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
            health_failure_threshold: DEFAULT_HEALTH_FAILURE_THRESHOLD,
            startup_timeout_secs: DEFAULT_STARTUP_TIMEOUT_SECS,
            readiness_poll_interval_ms: DEFAULT_READINESS_POLL_INTERVAL_MS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            version_timeout_secs: DEFAULT_VERSION_TIMEOUT_SECS,
        }
    }
}

impl SupervisorConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.health_check_interval_secs < MIN_HEALTH_CHECK_INTERVAL_SECS
            || self.health_check_interval_secs > MAX_HEALTH_CHECK_INTERVAL_SECS
        {
            return Err(ConfigError::supervisor(format!(
                "supervisor.health_check_interval_secs must be {}-{}, got {}",
                MIN_HEALTH_CHECK_INTERVAL_SECS,
                MAX_HEALTH_CHECK_INTERVAL_SECS,
                self.health_check_interval_secs
            )));
        }

        if self.health_failure_threshold < MIN_HEALTH_FAILURE_THRESHOLD
            || self.health_failure_threshold > MAX_HEALTH_FAILURE_THRESHOLD
        {
            return Err(ConfigError::supervisor(format!(
                "supervisor.health_failure_threshold must be {}-{}, got {}",
                MIN_HEALTH_FAILURE_THRESHOLD,
                MAX_HEALTH_FAILURE_THRESHOLD,
                self.health_failure_threshold
            )));
        }

        if self.startup_timeout_secs < MIN_STARTUP_TIMEOUT_SECS
            || self.startup_timeout_secs > MAX_STARTUP_TIMEOUT_SECS
        {
            return Err(ConfigError::supervisor(format!(
                "supervisor.startup_timeout_secs must be {}-{}, got {}",
                MIN_STARTUP_TIMEOUT_SECS, MAX_STARTUP_TIMEOUT_SECS, self.startup_timeout_secs
            )));
        }

        if self.readiness_poll_interval_ms < MIN_READINESS_POLL_INTERVAL_MS
            || self.readiness_poll_interval_ms > MAX_READINESS_POLL_INTERVAL_MS
        {
            return Err(ConfigError::supervisor(format!(
                "supervisor.readiness_poll_interval_ms must be {}-{}, got {}",
                MIN_READINESS_POLL_INTERVAL_MS,
                MAX_READINESS_POLL_INTERVAL_MS,
                self.readiness_poll_interval_ms
            )));
        }

        if self.readiness_poll_interval_ms >= self.startup_timeout_secs * 1000 {
            return Err(ConfigError::supervisor(format!(
                "supervisor.readiness_poll_interval_ms ({}) must be shorter than startup_timeout_secs ({})",
                self.readiness_poll_interval_ms, self.startup_timeout_secs
            )));
        }

        if self.shutdown_timeout_ms < MIN_SHUTDOWN_TIMEOUT_MS
            || self.shutdown_timeout_ms > MAX_SHUTDOWN_TIMEOUT_MS
        {
            return Err(ConfigError::supervisor(format!(
                "supervisor.shutdown_timeout_ms must be {}-{}, got {}",
                MIN_SHUTDOWN_TIMEOUT_MS, MAX_SHUTDOWN_TIMEOUT_MS, self.shutdown_timeout_ms
            )));
        }

        if self.version_timeout_secs < MIN_VERSION_TIMEOUT_SECS
            || self.version_timeout_secs > MAX_VERSION_TIMEOUT_SECS
        {
            return Err(ConfigError::supervisor(format!(
                "supervisor.version_timeout_secs must be {}-{}, got {}",
                MIN_VERSION_TIMEOUT_SECS, MAX_VERSION_TIMEOUT_SECS, self.version_timeout_secs
            )));
        }

        Ok(())
    }
}

use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

// Heartbeat interval constraints (seconds)
pub const MIN_HEARTBEAT_INTERVAL_SECS: u64 = 1;
pub const MAX_HEARTBEAT_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 30;

pub const DEFAULT_HEARTBEAT_TOOL: &str = "heartbeat";

// Reconnect constraints
pub const MIN_RECONNECT_MAX_ATTEMPTS: u32 = 1;
pub const MAX_RECONNECT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_RECONNECT_MAX_ATTEMPTS: u32 = 3;

pub const MIN_RECONNECT_INTERVAL_SECS: u64 = 1;
pub const MAX_RECONNECT_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_RECONNECT_INTERVAL_SECS: u64 = 10;

// Per protocol call
pub const MIN_CALL_TIMEOUT_SECS: u64 = 1;
pub const MAX_CALL_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 120;

/// Heartbeat and reconnect behaviour of a logical session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub heartbeat_interval_secs: u64,
    /// Tool invoked on every heartbeat tick
    pub heartbeat_tool: String,
    pub reconnect_max_attempts: u32,
    pub reconnect_interval_secs: u64,
    pub call_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            heartbeat_tool: String::from(DEFAULT_HEARTBEAT_TOOL),
            reconnect_max_attempts: DEFAULT_RECONNECT_MAX_ATTEMPTS,
            reconnect_interval_secs: DEFAULT_RECONNECT_INTERVAL_SECS,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.heartbeat_interval_secs < MIN_HEARTBEAT_INTERVAL_SECS
            || self.heartbeat_interval_secs > MAX_HEARTBEAT_INTERVAL_SECS
        {
            return Err(ConfigError::session(format!(
                "session.heartbeat_interval_secs must be {}-{}, got {}",
                MIN_HEARTBEAT_INTERVAL_SECS,
                MAX_HEARTBEAT_INTERVAL_SECS,
                self.heartbeat_interval_secs
            )));
        }

        if self.heartbeat_tool.trim().is_empty() {
            return Err(ConfigError::session(
                "session.heartbeat_tool must not be empty",
            ));
        }

        if self.reconnect_max_attempts < MIN_RECONNECT_MAX_ATTEMPTS
            || self.reconnect_max_attempts > MAX_RECONNECT_MAX_ATTEMPTS
        {
            return Err(ConfigError::session(format!(
                "session.reconnect_max_attempts must be {}-{}, got {}",
                MIN_RECONNECT_MAX_ATTEMPTS, MAX_RECONNECT_MAX_ATTEMPTS, self.reconnect_max_attempts
            )));
        }

        if self.reconnect_interval_secs < MIN_RECONNECT_INTERVAL_SECS
            || self.reconnect_interval_secs > MAX_RECONNECT_INTERVAL_SECS
        {
            return Err(ConfigError::session(format!(
                "session.reconnect_interval_secs must be {}-{}, got {}",
                MIN_RECONNECT_INTERVAL_SECS,
                MAX_RECONNECT_INTERVAL_SECS,
                self.reconnect_interval_secs
            )));
        }

        if self.call_timeout_secs < MIN_CALL_TIMEOUT_SECS
            || self.call_timeout_secs > MAX_CALL_TIMEOUT_SECS
        {
            return Err(ConfigError::session(format!(
                "session.call_timeout_secs must be {}-{}, got {}",
                MIN_CALL_TIMEOUT_SECS, MAX_CALL_TIMEOUT_SECS, self.call_timeout_secs
            )));
        }

        Ok(())
    }
}

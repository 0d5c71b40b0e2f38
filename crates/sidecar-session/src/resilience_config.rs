use sidecar_config::SessionConfig;

use std::time::Duration;

/// Heartbeat, reconnect and call bounds for a [`crate::ResilientSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResilienceConfig {
    pub heartbeat_interval: Duration,
    /// Tool invoked on every heartbeat tick
    pub heartbeat_tool: String,
    pub reconnect_max_attempts: u32,
    /// Fixed pause between reconnection attempts
    pub reconnect_interval: Duration,
    pub call_timeout: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for ResilienceConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(config.heartbeat_interval_secs),
            heartbeat_tool: config.heartbeat_tool.clone(),
            reconnect_max_attempts: config.reconnect_max_attempts,
            reconnect_interval: Duration::from_secs(config.reconnect_interval_secs),
            call_timeout: Duration::from_secs(config.call_timeout_secs),
        }
    }
}

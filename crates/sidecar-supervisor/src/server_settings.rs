use sidecar_config::ServerConfig;

use serde::Serialize;

/// Launch parameters read once per start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSettings {
    pub port: u16,
    pub timeout_ms: u64,
    pub log_level: String,
}

impl From<&ServerConfig> for ServerSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            port: config.port,
            timeout_ms: config.timeout_ms,
            log_level: config.log_level.as_str().to_string(),
        }
    }
}

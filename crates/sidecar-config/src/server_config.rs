use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_LOG_LEVEL, DEFAULT_MIN_VERSION, DEFAULT_PORT,
    DEFAULT_PROGRAM, DEFAULT_TIMEOUT_MS, LogLevel, MIN_PORT,
};

use serde::Deserialize;

// Per-call timeout the reasoning server enforces on itself
pub const MIN_TIMEOUT_MS: u64 = 1000;
pub const MAX_TIMEOUT_MS: u64 = 600000;

/// How to launch the reasoning server and what to hand it.
///
/// `args` may contain the placeholders `{port}`, `{timeout_ms}` and
/// `{log_level}`, substituted at spawn time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Executable name or path
    pub program: String,
    /// Arguments for the long-running server command
    pub args: Vec<String>,
    /// Arguments for the version check (`program --version`)
    pub version_args: Vec<String>,
    /// Lowest version that is known to work; older versions only warn
    pub min_version: String,
    pub port: u16,
    pub timeout_ms: u64,
    pub log_level: LogLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: String::from(DEFAULT_PROGRAM),
            args: default_args(),
            version_args: vec![String::from("--version")],
            min_version: String::from(DEFAULT_MIN_VERSION),
            port: DEFAULT_PORT,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            log_level: LogLevel(DEFAULT_LOG_LEVEL),
        }
    }
}

fn default_args() -> Vec<String> {
    [
        "serve",
        "--port",
        "{port}",
        "--timeout",
        "{timeout_ms}",
        "--log-level",
        "{log_level}",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl ServerConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.program.trim().is_empty() {
            return Err(ConfigError::server("server.program must not be empty"));
        }

        // The health probe needs a fixed, known port.
        if self.port < MIN_PORT {
            return Err(ConfigError::server(format!(
                "server.port must be >= {}, got {}",
                MIN_PORT, self.port
            )));
        }

        if self.timeout_ms < MIN_TIMEOUT_MS || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::server(format!(
                "server.timeout_ms must be {}-{}, got {}",
                MIN_TIMEOUT_MS, MAX_TIMEOUT_MS, self.timeout_ms
            )));
        }

        if self.min_version.trim().is_empty() {
            return Err(ConfigError::server("server.min_version must not be empty"));
        }

        Ok(())
    }
}

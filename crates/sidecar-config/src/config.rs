use crate::{
    CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult, DEFAULT_CONFIG_DIRNAME,
    LoggingConfig, ServerConfig, SessionConfig, SupervisorConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub supervisor: SupervisorConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from the default config directory.
    ///
    /// Loading order:
    /// 1. SIDECAR_CONFIG_DIR env var, else ./.sidecar/
    /// 2. Auto-create the config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply SIDECAR_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_from(&config_dir)
    }

    /// Load config from an explicit directory (same rules as [`Config::load`]).
    pub fn load_from(config_dir: &Path) -> ConfigErrorResult<Self> {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.to_path_buf(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load and parse TOML file with detailed error context.
    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: SIDECAR_CONFIG_DIR env var > ./.sidecar/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIRNAME))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.supervisor.validate()?;
        self.session.validate()?;
        self.logging.validate()?;

        Ok(())
    }

    /// Log configuration summary.
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  server: {} {} (port {}, timeout {}ms, log level {})",
            self.server.program,
            self.server.args.join(" "),
            self.server.port,
            self.server.timeout_ms,
            self.server.log_level
        );
        info!("  server: minimum version {}", self.server.min_version);
        info!(
            "  supervisor: health every {}s (restart after {} failures), startup={}s, shutdown={}ms, version check={}s",
            self.supervisor.health_check_interval_secs,
            self.supervisor.health_failure_threshold,
            self.supervisor.startup_timeout_secs,
            self.supervisor.shutdown_timeout_ms,
            self.supervisor.version_timeout_secs
        );
        info!(
            "  session: heartbeat={}s ({}), reconnect={}x every {}s, call timeout={}s",
            self.session.heartbeat_interval_secs,
            self.session.heartbeat_tool,
            self.session.reconnect_max_attempts,
            self.session.reconnect_interval_secs,
            self.session.call_timeout_secs
        );
        info!(
            "  logging: {} (dir: {}, json: {})",
            self.logging.level, self.logging.dir, self.logging.json
        );
    }

    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_string("SIDECAR_SERVER_PROGRAM", &mut self.server.program);
        Self::apply_env_list("SIDECAR_SERVER_ARGS", &mut self.server.args);
        Self::apply_env_list("SIDECAR_SERVER_VERSION_ARGS", &mut self.server.version_args);
        Self::apply_env_string("SIDECAR_SERVER_MIN_VERSION", &mut self.server.min_version);
        Self::apply_env_parse("SIDECAR_SERVER_PORT", &mut self.server.port);
        Self::apply_env_parse("SIDECAR_SERVER_TIMEOUT_MS", &mut self.server.timeout_ms);
        Self::apply_env_parse("SIDECAR_SERVER_LOG_LEVEL", &mut self.server.log_level);

        // Supervisor
        Self::apply_env_parse(
            "SIDECAR_HEALTH_CHECK_INTERVAL_SECS",
            &mut self.supervisor.health_check_interval_secs,
        );
        Self::apply_env_parse(
            "SIDECAR_HEALTH_FAILURE_THRESHOLD",
            &mut self.supervisor.health_failure_threshold,
        );
        Self::apply_env_parse(
            "SIDECAR_STARTUP_TIMEOUT_SECS",
            &mut self.supervisor.startup_timeout_secs,
        );
        Self::apply_env_parse(
            "SIDECAR_READINESS_POLL_INTERVAL_MS",
            &mut self.supervisor.readiness_poll_interval_ms,
        );
        Self::apply_env_parse(
            "SIDECAR_SHUTDOWN_TIMEOUT_MS",
            &mut self.supervisor.shutdown_timeout_ms,
        );
        Self::apply_env_parse(
            "SIDECAR_VERSION_TIMEOUT_SECS",
            &mut self.supervisor.version_timeout_secs,
        );

        // Session
        Self::apply_env_parse(
            "SIDECAR_HEARTBEAT_INTERVAL_SECS",
            &mut self.session.heartbeat_interval_secs,
        );
        Self::apply_env_string("SIDECAR_HEARTBEAT_TOOL", &mut self.session.heartbeat_tool);
        Self::apply_env_parse(
            "SIDECAR_RECONNECT_MAX_ATTEMPTS",
            &mut self.session.reconnect_max_attempts,
        );
        Self::apply_env_parse(
            "SIDECAR_RECONNECT_INTERVAL_SECS",
            &mut self.session.reconnect_interval_secs,
        );
        Self::apply_env_parse(
            "SIDECAR_CALL_TIMEOUT_SECS",
            &mut self.session.call_timeout_secs,
        );

        // Logging
        Self::apply_env_parse("SIDECAR_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_string("SIDECAR_LOG_DIR", &mut self.logging.dir);
        Self::apply_env_bool("SIDECAR_LOG_JSON", &mut self.logging.json);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for whitespace-separated lists
    fn apply_env_list(var_name: &str, target: &mut Vec<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val.split_whitespace().map(String::from).collect();
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }
}
